/*
 * Kodkod -- Copyright (c) 2005-present, Emina Torlak
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in
 * all copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR IN CONNECTION WITH
 * THE SOFTWARE.
 */

//! Evaluator for relational formulas and expressions
//!
//! Evaluation is direct structural recursion over an [`Instance`] with an
//! [`Environment`] of quantified bindings. Universal quantification stops at
//! the first falsifying atom, existential at the first satisfying one.

use std::fmt;

use crate::ast::{
    BinaryFormulaOp, BinaryOp, CompareOp, ConstantExpr, Decl, Expression, Formula, IntBinaryOp,
    IntExpression, Multiplicity, Quantifier, UnaryOp,
};
use crate::engine::environment::Environment;
use crate::instance::{Atom, Instance, Tuple, TupleSet};

/// The failing part of a formula together with the bindings in force
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Culprit {
    /// The smallest sub-formula found false
    pub formula: Formula,
    /// Variable name and atom name for every enclosing binding, outermost first
    pub bindings: Vec<(String, String)>,
}

impl fmt::Display for Culprit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.formula)?;
        if !self.bindings.is_empty() {
            f.write_str(" where ")?;
            for (i, (var, atom)) in self.bindings.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{var} = {atom}")?;
            }
        }
        Ok(())
    }
}

/// Result of [`Evaluator::check`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the formula holds
    pub holds: bool,
    /// Why it does not hold, when it does not
    pub culprit: Option<Culprit>,
}

/// An evaluator for relational formulas and expressions with
/// respect to a given Instance.
///
/// Names are resolved against the instance's schema. Unknown names and free
/// variables evaluate to the empty set; the checker rejects both before
/// search, so they only arise for formulas that were never validated.
pub struct Evaluator<'a> {
    instance: &'a Instance,
}

impl<'a> Evaluator<'a> {
    /// Constructs a new Evaluator for the given instance
    pub fn new(instance: &'a Instance) -> Self {
        Self { instance }
    }

    /// Returns the instance this evaluator reads
    pub fn instance(&self) -> &Instance {
        self.instance
    }

    /// Evaluates a closed formula
    pub fn evaluate(&self, formula: &Formula) -> bool {
        self.formula(formula, &mut Environment::empty())
    }

    /// Evaluates a closed expression to its tuples
    pub fn evaluate_expression(&self, expression: &Expression) -> TupleSet {
        self.expression(expression, &Environment::empty())
    }

    /// Evaluates a closed integer expression
    pub fn evaluate_int(&self, int_expr: &IntExpression) -> i64 {
        self.int_expression(int_expr, &Environment::empty())
    }

    /// Evaluates a formula under existing bindings
    pub fn evaluate_in(&self, formula: &Formula, env: &mut Environment) -> bool {
        self.formula(formula, env)
    }

    /// Evaluates a closed formula and, if it is false, locates the failure
    ///
    /// The culprit descends through conjunctions, universal quantifiers and
    /// implications whose premise holds, stopping at the first node that has
    /// no single false child to blame.
    pub fn check(&self, formula: &Formula) -> Verdict {
        let mut env = Environment::empty();
        if self.formula(formula, &mut env) {
            return Verdict {
                holds: true,
                culprit: None,
            };
        }
        Verdict {
            holds: false,
            culprit: Some(self.blame(formula, &mut env)),
        }
    }

    fn blame(&self, formula: &Formula, env: &mut Environment) -> Culprit {
        match formula {
            Formula::Binary {
                left,
                op: BinaryFormulaOp::And,
                right,
            } => {
                if !self.formula(left, env) {
                    self.blame(left, env)
                } else {
                    self.blame(right, env)
                }
            }
            Formula::Binary {
                op: BinaryFormulaOp::Implies,
                right,
                ..
            } => self.blame(right, env),
            Formula::Nary {
                op: BinaryFormulaOp::And,
                formulas,
            } => match formulas.iter().find(|f| !self.formula(f, env)) {
                Some(failing) => self.blame(failing, env),
                None => self.culprit(formula, env),
            },
            Formula::Quantified {
                quantifier: Quantifier::All,
                declarations,
                body,
            } => {
                let depth = env.depth();
                if self.find_binding(declarations.as_slice(), body, env, false) {
                    let culprit = self.blame(body, env);
                    while env.depth() > depth {
                        env.pop();
                    }
                    culprit
                } else {
                    self.culprit(formula, env)
                }
            }
            _ => self.culprit(formula, env),
        }
    }

    fn culprit(&self, formula: &Formula, env: &Environment) -> Culprit {
        Culprit {
            formula: formula.clone(),
            bindings: env
                .bindings()
                .iter()
                .map(|(v, a)| (v.name().to_string(), self.instance.atom_name(*a).to_string()))
                .collect(),
        }
    }

    /// Searches for bindings of `decls` under which `body` evaluates to
    /// `wanted`. On success the bindings are left on the environment.
    fn find_binding(&self, decls: &[Decl], body: &Formula, env: &mut Environment, wanted: bool) -> bool {
        let Some((decl, rest)) = decls.split_first() else {
            return self.formula(body, env) == wanted;
        };
        let domain = self.expression(decl.expression(), env);
        for atom in domain.atoms() {
            env.extend(decl.variable().clone(), atom);
            if self.find_binding(rest, body, env, wanted) {
                return true;
            }
            env.pop();
        }
        false
    }

    fn formula(&self, formula: &Formula, env: &mut Environment) -> bool {
        match formula {
            Formula::Constant(b) => *b,
            Formula::Not(inner) => !self.formula(inner, env),
            Formula::Binary { left, op, right } => match op {
                BinaryFormulaOp::And => self.formula(left, env) && self.formula(right, env),
                BinaryFormulaOp::Or => self.formula(left, env) || self.formula(right, env),
                BinaryFormulaOp::Implies => !self.formula(left, env) || self.formula(right, env),
                BinaryFormulaOp::Iff => self.formula(left, env) == self.formula(right, env),
            },
            Formula::Nary { op, formulas } => match op {
                BinaryFormulaOp::Or => formulas.iter().any(|f| self.formula(f, env)),
                _ => formulas.iter().all(|f| self.formula(f, env)),
            },
            Formula::Comparison { left, op, right } => {
                let l = self.expression(left, env);
                let r = self.expression(right, env);
                match op {
                    CompareOp::Equals => l == r,
                    CompareOp::Subset => l.is_subset(&r),
                }
            }
            Formula::Multiplicity { mult, expr } => {
                let size = self.expression(expr, env).size();
                match mult {
                    Multiplicity::Some => size > 0,
                    Multiplicity::One => size == 1,
                    Multiplicity::Lone => size <= 1,
                    Multiplicity::No => size == 0,
                }
            }
            Formula::Quantified {
                quantifier,
                declarations,
                body,
            } => {
                let depth = env.depth();
                let result = match quantifier {
                    Quantifier::All => !self.find_binding(declarations.as_slice(), body, env, false),
                    Quantifier::Some => self.find_binding(declarations.as_slice(), body, env, true),
                };
                while env.depth() > depth {
                    env.pop();
                }
                result
            }
            Formula::IntComparison { left, op, right } => {
                op.apply(self.int_expression(left, env), self.int_expression(right, env))
            }
        }
    }

    fn expression(&self, expr: &Expression, env: &Environment) -> TupleSet {
        let schema = self.instance.schema();
        let universe = self.instance.universe();
        match expr {
            Expression::Sig(name) => schema
                .sig_id(name)
                .map(|s| universe.extent(s).clone())
                .unwrap_or_else(|| TupleSet::empty(1)),
            Expression::Field(name) => self
                .instance
                .relation(name)
                .cloned()
                .unwrap_or_else(|| TupleSet::empty(2)),
            Expression::Variable(v) => env
                .lookup(v)
                .map(TupleSet::singleton)
                .unwrap_or_else(|| TupleSet::empty(1)),
            Expression::Constant(c) => match c {
                ConstantExpr::Univ => universe.univ(),
                ConstantExpr::Iden => universe.iden(),
                ConstantExpr::None => TupleSet::empty(1),
            },
            Expression::Binary { left, op, right } => {
                let l = self.expression(left, env);
                let r = self.expression(right, env);
                match op {
                    BinaryOp::Join => l.join(&r),
                    BinaryOp::Product => l.product(&r),
                    BinaryOp::Union => l.union(&r),
                    BinaryOp::Intersection => l.intersection(&r),
                    BinaryOp::Difference => l.difference(&r),
                }
            }
            Expression::Unary { op, expr: inner } => {
                let set = self.expression(inner, env);
                match op {
                    UnaryOp::Transpose => set.transpose(),
                    UnaryOp::Closure => set.closure(),
                }
            }
        }
    }

    fn int_expression(&self, expr: &IntExpression, env: &Environment) -> i64 {
        match expr {
            IntExpression::Constant(v) => *v,
            IntExpression::Binary { left, op, right } => {
                let l = self.int_expression(left, env);
                let r = self.int_expression(right, env);
                match op {
                    IntBinaryOp::Plus => l.wrapping_add(r),
                    IntBinaryOp::Minus => l.wrapping_sub(r),
                }
            }
            IntExpression::Cardinality(e) => self.expression(e, env).size() as i64,
            IntExpression::Sum(e) => self
                .expression(e, env)
                .iter()
                .filter_map(|t: &Tuple| t.atom(0))
                .filter_map(|a: Atom| self.instance.universe().int_value(a))
                .sum(),
        }
    }
}
