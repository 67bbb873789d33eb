//! Formula flattening: splits a formula into top-level conjuncts
//!
//! Negations are pushed only as far as needed to expose conjunctions:
//! through double negation, `or`, `implies` and quantifiers. Every other
//! node is kept intact so that conjuncts still read like the source formula
//! when they are reported.

use crate::ast::{BinaryFormulaOp, Decls, Formula, Quantifier};

/// Flattens a formula into the list of its top-level conjuncts
///
/// With `breakup_quantifiers`, `all x | A && B` becomes `all x | A` and
/// `all x | B`.
pub struct FormulaFlattener {
    breakup_quantifiers: bool,
}

impl FormulaFlattener {
    /// Creates a new flattener
    pub fn new(breakup_quantifiers: bool) -> Self {
        Self { breakup_quantifiers }
    }

    /// Flattens a formula and returns the list of top-level conjuncts
    ///
    /// Constant `true` conjuncts are dropped, so a tautology flattens to an
    /// empty list.
    pub fn flatten(&self, formula: &Formula) -> Vec<Formula> {
        let mut result = Vec::new();
        self.visit(formula, false, &mut result);
        result
    }

    fn visit(&self, formula: &Formula, negated: bool, out: &mut Vec<Formula>) {
        match formula {
            Formula::Constant(b) => {
                if *b == negated {
                    out.push(Formula::FALSE);
                }
            }
            Formula::Not(inner) => self.visit(inner, !negated, out),
            Formula::Binary { left, op, right } => match (op, negated) {
                (BinaryFormulaOp::And, false) | (BinaryFormulaOp::Or, true) => {
                    self.visit(left, negated, out);
                    self.visit(right, negated, out);
                }
                (BinaryFormulaOp::Implies, true) => {
                    // !(a => b) = a && !b
                    self.visit(left, false, out);
                    self.visit(right, true, out);
                }
                _ => out.push(leaf(formula, negated)),
            },
            Formula::Nary { op, formulas } => match (op, negated) {
                (BinaryFormulaOp::And, false) | (BinaryFormulaOp::Or, true) => {
                    for f in formulas {
                        self.visit(f, negated, out);
                    }
                }
                _ => out.push(leaf(formula, negated)),
            },
            Formula::Quantified {
                quantifier,
                declarations,
                body,
            } => match (quantifier, negated) {
                // !(some x | p) = all x | !p
                (Quantifier::All, false) | (Quantifier::Some, true) if self.breakup_quantifiers => {
                    let mut parts = Vec::new();
                    self.visit(body, negated, &mut parts);
                    out.extend(parts.into_iter().map(|p| forall(declarations, p)));
                }
                // !(all x | p) = some x | !p
                (Quantifier::All, true) => out.push(Formula::exists(declarations.clone(), negate(body))),
                (Quantifier::Some, true) => out.push(forall(declarations, negate(body))),
                _ => out.push(formula.clone()),
            },
            _ => out.push(leaf(formula, negated)),
        }
    }
}

fn forall(declarations: &Decls, body: Formula) -> Formula {
    Formula::forall(declarations.clone(), body)
}

fn leaf(formula: &Formula, negated: bool) -> Formula {
    if negated {
        negate(formula)
    } else {
        formula.clone()
    }
}

/// Negates a formula, cancelling a double negation
fn negate(formula: &Formula) -> Formula {
    match formula {
        Formula::Not(inner) => (**inner).clone(),
        Formula::Constant(b) => Formula::Constant(!b),
        other => other.clone().not(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Decl, Expression, Variable};

    fn atom(name: &str) -> Formula {
        Expression::sig(name).some()
    }

    #[test]
    fn double_negation() {
        let flattener = FormulaFlattener::new(false);
        let a = atom("A");
        assert_eq!(flattener.flatten(&a.clone().not().not()), vec![a]);
    }

    #[test]
    fn extract_conjuncts() {
        let flattener = FormulaFlattener::new(false);
        // (A && B) && (C && D) extracts to [A, B, C, D]
        let top = atom("A").and(atom("B")).and(Formula::and_all(vec![atom("C"), atom("D")]));
        assert_eq!(flattener.flatten(&top), vec![atom("A"), atom("B"), atom("C"), atom("D")]);
    }

    #[test]
    fn negated_disjunction_and_implication() {
        let flattener = FormulaFlattener::new(false);
        // !(A || B) = !A && !B
        let result = flattener.flatten(&atom("A").or(atom("B")).not());
        assert_eq!(result, vec![atom("A").not(), atom("B").not()]);

        // !(A => B) = A && !B
        let result = flattener.flatten(&atom("A").implies(atom("B")).not());
        assert_eq!(result, vec![atom("A"), atom("B").not()]);

        // A || B stays whole
        assert_eq!(flattener.flatten(&atom("A").or(atom("B"))).len(), 1);
    }

    #[test]
    fn universal_distributes_over_conjunction() {
        let p = Variable::unary("p");
        let decls = Decls::from(Decl::one_of(p.clone(), Expression::sig("Processor")));
        let a = Expression::from(&p).join(Expression::field("f")).some();
        let b = Expression::from(&p).join(Expression::field("g")).no();
        let formula = Formula::forall(decls.clone(), a.clone().and(b.clone()));

        assert_eq!(
            FormulaFlattener::new(true).flatten(&formula),
            vec![Formula::forall(decls.clone(), a), Formula::forall(decls, b)]
        );
        assert_eq!(FormulaFlattener::new(false).flatten(&formula).len(), 1);
    }

    #[test]
    fn negated_quantifiers_flip() {
        let r = Variable::unary("r");
        let decls = Decls::from(Decl::one_of(r.clone(), Expression::sig("RAR")));
        let body = Expression::from(&r).join(Expression::field("target")).some();

        let result = FormulaFlattener::new(true).flatten(&Formula::forall(decls.clone(), body.clone()).not());
        assert_eq!(result, vec![Formula::exists(decls.clone(), body.clone().not())]);

        let result = FormulaFlattener::new(true).flatten(&Formula::exists(decls.clone(), body.clone().not()).not());
        assert_eq!(result, vec![Formula::forall(decls, body)]);
    }

    #[test]
    fn constants() {
        let flattener = FormulaFlattener::new(true);
        assert!(flattener.flatten(&Formula::TRUE).is_empty());
        assert_eq!(flattener.flatten(&Formula::TRUE.not()), vec![Formula::FALSE]);
        assert_eq!(flattener.flatten(&atom("A").and(Formula::TRUE)), vec![atom("A")]);
    }
}
