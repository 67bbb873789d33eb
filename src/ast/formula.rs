//! Formula types for first-order relational logic

use std::fmt;

use super::int_expr::{IntCompareOp, IntExpression};
use super::{Expression, Variable};

/// Operators for binary formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryFormulaOp {
    /// Logical AND
    And,
    /// Logical OR
    Or,
    /// If and only if
    Iff,
    /// Implies
    Implies,
}

/// Comparison operators for expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Set equality
    Equals,
    /// Subset (membership when the left side is a singleton)
    Subset,
}

/// Multiplicity tests on expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Multiplicity {
    /// At least one element (some)
    Some,
    /// Exactly one element
    One,
    /// At most one element (lone)
    Lone,
    /// No elements
    No,
}

/// Quantifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantifier {
    /// Universal quantification (forall)
    All,
    /// Existential quantification (exists)
    Some,
}

/// A first-order formula
#[expect(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Formula {
    /// Constant formula (TRUE or FALSE)
    Constant(bool),
    /// Negation
    Not(Box<Formula>),
    /// Binary formula (AND, OR, IFF, IMPLIES)
    Binary {
        left: Box<Formula>,
        op: BinaryFormulaOp,
        right: Box<Formula>,
    },
    /// N-ary formula (conjunction/disjunction of multiple formulas)
    Nary {
        op: BinaryFormulaOp, // Only AND or OR
        formulas: Vec<Formula>,
    },
    /// Expression comparison (equals, subset)
    Comparison {
        left: Expression,
        op: CompareOp,
        right: Expression,
    },
    /// Multiplicity constraint (some, one, lone, no)
    Multiplicity { mult: Multiplicity, expr: Expression },
    /// Quantified formula (forall/exists)
    Quantified {
        quantifier: Quantifier,
        declarations: Decls,
        body: Box<Formula>,
    },
    /// Integer comparison
    IntComparison {
        left: IntExpression,
        op: IntCompareOp,
        right: IntExpression,
    },
}

impl Formula {
    /// Constant TRUE formula
    pub const TRUE: Formula = Formula::Constant(true);

    /// Constant FALSE formula
    pub const FALSE: Formula = Formula::Constant(false);

    /// Logical AND
    pub fn and(self, other: Formula) -> Formula {
        self.binary(BinaryFormulaOp::And, other)
    }

    /// Logical OR
    pub fn or(self, other: Formula) -> Formula {
        self.binary(BinaryFormulaOp::Or, other)
    }

    /// If and only if (biconditional)
    pub fn iff(self, other: Formula) -> Formula {
        self.binary(BinaryFormulaOp::Iff, other)
    }

    /// Implication
    pub fn implies(self, other: Formula) -> Formula {
        self.binary(BinaryFormulaOp::Implies, other)
    }

    /// Negation
    pub fn not(self) -> Formula {
        Formula::Not(Box::new(self))
    }

    fn binary(self, op: BinaryFormulaOp, other: Formula) -> Formula {
        Formula::Binary {
            left: Box::new(self),
            op,
            right: Box::new(other),
        }
    }

    /// N-ary conjunction
    pub fn and_all(formulas: Vec<Formula>) -> Formula {
        Self::nary(BinaryFormulaOp::And, formulas, Formula::TRUE)
    }

    /// N-ary disjunction
    pub fn or_all(formulas: Vec<Formula>) -> Formula {
        Self::nary(BinaryFormulaOp::Or, formulas, Formula::FALSE)
    }

    fn nary(op: BinaryFormulaOp, mut formulas: Vec<Formula>, empty: Formula) -> Formula {
        match formulas.len() {
            0 => empty,
            1 => formulas.remove(0),
            _ => Formula::Nary { op, formulas },
        }
    }

    /// Universal quantification (forall)
    pub fn forall(declarations: Decls, body: Formula) -> Formula {
        Formula::Quantified {
            quantifier: Quantifier::All,
            declarations,
            body: Box::new(body),
        }
    }

    /// Existential quantification (exists)
    pub fn exists(declarations: Decls, body: Formula) -> Formula {
        Formula::Quantified {
            quantifier: Quantifier::Some,
            declarations,
            body: Box::new(body),
        }
    }

    /// Creates an integer comparison formula
    pub fn int_comparison(left: IntExpression, op: IntCompareOp, right: IntExpression) -> Formula {
        Formula::IntComparison { left, op, right }
    }
}

impl Expression {
    /// Expression equals another
    pub fn equals(self, other: Expression) -> Formula {
        Formula::Comparison {
            left: self,
            op: CompareOp::Equals,
            right: other,
        }
    }

    /// Expression does not equal another (convenience method)
    pub fn ne(self, other: Expression) -> Formula {
        self.equals(other).not()
    }

    /// Expression is subset of another
    pub fn in_set(self, other: Expression) -> Formula {
        Formula::Comparison {
            left: self,
            op: CompareOp::Subset,
            right: other,
        }
    }

    /// Expression has at least one element
    pub fn some(self) -> Formula {
        self.multiplicity(Multiplicity::Some)
    }

    /// Expression has exactly one element
    pub fn one(self) -> Formula {
        self.multiplicity(Multiplicity::One)
    }

    /// Expression has at most one element
    pub fn lone(self) -> Formula {
        self.multiplicity(Multiplicity::Lone)
    }

    /// Expression has no elements
    pub fn no(self) -> Formula {
        self.multiplicity(Multiplicity::No)
    }

    fn multiplicity(self, mult: Multiplicity) -> Formula {
        Formula::Multiplicity { mult, expr: self }
    }
}

/// A variable declaration (`x: expression`), binding `x` to each atom of a unary expression
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Decl {
    variable: Variable,
    expression: Expression,
}

impl Decl {
    /// Creates a new "one of" declaration
    pub fn one_of(variable: Variable, expression: Expression) -> Self {
        Self {
            variable,
            expression,
        }
    }

    /// Returns the variable being declared
    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    /// Returns the expression the variable ranges over
    pub fn expression(&self) -> &Expression {
        &self.expression
    }
}

/// A sequence of variable declarations
///
/// Later declarations may refer to earlier variables.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Decls {
    declarations: Vec<Decl>,
}

impl Decls {
    /// Creates a new Decls from a single declaration
    pub fn from(decl: Decl) -> Self {
        Self {
            declarations: vec![decl],
        }
    }

    /// Returns the number of declarations
    pub fn size(&self) -> usize {
        self.declarations.len()
    }

    /// Returns an iterator over the declarations
    pub fn iter(&self) -> impl Iterator<Item = &Decl> {
        self.declarations.iter()
    }

    /// Returns the declarations as a slice
    pub fn as_slice(&self) -> &[Decl] {
        &self.declarations
    }

    /// Adds a declaration to this Decls
    pub fn and(mut self, decl: Decl) -> Self {
        self.declarations.push(decl);
        self
    }
}

impl fmt::Display for Decls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, decl) in self.declarations.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", decl.variable, decl.expression)?;
        }
        Ok(())
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::Constant(b) => write!(f, "{b}"),
            Formula::Not(inner) => write!(f, "!{inner}"),
            Formula::Binary { left, op, right } => {
                write!(f, "({left} {} {right})", connective(*op))
            }
            Formula::Nary { op, formulas } => {
                f.write_str("(")?;
                for (i, formula) in formulas.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", connective(*op))?;
                    }
                    write!(f, "{formula}")?;
                }
                f.write_str(")")
            }
            Formula::Comparison { left, op, right } => match op {
                CompareOp::Equals => write!(f, "{left} = {right}"),
                CompareOp::Subset => write!(f, "{left} in {right}"),
            },
            Formula::Multiplicity { mult, expr } => {
                let keyword = match mult {
                    Multiplicity::Some => "some",
                    Multiplicity::One => "one",
                    Multiplicity::Lone => "lone",
                    Multiplicity::No => "no",
                };
                write!(f, "{keyword} {expr}")
            }
            Formula::Quantified {
                quantifier,
                declarations,
                body,
            } => {
                let keyword = match quantifier {
                    Quantifier::All => "all",
                    Quantifier::Some => "some",
                };
                write!(f, "({keyword} {declarations} | {body})")
            }
            Formula::IntComparison { left, op, right } => write!(f, "{left} {op} {right}"),
        }
    }
}

fn connective(op: BinaryFormulaOp) -> &'static str {
    match op {
        BinaryFormulaOp::And => "&&",
        BinaryFormulaOp::Or => "||",
        BinaryFormulaOp::Iff => "<=>",
        BinaryFormulaOp::Implies => "=>",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_formulas() {
        let f1 = Formula::TRUE;
        let f2 = Formula::FALSE;

        let and = f1.clone().and(f2.clone());
        assert!(matches!(and, Formula::Binary { op: BinaryFormulaOp::And, .. }));

        let iff = f1.clone().iff(f2.clone());
        assert!(matches!(iff, Formula::Binary { op: BinaryFormulaOp::Iff, .. }));

        let implies = f1.implies(f2);
        assert!(matches!(implies, Formula::Binary { op: BinaryFormulaOp::Implies, .. }));
    }

    #[test]
    fn nary_formulas() {
        let and = Formula::and_all(vec![Formula::TRUE, Formula::FALSE, Formula::TRUE]);
        assert!(matches!(and, Formula::Nary { op: BinaryFormulaOp::And, .. }));

        // Empty and singleton cases collapse
        assert_eq!(Formula::and_all(vec![]), Formula::TRUE);
        assert_eq!(Formula::or_all(vec![]), Formula::FALSE);
        assert_eq!(Formula::or_all(vec![Formula::TRUE]), Formula::TRUE);
    }

    #[test]
    fn multiplicity_formulas() {
        let r = Expression::sig("Person");

        assert!(matches!(r.clone().some(), Formula::Multiplicity { mult: Multiplicity::Some, .. }));
        assert!(matches!(r.clone().one(), Formula::Multiplicity { mult: Multiplicity::One, .. }));
        assert!(matches!(r.clone().lone(), Formula::Multiplicity { mult: Multiplicity::Lone, .. }));
        assert!(matches!(r.no(), Formula::Multiplicity { mult: Multiplicity::No, .. }));
    }

    #[test]
    fn quantified_formula_display() {
        // all p: Processor | p.enable = True => p.rarBit = True
        let p = Variable::unary("p");
        let body = Expression::from(&p)
            .join(Expression::field("enable"))
            .equals(Expression::sig("True"))
            .implies(
                Expression::from(&p)
                    .join(Expression::field("rarBit"))
                    .equals(Expression::sig("True")),
            );
        let formula = Formula::forall(
            Decls::from(Decl::one_of(p, Expression::sig("Processor"))),
            body,
        );

        assert_eq!(
            formula.to_string(),
            "(all p: Processor | (p.enable = True => p.rarBit = True))"
        );
    }

    #[test]
    fn declarations() {
        let x = Variable::unary("x");
        let y = Variable::unary("y");

        let decls = Decls::from(x.clone().one_of(Expression::sig("A")))
            .and(Decl::one_of(y, Expression::from(&x).join(Expression::field("f"))));
        assert_eq!(decls.size(), 2);
        assert_eq!(decls.to_string(), "x: A, y: x.f");
    }
}
