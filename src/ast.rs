//! AST types for relational logic formulas
//!
//! Expressions denote sets of tuples over the atoms of an instance. Leaves
//! refer to schema declarations by name; names are resolved and type-checked
//! by [`crate::engine::checker`] before any search starts.

pub mod formula;
pub mod int_expr;
pub mod visitor;

pub use formula::{
    BinaryFormulaOp, CompareOp, Decl, Decls, Formula, Multiplicity, Quantifier,
};
pub use int_expr::{IntBinaryOp, IntCompareOp, IntExpression};
pub use visitor::{relations_read, Visitor};

use std::fmt;
use std::sync::Arc;

/// A variable in a quantified formula
///
/// Variables are unary and compare by name; an inner quantifier may shadow an
/// outer binding of the same name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    name: Arc<str>,
}

impl Variable {
    /// Creates a new unary variable
    pub fn unary(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
        }
    }

    /// Returns the name of this variable
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the arity of this variable (always 1)
    pub fn arity(&self) -> usize {
        1
    }

    /// Declares this variable as ranging over `expression`
    pub fn one_of(self, expression: Expression) -> Decl {
        Decl::one_of(self, expression)
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Variable({})", self.name())
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operators for binary expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// Relational composition/join
    Join,
    /// Cartesian product
    Product,
    /// Set union
    Union,
    /// Set difference
    Difference,
    /// Set intersection
    Intersection,
}

/// Operators for unary expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Transpose of a binary relation
    Transpose,
    /// Transitive closure
    Closure,
}

/// Constant expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstantExpr {
    /// Universal relation (all atoms)
    Univ,
    /// Identity relation (diagonal)
    Iden,
    /// Empty relation
    None,
}

/// A relational expression
#[expect(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Expression {
    /// All atoms of a signature and its subtypes (leaf)
    Sig(String),
    /// A declared binary relation (leaf)
    Field(String),
    /// A quantified variable (leaf)
    Variable(Variable),
    /// A constant expression
    Constant(ConstantExpr),
    /// Binary expression (e.g., join, product, union)
    Binary {
        left: Box<Expression>,
        op: BinaryOp,
        right: Box<Expression>,
    },
    /// Unary expression (transpose, closure)
    Unary {
        op: UnaryOp,
        expr: Box<Expression>,
    },
}

impl Expression {
    /// Universal relation constant
    pub const UNIV: Expression = Expression::Constant(ConstantExpr::Univ);
    /// Identity relation constant
    pub const IDEN: Expression = Expression::Constant(ConstantExpr::Iden);
    /// Empty relation constant
    pub const NONE: Expression = Expression::Constant(ConstantExpr::None);

    /// The atoms of signature `name` (including subtype atoms)
    pub fn sig(name: impl Into<String>) -> Expression {
        Expression::Sig(name.into())
    }

    /// The tuples of relation `name`
    pub fn field(name: impl Into<String>) -> Expression {
        Expression::Field(name.into())
    }

    /// Returns the arity of this expression
    ///
    /// Ill-formed joins report arity 0; the checker rejects them.
    pub fn arity(&self) -> usize {
        match self {
            Expression::Sig(_) | Expression::Variable(_) => 1,
            Expression::Field(_) => 2,
            Expression::Constant(c) => match c {
                ConstantExpr::Univ | ConstantExpr::None => 1,
                ConstantExpr::Iden => 2,
            },
            Expression::Binary { left, op, right } => match op {
                BinaryOp::Join => (left.arity() + right.arity()).saturating_sub(2),
                BinaryOp::Product => left.arity() + right.arity(),
                BinaryOp::Union | BinaryOp::Difference | BinaryOp::Intersection => left.arity(),
            },
            Expression::Unary { .. } => 2,
        }
    }

    /// Relational join (`self.other`)
    pub fn join(self, other: Expression) -> Expression {
        self.binary(BinaryOp::Join, other)
    }

    /// Cartesian product (`self -> other`)
    pub fn product(self, other: Expression) -> Expression {
        self.binary(BinaryOp::Product, other)
    }

    /// Set union
    pub fn union(self, other: Expression) -> Expression {
        self.binary(BinaryOp::Union, other)
    }

    /// Set difference
    pub fn difference(self, other: Expression) -> Expression {
        self.binary(BinaryOp::Difference, other)
    }

    /// Set intersection
    pub fn intersection(self, other: Expression) -> Expression {
        self.binary(BinaryOp::Intersection, other)
    }

    /// Transpose
    pub fn transpose(self) -> Expression {
        Expression::Unary {
            op: UnaryOp::Transpose,
            expr: Box::new(self),
        }
    }

    /// Transitive closure
    pub fn closure(self) -> Expression {
        Expression::Unary {
            op: UnaryOp::Closure,
            expr: Box::new(self),
        }
    }

    fn binary(self, op: BinaryOp, other: Expression) -> Expression {
        Expression::Binary {
            left: Box::new(self),
            op,
            right: Box::new(other),
        }
    }
}

impl From<Variable> for Expression {
    fn from(v: Variable) -> Self {
        Expression::Variable(v)
    }
}

impl From<&Variable> for Expression {
    fn from(v: &Variable) -> Self {
        Expression::Variable(v.clone())
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Sig(name) | Expression::Field(name) => f.write_str(name),
            Expression::Variable(v) => write!(f, "{v}"),
            Expression::Constant(ConstantExpr::Univ) => f.write_str("univ"),
            Expression::Constant(ConstantExpr::Iden) => f.write_str("iden"),
            Expression::Constant(ConstantExpr::None) => f.write_str("none"),
            Expression::Binary { left, op, right } => match op {
                BinaryOp::Join => write!(f, "{left}.{right}"),
                BinaryOp::Product => write!(f, "({left} -> {right})"),
                BinaryOp::Union => write!(f, "({left} + {right})"),
                BinaryOp::Difference => write!(f, "({left} - {right})"),
                BinaryOp::Intersection => write!(f, "({left} & {right})"),
            },
            Expression::Unary { op, expr } => match op {
                UnaryOp::Transpose => write!(f, "~{expr}"),
                UnaryOp::Closure => write!(f, "^{expr}"),
            },
        }
    }
}
