//! Integer expression types

use std::fmt;

use super::{Expression, Formula};

/// Binary operators for integer expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntBinaryOp {
    /// Addition
    Plus,
    /// Subtraction
    Minus,
}

/// Integer comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntCompareOp {
    /// Equal
    Eq,
    /// Not equal
    Neq,
    /// Less than
    Lt,
    /// Less than or equal
    Lte,
    /// Greater than
    Gt,
    /// Greater than or equal
    Gte,
}

impl IntCompareOp {
    /// Applies the comparison to two values
    pub fn apply(self, left: i64, right: i64) -> bool {
        match self {
            IntCompareOp::Eq => left == right,
            IntCompareOp::Neq => left != right,
            IntCompareOp::Lt => left < right,
            IntCompareOp::Lte => left <= right,
            IntCompareOp::Gt => left > right,
            IntCompareOp::Gte => left >= right,
        }
    }
}

impl fmt::Display for IntCompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IntCompareOp::Eq => "=",
            IntCompareOp::Neq => "!=",
            IntCompareOp::Lt => "<",
            IntCompareOp::Lte => "<=",
            IntCompareOp::Gt => ">",
            IntCompareOp::Gte => ">=",
        })
    }
}

/// An expression that evaluates to an integer
#[expect(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IntExpression {
    /// Integer constant
    Constant(i64),
    /// Binary operation
    Binary {
        left: Box<IntExpression>,
        op: IntBinaryOp,
        right: Box<IntExpression>,
    },
    /// Cardinality of an expression (#expr)
    Cardinality(Expression),
    /// Sum of the values of the `Int` atoms in a unary expression (int[expr])
    Sum(Expression),
}

impl IntExpression {
    /// Integer constant
    pub fn constant(value: i64) -> Self {
        IntExpression::Constant(value)
    }

    /// Addition
    pub fn plus(self, other: IntExpression) -> Self {
        IntExpression::Binary {
            left: Box::new(self),
            op: IntBinaryOp::Plus,
            right: Box::new(other),
        }
    }

    /// Subtraction
    pub fn minus(self, other: IntExpression) -> Self {
        IntExpression::Binary {
            left: Box::new(self),
            op: IntBinaryOp::Minus,
            right: Box::new(other),
        }
    }

    /// `self = other`
    pub fn eq(self, other: IntExpression) -> Formula {
        Formula::int_comparison(self, IntCompareOp::Eq, other)
    }

    /// `self != other`
    pub fn neq(self, other: IntExpression) -> Formula {
        Formula::int_comparison(self, IntCompareOp::Neq, other)
    }

    /// `self < other`
    pub fn lt(self, other: IntExpression) -> Formula {
        Formula::int_comparison(self, IntCompareOp::Lt, other)
    }

    /// `self <= other`
    pub fn lte(self, other: IntExpression) -> Formula {
        Formula::int_comparison(self, IntCompareOp::Lte, other)
    }

    /// `self > other`
    pub fn gt(self, other: IntExpression) -> Formula {
        Formula::int_comparison(self, IntCompareOp::Gt, other)
    }

    /// `self >= other`
    pub fn gte(self, other: IntExpression) -> Formula {
        Formula::int_comparison(self, IntCompareOp::Gte, other)
    }
}

impl Expression {
    /// Cardinality (`#self`)
    pub fn count(self) -> IntExpression {
        IntExpression::Cardinality(self)
    }

    /// Integer value of the `Int` atoms in this expression (`int[self]`)
    pub fn sum(self) -> IntExpression {
        IntExpression::Sum(self)
    }
}

impl fmt::Display for IntExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntExpression::Constant(v) => write!(f, "{v}"),
            IntExpression::Binary { left, op, right } => {
                let sym = match op {
                    IntBinaryOp::Plus => "+",
                    IntBinaryOp::Minus => "-",
                };
                write!(f, "({left} {sym} {right})")
            }
            IntExpression::Cardinality(expr) => write!(f, "#{expr}"),
            IntExpression::Sum(expr) => write!(f, "int[{expr}]"),
        }
    }
}
