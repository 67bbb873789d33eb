//! Visitor trait for traversing AST nodes
//!
//! Since the AST is a set of enums, most passes pattern-match directly. The
//! visitor covers the read-only walks that only care about leaves, such as
//! collecting the relations a constraint depends on.

use std::collections::BTreeSet;

use super::formula::Formula;
use super::int_expr::IntExpression;
use super::{Expression, Variable};

/// A read-only traversal over formulas, expressions and integer expressions
///
/// The default methods recurse into every child; override a leaf method to
/// observe it.
pub trait Visitor {
    /// Visit a formula
    fn visit_formula(&mut self, formula: &Formula) {
        match formula {
            Formula::Constant(_) => {}
            Formula::Not(inner) => self.visit_formula(inner),
            Formula::Binary { left, right, .. } => {
                self.visit_formula(left);
                self.visit_formula(right);
            }
            Formula::Nary { formulas, .. } => {
                for f in formulas {
                    self.visit_formula(f);
                }
            }
            Formula::Comparison { left, right, .. } => {
                self.visit_expression(left);
                self.visit_expression(right);
            }
            Formula::Multiplicity { expr, .. } => self.visit_expression(expr),
            Formula::Quantified {
                declarations, body, ..
            } => {
                for decl in declarations.iter() {
                    self.visit_expression(decl.expression());
                }
                self.visit_formula(body);
            }
            Formula::IntComparison { left, right, .. } => {
                self.visit_int_expression(left);
                self.visit_int_expression(right);
            }
        }
    }

    /// Visit an expression
    fn visit_expression(&mut self, expr: &Expression) {
        match expr {
            Expression::Sig(name) => self.visit_sig(name),
            Expression::Field(name) => self.visit_field(name),
            Expression::Variable(v) => self.visit_variable(v),
            Expression::Constant(_) => {}
            Expression::Binary { left, right, .. } => {
                self.visit_expression(left);
                self.visit_expression(right);
            }
            Expression::Unary { expr: inner, .. } => self.visit_expression(inner),
        }
    }

    /// Visit an integer expression
    fn visit_int_expression(&mut self, expr: &IntExpression) {
        match expr {
            IntExpression::Constant(_) => {}
            IntExpression::Binary { left, right, .. } => {
                self.visit_int_expression(left);
                self.visit_int_expression(right);
            }
            IntExpression::Cardinality(e) | IntExpression::Sum(e) => self.visit_expression(e),
        }
    }

    /// Visit a signature leaf
    fn visit_sig(&mut self, _name: &str) {}

    /// Visit a relation leaf
    fn visit_field(&mut self, _name: &str) {}

    /// Visit a variable leaf
    fn visit_variable(&mut self, _variable: &Variable) {}
}

#[derive(Default)]
struct LeafCollector {
    fields: BTreeSet<String>,
}

impl Visitor for LeafCollector {
    fn visit_field(&mut self, name: &str) {
        self.fields.insert(name.to_string());
    }
}

/// Returns the names of every relation the formula reads
pub fn relations_read(formula: &Formula) -> BTreeSet<String> {
    let mut collector = LeafCollector::default();
    collector.visit_formula(formula);
    collector.fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Decl, Decls};

    #[test]
    fn collects_relations_through_quantifiers() {
        let a = Variable::unary("a");
        let formula = Formula::forall(
            Decls::from(Decl::one_of(a.clone(), Expression::sig("ActionVecEntry"))),
            Expression::from(&a)
                .join(Expression::field("idx"))
                .sum()
                .lte(
                    Expression::from(&a)
                        .join(Expression::field("vecOwner"))
                        .join(Expression::field("tableMaxIndex"))
                        .sum(),
                ),
        );

        let fields: Vec<_> = relations_read(&formula).into_iter().collect();
        assert_eq!(fields, vec!["idx", "tableMaxIndex", "vecOwner"]);
    }

    #[test]
    fn constants_read_nothing() {
        assert!(relations_read(&Formula::TRUE).is_empty());
        assert!(relations_read(&Expression::UNIV.some()).is_empty());
    }
}
