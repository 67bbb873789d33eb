//! Static validation of constraints against a schema
//!
//! Every expression is given a column type: for each column, the set of
//! signatures whose atoms may appear there. Joins whose inner columns share no
//! signature, arity errors and free variables are reported before search.

use std::collections::BTreeSet;

use crate::ast::{BinaryOp, ConstantExpr, Expression, Formula, IntExpression, UnaryOp, Variable};
use crate::error::{ModelError, Result};
use crate::schema::{Schema, SigId};

/// Column-wise type of an expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    columns: Vec<BTreeSet<SigId>>,
}

impl ColumnType {
    fn unary(sigs: BTreeSet<SigId>) -> Self {
        Self {
            columns: vec![sigs],
        }
    }

    /// Returns the arity
    pub fn arity(&self) -> usize {
        self.columns.len()
    }

    /// Returns the signatures that may appear in column `i`
    pub fn column(&self, i: usize) -> &BTreeSet<SigId> {
        &self.columns[i]
    }
}

/// Checks one named constraint
///
/// # Errors
/// `UnknownType`, `UnknownRelation`, `UnboundVariable` or `TypeMismatch`,
/// each naming `constraint`.
pub fn check_constraint(schema: &Schema, constraint: &str, formula: &Formula) -> Result<()> {
    let mut checker = Checker {
        schema,
        constraint,
        env: Vec::new(),
    };
    checker.formula(formula)
}

/// Computes the column type of a closed expression
///
/// # Errors
/// As [`check_constraint`].
pub fn type_of(schema: &Schema, expr: &Expression) -> Result<ColumnType> {
    let mut checker = Checker {
        schema,
        constraint: "<expression>",
        env: Vec::new(),
    };
    checker.expression(expr)
}

struct Checker<'a> {
    schema: &'a Schema,
    constraint: &'a str,
    env: Vec<(Variable, ColumnType)>,
}

impl Checker<'_> {
    fn mismatch(&self, detail: String) -> ModelError {
        ModelError::TypeMismatch {
            location: format!("constraint `{}`", self.constraint),
            detail,
        }
    }

    fn closure(&self, sig: SigId) -> BTreeSet<SigId> {
        self.schema.type_closure(sig).into_iter().collect()
    }

    fn all_sigs(&self) -> BTreeSet<SigId> {
        self.schema.sig_ids().collect()
    }

    fn formula(&mut self, formula: &Formula) -> Result<()> {
        match formula {
            Formula::Constant(_) => Ok(()),
            Formula::Not(inner) => self.formula(inner),
            Formula::Binary { left, right, .. } => {
                self.formula(left)?;
                self.formula(right)
            }
            Formula::Nary { formulas, .. } => {
                for f in formulas {
                    self.formula(f)?;
                }
                Ok(())
            }
            Formula::Comparison { left, right, .. } => {
                let lt = self.expression(left)?;
                let rt = self.expression(right)?;
                if lt.arity() != rt.arity() {
                    return Err(self.mismatch(format!(
                        "cannot compare `{left}` (arity {}) with `{right}` (arity {})",
                        lt.arity(),
                        rt.arity()
                    )));
                }
                Ok(())
            }
            Formula::Multiplicity { expr, .. } => self.expression(expr).map(|_| ()),
            Formula::Quantified {
                declarations, body, ..
            } => {
                let depth = self.env.len();
                for decl in declarations.iter() {
                    let ty = self.expression(decl.expression())?;
                    if ty.arity() != 1 {
                        return Err(self.mismatch(format!(
                            "`{}` must range over a unary expression, `{}` has arity {}",
                            decl.variable(),
                            decl.expression(),
                            ty.arity()
                        )));
                    }
                    self.env.push((decl.variable().clone(), ty));
                }
                let result = self.formula(body);
                self.env.truncate(depth);
                result
            }
            Formula::IntComparison { left, right, .. } => {
                self.int_expression(left)?;
                self.int_expression(right)
            }
        }
    }

    fn int_expression(&mut self, expr: &IntExpression) -> Result<()> {
        match expr {
            IntExpression::Constant(_) => Ok(()),
            IntExpression::Binary { left, right, .. } => {
                self.int_expression(left)?;
                self.int_expression(right)
            }
            IntExpression::Cardinality(e) => self.expression(e).map(|_| ()),
            IntExpression::Sum(e) => {
                let ty = self.expression(e)?;
                let int = self.schema.int_sig();
                if ty.arity() != 1 || (!ty.column(0).is_empty() && !ty.column(0).contains(&int)) {
                    return Err(self.mismatch(format!("int[{e}] requires a unary Int expression")));
                }
                Ok(())
            }
        }
    }

    fn expression(&mut self, expr: &Expression) -> Result<ColumnType> {
        match expr {
            Expression::Sig(name) => {
                let sig = self.schema.sig_id(name).ok_or_else(|| ModelError::UnknownType {
                    name: name.clone(),
                    location: format!("constraint `{}`", self.constraint),
                })?;
                Ok(ColumnType::unary(self.closure(sig)))
            }
            Expression::Field(name) => {
                let field = self.schema.field_id(name).ok_or_else(|| ModelError::UnknownRelation {
                    name: name.clone(),
                    location: format!("constraint `{}`", self.constraint),
                })?;
                let decl = self.schema.field(field);
                Ok(ColumnType {
                    columns: vec![self.closure(decl.source()), self.closure(decl.range())],
                })
            }
            Expression::Variable(v) => self
                .env
                .iter()
                .rev()
                .find(|(bound, _)| bound == v)
                .map(|(_, ty)| ty.clone())
                .ok_or_else(|| ModelError::UnboundVariable {
                    variable: v.name().to_string(),
                    constraint: self.constraint.to_string(),
                }),
            Expression::Constant(c) => Ok(match c {
                ConstantExpr::Univ => ColumnType::unary(self.all_sigs()),
                ConstantExpr::None => ColumnType::unary(BTreeSet::new()),
                ConstantExpr::Iden => ColumnType {
                    columns: vec![self.all_sigs(), self.all_sigs()],
                },
            }),
            Expression::Binary { left, op, right } => {
                let lt = self.expression(left)?;
                let rt = self.expression(right)?;
                self.binary(expr, *op, lt, rt)
            }
            Expression::Unary { op, expr: inner } => {
                let ty = self.expression(inner)?;
                if ty.arity() != 2 {
                    return Err(self.mismatch(format!("`{expr}` requires a binary relation")));
                }
                Ok(match op {
                    UnaryOp::Transpose => ColumnType {
                        columns: vec![ty.columns[1].clone(), ty.columns[0].clone()],
                    },
                    UnaryOp::Closure => {
                        let both: BTreeSet<SigId> = ty.columns[0].union(&ty.columns[1]).copied().collect();
                        ColumnType {
                            columns: vec![both.clone(), both],
                        }
                    }
                })
            }
        }
    }

    fn binary(&self, expr: &Expression, op: BinaryOp, lt: ColumnType, rt: ColumnType) -> Result<ColumnType> {
        match op {
            BinaryOp::Join => {
                if lt.arity() + rt.arity() < 3 {
                    return Err(self.mismatch(format!("`{expr}` joins two unary expressions")));
                }
                let inner_l = &lt.columns[lt.arity() - 1];
                let inner_r = &rt.columns[0];
                if !inner_l.is_empty() && !inner_r.is_empty() && inner_l.is_disjoint(inner_r) {
                    return Err(self.mismatch(format!("`{expr}` joins disjoint types")));
                }
                let mut columns = lt.columns[..lt.arity() - 1].to_vec();
                columns.extend_from_slice(&rt.columns[1..]);
                Ok(ColumnType { columns })
            }
            BinaryOp::Product => {
                let mut columns = lt.columns;
                columns.extend(rt.columns);
                Ok(ColumnType { columns })
            }
            BinaryOp::Union | BinaryOp::Intersection | BinaryOp::Difference => {
                if lt.arity() != rt.arity() {
                    return Err(self.mismatch(format!(
                        "`{expr}` combines arities {} and {}",
                        lt.arity(),
                        rt.arity()
                    )));
                }
                let columns = match op {
                    BinaryOp::Union => lt
                        .columns
                        .iter()
                        .zip(&rt.columns)
                        .map(|(a, b)| a.union(b).copied().collect())
                        .collect(),
                    BinaryOp::Intersection => lt
                        .columns
                        .iter()
                        .zip(&rt.columns)
                        .map(|(a, b)| a.intersection(b).copied().collect())
                        .collect(),
                    _ => lt.columns,
                };
                Ok(ColumnType { columns })
            }
        }
    }
}
