//! Formula flattening into independently checkable conjuncts

pub mod flattener;

pub use flattener::FormulaFlattener;

use crate::ast::Formula;

/// Splits a formula into conjuncts whose conjunction is equivalent to it
pub fn conjuncts(formula: &Formula) -> Vec<Formula> {
    FormulaFlattener::new(true).flatten(formula)
}
