//! Evaluation, static checking and instance enumeration
//!
//! The search engine in [`crate::solver`] drives the [`enumerator`] and the
//! [`evaluator`] together; [`checker`] runs once before any search.

pub mod checker;
pub mod enumerator;
pub mod environment;
pub mod evaluator;
pub mod search;

pub use checker::check_constraint;
pub use enumerator::{ChoicePoint, ImageIter, ScopeAssignments};
pub use environment::Environment;
pub use evaluator::{Culprit, Evaluator, Verdict};
pub use search::Budget;
