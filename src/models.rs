//! Models shipped with the crate
//!
//! Each model is plain data: a schema and constraints built through the
//! public API, with nothing special-cased in the engine.

pub mod rar;

pub use rar::rar_model;

use crate::error::Result;
use crate::model::Model;

/// Names of the bundled models
pub const MODELS: &[&str] = &["rar"];

/// Builds a bundled model by name, or `None` if there is no such model
pub fn by_name(name: &str) -> Option<Result<Model>> {
    match name {
        "rar" => Some(rar_model()),
        _ => None,
    }
}
