//! A model: a schema plus named facts, predicates and assertions
//!
//! Facts are enforced in every search. Predicates are FIND targets and
//! assertions are CHECK targets; neither is enforced otherwise.

use std::fmt;

use crate::ast::Formula;
use crate::engine::checker;
use crate::error::{ModelError, Result};
use crate::schema::Schema;

/// The role a named constraint plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// Always enforced
    Fact,
    /// Target of FIND
    Predicate,
    /// Negated target of CHECK
    Assertion,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConstraintKind::Fact => "fact",
            ConstraintKind::Predicate => "pred",
            ConstraintKind::Assertion => "assert",
        })
    }
}

/// A named closed formula
#[derive(Debug, Clone)]
pub struct Constraint {
    name: String,
    kind: ConstraintKind,
    formula: Formula,
}

impl Constraint {
    /// Returns the constraint name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the constraint kind
    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    /// Returns the formula
    pub fn formula(&self) -> &Formula {
        &self.formula
    }
}

/// Schema and constraints supplied to the solver
#[derive(Debug, Clone, Default)]
pub struct Model {
    schema: Schema,
    constraints: Vec<Constraint>,
}

impl Model {
    /// Creates an empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a model over an existing schema
    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema,
            constraints: Vec::new(),
        }
    }

    /// Returns the schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the schema for registering declarations
    pub fn schema_mut(&mut self) -> &mut Schema {
        &mut self.schema
    }

    /// Adds a fact
    ///
    /// # Errors
    /// `DuplicateConstraint` if the name is already used.
    pub fn add_fact(&mut self, name: &str, formula: Formula) -> Result<()> {
        self.add(name, ConstraintKind::Fact, formula)
    }

    /// Adds a predicate
    ///
    /// # Errors
    /// `DuplicateConstraint` if the name is already used.
    pub fn add_predicate(&mut self, name: &str, formula: Formula) -> Result<()> {
        self.add(name, ConstraintKind::Predicate, formula)
    }

    /// Adds an assertion
    ///
    /// # Errors
    /// `DuplicateConstraint` if the name is already used.
    pub fn add_assertion(&mut self, name: &str, formula: Formula) -> Result<()> {
        self.add(name, ConstraintKind::Assertion, formula)
    }

    fn add(&mut self, name: &str, kind: ConstraintKind, formula: Formula) -> Result<()> {
        if self.constraints.iter().any(|c| c.name == name) {
            return Err(ModelError::DuplicateConstraint(name.to_string()));
        }
        self.constraints.push(Constraint {
            name: name.to_string(),
            kind,
            formula,
        });
        Ok(())
    }

    /// Returns every constraint in registration order
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Returns the facts in registration order
    pub fn facts(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints
            .iter()
            .filter(|c| c.kind == ConstraintKind::Fact)
    }

    /// Returns the named predicate
    ///
    /// # Errors
    /// `UnknownConstraint` if no predicate has this name.
    pub fn predicate(&self, name: &str) -> Result<&Constraint> {
        self.lookup(name, ConstraintKind::Predicate, "predicate")
    }

    /// Returns the named assertion
    ///
    /// # Errors
    /// `UnknownConstraint` if no assertion has this name.
    pub fn assertion(&self, name: &str) -> Result<&Constraint> {
        self.lookup(name, ConstraintKind::Assertion, "assertion")
    }

    fn lookup(&self, name: &str, kind: ConstraintKind, label: &'static str) -> Result<&Constraint> {
        self.constraints
            .iter()
            .find(|c| c.kind == kind && c.name == name)
            .ok_or_else(|| ModelError::UnknownConstraint {
                kind: label,
                name: name.to_string(),
            })
    }

    /// Statically checks every constraint against the schema
    ///
    /// # Errors
    /// The first `UnknownType`, `UnknownRelation`, `UnboundVariable` or
    /// `TypeMismatch` found, in registration order.
    pub fn validate(&self) -> Result<()> {
        for constraint in &self.constraints {
            checker::check_constraint(&self.schema, constraint.name(), constraint.formula())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expression;

    #[test]
    fn constraints_keep_their_kind() {
        let mut model = Model::new();
        model.schema_mut().register_sig("A", None, false).unwrap();
        model.add_fact("f", Expression::sig("A").lone()).unwrap();
        model.add_predicate("p", Expression::sig("A").some()).unwrap();
        model.add_assertion("a", Expression::sig("A").no()).unwrap();

        assert_eq!(model.facts().count(), 1);
        assert_eq!(model.predicate("p").unwrap().kind(), ConstraintKind::Predicate);
        assert_eq!(model.assertion("a").unwrap().kind(), ConstraintKind::Assertion);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn lookups_respect_kind() {
        let mut model = Model::new();
        model.add_predicate("p", Formula::TRUE).unwrap();

        assert!(matches!(
            model.assertion("p"),
            Err(ModelError::UnknownConstraint { kind: "assertion", .. })
        ));
        assert_eq!(
            model.add_fact("p", Formula::TRUE).unwrap_err(),
            ModelError::DuplicateConstraint("p".into())
        );
    }
}
