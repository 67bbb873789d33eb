//! # relfind
//!
//! A bounded relational model finder.
//!
//! A model is a schema of typed signatures and binary relations plus named
//! constraints written in first-order relational logic. Given per-type scopes,
//! the solver searches every instance within the bound by depth-first
//! backtracking, evaluating each constraint as soon as the relations it reads
//! are fully assigned, and reports either a witness instance or exhaustion.
//!
//! ## Example
//!
//! ```rust
//! use relfind::ast::{Decl, Decls, Expression, Formula, Variable};
//! use relfind::instance::Bounds;
//! use relfind::model::Model;
//! use relfind::schema::Multiplicity;
//! use relfind::solver::{Options, Solver};
//!
//! let mut model = Model::new();
//! model.schema_mut().register_sig("Person", None, false).unwrap();
//! model.schema_mut().register_field("knows", "Person", "Person", Multiplicity::Set).unwrap();
//!
//! // some p: Person | p in p.knows
//! let p = Variable::unary("p");
//! let body = Expression::from(&p).in_set(Expression::from(&p).join(Expression::field("knows")));
//! let pred = Formula::exists(Decls::from(Decl::one_of(p, Expression::sig("Person"))), body);
//! model.add_predicate("selfAware", pred).unwrap();
//!
//! let solver = Solver::new(Options::default());
//! let solution = solver.find(&model, "selfAware", &Bounds::new().bound("Person", 2)).unwrap();
//! assert!(solution.is_sat());
//! ```

#![warn(missing_docs)]
#![warn(rust_2024_compatibility)]

/// Abstract syntax tree types (Expression, Formula, IntExpression, Decl)
pub mod ast;

/// Signature and relation declarations
pub mod schema;

/// Schema plus named facts, predicates and assertions
pub mod model;

/// Atoms, tuples, bounds and instances
pub mod instance;

/// Evaluation, static checking and instance enumeration
pub mod engine;

/// Formula flattening into independently checkable conjuncts
pub mod simplify;

/// Main solver API (FIND / CHECK)
pub mod solver;

/// Witness and outcome rendering
pub mod report;

/// Bundled models
pub mod models;

/// Error types
pub mod error {
    //! Error types for relfind
    //!
    //! Every variant is a definition error: it is raised while registering
    //! declarations or while validating a model before search, never during it.

    use thiserror::Error;

    /// Errors raised while loading a model or resolving its bounds
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum ModelError {
        /// A signature with this name is already registered
        #[error("duplicate type `{0}`")]
        DuplicateType(String),

        /// The declared parent signature has not been registered
        #[error("type `{sig}` extends unknown parent `{parent}`")]
        UnknownParent {
            /// The signature being declared
            sig: String,
            /// The missing parent
            parent: String,
        },

        /// A declaration or formula names a type that is not registered
        #[error("unknown type `{name}` in {location}")]
        UnknownType {
            /// The unresolved type name
            name: String,
            /// Declaration or constraint that referenced it
            location: String,
        },

        /// A relation with this name is already registered
        #[error("duplicate relation `{0}`")]
        DuplicateRelation(String),

        /// A formula names a relation that is not registered
        #[error("unknown relation `{name}` in {location}")]
        UnknownRelation {
            /// The unresolved relation name
            name: String,
            /// Constraint that referenced it
            location: String,
        },

        /// A constraint with this name is already registered
        #[error("duplicate constraint `{0}`")]
        DuplicateConstraint(String),

        /// No predicate or assertion with this name exists
        #[error("unknown {kind} `{name}`")]
        UnknownConstraint {
            /// "predicate" or "assertion"
            kind: &'static str,
            /// The requested name
            name: String,
        },

        /// A formula references a variable not bound by an enclosing quantifier
        #[error("unbound variable `{variable}` in constraint `{constraint}`")]
        UnboundVariable {
            /// The free variable
            variable: String,
            /// Constraint containing it
            constraint: String,
        },

        /// An expression combines incompatible types or arities
        #[error("type mismatch in {location}: {detail}")]
        TypeMismatch {
            /// Declaration or constraint containing the mismatch
            location: String,
            /// What was incompatible
            detail: String,
        },

        /// A bound is negative or too large to search
        #[error("scope exceeded for `{name}`: {detail}")]
        ScopeExceeded {
            /// The type or relation whose scope is invalid
            name: String,
            /// Why the scope was rejected
            detail: String,
        },
    }

    /// Result type for relfind operations
    pub type Result<T> = std::result::Result<T, ModelError>;
}

// Re-export commonly used types
pub use error::{ModelError, Result};
