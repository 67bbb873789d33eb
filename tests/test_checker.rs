//! Tests for load-time validation of constraints
//!
//! Definition errors must be reported before any search starts.

use relfind::ast::{Decl, Decls, Expression, Formula, IntExpression, Variable};
use relfind::instance::Bounds;
use relfind::model::Model;
use relfind::schema::Multiplicity;
use relfind::solver::{Options, Solver};
use relfind::ModelError;

fn base() -> Model {
    let mut model = Model::new();
    let schema = model.schema_mut();
    schema.register_sig("Processor", None, false).unwrap();
    schema.register_sig("Entry", None, false).unwrap();
    schema
        .register_field("owner", "Entry", "Processor", Multiplicity::One)
        .unwrap();
    schema
        .register_field("idx", "Entry", "Int", Multiplicity::One)
        .unwrap();
    model.add_predicate("any", Formula::TRUE).unwrap();
    model
}

fn find(model: &Model) -> relfind::Result<()> {
    Solver::new(Options::default())
        .find(model, "any", &Bounds::new())
        .map(|_| ())
}

#[test]
fn test_valid_model_passes() {
    let mut model = base();
    let e = Variable::unary("e");
    model
        .add_fact(
            "ownedEntriesIndexed",
            Formula::forall(
                Decls::from(Decl::one_of(e.clone(), Expression::sig("Entry"))),
                Expression::from(&e)
                    .join(Expression::field("idx"))
                    .sum()
                    .lte(IntExpression::constant(3)),
            ),
        )
        .unwrap();
    assert!(model.validate().is_ok());
    assert!(find(&model).is_ok());
}

#[test]
fn test_unknown_relation_names_constraint() {
    let mut model = base();
    model
        .add_fact("usesStatus", Expression::field("status").some())
        .unwrap();
    assert_eq!(
        find(&model).unwrap_err(),
        ModelError::UnknownRelation {
            name: "status".to_string(),
            location: "constraint `usesStatus`".to_string(),
        }
    );
}

#[test]
fn test_unknown_type() {
    let mut model = base();
    model.add_fact("robots", Expression::sig("Robot").no()).unwrap();
    assert!(matches!(
        find(&model),
        Err(ModelError::UnknownType { ref name, .. }) if name == "Robot"
    ));
}

#[test]
fn test_unbound_variable() {
    let mut model = base();
    let e = Variable::unary("e");
    model
        .add_fact("free", Expression::from(&e).join(Expression::field("owner")).some())
        .unwrap();
    assert_eq!(
        find(&model).unwrap_err(),
        ModelError::UnboundVariable {
            variable: "e".to_string(),
            constraint: "free".to_string(),
        }
    );
}

#[test]
fn test_arity_mismatch() {
    let mut model = base();
    model
        .add_fact("badEquals", Expression::field("owner").equals(Expression::sig("Entry")))
        .unwrap();
    assert!(matches!(find(&model), Err(ModelError::TypeMismatch { .. })));
}

#[test]
fn test_join_of_disjoint_types() {
    let mut model = base();
    // Processor has no `owner`
    model
        .add_fact(
            "badJoin",
            Expression::sig("Processor").join(Expression::field("owner")).some(),
        )
        .unwrap();
    assert!(matches!(find(&model), Err(ModelError::TypeMismatch { .. })));
}

#[test]
fn test_sum_of_non_integers() {
    let mut model = base();
    model
        .add_fact(
            "badSum",
            Expression::sig("Processor").sum().eq(IntExpression::constant(0)),
        )
        .unwrap();
    assert!(matches!(find(&model), Err(ModelError::TypeMismatch { .. })));
}

#[test]
fn test_unknown_targets() {
    let model = base();
    let solver = Solver::new(Options::default());
    assert!(matches!(
        solver.find(&model, "missing", &Bounds::new()),
        Err(ModelError::UnknownConstraint { kind: "predicate", .. })
    ));
    assert!(matches!(
        solver.check(&model, "missing", &Bounds::new()),
        Err(ModelError::UnknownConstraint { kind: "assertion", .. })
    ));
}

#[test]
fn test_duplicate_constraint() {
    let mut model = base();
    assert_eq!(
        model.add_assertion("any", Formula::TRUE),
        Err(ModelError::DuplicateConstraint("any".to_string()))
    );
}

#[test]
fn test_bounds_that_admit_no_instance() {
    let model = relfind::models::rar_model().unwrap();
    let solver = Solver::new(Options::default());
    assert!(solver
        .check(&model, "enabledImpliesInterruptible", &Bounds::new())
        .unwrap()
        .is_sat());

    for (sig, bounds) in [
        ("Bool", Bounds::new().bound("Bool", 1)),
        ("ExecState", Bounds::new().bound("ExecState", 2)),
        ("Event", Bounds::new().exactly("Event", 2).bound("RAR", 1)),
    ] {
        assert!(matches!(
            solver.check(&model, "enabledImpliesInterruptible", &bounds),
            Err(ModelError::ScopeExceeded { ref name, .. }) if name == sig
        ));
    }
}
