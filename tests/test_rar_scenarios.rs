//! End-to-end scenarios against the bundled RAR model

use relfind::engine::Evaluator;
use relfind::instance::Bounds;
use relfind::model::Model;
use relfind::models::rar_model;
use relfind::report::{Report, Verdict, Witness};
use relfind::solver::{Command, Options, Solution, Solver};

fn solve(command: Command, bounds: Bounds) -> (Model, Solution) {
    let model = rar_model().unwrap();
    let solution = Solver::new(Options::default())
        .solve(&model, &command, &bounds)
        .unwrap();
    (model, solution)
}

fn has(witness: &Witness, relation: &str, from: &str, to: &str) -> bool {
    witness
        .tuples(relation)
        .unwrap()
        .iter()
        .any(|t| t == &vec![from.to_string(), to.to_string()])
}

#[test]
fn test_enable_requires_rar_bit() {
    let (_, solution) = solve(
        Command::Find("enabledWithoutRarBit".into()),
        Bounds::new().bound("Processor", 1),
    );
    assert!(solution.is_unsat());
    assert!(solution.statistics().pruned() > 0);
}

#[test]
fn test_sleeping_processor_cannot_be_targeted() {
    let (_, solution) = solve(
        Command::Find("rarToSleepingProcessor".into()),
        Bounds::new().bound("Processor", 1).bound("RAR", 1),
    );
    assert!(solution.is_unsat());
}

#[test]
fn test_payload_entry_beyond_table() {
    let (_, solution) = solve(
        Command::Find("payloadBeyondTable".into()),
        Bounds::new().bound("Processor", 1).bound("PayloadTableEntry", 1),
    );
    assert!(solution.is_unsat());
}

#[test]
fn test_ready_processor_with_pending_action() {
    let (model, solution) = solve(
        Command::Find("readyWithPendingAction".into()),
        Bounds::new()
            .bound("Processor", 1)
            .bound("RAR", 0)
            .bound("PayloadTableEntry", 1),
    );
    assert!(solution.is_sat());

    let report = Report::new(&model, &Command::Find("readyWithPendingAction".into()), &solution);
    assert_eq!(report.verdict, Verdict::Sat);
    let witness = report.witness.unwrap();
    assert_eq!(witness.atoms("Processor").unwrap(), ["Processor$0"]);
    for flag in ["enable", "allocatedTable", "allocatedVector", "msrsProgrammed", "IF", "rarBit"] {
        assert!(has(&witness, flag, "Processor$0", "True"), "{flag}");
    }
    assert!(has(&witness, "execState", "Processor$0", "NORMAL"));
    assert!(has(&witness, "vecOwner", "ActionVecEntry$0", "Processor$0"));
    assert!(has(&witness, "status", "ActionVecEntry$0", "PENDING"));
    assert!(has(&witness, "idx", "ActionVecEntry$0", "0"));
    assert!(has(&witness, "owner", "PayloadTableEntry$0", "Processor$0"));
    assert!(has(&witness, "idxInTable", "PayloadTableEntry$0", "0"));
    assert!(witness.atoms("RAR").unwrap().is_empty());
}

#[test]
fn test_no_rar_targets_init_holds() {
    let command = Command::Check("noRarTargetsInit".into());
    let (model, solution) = solve(command.clone(), Bounds::new().bound("Processor", 2).bound("RAR", 2));
    assert!(solution.is_unsat());

    let report = Report::new(&model, &command, &solution);
    assert_eq!(report.verdict, Verdict::Holds);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.scope["Processor"], 2);
    assert_eq!(report.scope["RAR"], 2);
    assert!(report.to_string().contains("HOLDS for all instances up to scope"));
}

#[test]
fn test_pending_entries_fit_table_holds() {
    let (_, solution) = solve(Command::Check("pendingEntriesFitTable".into()), Bounds::new());
    assert!(solution.is_unsat());
}

#[test]
fn test_enabled_processor_may_be_uninterruptible() {
    let command = Command::Check("enabledImpliesInterruptible".into());
    let (model, solution) = solve(command.clone(), Bounds::new());
    assert!(solution.is_sat());

    let instance = solution.instance().unwrap();
    let evaluator = Evaluator::new(instance);
    for fact in model.facts() {
        assert!(evaluator.evaluate(fact.formula()), "fact {} violated", fact.name());
    }
    assert!(!evaluator.evaluate(model.assertion("enabledImpliesInterruptible").unwrap().formula()));

    let report = Report::new(&model, &command, &solution);
    assert_eq!(report.verdict, Verdict::Counterexample);
    assert_eq!(report.exit_code(), 1);
    let witness = report.witness.as_ref().unwrap();
    assert!(has(witness, "enable", "Processor$0", "True"));
    assert!(has(witness, "IF", "Processor$0", "False"));

    let violated = report.violated.as_deref().unwrap();
    assert!(violated.contains("IF"), "{violated}");
    assert!(violated.ends_with("where p = Processor$0"), "{violated}");
}

#[test]
fn test_rar_in_flight() {
    let (model, solution) = solve(Command::Find("rarInFlight".into()), Bounds::new());
    assert!(solution.is_sat());

    let instance = solution.instance().unwrap();
    let evaluator = Evaluator::new(instance);
    for fact in model.facts() {
        assert!(evaluator.evaluate(fact.formula()), "fact {} violated", fact.name());
    }

    let witness = Witness::render(instance);
    assert_eq!(witness.atoms("RAR").unwrap(), ["RAR$0"]);
    assert_eq!(witness.atoms("Event").unwrap(), ["RAR$0"]);
    assert!(has(&witness, "target", "RAR$0", "Processor$0"));
    assert!(has(&witness, "status", "ActionVecEntry$0", "PENDING"));
}

#[test]
fn test_timeout_is_not_unsat() {
    let model = rar_model().unwrap();
    let mut options = Options::default();
    options.budget.max_nodes = Some(5);
    let solution = Solver::new(options)
        .check(&model, "noRarTargetsInit", &Bounds::new().bound("Processor", 2).bound("RAR", 2))
        .unwrap();
    assert!(solution.is_timeout());
    assert!(!solution.is_unsat());
    let report = Report::new(&model, &Command::Check("noRarTargetsInit".into()), &solution);
    assert_eq!(report.verdict, Verdict::Timeout);
    assert_eq!(report.exit_code(), 3);
}
