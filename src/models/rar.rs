//! Remote Action Request (RAR)
//!
//! Processors signal each other through RAR events. A target processor must
//! have the feature enumerated and enabled, its payload table and action
//! vector allocated, its control MSR programmed, and must be interruptible
//! and in a state that services interrupts. Work is described by payload
//! table entries; the action vector records the status of each slot.
//!
//! Register contents are flattened into one relation per bit or field, and
//! enumerations are abstract types whose values are `one` subtypes.

use crate::ast::{Decl, Decls, Expression, Formula, IntExpression, Variable};
use crate::error::Result;
use crate::model::Model;
use crate::schema::{Multiplicity, Schema};

/// Execution states, with `NORMAL` first so searches try it first
pub const EXEC_STATES: &[&str] = &["NORMAL", "C6_SLEEP", "INIT", "SMM"];

/// Action vector entry states
pub const ACTION_STATUSES: &[&str] = &["PENDING", "SUCCESS", "FAILURE"];

/// Kinds of work a payload table entry can request
pub const PAYLOAD_TYPES: &[&str] = &[
    "PAGE_INVALIDATION",
    "PCID_INVALIDATION",
    "EPT_INVALIDATION",
    "VPID_INVALIDATION",
    "MSR_WRITE",
];

/// Builds the RAR model
pub fn rar_model() -> Result<Model> {
    let mut model = Model::with_schema(rar_schema()?);
    add_facts(&mut model)?;
    add_predicates(&mut model)?;
    add_assertions(&mut model)?;
    Ok(model)
}

fn enumeration(schema: &mut Schema, name: &str, values: &[&str]) -> Result<()> {
    schema.register_sig(name, None, true)?;
    for value in values {
        schema.register_one_sig(value, Some(name))?;
    }
    Ok(())
}

fn rar_schema() -> Result<Schema> {
    let mut s = Schema::new();
    enumeration(&mut s, "Bool", &["True", "False"])?;
    enumeration(&mut s, "ExecState", EXEC_STATES)?;
    enumeration(&mut s, "ActionStatus", ACTION_STATUSES)?;
    enumeration(&mut s, "PayloadType", PAYLOAD_TYPES)?;

    s.register_sig("Processor", None, false)?;
    s.register_sig("PayloadTableEntry", None, false)?;
    s.register_sig("ActionVecEntry", None, false)?;
    s.register_sig("Event", None, true)?;
    s.register_sig("RAR", Some("Event"), false)?;

    // CPUID enumeration
    s.register_field("rarBit", "Processor", "Bool", Multiplicity::One)?;
    // control MSR
    s.register_field("enable", "Processor", "Bool", Multiplicity::One)?;
    s.register_field("allocatedTable", "Processor", "Bool", Multiplicity::One)?;
    s.register_field("allocatedVector", "Processor", "Bool", Multiplicity::One)?;
    s.register_field("msrsProgrammed", "Processor", "Bool", Multiplicity::One)?;
    // info MSR
    s.register_field("tableMaxIndex", "Processor", "Int", Multiplicity::One)?;
    s.register_field("execState", "Processor", "ExecState", Multiplicity::One)?;
    s.register_field("IF", "Processor", "Bool", Multiplicity::One)?;
    s.register_field(
        "supportedTypes",
        "Processor",
        "PayloadType",
        Multiplicity::SubsetOf("PayloadType".to_string()),
    )?;

    s.register_field("owner", "PayloadTableEntry", "Processor", Multiplicity::One)?;
    s.register_field("idxInTable", "PayloadTableEntry", "Int", Multiplicity::One)?;
    s.register_field("payloadType", "PayloadTableEntry", "PayloadType", Multiplicity::One)?;

    s.register_field("vecOwner", "ActionVecEntry", "Processor", Multiplicity::One)?;
    s.register_field("idx", "ActionVecEntry", "Int", Multiplicity::One)?;
    s.register_field("status", "ActionVecEntry", "ActionStatus", Multiplicity::One)?;

    s.register_field("target", "Event", "Processor", Multiplicity::One)?;
    s.register_field("slot", "RAR", "Int", Multiplicity::One)?;
    Ok(s)
}

fn sig(name: &str) -> Expression {
    Expression::sig(name)
}

fn nav(var: &Variable, fields: &[&str]) -> Expression {
    fields
        .iter()
        .fold(Expression::from(var), |e, f| e.join(Expression::field(*f)))
}

fn is(var: &Variable, fields: &[&str], value: &str) -> Formula {
    nav(var, fields).equals(sig(value))
}

fn all(var: &Variable, domain: &str, body: Formula) -> Formula {
    Formula::forall(Decls::from(Decl::one_of(var.clone(), sig(domain))), body)
}

fn some(var: &Variable, domain: &str, body: Formula) -> Formula {
    Formula::exists(Decls::from(Decl::one_of(var.clone(), sig(domain))), body)
}

/// `int[e.idxInTable] <= int[e.owner.tableMaxIndex]`, for either entry kind
fn fits_table(var: &Variable, owner: &str, index: &str) -> Formula {
    nav(var, &[index])
        .sum()
        .lte(nav(var, &[owner, "tableMaxIndex"]).sum())
}

/// `all e1, e2 | e1 != e2 && e1.owner = e2.owner => int[e1.index] != int[e2.index]`
fn unique_slots(domain: &str, owner: &str, index: &str) -> Formula {
    let e1 = Variable::unary("e1");
    let e2 = Variable::unary("e2");
    let decls = Decls::from(Decl::one_of(e1.clone(), sig(domain))).and(Decl::one_of(e2.clone(), sig(domain)));
    let same_owner = Expression::from(&e1)
        .ne(Expression::from(&e2))
        .and(nav(&e1, &[owner]).equals(nav(&e2, &[owner])));
    Formula::forall(
        decls,
        same_owner.implies(nav(&e1, &[index]).sum().neq(nav(&e2, &[index]).sum())),
    )
}

fn add_facts(model: &mut Model) -> Result<()> {
    let p = Variable::unary("p");
    let e = Variable::unary("e");
    let a = Variable::unary("a");
    let r = Variable::unary("r");

    model.add_fact(
        "enableRequiresRarBit",
        all(&p, "Processor", is(&p, &["enable"], "True").implies(is(&p, &["rarBit"], "True"))),
    )?;
    model.add_fact(
        "enableRequiresSetup",
        all(
            &p,
            "Processor",
            is(&p, &["enable"], "True").implies(Formula::and_all(vec![
                is(&p, &["allocatedTable"], "True"),
                is(&p, &["allocatedVector"], "True"),
                is(&p, &["msrsProgrammed"], "True"),
            ])),
        ),
    )?;
    model.add_fact(
        "payloadEntriesFitTable",
        all(
            &e,
            "PayloadTableEntry",
            fits_table(&e, "owner", "idxInTable").and(is(&e, &["owner", "allocatedTable"], "True")),
        ),
    )?;
    model.add_fact(
        "actionEntriesFitTable",
        all(
            &a,
            "ActionVecEntry",
            fits_table(&a, "vecOwner", "idx").and(is(&a, &["vecOwner", "allocatedVector"], "True")),
        ),
    )?;
    model.add_fact("uniquePayloadSlots", unique_slots("PayloadTableEntry", "owner", "idxInTable"))?;
    model.add_fact("uniqueActionSlots", unique_slots("ActionVecEntry", "vecOwner", "idx"))?;

    // a pending action names a payload in the same slot of the same processor
    let payload_at_slot = some(
        &e,
        "PayloadTableEntry",
        nav(&e, &["owner"])
            .equals(nav(&a, &["vecOwner"]))
            .and(nav(&e, &["idxInTable"]).sum().eq(nav(&a, &["idx"]).sum())),
    );
    model.add_fact(
        "pendingNeedsPayload",
        all(&a, "ActionVecEntry", is(&a, &["status"], "PENDING").implies(payload_at_slot)),
    )?;

    model.add_fact(
        "rarTargetsServiceable",
        all(
            &r,
            "RAR",
            Formula::and_all(vec![
                is(&r, &["target", "enable"], "True"),
                is(&r, &["target", "IF"], "True"),
                nav(&r, &["target", "execState"]).ne(sig("C6_SLEEP")),
                nav(&r, &["target", "execState"]).ne(sig("SMM")),
                nav(&r, &["target", "execState"]).ne(sig("INIT")),
            ]),
        ),
    )?;
    model.add_fact(
        "initClearsPending",
        all(
            &a,
            "ActionVecEntry",
            is(&a, &["vecOwner", "execState"], "INIT").implies(nav(&a, &["status"]).ne(sig("PENDING"))),
        ),
    )?;

    let pending_at_slot = some(
        &a,
        "ActionVecEntry",
        Formula::and_all(vec![
            nav(&a, &["vecOwner"]).equals(nav(&r, &["target"])),
            nav(&a, &["idx"]).sum().eq(nav(&r, &["slot"]).sum()),
            is(&a, &["status"], "PENDING"),
        ]),
    );
    model.add_fact("rarHasPendingAction", all(&r, "RAR", pending_at_slot))?;

    // enclave addresses are not modeled
    model.add_fact("enclaveAddressesExcluded", Formula::TRUE)?;
    Ok(())
}

fn add_predicates(model: &mut Model) -> Result<()> {
    let p = Variable::unary("p");
    let e = Variable::unary("e");
    let a = Variable::unary("a");
    let r = Variable::unary("r");

    model.add_predicate(
        "enabledWithoutRarBit",
        some(
            &p,
            "Processor",
            is(&p, &["rarBit"], "False").and(is(&p, &["enable"], "True")),
        ),
    )?;
    model.add_predicate(
        "rarToSleepingProcessor",
        some(&r, "RAR", is(&r, &["target", "execState"], "C6_SLEEP")),
    )?;
    model.add_predicate(
        "payloadBeyondTable",
        some(
            &e,
            "PayloadTableEntry",
            nav(&e, &["owner", "tableMaxIndex"])
                .sum()
                .eq(IntExpression::constant(0))
                .and(nav(&e, &["idxInTable"]).sum().eq(IntExpression::constant(1))),
        ),
    )?;

    let pending_action = some(
        &a,
        "ActionVecEntry",
        Formula::and_all(vec![
            nav(&a, &["vecOwner"]).equals(Expression::from(&p)),
            is(&a, &["status"], "PENDING"),
            nav(&a, &["idx"]).sum().eq(IntExpression::constant(0)),
        ]),
    );
    let payload_entry = some(
        &e,
        "PayloadTableEntry",
        nav(&e, &["owner"])
            .equals(Expression::from(&p))
            .and(nav(&e, &["idxInTable"]).sum().eq(IntExpression::constant(0))),
    );
    model.add_predicate(
        "readyWithPendingAction",
        some(
            &p,
            "Processor",
            Formula::and_all(vec![
                is(&p, &["enable"], "True"),
                is(&p, &["allocatedTable"], "True"),
                is(&p, &["allocatedVector"], "True"),
                is(&p, &["msrsProgrammed"], "True"),
                is(&p, &["execState"], "NORMAL"),
                is(&p, &["IF"], "True"),
                pending_action,
                payload_entry,
            ]),
        ),
    )?;
    model.add_predicate("rarInFlight", sig("RAR").some())?;
    Ok(())
}

fn add_assertions(model: &mut Model) -> Result<()> {
    let p = Variable::unary("p");
    let a = Variable::unary("a");
    let r = Variable::unary("r");

    model.add_assertion(
        "noRarTargetsInit",
        all(&r, "RAR", nav(&r, &["target", "execState"]).ne(sig("INIT"))),
    )?;
    model.add_assertion(
        "pendingEntriesFitTable",
        all(
            &a,
            "ActionVecEntry",
            is(&a, &["status"], "PENDING").implies(fits_table(&a, "vecOwner", "idx")),
        ),
    )?;
    model.add_assertion(
        "enabledImpliesInterruptible",
        all(&p, "Processor", is(&p, &["enable"], "True").implies(is(&p, &["IF"], "True"))),
    )?;
    Ok(())
}
