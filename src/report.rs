//! Witness and outcome rendering
//!
//! A [`Report`] is built from a finished [`Solution`] without modifying it. It
//! renders as text through `Display` and as JSON through `serde`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::engine::evaluator::Evaluator;
use crate::instance::Instance;
use crate::model::Model;
use crate::solver::{Command, Solution, Statistics};

/// Canonical outcome labels shared by text and JSON output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// FIND found a witness
    Sat,
    /// FIND exhausted the bounded space
    Unsat,
    /// CHECK found an instance violating the assertion
    Counterexample,
    /// CHECK exhausted the bounded space
    Holds,
    /// The budget ran out
    Timeout,
}

impl Verdict {
    /// Returns the label
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Sat => "SAT",
            Verdict::Unsat => "UNSAT",
            Verdict::Counterexample => "COUNTEREXAMPLE",
            Verdict::Holds => "HOLDS",
            Verdict::Timeout => "TIMEOUT",
        }
    }

    /// Process exit code: 0 for SAT or HOLDS, 1 for UNSAT or a
    /// counterexample, 3 for a timeout
    pub fn exit_code(self) -> u8 {
        match self {
            Verdict::Sat | Verdict::Holds => 0,
            Verdict::Unsat | Verdict::Counterexample => 1,
            Verdict::Timeout => 3,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The atoms of one type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeAtoms {
    /// Type name
    pub name: String,
    /// Atoms of the type and its subtypes, in atom order
    pub atoms: Vec<String>,
}

/// The tuples of one relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationTuples {
    /// Relation name
    pub name: String,
    /// Tuples as atom names, in tuple order
    pub tuples: Vec<Vec<String>>,
}

/// A rendered instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Witness {
    /// Per type, in registration order (the builtin `Int` is omitted)
    pub types: Vec<TypeAtoms>,
    /// Per relation, in registration order
    pub relations: Vec<RelationTuples>,
}

impl Witness {
    /// Renders an instance
    pub fn render(instance: &Instance) -> Self {
        let schema = instance.schema();
        let universe = instance.universe();
        let types = schema
            .sig_ids()
            .filter(|&s| !schema.sig(s).is_builtin())
            .map(|s| TypeAtoms {
                name: schema.sig(s).name().to_string(),
                atoms: universe
                    .extent(s)
                    .atoms()
                    .map(|a| universe.name(a).to_string())
                    .collect(),
            })
            .collect();
        let relations = schema
            .field_ids()
            .map(|f| RelationTuples {
                name: schema.field(f).name().to_string(),
                tuples: instance
                    .field(f)
                    .iter()
                    .map(|t| t.atoms().iter().map(|&a| universe.name(a).to_string()).collect())
                    .collect(),
            })
            .collect();
        Self { types, relations }
    }

    /// Returns the atoms of the named type
    pub fn atoms(&self, name: &str) -> Option<&[String]> {
        self.types
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.atoms.as_slice())
    }

    /// Returns the tuples of the named relation
    pub fn tuples(&self, name: &str) -> Option<&[Vec<String>]> {
        self.relations
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.tuples.as_slice())
    }
}

impl fmt::Display for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for t in &self.types {
            writeln!(f, "  {} = {{{}}}", t.name, t.atoms.join(", "))?;
        }
        for r in &self.relations {
            let tuples: Vec<String> = r.tuples.iter().map(|t| t.join("->")).collect();
            writeln!(f, "  {} = {{{}}}", r.name, tuples.join(", "))?;
        }
        Ok(())
    }
}

/// Full result of one command
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// `find` or `check`
    pub command: &'static str,
    /// Predicate or assertion name
    pub target: String,
    /// Outcome
    pub verdict: Verdict,
    /// Effective scope of every type
    pub scope: BTreeMap<String, usize>,
    /// Search statistics
    pub stats: Statistics,
    /// The witness or counterexample, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub witness: Option<Witness>,
    /// For a counterexample, the part of the assertion it violates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violated: Option<String>,
}

impl Report {
    /// Builds the report for a finished command
    pub fn new(model: &Model, command: &Command, solution: &Solution) -> Self {
        let (kind, verdict) = match (command, solution) {
            (Command::Find(_), Solution::Sat { .. }) => ("find", Verdict::Sat),
            (Command::Find(_), Solution::Unsat { .. }) => ("find", Verdict::Unsat),
            (Command::Check(_), Solution::Sat { .. }) => ("check", Verdict::Counterexample),
            (Command::Check(_), Solution::Unsat { .. }) => ("check", Verdict::Holds),
            (Command::Find(_), Solution::Timeout { .. }) => ("find", Verdict::Timeout),
            (Command::Check(_), Solution::Timeout { .. }) => ("check", Verdict::Timeout),
        };

        let violated = match (command, solution.instance()) {
            (Command::Check(name), Some(instance)) => model.assertion(name).ok().and_then(|assertion| {
                Evaluator::new(instance)
                    .check(assertion.formula())
                    .culprit
                    .map(|c| c.to_string())
            }),
            _ => None,
        };

        Self {
            command: kind,
            target: command.target().to_string(),
            verdict,
            scope: solution.statistics().scope().clone(),
            stats: solution.statistics().clone(),
            witness: solution.instance().map(Witness::render),
            violated,
        }
    }

    /// Process exit code for this outcome
    pub fn exit_code(&self) -> u8 {
        self.verdict.exit_code()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope: Vec<String> = self.scope.iter().map(|(k, v)| format!("{k}={v}")).collect();
        let scope = scope.join(", ");
        match self.verdict {
            Verdict::Sat => writeln!(f, "{} {}: SAT within scope {{{scope}}}", self.command, self.target)?,
            Verdict::Unsat => writeln!(
                f,
                "{} {}: UNSAT, no instance exists within scope {{{scope}}}",
                self.command, self.target
            )?,
            Verdict::Counterexample => writeln!(
                f,
                "{} {}: COUNTEREXAMPLE within scope {{{scope}}}",
                self.command, self.target
            )?,
            Verdict::Holds => writeln!(
                f,
                "{} {}: HOLDS for all instances up to scope {{{scope}}}",
                self.command, self.target
            )?,
            Verdict::Timeout => writeln!(
                f,
                "{} {}: TIMEOUT before the search finished, scope {{{scope}}}",
                self.command, self.target
            )?,
        }
        if let Some(violated) = &self.violated {
            writeln!(f, "violated: {violated}")?;
        }
        if let Some(witness) = &self.witness {
            write!(f, "{witness}")?;
        }
        write!(
            f,
            "nodes: {}, constraints checked: {}, pruned: {}, assignments: {}, elapsed: {} ms",
            self.stats.nodes(),
            self.stats.constraints_checked(),
            self.stats.pruned(),
            self.stats.scopes_explored(),
            self.stats.total_time()
        )
    }
}
