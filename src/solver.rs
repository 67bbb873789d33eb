//! Main solver API
//!
//! The solver resolves bounds, validates the model, and searches for an
//! instance satisfying every fact together with a goal: the predicate for
//! FIND, the negated assertion for CHECK.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::engine::enumerator::ScopeAssignments;
use crate::engine::search::{run_worker, Counters, Outcome, Plan, Shared, WorkerResult};
use crate::instance::{Bounds, Instance};
use crate::model::Model;
use crate::schema::Schema;
use crate::Result;

pub use crate::engine::search::Budget;

/// Solver options
#[derive(Debug, Clone)]
pub struct Options {
    /// Node and time limits
    pub budget: Budget,
    /// Worker threads; 1 searches deterministically on the calling thread
    pub threads: usize,
    /// Evaluate each conjunct as soon as the relations it reads are assigned.
    /// When false every conjunct waits for a complete instance.
    pub early_pruning: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            budget: Budget::default(),
            threads: 1,
            early_pruning: true,
        }
    }
}

/// What to search for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// An instance satisfying the facts and the named predicate
    Find(String),
    /// An instance satisfying the facts and violating the named assertion
    Check(String),
}

impl Command {
    /// Returns the predicate or assertion name
    pub fn target(&self) -> &str {
        match self {
            Command::Find(name) | Command::Check(name) => name,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Find(name) => write!(f, "find {name}"),
            Command::Check(name) => write!(f, "check {name}"),
        }
    }
}

/// Bounded model finder
pub struct Solver {
    options: Options,
}

impl Solver {
    /// Creates a new solver with the given options
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// Returns the options
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Finds an instance satisfying every fact and the named predicate
    ///
    /// # Errors
    /// Any definition error in the model or bounds; no search is attempted.
    pub fn find(&self, model: &Model, predicate: &str, bounds: &Bounds) -> Result<Solution> {
        self.solve(model, &Command::Find(predicate.to_string()), bounds)
    }

    /// Searches for a counterexample to the named assertion
    ///
    /// A `Sat` solution holds the counterexample; `Unsat` means the assertion
    /// holds for every instance within the bounds.
    ///
    /// # Errors
    /// Any definition error in the model or bounds; no search is attempted.
    pub fn check(&self, model: &Model, assertion: &str, bounds: &Bounds) -> Result<Solution> {
        self.solve(model, &Command::Check(assertion.to_string()), bounds)
    }

    /// Runs a command
    ///
    /// # Errors
    /// `UnknownConstraint` for a missing target, any bounds resolution error,
    /// or the first static error found by validating the model.
    pub fn solve(&self, model: &Model, command: &Command, bounds: &Bounds) -> Result<Solution> {
        let goal = match command {
            Command::Find(name) => model.predicate(name)?.formula().clone(),
            Command::Check(name) => model.assertion(name)?.formula().clone().not(),
        };
        let scope = bounds.resolve(model.schema())?;
        model.validate()?;

        let schema = Arc::new(model.schema().clone());
        let plan = Plan::new(
            &schema,
            model.facts().map(|c| (c.name(), c.formula())),
            command.target(),
            &goal,
            self.options.early_pruning,
        );
        let summary = scope.summary(&schema);
        info!(
            %command,
            scope = ?summary,
            conjuncts = plan.conjuncts().len(),
            threads = self.options.threads,
            "search started"
        );

        let shared = Shared::new(self.options.budget);
        let assignments = ScopeAssignments::new(&schema, &scope);
        let (outcome, instance, counters) = if self.options.threads <= 1 {
            let result = run_worker(&schema, &plan, &shared, assignments);
            (result.outcome, result.instance, result.counters)
        } else {
            self.run_parallel(&schema, &plan, &shared, assignments.collect())
        };

        let stats = Statistics {
            nodes: shared.nodes.load(Ordering::Relaxed),
            constraints_checked: counters.constraints_checked,
            pruned: counters.pruned,
            scopes_explored: counters.scopes_explored,
            conjuncts: plan.conjuncts().len(),
            elapsed: shared.elapsed(),
            scope: summary,
        };
        let solution = match (outcome, instance) {
            (Outcome::Found, Some(instance)) => {
                instance.assert_well_formed();
                Solution::Sat { instance, stats }
            }
            (Outcome::OutOfBudget, _) => Solution::Timeout { stats },
            _ => Solution::Unsat { stats },
        };
        info!(
            %command,
            outcome = solution.label(),
            nodes = solution.statistics().nodes(),
            elapsed_ms = solution.statistics().total_time(),
            "search finished"
        );
        Ok(solution)
    }

    /// Partitions the assignments round-robin across worker threads; the
    /// first worker to find an instance cancels the others.
    fn run_parallel(
        &self,
        schema: &Arc<Schema>,
        plan: &Plan,
        shared: &Shared,
        assignments: Vec<Vec<usize>>,
    ) -> (Outcome, Option<Instance>, Counters) {
        let threads = self.options.threads.min(assignments.len()).max(1);
        let mut partitions: Vec<Vec<Vec<usize>>> = vec![Vec::new(); threads];
        for (i, counts) in assignments.into_iter().enumerate() {
            partitions[i % threads].push(counts);
        }

        let (tx, rx) = mpsc::channel::<WorkerResult>();
        thread::scope(|s| {
            for (worker, partition) in partitions.into_iter().enumerate() {
                let tx = tx.clone();
                s.spawn(move || {
                    debug!(worker, assignments = partition.len(), "worker started");
                    let result = run_worker(schema, plan, shared, partition);
                    if result.outcome == Outcome::Found {
                        shared.cancel.store(true, Ordering::Relaxed);
                    }
                    let _ = tx.send(result);
                });
            }
            drop(tx);

            let mut counters = Counters::default();
            let mut found = None;
            let mut out_of_budget = false;
            for result in rx {
                counters.merge(&result.counters);
                match result.outcome {
                    Outcome::Found if found.is_none() => found = result.instance,
                    Outcome::OutOfBudget => out_of_budget = true,
                    _ => {}
                }
            }
            match found {
                Some(instance) => (Outcome::Found, Some(instance), counters),
                None if out_of_budget => (Outcome::OutOfBudget, None, counters),
                None => (Outcome::Exhausted, None, counters),
            }
        })
    }
}

/// Result of a command
#[derive(Debug)]
pub enum Solution {
    /// An instance satisfying the goal (a witness for FIND, a
    /// counterexample for CHECK)
    Sat {
        /// The instance found
        instance: Instance,
        /// Search statistics
        stats: Statistics,
    },
    /// The bounded space holds no such instance
    Unsat {
        /// Search statistics
        stats: Statistics,
    },
    /// The budget ran out before the search finished
    Timeout {
        /// Statistics up to the point the search stopped
        stats: Statistics,
    },
}

impl Solution {
    /// Returns true if an instance was found
    pub fn is_sat(&self) -> bool {
        matches!(self, Solution::Sat { .. })
    }

    /// Returns true if the space was exhausted
    pub fn is_unsat(&self) -> bool {
        matches!(self, Solution::Unsat { .. })
    }

    /// Returns true if the budget ran out
    pub fn is_timeout(&self) -> bool {
        matches!(self, Solution::Timeout { .. })
    }

    /// Returns the instance if one was found
    pub fn instance(&self) -> Option<&Instance> {
        match self {
            Solution::Sat { instance, .. } => Some(instance),
            _ => None,
        }
    }

    /// Returns the statistics
    pub fn statistics(&self) -> &Statistics {
        match self {
            Solution::Sat { stats, .. } => stats,
            Solution::Unsat { stats } => stats,
            Solution::Timeout { stats } => stats,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Solution::Sat { .. } => "sat",
            Solution::Unsat { .. } => "unsat",
            Solution::Timeout { .. } => "timeout",
        }
    }
}

/// Statistics collected during search
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    nodes: u64,
    constraints_checked: u64,
    pruned: u64,
    scopes_explored: u64,
    conjuncts: usize,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    elapsed: Duration,
    #[serde(skip)]
    scope: BTreeMap<String, usize>,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl Statistics {
    /// Returns the number of search nodes visited
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Returns the number of conjunct evaluations
    pub fn constraints_checked(&self) -> u64 {
        self.constraints_checked
    }

    /// Returns the number of branches cut by a false conjunct
    pub fn pruned(&self) -> u64 {
        self.pruned
    }

    /// Returns the number of atom-count assignments searched
    pub fn scopes_explored(&self) -> u64 {
        self.scopes_explored
    }

    /// Returns the number of conjuncts the facts and goal split into
    pub fn conjuncts(&self) -> usize {
        self.conjuncts
    }

    /// Returns total time in milliseconds
    pub fn total_time(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }

    /// Returns the effective scope of every type
    pub fn scope(&self) -> &BTreeMap<String, usize> {
        &self.scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Decl, Decls, Expression, Formula, Variable};
    use crate::error::ModelError;
    use crate::schema::Multiplicity;

    fn model() -> Model {
        let mut model = Model::new();
        let schema = model.schema_mut();
        schema.register_sig("Person", None, false).unwrap();
        schema
            .register_field("knows", "Person", "Person", Multiplicity::Set)
            .unwrap();

        let p = Variable::unary("p");
        let decls = Decls::from(Decl::one_of(p.clone(), Expression::sig("Person")));
        let knows = Expression::from(&p).join(Expression::field("knows"));
        model
            .add_fact("irreflexive", Formula::forall(decls.clone(), Expression::from(&p).in_set(knows.clone()).not()))
            .unwrap();
        model
            .add_predicate("selfAware", Formula::exists(decls.clone(), Expression::from(&p).in_set(knows.clone())))
            .unwrap();
        model
            .add_predicate("popular", Formula::exists(decls.clone(), knows.clone().some()))
            .unwrap();
        model
            .add_assertion("nobodyKnowsThemselves", Formula::forall(decls, Expression::from(&p).in_set(knows).not()))
            .unwrap();
        model
    }

    #[test]
    fn find_sat_and_unsat() {
        let solver = Solver::new(Options::default());
        let bounds = Bounds::new().bound("Person", 2);

        let solution = solver.find(&model(), "popular", &bounds).unwrap();
        assert!(solution.is_sat());
        let instance = solution.instance().unwrap();
        assert_eq!(instance.relation("knows").unwrap().size(), 1);

        let solution = solver.find(&model(), "selfAware", &bounds).unwrap();
        assert!(solution.is_unsat());
        assert!(solution.statistics().nodes() > 0);
        assert_eq!(solution.statistics().scopes_explored(), 3);
    }

    #[test]
    fn check_holds_for_fact() {
        let solver = Solver::new(Options::default());
        let solution = solver
            .check(&model(), "nobodyKnowsThemselves", &Bounds::new().bound("Person", 3))
            .unwrap();
        assert!(solution.is_unsat());
    }

    #[test]
    fn unknown_targets_are_errors() {
        let solver = Solver::new(Options::default());
        let err = solver.find(&model(), "nobodyKnowsThemselves", &Bounds::new()).unwrap_err();
        assert!(matches!(err, ModelError::UnknownConstraint { kind: "predicate", .. }));
    }

    #[test]
    fn node_budget_yields_timeout() {
        let options = Options {
            budget: Budget {
                max_nodes: Some(5),
                timeout_ms: None,
            },
            ..Options::default()
        };
        let solution = Solver::new(options)
            .find(&model(), "selfAware", &Bounds::new().bound("Person", 3))
            .unwrap();
        assert!(solution.is_timeout());
    }

    #[test]
    fn parallel_agrees_with_sequential() {
        let options = Options {
            threads: 4,
            ..Options::default()
        };
        let solver = Solver::new(options);
        let bounds = Bounds::new().bound("Person", 3);
        assert!(solver.find(&model(), "popular", &bounds).unwrap().is_sat());
        assert!(solver.find(&model(), "selfAware", &bounds).unwrap().is_unsat());
    }

    #[test]
    fn command_display() {
        assert_eq!(Command::Find("p".into()).to_string(), "find p");
        assert_eq!(Command::Check("a".into()).target(), "a");
    }
}
