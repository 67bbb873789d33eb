//! Depth-first backtracking search over the instance space
//!
//! A [`Plan`] is built once per command: the facts and the goal are split
//! into conjuncts, relations are ordered so that those the goal and the
//! smallest conjuncts read are filled first, and every conjunct is scheduled
//! at the first depth where all relations it reads are assigned.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::ast::{relations_read, Formula};
use crate::engine::enumerator::{candidate_targets, choice_points, ChoicePoint, ImageIter};
use crate::engine::evaluator::Evaluator;
use crate::instance::{Atom, Instance, Tuple, Universe};
use crate::schema::{FieldId, Schema};
use crate::simplify::conjuncts;

/// Work limits for one command; `None` means unlimited
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Budget {
    /// Maximum number of search nodes across all workers
    pub max_nodes: Option<u64>,
    /// Wall-clock limit in milliseconds
    pub timeout_ms: Option<u64>,
}

/// A conjunct of a fact or of the goal, with the relations it reads
#[derive(Debug, Clone)]
pub struct Conjunct {
    /// The conjunct itself
    pub formula: Formula,
    /// Name of the constraint it came from
    pub origin: String,
    /// Relations read, in registration order
    pub fields: Vec<FieldId>,
}

/// Search order and constraint schedule for one command
#[derive(Debug, Clone)]
pub struct Plan {
    conjuncts: Vec<Conjunct>,
    field_order: Vec<FieldId>,
    early_pruning: bool,
}

impl Plan {
    /// Builds the plan for facts plus a goal formula named `goal_name`
    pub fn new<'a>(
        schema: &Schema,
        facts: impl IntoIterator<Item = (&'a str, &'a Formula)>,
        goal_name: &str,
        goal: &Formula,
        early_pruning: bool,
    ) -> Self {
        let split = |origin: &str, formula: &Formula| -> Vec<Conjunct> {
            conjuncts(formula)
                .into_iter()
                .map(|formula| Conjunct {
                    fields: fields_read(schema, &formula),
                    formula,
                    origin: origin.to_string(),
                })
                .collect()
        };

        let goal_conjuncts = split(goal_name, goal);
        let mut fact_conjuncts: Vec<Conjunct> = facts
            .into_iter()
            .flat_map(|(name, formula)| split(name, formula))
            .collect();
        fact_conjuncts.sort_by_key(|c| c.fields.len());

        let goal_fields: BTreeSet<FieldId> = goal_conjuncts.iter().flat_map(|c| c.fields.iter().copied()).collect();
        let mut field_order: Vec<FieldId> = goal_fields.into_iter().collect();
        for field in fact_conjuncts
            .iter()
            .flat_map(|c| c.fields.iter().copied())
            .chain(schema.field_ids())
        {
            if !field_order.contains(&field) {
                field_order.push(field);
            }
        }

        let mut all = goal_conjuncts;
        all.extend(fact_conjuncts);
        Self {
            conjuncts: all,
            field_order,
            early_pruning,
        }
    }

    /// Returns every conjunct, goal conjuncts first
    pub fn conjuncts(&self) -> &[Conjunct] {
        &self.conjuncts
    }

    /// Returns the order in which relations are filled
    pub fn field_order(&self) -> &[FieldId] {
        &self.field_order
    }
}

fn fields_read(schema: &Schema, formula: &Formula) -> Vec<FieldId> {
    let mut fields: Vec<FieldId> = relations_read(formula)
        .iter()
        .filter_map(|name| schema.field_id(name))
        .collect();
    fields.sort();
    fields
}

/// How one worker's search ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// An instance satisfying every conjunct was found
    Found,
    /// The assigned space holds no such instance
    Exhausted,
    /// The node or time budget ran out
    OutOfBudget,
    /// Another worker found a result first
    Cancelled,
}

/// Counters collected by one worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// Conjunct evaluations
    pub constraints_checked: u64,
    /// Branches cut by a false conjunct
    pub pruned: u64,
    /// Atom-count assignments searched
    pub scopes_explored: u64,
}

impl Counters {
    /// Adds another worker's counters
    pub fn merge(&mut self, other: &Counters) {
        self.constraints_checked += other.constraints_checked;
        self.pruned += other.pruned;
        self.scopes_explored += other.scopes_explored;
    }
}

/// State shared by all workers of one command
#[derive(Debug)]
pub struct Shared {
    /// Set once a worker has a result
    pub cancel: AtomicBool,
    /// Search nodes visited across workers
    pub nodes: AtomicU64,
    started: Instant,
    budget: Budget,
}

impl Shared {
    /// Creates the shared state and starts the clock
    pub fn new(budget: Budget) -> Self {
        Self {
            cancel: AtomicBool::new(false),
            nodes: AtomicU64::new(0),
            started: Instant::now(),
            budget,
        }
    }

    /// Time since the command started
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn over_budget(&self, nodes: u64) -> bool {
        if self.budget.max_nodes.is_some_and(|max| nodes > max) {
            return true;
        }
        self.budget
            .timeout_ms
            .is_some_and(|ms| self.started.elapsed() >= Duration::from_millis(ms))
    }
}

/// Result of one worker
#[derive(Debug)]
pub struct WorkerResult {
    /// How the search ended
    pub outcome: Outcome,
    /// The instance, when found
    pub instance: Option<Instance>,
    /// Work done
    pub counters: Counters,
}

/// Searches the given atom-count assignments in order
pub fn run_worker(
    schema: &Arc<Schema>,
    plan: &Plan,
    shared: &Shared,
    assignments: impl IntoIterator<Item = Vec<usize>>,
) -> WorkerResult {
    let mut counters = Counters::default();
    for counts in assignments {
        if shared.cancel.load(Ordering::Relaxed) {
            return WorkerResult {
                outcome: Outcome::Cancelled,
                instance: None,
                counters,
            };
        }
        counters.scopes_explored += 1;
        debug!(?counts, "searching atom-count assignment");

        let universe = Universe::new(schema, &counts);
        let mut search = UniverseSearch::new(schema, plan, shared, universe, &mut counters);
        match search.dfs(0) {
            Outcome::Exhausted => {}
            Outcome::Found => {
                let instance = search.instance;
                return WorkerResult {
                    outcome: Outcome::Found,
                    instance: Some(instance),
                    counters,
                };
            }
            outcome => {
                return WorkerResult {
                    outcome,
                    instance: None,
                    counters,
                }
            }
        }
    }
    WorkerResult {
        outcome: Outcome::Exhausted,
        instance: None,
        counters,
    }
}

/// Backtracking over the choice points of one universe
struct UniverseSearch<'a> {
    schema: &'a Schema,
    plan: &'a Plan,
    shared: &'a Shared,
    counters: &'a mut Counters,
    instance: Instance,
    points: Vec<ChoicePoint>,
    targets: Vec<Vec<Atom>>,
    /// Conjunct indices to evaluate once `depth` choice points are assigned
    ready: Vec<Vec<usize>>,
}

impl<'a> UniverseSearch<'a> {
    fn new(
        schema: &'a Arc<Schema>,
        plan: &'a Plan,
        shared: &'a Shared,
        universe: Universe,
        counters: &'a mut Counters,
    ) -> Self {
        let points = choice_points(schema, &universe, &plan.field_order);

        let mut end = vec![0; schema.field_count()];
        let mut pos = 0;
        for &field in &plan.field_order {
            pos += points.iter().filter(|p| p.field == field).count();
            end[field.index()] = pos;
        }

        let mut ready = vec![Vec::new(); points.len() + 1];
        for (i, conjunct) in plan.conjuncts.iter().enumerate() {
            let at = if plan.early_pruning {
                conjunct.fields.iter().map(|f| end[f.index()]).max().unwrap_or(0)
            } else {
                points.len()
            };
            ready[at].push(i);
        }

        let targets = points
            .iter()
            .map(|p| candidate_targets(schema, &universe, p.field))
            .collect();

        Self {
            schema: schema.as_ref(),
            plan,
            shared,
            counters,
            instance: Instance::new(Arc::clone(schema), universe),
            points,
            targets,
            ready,
        }
    }

    fn dfs(&mut self, depth: usize) -> Outcome {
        let nodes = self.shared.nodes.fetch_add(1, Ordering::Relaxed) + 1;
        if self.shared.cancel.load(Ordering::Relaxed) {
            return Outcome::Cancelled;
        }
        if self.shared.over_budget(nodes) {
            return Outcome::OutOfBudget;
        }

        let evaluator = Evaluator::new(&self.instance);
        for &i in &self.ready[depth] {
            self.counters.constraints_checked += 1;
            let conjunct = &self.plan.conjuncts[i];
            if !evaluator.evaluate(&conjunct.formula) {
                self.counters.pruned += 1;
                trace!(depth, origin = %conjunct.origin, "pruned");
                return Outcome::Exhausted;
            }
        }

        let Some(&point) = self.points.get(depth) else {
            return Outcome::Found;
        };
        let schema = self.schema;
        let multiplicity = schema.field(point.field).multiplicity();
        for image in ImageIter::new(multiplicity, self.targets[depth].clone()) {
            let tuples: Vec<Tuple> = image
                .iter()
                .map(|&target| Tuple::from(vec![point.source, target]))
                .collect();
            let relation = self.instance.field_mut(point.field);
            for t in &tuples {
                relation.insert(t.clone());
            }

            let outcome = self.dfs(depth + 1);
            if outcome == Outcome::Found {
                return outcome;
            }

            let relation = self.instance.field_mut(point.field);
            for t in &tuples {
                relation.remove(t);
            }
            if outcome != Outcome::Exhausted {
                return outcome;
            }
        }
        Outcome::Exhausted
    }
}
