//! Instance space enumeration
//!
//! The space is enumerated in two layers. [`ScopeAssignments`] yields every
//! atom-count assignment a [`Scope`] admits; for a fixed universe, each
//! [`ChoicePoint`] (one relation, one source atom) is filled in turn from an
//! [`ImageIter`] over the target sets its multiplicity allows. Both layers
//! run in a fixed order, so identical inputs always visit instances in the
//! same sequence and never twice.

use crate::instance::{Atom, Scope, Universe};
use crate::schema::{FieldId, Multiplicity, Schema};

/// Odometer over atom-count assignments, ascending lexicographically in
/// signature registration order
///
/// Each item has one count per signature (indexed by `SigId`); assignments
/// violating an explicit bound are skipped.
#[derive(Debug, Clone)]
pub struct ScopeAssignments {
    scope: Scope,
    min: Vec<usize>,
    max: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl ScopeAssignments {
    /// Creates the odometer for a resolved scope
    pub fn new(schema: &Schema, scope: &Scope) -> Self {
        let min: Vec<usize> = schema.sig_ids().map(|s| scope.own_min(s)).collect();
        let max: Vec<usize> = schema.sig_ids().map(|s| scope.own_max(s)).collect();
        Self {
            scope: scope.clone(),
            next: Some(min.clone()),
            min,
            max,
        }
    }

    fn advance(&mut self) {
        let Some(current) = self.next.as_mut() else {
            return;
        };
        for i in (0..current.len()).rev() {
            if current[i] < self.max[i] {
                current[i] += 1;
                return;
            }
            current[i] = self.min[i];
        }
        self.next = None;
    }
}

impl Iterator for ScopeAssignments {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        loop {
            let current = self.next.clone()?;
            self.advance();
            if self.scope.admits(&current) {
                return Some(current);
            }
        }
    }
}

/// One decision of the search: the targets of `source` in `field`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoicePoint {
    /// The relation being filled
    pub field: FieldId,
    /// The source atom whose image is chosen
    pub source: Atom,
}

/// Lists the choice points for a universe, field-major in `fields` order and
/// then in atom order
pub fn choice_points(schema: &Schema, universe: &Universe, fields: &[FieldId]) -> Vec<ChoicePoint> {
    fields
        .iter()
        .flat_map(|&field| {
            universe
                .extent(schema.field(field).source())
                .atoms()
                .map(move |source| ChoicePoint { field, source })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Returns the atoms a relation may target, in atom order
pub fn candidate_targets(schema: &Schema, universe: &Universe, field: FieldId) -> Vec<Atom> {
    universe.extent(schema.field(field).range()).atoms().collect()
}

#[derive(Debug, Clone, Copy)]
enum Shape {
    /// Empty first, then each single target
    Lone,
    /// Each single target
    One,
    /// Bitmask subsets from `first` upwards
    Subsets { first: u64 },
}

/// Iterator over the target sets one source atom may take in a relation
///
/// `lone` yields the empty set then each singleton, `one` each singleton,
/// `set` and `subsetOf` every subset by ascending bitmask, and `some` the
/// same without the empty set.
#[derive(Debug, Clone)]
pub struct ImageIter {
    targets: Vec<Atom>,
    shape: Shape,
    cursor: u64,
    end: u64,
}

impl ImageIter {
    /// Creates the iterator for a multiplicity over candidate targets
    pub fn new(multiplicity: &Multiplicity, targets: Vec<Atom>) -> Self {
        let n = targets.len() as u64;
        let (shape, cursor, end) = match multiplicity {
            Multiplicity::Lone => (Shape::Lone, 0, n + 1),
            Multiplicity::One => (Shape::One, 0, n),
            Multiplicity::Set | Multiplicity::SubsetOf(_) => (Shape::Subsets { first: 0 }, 0, 1u64 << n),
            Multiplicity::Some => (Shape::Subsets { first: 1 }, 1, 1u64 << n),
        };
        Self {
            targets,
            shape,
            cursor,
            end,
        }
    }

    /// Number of images this iterator yields in total
    pub fn total(&self) -> u64 {
        match self.shape {
            Shape::Subsets { first } => self.end - first,
            _ => self.end,
        }
    }
}

impl Iterator for ImageIter {
    type Item = Vec<Atom>;

    fn next(&mut self) -> Option<Vec<Atom>> {
        if self.cursor >= self.end {
            return None;
        }
        let k = self.cursor;
        self.cursor += 1;
        Some(match self.shape {
            Shape::Lone if k == 0 => Vec::new(),
            Shape::Lone => vec![self.targets[(k - 1) as usize]],
            Shape::One => vec![self.targets[k as usize]],
            Shape::Subsets { .. } => self
                .targets
                .iter()
                .enumerate()
                .filter(|(i, _)| k & (1u64 << i) != 0)
                .map(|(_, &a)| a)
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Bounds;

    fn atoms(n: usize) -> Vec<Atom> {
        let mut schema = Schema::new();
        schema.register_sig("A", None, false).unwrap();
        Universe::new(&schema, &[0, n]).atoms().collect()
    }

    #[test]
    fn image_orders() {
        let a = atoms(2);
        let lone: Vec<_> = ImageIter::new(&Multiplicity::Lone, a.clone()).collect();
        assert_eq!(lone, vec![vec![], vec![a[0]], vec![a[1]]]);

        let one: Vec<_> = ImageIter::new(&Multiplicity::One, a.clone()).collect();
        assert_eq!(one, vec![vec![a[0]], vec![a[1]]]);

        let set: Vec<_> = ImageIter::new(&Multiplicity::Set, a.clone()).collect();
        assert_eq!(set, vec![vec![], vec![a[0]], vec![a[1]], vec![a[0], a[1]]]);

        let some = ImageIter::new(&Multiplicity::Some, a.clone());
        assert_eq!(some.total(), 3);
        assert_eq!(some.collect::<Vec<_>>()[0], vec![a[0]]);
    }

    #[test]
    fn one_over_no_targets_is_empty() {
        assert_eq!(ImageIter::new(&Multiplicity::One, Vec::new()).count(), 0);
        assert_eq!(ImageIter::new(&Multiplicity::Lone, Vec::new()).count(), 1);
        assert_eq!(ImageIter::new(&Multiplicity::Some, Vec::new()).count(), 0);
    }

    #[test]
    fn odometer_is_lexicographic_and_filtered() {
        let mut schema = Schema::new();
        schema.register_sig("A", None, false).unwrap();
        schema.register_sig("B", None, false).unwrap();
        schema.register_one_sig("Top", None).unwrap();

        let scope = Bounds::new().bound("A", 1).bound("B", 2).int_scope(0).resolve(&schema).unwrap();
        let all: Vec<_> = ScopeAssignments::new(&schema, &scope).collect();
        assert_eq!(
            all,
            vec![
                vec![0, 0, 0, 1],
                vec![0, 0, 1, 1],
                vec![0, 0, 2, 1],
                vec![0, 1, 0, 1],
                vec![0, 1, 1, 1],
                vec![0, 1, 2, 1],
            ]
        );
    }

    #[test]
    fn exact_scope_on_parent() {
        let mut schema = Schema::new();
        schema.register_sig("Event", None, true).unwrap();
        schema.register_sig("RAR", Some("Event"), false).unwrap();
        schema.register_sig("Ipi", Some("Event"), false).unwrap();

        let scope = Bounds::new().exactly("Event", 2).int_scope(0).resolve(&schema).unwrap();
        let totals: Vec<_> = ScopeAssignments::new(&schema, &scope)
            .map(|c| (c[2], c[3]))
            .collect();
        assert_eq!(totals, vec![(0, 2), (1, 1), (2, 0)]);
    }

    #[test]
    fn choice_points_are_field_major() {
        let mut schema = Schema::new();
        schema.register_sig("P", None, false).unwrap();
        let f = schema.register_field("f", "P", "P", Multiplicity::Lone).unwrap();
        let g = schema.register_field("g", "P", "P", Multiplicity::Lone).unwrap();
        let universe = Universe::new(&schema, &[0, 2]);

        let points = choice_points(&schema, &universe, &[g, f]);
        assert_eq!(points.len(), 4);
        assert_eq!(points[0].field, g);
        assert_eq!(points[1].field, g);
        assert_eq!(points[2].field, f);
        assert!(points[2].source < points[3].source);
    }
}
