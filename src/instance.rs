//! Instance types: Atom, Universe, Tuple, TupleSet, Bounds, Scope and Instance
//!
//! A universe is fixed by one atom-count assignment. Every atom carries the
//! leaf signature it was created for; the extent of a signature is the set of
//! atoms tagged with any member of its type closure.

use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::error::{ModelError, Result};
use crate::schema::{FieldId, Multiplicity, Schema, SigId, INT};

/// Largest scope accepted for any signature (and for `Int`)
pub const MAX_SCOPE: i64 = 64;

/// Largest number of candidate targets for a set-valued relation
pub const MAX_SET_TARGETS: usize = 20;

/// Scope used for signatures no bound mentions
pub const DEFAULT_SCOPE: i64 = 1;

/// Number of `Int` atoms unless configured otherwise (values 0..=3)
pub const DEFAULT_INT_SCOPE: i64 = 4;

/// An atom: an index into its universe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(u32);

impl Atom {
    /// Returns the index of this atom in its universe
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
struct AtomInfo {
    name: String,
    sig: SigId,
    value: Option<i64>,
}

/// The atoms of one candidate instance
///
/// Atoms are created in signature registration order, so the builtin `Int`
/// atoms come first, then each signature's own atoms.
#[derive(Clone)]
pub struct Universe {
    inner: Arc<UniverseInner>,
}

struct UniverseInner {
    atoms: Vec<AtomInfo>,
    own: Vec<Vec<Atom>>,
    extents: Vec<TupleSet>,
    by_name: FxHashMap<String, Atom>,
}

impl Universe {
    /// Creates the universe for an atom-count assignment
    ///
    /// `counts[s]` is the number of atoms whose leaf signature is `s`.
    pub fn new(schema: &Schema, counts: &[usize]) -> Self {
        assert_eq!(counts.len(), schema.sig_count(), "one count per signature");
        let mut atoms = Vec::new();
        let mut own = Vec::with_capacity(counts.len());
        for sig in schema.sig_ids() {
            let decl = schema.sig(sig);
            let mut mine = Vec::with_capacity(counts[sig.index()]);
            for i in 0..counts[sig.index()] {
                let (name, value) = if decl.is_builtin() {
                    (i.to_string(), Some(i as i64))
                } else if decl.is_one() {
                    (decl.name().to_string(), None)
                } else {
                    (format!("{}${i}", decl.name()), None)
                };
                mine.push(Atom(atoms.len() as u32));
                atoms.push(AtomInfo { name, sig, value });
            }
            own.push(mine);
        }

        let extents = schema
            .sig_ids()
            .map(|sig| {
                let mut set = TupleSet::empty(1);
                for member in schema.type_closure(sig) {
                    for &atom in &own[member.index()] {
                        set.insert(Tuple::unary(atom));
                    }
                }
                set
            })
            .collect();
        let by_name = atoms
            .iter()
            .enumerate()
            .map(|(i, info)| (info.name.clone(), Atom(i as u32)))
            .collect();

        Self {
            inner: Arc::new(UniverseInner {
                atoms,
                own,
                extents,
                by_name,
            }),
        }
    }

    /// Returns the number of atoms
    pub fn size(&self) -> usize {
        self.inner.atoms.len()
    }

    /// Returns every atom in creation order
    pub fn atoms(&self) -> impl Iterator<Item = Atom> {
        (0..self.inner.atoms.len() as u32).map(Atom)
    }

    /// Returns the display name of an atom
    pub fn name(&self, atom: Atom) -> &str {
        &self.inner.atoms[atom.index()].name
    }

    /// Returns the leaf signature an atom was created for
    pub fn sig_of(&self, atom: Atom) -> SigId {
        self.inner.atoms[atom.index()].sig
    }

    /// Returns the integer value of an `Int` atom
    pub fn int_value(&self, atom: Atom) -> Option<i64> {
        self.inner.atoms[atom.index()].value
    }

    /// Looks up an atom by name
    pub fn atom(&self, name: &str) -> Option<Atom> {
        self.inner.by_name.get(name).copied()
    }

    /// Returns the atoms tagged with exactly `sig`
    pub fn own_atoms(&self, sig: SigId) -> &[Atom] {
        &self.inner.own[sig.index()]
    }

    /// Returns the atoms of `sig` and all of its subtypes as a unary set
    pub fn extent(&self, sig: SigId) -> &TupleSet {
        &self.inner.extents[sig.index()]
    }

    /// Returns the identity relation over every atom
    pub fn iden(&self) -> TupleSet {
        let mut set = TupleSet::empty(2);
        for atom in self.atoms() {
            set.insert(Tuple::from(vec![atom, atom]));
        }
        set
    }

    /// Returns every atom as a unary set
    pub fn univ(&self) -> TupleSet {
        let mut set = TupleSet::empty(1);
        for atom in self.atoms() {
            set.insert(Tuple::unary(atom));
        }
        set
    }
}

impl PartialEq for Universe {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Universe {}

impl fmt::Debug for Universe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.inner.atoms.iter().map(|a| a.name.as_str()).collect();
        write!(f, "Universe({names:?})")
    }
}

/// A tuple of atoms
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tuple(Vec<Atom>);

impl Tuple {
    /// Creates a 1-tuple
    pub fn unary(atom: Atom) -> Self {
        Tuple(vec![atom])
    }

    /// Returns the arity (number of atoms) in this tuple
    pub fn arity(&self) -> usize {
        self.0.len()
    }

    /// Returns the atom at the given position
    pub fn atom(&self, i: usize) -> Option<Atom> {
        self.0.get(i).copied()
    }

    /// Returns the atoms in order
    pub fn atoms(&self) -> &[Atom] {
        &self.0
    }

    fn first(&self) -> Atom {
        self.0[0]
    }

    fn last(&self) -> Atom {
        self.0[self.0.len() - 1]
    }
}

impl From<Vec<Atom>> for Tuple {
    fn from(atoms: Vec<Atom>) -> Self {
        Tuple(atoms)
    }
}

/// A set of tuples all of the same arity, kept in atom order
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TupleSet {
    arity: usize,
    tuples: BTreeSet<Tuple>,
}

impl TupleSet {
    /// Creates an empty tuple set with the given arity
    pub fn empty(arity: usize) -> Self {
        Self {
            arity,
            tuples: BTreeSet::new(),
        }
    }

    /// Creates `{(atom)}`
    pub fn singleton(atom: Atom) -> Self {
        let mut set = Self::empty(1);
        set.insert(Tuple::unary(atom));
        set
    }

    /// Creates a unary set from atoms
    pub fn of_atoms(atoms: impl IntoIterator<Item = Atom>) -> Self {
        let mut set = Self::empty(1);
        for atom in atoms {
            set.insert(Tuple::unary(atom));
        }
        set
    }

    /// Returns the arity of tuples in this set
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Returns the number of tuples in this set
    pub fn size(&self) -> usize {
        self.tuples.len()
    }

    /// Returns true if this set is empty
    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// Adds a tuple, returning false if it was already present
    pub fn insert(&mut self, tuple: Tuple) -> bool {
        assert_eq!(tuple.arity(), self.arity, "tuple arity does not match set arity");
        self.tuples.insert(tuple)
    }

    /// Removes a tuple, returning true if it was present
    pub fn remove(&mut self, tuple: &Tuple) -> bool {
        self.tuples.remove(tuple)
    }

    /// True if the tuple is in this set
    pub fn contains(&self, tuple: &Tuple) -> bool {
        self.tuples.contains(tuple)
    }

    /// Returns an iterator over the tuples in order
    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.tuples.iter()
    }

    /// Returns the first atom of every tuple (the atoms of a unary set)
    pub fn atoms(&self) -> impl Iterator<Item = Atom> + '_ {
        self.tuples.iter().map(Tuple::first)
    }

    /// True if every tuple of this set is in `other`
    pub fn is_subset(&self, other: &TupleSet) -> bool {
        self.tuples.is_subset(&other.tuples)
    }

    /// Set union
    pub fn union(&self, other: &TupleSet) -> TupleSet {
        TupleSet {
            arity: self.arity,
            tuples: self.tuples.union(&other.tuples).cloned().collect(),
        }
    }

    /// Set intersection
    pub fn intersection(&self, other: &TupleSet) -> TupleSet {
        TupleSet {
            arity: self.arity,
            tuples: self.tuples.intersection(&other.tuples).cloned().collect(),
        }
    }

    /// Returns a new tuple set containing tuples in this set but not in other
    pub fn difference(&self, other: &TupleSet) -> TupleSet {
        TupleSet {
            arity: self.arity,
            tuples: self.tuples.difference(&other.tuples).cloned().collect(),
        }
    }

    /// Returns the Cartesian product of this set with another
    pub fn product(&self, other: &TupleSet) -> TupleSet {
        let mut result = TupleSet::empty(self.arity + other.arity);
        for t1 in &self.tuples {
            for t2 in &other.tuples {
                let mut atoms = Vec::with_capacity(result.arity);
                atoms.extend_from_slice(&t1.0);
                atoms.extend_from_slice(&t2.0);
                result.tuples.insert(Tuple(atoms));
            }
        }
        result
    }

    /// Relational join: matches the last column of `self` with the first of `other`
    ///
    /// An empty operand yields an empty result.
    pub fn join(&self, other: &TupleSet) -> TupleSet {
        assert!(self.arity + other.arity > 2, "join of two unary sets");
        let mut result = TupleSet::empty(self.arity + other.arity - 2);
        if self.is_empty() || other.is_empty() {
            return result;
        }
        let mut by_first: BTreeMap<Atom, Vec<&Tuple>> = BTreeMap::new();
        for t in &other.tuples {
            by_first.entry(t.first()).or_default().push(t);
        }
        for left in &self.tuples {
            if let Some(rights) = by_first.get(&left.last()) {
                for right in rights {
                    let mut atoms = Vec::with_capacity(result.arity);
                    atoms.extend_from_slice(&left.0[..left.arity() - 1]);
                    atoms.extend_from_slice(&right.0[1..]);
                    result.tuples.insert(Tuple(atoms));
                }
            }
        }
        result
    }

    /// Swaps the columns of a binary relation
    pub fn transpose(&self) -> TupleSet {
        assert_eq!(self.arity, 2, "transpose of a non-binary set");
        TupleSet {
            arity: 2,
            tuples: self
                .tuples
                .iter()
                .map(|t| Tuple(vec![t.0[1], t.0[0]]))
                .collect(),
        }
    }

    /// Transitive closure of a binary relation
    pub fn closure(&self) -> TupleSet {
        assert_eq!(self.arity, 2, "closure of a non-binary set");
        let mut result = self.clone();
        loop {
            let next = result.union(&result.join(self));
            if next.size() == result.size() {
                return result;
            }
            result = next;
        }
    }
}

impl FromIterator<Tuple> for TupleSet {
    /// Collects tuples into a set; the arity is taken from the first tuple
    /// and an empty iterator yields an empty unary set.
    fn from_iter<I: IntoIterator<Item = Tuple>>(iter: I) -> Self {
        let tuples: BTreeSet<Tuple> = iter.into_iter().collect();
        let arity = tuples.iter().next().map_or(1, Tuple::arity);
        assert!(tuples.iter().all(|t| t.arity() == arity), "mixed arities");
        TupleSet { arity, tuples }
    }
}

#[derive(Debug, Clone, Copy)]
struct ScopeRequest {
    count: i64,
    exact: bool,
}

/// Per-type scopes requested for a run
///
/// Types no bound mentions use the default scope. Bounding `Int` sets the
/// number of integer atoms.
#[derive(Debug, Clone)]
pub struct Bounds {
    requests: BTreeMap<String, ScopeRequest>,
    default_scope: i64,
    int_scope: i64,
}

impl Bounds {
    /// Creates bounds with the default scope and integer scope
    pub fn new() -> Self {
        Self {
            requests: BTreeMap::new(),
            default_scope: DEFAULT_SCOPE,
            int_scope: DEFAULT_INT_SCOPE,
        }
    }

    /// At most `count` atoms of `sig` (including its subtypes)
    pub fn bound(mut self, sig: &str, count: i64) -> Self {
        self.request(sig, count, false);
        self
    }

    /// Exactly `count` atoms of `sig` (including its subtypes)
    pub fn exactly(mut self, sig: &str, count: i64) -> Self {
        self.request(sig, count, true);
        self
    }

    fn request(&mut self, sig: &str, count: i64, exact: bool) {
        if sig == INT {
            self.int_scope = count;
        } else {
            self.requests.insert(sig.to_string(), ScopeRequest { count, exact });
        }
    }

    /// Scope for types no bound mentions
    pub fn with_default(mut self, count: i64) -> Self {
        self.default_scope = count;
        self
    }

    /// Number of `Int` atoms
    pub fn int_scope(mut self, count: i64) -> Self {
        self.int_scope = count;
        self
    }

    /// Resolves the bounds against a schema
    ///
    /// # Errors
    /// `UnknownType` for a bound on an unregistered type; `ScopeExceeded` for
    /// negative or oversized bounds, a `one` type bounded below one, bounds
    /// that no atom count can satisfy, or a set-valued relation with too many
    /// candidate targets.
    pub fn resolve(&self, schema: &Schema) -> Result<Scope> {
        let in_range = |name: &str, count: i64| -> Result<usize> {
            if count < 0 {
                return Err(ModelError::ScopeExceeded {
                    name: name.to_string(),
                    detail: format!("negative bound {count}"),
                });
            }
            if count > MAX_SCOPE {
                return Err(ModelError::ScopeExceeded {
                    name: name.to_string(),
                    detail: format!("bound {count} exceeds the maximum scope {MAX_SCOPE}"),
                });
            }
            Ok(count as usize)
        };
        let default_scope = in_range("default scope", self.default_scope)?;
        let int_scope = in_range(INT, self.int_scope)?;

        let mut explicit: Vec<Option<usize>> = vec![None; schema.sig_count()];
        let mut caps = Vec::new();
        for (name, request) in &self.requests {
            let sig = schema.sig_id(name).ok_or_else(|| ModelError::UnknownType {
                name: name.clone(),
                location: "bounds".to_string(),
            })?;
            let count = in_range(name, request.count)?;
            let decl = schema.sig(sig);
            if decl.is_one() && (count < 1 || (request.exact && count != 1)) {
                return Err(ModelError::ScopeExceeded {
                    name: name.clone(),
                    detail: format!("`one` type cannot be bounded by {count}"),
                });
            }
            explicit[sig.index()] = Some(count);
            caps.push(Cap {
                sig,
                closure: schema.type_closure(sig),
                count,
                exact: request.exact,
            });
        }

        let mut own_min = vec![0; schema.sig_count()];
        let mut own_max = vec![0; schema.sig_count()];
        for sig in schema.sig_ids() {
            let decl = schema.sig(sig);
            let i = sig.index();
            if decl.is_builtin() {
                own_min[i] = int_scope;
                own_max[i] = int_scope;
            } else if decl.is_one() {
                own_min[i] = 1;
                own_max[i] = 1;
            } else if !decl.is_abstract() {
                own_max[i] = std::iter::once(sig)
                    .chain(schema.ancestors(sig))
                    .find_map(|s| explicit[s.index()])
                    .unwrap_or(default_scope);
            }
        }

        for cap in &caps {
            let name = schema.sig(cap.sig).name();
            let least: usize = cap.closure.iter().map(|s| own_min[s.index()]).sum();
            if least > cap.count {
                return Err(ModelError::ScopeExceeded {
                    name: name.to_string(),
                    detail: format!("bound {} is below the {least} atoms its `one` subtypes require", cap.count),
                });
            }
            let most: usize = cap.closure.iter().map(|s| own_max[s.index()]).sum();
            if cap.exact && most < cap.count {
                return Err(ModelError::ScopeExceeded {
                    name: name.to_string(),
                    detail: format!("exactly {} atoms requested but its subtypes allow at most {most}", cap.count),
                });
            }
            for inner in &caps {
                if inner.sig != cap.sig && inner.exact && inner.count > cap.count && cap.closure.contains(&inner.sig) {
                    return Err(ModelError::ScopeExceeded {
                        name: name.to_string(),
                        detail: format!(
                            "bound {} is below exactly {} atoms of `{}`",
                            cap.count,
                            inner.count,
                            schema.sig(inner.sig).name()
                        ),
                    });
                }
            }
        }

        let scope = Scope {
            own_min,
            own_max,
            caps,
        };

        for field in schema.field_ids() {
            let decl = schema.field(field);
            if matches!(decl.multiplicity(), Multiplicity::One | Multiplicity::Lone) {
                continue;
            }
            let targets = scope.max_total(schema, decl.range());
            if targets > MAX_SET_TARGETS {
                return Err(ModelError::ScopeExceeded {
                    name: decl.name().to_string(),
                    detail: format!(
                        "{targets} candidate targets exceed the limit of {MAX_SET_TARGETS} for set-valued relations"
                    ),
                });
            }
        }
        Ok(scope)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
struct Cap {
    sig: SigId,
    closure: Vec<SigId>,
    count: usize,
    exact: bool,
}

/// Bounds resolved against a schema
///
/// Gives the range of each signature's own atom count and the caps explicit
/// bounds place on type closures.
#[derive(Debug, Clone)]
pub struct Scope {
    own_min: Vec<usize>,
    own_max: Vec<usize>,
    caps: Vec<Cap>,
}

impl Scope {
    /// Smallest own atom count of `sig`
    pub fn own_min(&self, sig: SigId) -> usize {
        self.own_min[sig.index()]
    }

    /// Largest own atom count of `sig`
    pub fn own_max(&self, sig: SigId) -> usize {
        self.own_max[sig.index()]
    }

    /// True if a count assignment respects every explicit bound
    pub fn admits(&self, counts: &[usize]) -> bool {
        self.caps.iter().all(|cap| {
            let total: usize = cap.closure.iter().map(|s| counts[s.index()]).sum();
            if cap.exact {
                total == cap.count
            } else {
                total <= cap.count
            }
        })
    }

    /// Largest number of atoms `sig` and its subtypes can have together
    pub fn max_total(&self, schema: &Schema, sig: SigId) -> usize {
        let sum: usize = schema
            .type_closure(sig)
            .iter()
            .map(|s| self.own_max[s.index()])
            .sum();
        self.caps
            .iter()
            .filter(|cap| cap.sig == sig)
            .map(|cap| cap.count)
            .fold(sum, usize::min)
    }

    /// Returns the effective maximum of every user type, keyed by name
    pub fn summary(&self, schema: &Schema) -> BTreeMap<String, usize> {
        schema
            .sig_ids()
            .filter(|&s| !schema.sig(s).is_abstract() || !schema.sig(s).children().is_empty())
            .map(|s| (schema.sig(s).name().to_string(), self.max_total(schema, s)))
            .collect()
    }
}

/// One candidate or final assignment of tuples to every relation
///
/// Relations are indexed by [`FieldId`]; each holds `source -> target` pairs.
#[derive(Debug, Clone)]
pub struct Instance {
    schema: Arc<Schema>,
    universe: Universe,
    relations: Vec<TupleSet>,
}

impl Instance {
    /// Creates an instance with every relation empty
    pub fn new(schema: Arc<Schema>, universe: Universe) -> Self {
        let relations = vec![TupleSet::empty(2); schema.field_count()];
        Self {
            schema,
            universe,
            relations,
        }
    }

    /// Returns the schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the universe
    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Returns the tuples of a relation
    pub fn field(&self, field: FieldId) -> &TupleSet {
        &self.relations[field.index()]
    }

    /// Returns the tuples of a relation for modification
    pub fn field_mut(&mut self, field: FieldId) -> &mut TupleSet {
        &mut self.relations[field.index()]
    }

    /// Looks up a relation by name
    pub fn relation(&self, name: &str) -> Option<&TupleSet> {
        self.schema.field_id(name).map(|f| self.field(f))
    }

    /// Returns the atoms of a type and its subtypes, in atom order
    pub fn atoms_of(&self, sig: &str) -> Option<Vec<Atom>> {
        self.schema
            .sig_id(sig)
            .map(|s| self.universe.extent(s).atoms().collect())
    }

    /// Returns the display name of an atom
    pub fn atom_name(&self, atom: Atom) -> &str {
        self.universe.name(atom)
    }

    /// Panics unless every relation respects its declaration
    ///
    /// Each tuple must run from an atom of the source type to an atom of the
    /// candidate range, and every source atom must have a number of targets
    /// allowed by the multiplicity.
    pub fn assert_well_formed(&self) {
        for field in self.schema.field_ids() {
            let decl = self.schema.field(field);
            let sources = self.universe.extent(decl.source());
            let targets = self.universe.extent(decl.range());
            let tuples = self.field(field);
            for t in tuples.iter() {
                assert!(
                    sources.contains(&Tuple::unary(t.first())) && targets.contains(&Tuple::unary(t.last())),
                    "relation `{}` holds ill-typed tuple ({}, {})",
                    decl.name(),
                    self.atom_name(t.first()),
                    self.atom_name(t.last()),
                );
            }
            for source in sources.atoms() {
                let n = tuples.iter().filter(|t| t.first() == source).count();
                let ok = match decl.multiplicity() {
                    Multiplicity::One => n == 1,
                    Multiplicity::Lone => n <= 1,
                    Multiplicity::Some => n >= 1,
                    Multiplicity::Set | Multiplicity::SubsetOf(_) => true,
                };
                assert!(
                    ok,
                    "relation `{}` gives {} {} targets, violating `{}`",
                    decl.name(),
                    self.atom_name(source),
                    n,
                    decl.multiplicity()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        let mut schema = Schema::new();
        schema.register_sig("Event", None, true).unwrap();
        schema.register_sig("RAR", Some("Event"), false).unwrap();
        schema.register_sig("Processor", None, false).unwrap();
        schema.register_one_sig("True", None).unwrap();
        schema
            .register_field("target", "Event", "Processor", Multiplicity::One)
            .unwrap();
        schema
    }

    fn counts(schema: &Schema, pairs: &[(&str, usize)]) -> Vec<usize> {
        let mut counts = vec![0; schema.sig_count()];
        for (name, n) in pairs {
            counts[schema.sig_id(name).unwrap().index()] = *n;
        }
        counts
    }

    #[test]
    fn universe_names_and_extents() {
        let schema = schema();
        let universe = Universe::new(&schema, &counts(&schema, &[("Int", 2), ("RAR", 2), ("Processor", 1), ("True", 1)]));
        assert_eq!(universe.size(), 6);
        assert_eq!(universe.name(Atom(0)), "0");
        assert_eq!(universe.int_value(Atom(1)), Some(1));
        assert!(universe.atom("RAR$1").is_some());
        assert!(universe.atom("True").is_some());

        let event = schema.sig_id("Event").unwrap();
        assert_eq!(universe.extent(event).size(), 2);
        assert!(universe.own_atoms(event).is_empty());
    }

    #[test]
    fn join_and_product() {
        let a = Atom(0);
        let b = Atom(1);
        let c = Atom(2);
        let r: TupleSet = [Tuple::from(vec![a, b]), Tuple::from(vec![b, c])].into_iter().collect();

        let ab = TupleSet::singleton(a).join(&r);
        assert_eq!(ab, TupleSet::singleton(b));
        assert_eq!(r.join(&r).size(), 1);
        assert_eq!(r.closure().size(), 3);
        assert_eq!(r.transpose().join(&TupleSet::singleton(b)), TupleSet::singleton(a));

        let p = TupleSet::of_atoms([a, b]).product(&TupleSet::singleton(c));
        assert_eq!(p.arity(), 2);
        assert_eq!(p.size(), 2);
    }

    #[test]
    fn join_over_empty_is_empty() {
        let r: TupleSet = [Tuple::from(vec![Atom(0), Atom(1)])].into_iter().collect();
        let empty = TupleSet::empty(1);
        assert!(empty.join(&r).is_empty());
        assert_eq!(empty.join(&r).arity(), 1);
    }

    #[test]
    fn bounds_resolve_inherited_scopes() {
        let schema = schema();
        let scope = Bounds::new().bound("Event", 3).resolve(&schema).unwrap();
        let rar = schema.sig_id("RAR").unwrap();
        let processor = schema.sig_id("Processor").unwrap();
        let truth = schema.sig_id("True").unwrap();

        assert_eq!(scope.own_max(rar), 3);
        assert_eq!(scope.own_max(processor), 1);
        assert_eq!(scope.own_min(truth), 1);
        assert_eq!(scope.own_max(schema.int_sig()), 4);
    }

    #[test]
    fn exact_bounds_filter_assignments() {
        let schema = schema();
        let scope = Bounds::new().exactly("Processor", 2).resolve(&schema).unwrap();
        assert!(scope.admits(&counts(&schema, &[("Processor", 2)])));
        assert!(!scope.admits(&counts(&schema, &[("Processor", 1)])));
    }

    #[test]
    fn invalid_bounds_rejected() {
        let schema = schema();
        assert!(matches!(
            Bounds::new().bound("Processor", -1).resolve(&schema),
            Err(ModelError::ScopeExceeded { .. })
        ));
        assert!(matches!(
            Bounds::new().bound("Cpu", 1).resolve(&schema),
            Err(ModelError::UnknownType { .. })
        ));
        assert!(matches!(
            Bounds::new().bound("True", 0).resolve(&schema),
            Err(ModelError::ScopeExceeded { .. })
        ));
        assert!(matches!(
            Bounds::new().bound("Processor", MAX_SCOPE + 1).resolve(&schema),
            Err(ModelError::ScopeExceeded { .. })
        ));
    }

    #[test]
    fn unsatisfiable_bounds_rejected() {
        let mut schema = schema();
        schema.register_sig("Bool", None, true).unwrap();
        schema.register_one_sig("Yes", Some("Bool")).unwrap();
        schema.register_one_sig("No", Some("Bool")).unwrap();
        schema.register_sig("Ipi", Some("Event"), false).unwrap();

        let err = Bounds::new().bound("Bool", 1).resolve(&schema).unwrap_err();
        assert!(matches!(err, ModelError::ScopeExceeded { ref name, .. } if name == "Bool"));
        assert!(Bounds::new().bound("Bool", 2).resolve(&schema).is_ok());
        assert!(Bounds::new().exactly("Bool", 2).resolve(&schema).is_ok());

        let err = Bounds::new()
            .exactly("Event", 3)
            .bound("RAR", 1)
            .bound("Ipi", 1)
            .resolve(&schema)
            .unwrap_err();
        assert!(matches!(err, ModelError::ScopeExceeded { ref name, .. } if name == "Event"));
        assert!(Bounds::new()
            .exactly("Event", 2)
            .bound("RAR", 1)
            .bound("Ipi", 1)
            .resolve(&schema)
            .is_ok());

        let err = Bounds::new()
            .bound("Event", 1)
            .exactly("RAR", 2)
            .resolve(&schema)
            .unwrap_err();
        assert!(matches!(err, ModelError::ScopeExceeded { ref name, .. } if name == "Event"));
    }

    #[test]
    fn wide_set_relations_rejected() {
        let mut schema = schema();
        schema
            .register_field("peers", "Processor", "Processor", Multiplicity::Set)
            .unwrap();
        assert!(Bounds::new().bound("Processor", 20).resolve(&schema).is_ok());
        let err = Bounds::new().bound("Processor", 21).resolve(&schema).unwrap_err();
        assert!(matches!(err, ModelError::ScopeExceeded { ref name, .. } if name == "peers"));
    }

    #[test]
    fn well_formed_instance_passes() {
        let schema = Arc::new(schema());
        let universe = Universe::new(&schema, &counts(&schema, &[("RAR", 1), ("Processor", 1), ("True", 1)]));
        let mut instance = Instance::new(schema.clone(), universe.clone());
        let target = schema.field_id("target").unwrap();
        let rar = universe.atom("RAR$0").unwrap();
        let p = universe.atom("Processor$0").unwrap();
        instance.field_mut(target).insert(Tuple::from(vec![rar, p]));
        instance.assert_well_formed();
        assert_eq!(instance.atoms_of("Event"), Some(vec![rar]));
    }

    #[test]
    #[should_panic(expected = "violating `one`")]
    fn missing_target_panics() {
        let schema = Arc::new(schema());
        let universe = Universe::new(&schema, &counts(&schema, &[("RAR", 1), ("Processor", 1), ("True", 1)]));
        Instance::new(schema, universe).assert_well_formed();
    }
}
