//! Schema registry: signatures, subtyping and relation declarations
//!
//! Signatures form a forest. Every atom belongs to exactly one signature (its
//! leaf tag); the atoms of a signature in the polymorphic sense are the atoms
//! tagged with any member of its [`Schema::type_closure`].

use rustc_hash::FxHashMap;
use std::fmt;

use crate::error::{ModelError, Result};

/// Name of the builtin integer signature
pub const INT: &str = "Int";

/// Index of a signature in its schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SigId(usize);

impl SigId {
    /// Returns the registration index
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of a relation in its schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(usize);

impl FieldId {
    /// Returns the registration index
    pub fn index(self) -> usize {
        self.0
    }
}

/// How many targets each source atom may have in a relation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Multiplicity {
    /// Exactly one target
    One,
    /// At most one target
    Lone,
    /// At least one target
    Some,
    /// Any number of targets
    Set,
    /// Any number of targets drawn from the named subtype of the target type
    SubsetOf(String),
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Multiplicity::One => f.write_str("one"),
            Multiplicity::Lone => f.write_str("lone"),
            Multiplicity::Some => f.write_str("some"),
            Multiplicity::Set => f.write_str("set"),
            Multiplicity::SubsetOf(sig) => write!(f, "subsetOf {sig}"),
        }
    }
}

/// A registered signature
#[derive(Debug, Clone)]
pub struct SigDecl {
    name: String,
    parent: Option<SigId>,
    is_abstract: bool,
    is_one: bool,
    builtin: bool,
    children: Vec<SigId>,
}

impl SigDecl {
    /// Returns the signature name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parent signature, if this one extends another
    pub fn parent(&self) -> Option<SigId> {
        self.parent
    }

    /// True if the signature has no atoms of its own
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// True if the signature always has exactly one atom
    pub fn is_one(&self) -> bool {
        self.is_one
    }

    /// True for the builtin `Int` signature
    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    /// Returns the direct subtypes in registration order
    pub fn children(&self) -> &[SigId] {
        &self.children
    }
}

/// A registered binary relation `source -> target`
#[derive(Debug, Clone)]
pub struct FieldDecl {
    name: String,
    source: SigId,
    target: SigId,
    multiplicity: Multiplicity,
    range: SigId,
}

impl FieldDecl {
    /// Returns the relation name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the source signature
    pub fn source(&self) -> SigId {
        self.source
    }

    /// Returns the declared target signature
    pub fn target(&self) -> SigId {
        self.target
    }

    /// Returns the declared multiplicity
    pub fn multiplicity(&self) -> &Multiplicity {
        &self.multiplicity
    }

    /// Returns the signature whose atoms are candidate targets
    ///
    /// This is the target itself, or the subtype named by `SubsetOf`.
    pub fn range(&self) -> SigId {
        self.range
    }
}

/// Registry of signatures and relations
#[derive(Debug, Clone)]
pub struct Schema {
    sigs: Vec<SigDecl>,
    fields: Vec<FieldDecl>,
    sig_index: FxHashMap<String, SigId>,
    field_index: FxHashMap<String, FieldId>,
}

impl Schema {
    /// Creates a schema holding only the builtin `Int` signature
    pub fn new() -> Self {
        let mut schema = Self {
            sigs: Vec::new(),
            fields: Vec::new(),
            sig_index: FxHashMap::default(),
            field_index: FxHashMap::default(),
        };
        schema.push_sig(SigDecl {
            name: INT.to_string(),
            parent: None,
            is_abstract: false,
            is_one: false,
            builtin: true,
            children: Vec::new(),
        });
        schema
    }

    /// Registers a signature
    ///
    /// # Errors
    /// `DuplicateType` if the name is taken, `UnknownParent` if `parent` is
    /// not registered yet, `TypeMismatch` if `parent` cannot be extended.
    pub fn register_sig(&mut self, name: &str, parent: Option<&str>, is_abstract: bool) -> Result<SigId> {
        self.register(name, parent, is_abstract, false)
    }

    /// Registers a signature with exactly one atom (`one sig`)
    ///
    /// # Errors
    /// As [`Schema::register_sig`].
    pub fn register_one_sig(&mut self, name: &str, parent: Option<&str>) -> Result<SigId> {
        self.register(name, parent, false, true)
    }

    fn register(&mut self, name: &str, parent: Option<&str>, is_abstract: bool, is_one: bool) -> Result<SigId> {
        if self.sig_index.contains_key(name) {
            return Err(ModelError::DuplicateType(name.to_string()));
        }
        let parent = match parent {
            None => None,
            Some(p) => {
                let pid = self.sig_id(p).ok_or_else(|| ModelError::UnknownParent {
                    sig: name.to_string(),
                    parent: p.to_string(),
                })?;
                let decl = self.sig(pid);
                if decl.builtin || decl.is_one {
                    return Err(ModelError::TypeMismatch {
                        location: format!("declaration of `{name}`"),
                        detail: format!("`{p}` cannot be extended"),
                    });
                }
                Some(pid)
            }
        };
        let id = self.push_sig(SigDecl {
            name: name.to_string(),
            parent,
            is_abstract,
            is_one,
            builtin: false,
            children: Vec::new(),
        });
        if let Some(pid) = parent {
            self.sigs[pid.0].children.push(id);
        }
        Ok(id)
    }

    fn push_sig(&mut self, decl: SigDecl) -> SigId {
        let id = SigId(self.sigs.len());
        self.sig_index.insert(decl.name.clone(), id);
        self.sigs.push(decl);
        id
    }

    /// Registers a binary relation from `source` to `target`
    ///
    /// # Errors
    /// `DuplicateRelation` if the name is taken, `UnknownType` if either
    /// endpoint (or the `SubsetOf` signature) is unregistered, `TypeMismatch`
    /// if the `SubsetOf` signature is not a subtype of `target`.
    pub fn register_field(
        &mut self,
        name: &str,
        source: &str,
        target: &str,
        multiplicity: Multiplicity,
    ) -> Result<FieldId> {
        if self.field_index.contains_key(name) {
            return Err(ModelError::DuplicateRelation(name.to_string()));
        }
        let location = format!("relation `{name}`");
        let source_id = self.require_sig(source, &location)?;
        let target_id = self.require_sig(target, &location)?;
        let range = match &multiplicity {
            Multiplicity::SubsetOf(sub) => {
                let sub_id = self.require_sig(sub, &location)?;
                if !self.is_subtype(sub_id, target_id) {
                    return Err(ModelError::TypeMismatch {
                        location,
                        detail: format!("`{sub}` is not a subtype of `{target}`"),
                    });
                }
                sub_id
            }
            _ => target_id,
        };

        let id = FieldId(self.fields.len());
        self.field_index.insert(name.to_string(), id);
        self.fields.push(FieldDecl {
            name: name.to_string(),
            source: source_id,
            target: target_id,
            multiplicity,
            range,
        });
        Ok(id)
    }

    fn require_sig(&self, name: &str, location: &str) -> Result<SigId> {
        self.sig_id(name).ok_or_else(|| ModelError::UnknownType {
            name: name.to_string(),
            location: location.to_string(),
        })
    }

    /// Looks up a signature by name
    pub fn sig_id(&self, name: &str) -> Option<SigId> {
        self.sig_index.get(name).copied()
    }

    /// Looks up a relation by name
    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        self.field_index.get(name).copied()
    }

    /// Returns the builtin `Int` signature
    pub fn int_sig(&self) -> SigId {
        SigId(0)
    }

    /// Returns a signature declaration
    pub fn sig(&self, id: SigId) -> &SigDecl {
        &self.sigs[id.0]
    }

    /// Returns a relation declaration
    pub fn field(&self, id: FieldId) -> &FieldDecl {
        &self.fields[id.0]
    }

    /// Returns all signature ids in registration order (builtin `Int` first)
    pub fn sig_ids(&self) -> impl Iterator<Item = SigId> {
        (0..self.sigs.len()).map(SigId)
    }

    /// Returns all relation ids in registration order
    pub fn field_ids(&self) -> impl Iterator<Item = FieldId> {
        (0..self.fields.len()).map(FieldId)
    }

    /// Returns the number of signatures, including `Int`
    pub fn sig_count(&self) -> usize {
        self.sigs.len()
    }

    /// Returns the number of relations
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns `sig` and all of its descendants in registration order
    pub fn type_closure(&self, sig: SigId) -> Vec<SigId> {
        self.sig_ids().filter(|&s| self.is_subtype(s, sig)).collect()
    }

    /// True if `sub` is `sup` or one of its descendants
    pub fn is_subtype(&self, sub: SigId, sup: SigId) -> bool {
        let mut current = Some(sub);
        while let Some(s) = current {
            if s == sup {
                return true;
            }
            current = self.sigs[s.0].parent;
        }
        false
    }

    /// Returns the ancestors of `sig`, nearest first (excluding `sig`)
    pub fn ancestors(&self, sig: SigId) -> Vec<SigId> {
        let mut result = Vec::new();
        let mut current = self.sigs[sig.0].parent;
        while let Some(s) = current {
            result.push(s);
            current = self.sigs[s.0].parent;
        }
        result
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}
