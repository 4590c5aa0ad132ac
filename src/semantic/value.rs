//! Type values (`ScrData`), aggregates, and the control-flow-join merge.
//!
//! [`ScrData`] is the immutable value abstraction everything else leans on:
//! a [`TypeTag`] bitset, an optional concrete value (for constant folding),
//! a read-only flag, and — for values read out of a struct/entity field — a
//! back-reference recording which aggregate field it came from, so result
//! consumers (hover, navigation) can name the origin of a field read.
//!
//! Aggregates live in a [`StructArena`] owned by one analysis run and are
//! addressed by [`StructId`] index. The owner back-reference is an index
//! into that arena, never an owning pointer: the aggregate owns its fields,
//! not vice versa.
//!
//! # Merge semantics
//!
//! [`StructArena::merge`] implements the lattice join used when predecessor
//! OUT-sets meet at a CFG node:
//!
//! - tags are unioned; `ANY` absorbs everything;
//! - if all inputs carry the same tag and a known value, the values merge
//!   deeply (field-wise for aggregates, keeping a field only when at least
//!   one contributor defines it and the merged field is not already `ANY`);
//! - otherwise the result keeps the unioned tag with an unknown value.
//!
//! Aggregate values are deep-copied on merge and on [`StructArena::deep_copy`]
//! so a successor node never aliases its predecessors' state.

use crate::semantic::builtins::EntitySchema;
use crate::semantic::types::TypeTag;
use rustc_hash::FxHashMap;

/// Index of an aggregate within one analysis run's [`StructArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StructId(pub usize);

/// A resolved function identity, carried by function and function-pointer
/// values so calls through pointers can still surface signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionHandle {
    pub namespace: Option<String>,
    pub name: String,
}

/// A concrete, statically-known value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Vector(f64, f64, f64),
    Function(FunctionHandle),
    /// An aggregate (struct or entity) in the run's arena.
    Struct(StructId),
}

/// Back-reference from a field value to the aggregate it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    pub owner: StructId,
    pub field: String,
}

/// The type value: tag bitset plus optional known value.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrData {
    /// What this value could be at runtime.
    pub tag: TypeTag,
    /// The concrete value, when statically known.
    pub value: Option<ScrValue>,
    /// Whether assignment to this value is an error (constants, schema
    /// fields marked read-only).
    pub read_only: bool,
    /// Set when this data was read out of an aggregate field. Purely
    /// descriptive: field writes resolve their target from the assignment
    /// expression, not from this reference.
    pub owner: Option<FieldRef>,
}

impl ScrData {
    /// A value of the given tag with no known concrete value.
    pub fn of(tag: TypeTag) -> Self {
        Self {
            tag,
            value: None,
            read_only: false,
            owner: None,
        }
    }

    /// The lattice top: unknown, could be anything.
    pub fn any() -> Self {
        Self::of(TypeTag::ANY)
    }

    /// The no-value sentinel (threaded calls, analyzer-internal defaults).
    pub fn void() -> Self {
        Self::of(TypeTag::VOID)
    }

    /// The `undefined` value.
    pub fn undefined() -> Self {
        Self::of(TypeTag::UNDEFINED)
    }

    /// A known integer.
    pub fn int(v: i64) -> Self {
        Self {
            value: Some(ScrValue::Int(v)),
            ..Self::of(TypeTag::INT)
        }
    }

    /// A known float.
    pub fn float(v: f64) -> Self {
        Self {
            value: Some(ScrValue::Float(v)),
            ..Self::of(TypeTag::FLOAT)
        }
    }

    /// A known boolean.
    pub fn boolean(v: bool) -> Self {
        Self {
            value: Some(ScrValue::Bool(v)),
            ..Self::of(TypeTag::BOOL)
        }
    }

    /// A known string.
    pub fn string(v: impl Into<String>) -> Self {
        Self {
            value: Some(ScrValue::String(v.into())),
            ..Self::of(TypeTag::STRING)
        }
    }

    /// A known interned (localized) string.
    pub fn istring(v: impl Into<String>) -> Self {
        Self {
            value: Some(ScrValue::String(v.into())),
            ..Self::of(TypeTag::ISTRING)
        }
    }

    /// A known vector.
    pub fn vector(x: f64, y: f64, z: f64) -> Self {
        Self {
            value: Some(ScrValue::Vector(x, y, z)),
            ..Self::of(TypeTag::VECTOR3)
        }
    }

    /// A resolved function or function pointer, depending on `tag`.
    pub fn function(handle: FunctionHandle, tag: TypeTag) -> Self {
        Self {
            value: Some(ScrValue::Function(handle)),
            ..Self::of(tag)
        }
    }

    /// An aggregate reference; `tag` distinguishes struct from entity.
    pub fn aggregate(id: StructId, tag: TypeTag) -> Self {
        Self {
            value: Some(ScrValue::Struct(id)),
            ..Self::of(tag)
        }
    }

    /// Marks this value read-only.
    pub fn into_read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Attaches an owner back-reference.
    pub fn with_owner(mut self, owner: FieldRef) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn is_any(&self) -> bool {
        self.tag.is_any()
    }

    pub fn is_void(&self) -> bool {
        self.tag.is_void()
    }

    /// The statically-known truthiness of this value, if determinable.
    ///
    /// GSC conditionals test "defined and non-zero": numeric zero and
    /// `undefined` are falsy, every other defined value is truthy.
    pub fn truthiness(&self) -> Option<bool> {
        if let Some(value) = &self.value {
            return Some(match value {
                ScrValue::Bool(b) => *b,
                ScrValue::Int(i) => *i != 0,
                ScrValue::Float(f) => *f != 0.0,
                ScrValue::String(_)
                | ScrValue::Vector(..)
                | ScrValue::Function(_)
                | ScrValue::Struct(_) => true,
            });
        }
        if self.tag == TypeTag::UNDEFINED {
            return Some(false);
        }
        None
    }
}

/// A variable binding flowing through the CFG.
///
/// Identity is structural (name + data + scope): the worklist's
/// stabilization check compares bindings by content, never by allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrVariable {
    /// Original-case name (map keys are lowercased; GSC is case-insensitive).
    pub name: String,
    pub data: ScrData,
    /// Nesting depth of the block that created the binding.
    pub lexical_scope: u32,
    /// Global bindings survive merges into shallower scopes.
    pub is_global: bool,
}

/// The variable map carried as a node's IN- or OUT-set, keyed by lowercased
/// name.
pub type VarMap = FxHashMap<String, ScrVariable>;

/// An aggregate: custom fields plus an optional fixed engine schema.
#[derive(Debug, Clone)]
pub struct ScrStruct {
    pub fields: FxHashMap<String, ScrData>,
    /// Predefined field set for built-in entity types (player, weapon, ...).
    pub schema: Option<&'static EntitySchema>,
}

/// Arena of aggregates owned by one analysis run.
#[derive(Debug, Default)]
pub struct StructArena {
    structs: Vec<ScrStruct>,
}

impl StructArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh aggregate, optionally backed by an engine schema.
    pub fn alloc(&mut self, schema: Option<&'static EntitySchema>) -> StructId {
        let id = StructId(self.structs.len());
        self.structs.push(ScrStruct {
            fields: FxHashMap::default(),
            schema,
        });
        id
    }

    pub fn get(&self, id: StructId) -> Option<&ScrStruct> {
        self.structs.get(id.0)
    }

    /// Reads a field, materializing schema fields with their declared tag,
    /// read-only flag, and an owner back-reference.
    ///
    /// Returns `None` if the aggregate has no such field (custom or schema).
    pub fn field(&self, id: StructId, name: &str) -> Option<ScrData> {
        let aggregate = self.get(id)?;
        if let Some(data) = aggregate.fields.get(name) {
            return Some(data.clone().with_owner(FieldRef {
                owner: id,
                field: name.to_string(),
            }));
        }
        if let Some(schema) = aggregate.schema
            && let Some(field) = schema.field(name)
        {
            let mut data = ScrData::of(field.tag);
            data.read_only = field.read_only;
            return Some(data.with_owner(FieldRef {
                owner: id,
                field: name.to_string(),
            }));
        }
        None
    }

    /// Returns true if writing `name` on this aggregate is forbidden:
    /// either the schema declares it read-only, or a stored custom field is
    /// marked read-only.
    pub fn field_is_read_only(&self, id: StructId, name: &str) -> bool {
        let Some(aggregate) = self.get(id) else {
            return false;
        };
        if let Some(data) = aggregate.fields.get(name) {
            return data.read_only;
        }
        if let Some(schema) = aggregate.schema
            && let Some(field) = schema.field(name)
        {
            return field.read_only;
        }
        false
    }

    /// Writes a field. The stored copy drops any stale owner back-reference
    /// and records this aggregate as the owner implicitly (by storage).
    pub fn set_field(&mut self, id: StructId, name: &str, mut data: ScrData) {
        data.owner = None;
        if let Some(aggregate) = self.structs.get_mut(id.0) {
            aggregate.fields.insert(name.to_string(), data);
        }
    }

    /// Deep-copies a value: aggregates are cloned into fresh arena slots so
    /// the copy never aliases the original.
    pub fn deep_copy(&mut self, data: &ScrData) -> ScrData {
        let mut copy = data.clone();
        if let Some(ScrValue::Struct(id)) = &data.value {
            let source = match self.get(*id) {
                Some(s) => s.clone(),
                None => return copy,
            };
            let fresh = self.alloc(source.schema);
            for (name, field) in &source.fields {
                let field_copy = self.deep_copy(field);
                self.set_field(fresh, name, field_copy);
            }
            copy.value = Some(ScrValue::Struct(fresh));
        }
        copy
    }

    /// Structural equality between two values, chasing aggregate ids
    /// through the arena. Owner back-references are ignored — they are
    /// bookkeeping, not value identity.
    pub fn data_eq(&self, a: &ScrData, b: &ScrData) -> bool {
        if a.tag != b.tag || a.read_only != b.read_only {
            return false;
        }
        match (&a.value, &b.value) {
            (None, None) => true,
            (Some(ScrValue::Struct(x)), Some(ScrValue::Struct(y))) => self.struct_eq(*x, *y),
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    fn struct_eq(&self, x: StructId, y: StructId) -> bool {
        let (Some(a), Some(b)) = (self.get(x), self.get(y)) else {
            return false;
        };
        let schema_matches = match (a.schema, b.schema) {
            (None, None) => true,
            (Some(sa), Some(sb)) => sa.name == sb.name,
            _ => false,
        };
        if !schema_matches || a.fields.len() != b.fields.len() {
            return false;
        }
        a.fields.iter().all(|(name, fa)| {
            b.fields
                .get(name)
                .is_some_and(|fb| self.data_eq(fa, fb))
        })
    }

    /// Structural equality between two variable maps.
    pub fn vars_eq(&self, a: &VarMap, b: &VarMap) -> bool {
        if a.len() != b.len() {
            return false;
        }
        a.iter().all(|(key, va)| {
            b.get(key).is_some_and(|vb| {
                va.name == vb.name
                    && va.lexical_scope == vb.lexical_scope
                    && va.is_global == vb.is_global
                    && self.data_eq(&va.data, &vb.data)
            })
        })
    }

    /// Lattice join over one or more values. See the module docs for the
    /// exact semantics.
    pub fn merge(&mut self, inputs: &[ScrData]) -> ScrData {
        match inputs {
            [] => ScrData::undefined(),
            [single] => self.deep_copy(single),
            _ => self.merge_many(inputs),
        }
    }

    fn merge_many(&mut self, inputs: &[ScrData]) -> ScrData {
        if inputs.iter().any(|d| d.is_any()) {
            return ScrData::any();
        }

        let mut tag = TypeTag::VOID;
        for data in inputs {
            tag |= data.tag;
        }
        let read_only = inputs.iter().all(|d| d.read_only);

        let same_tag = inputs.iter().all(|d| d.tag == inputs[0].tag);
        let all_known = inputs.iter().all(|d| d.value.is_some());
        if !(same_tag && all_known) {
            let mut result = ScrData::of(tag);
            result.read_only = read_only;
            return result;
        }

        // Same tag, all values known. Aggregates merge field-wise; scalars
        // survive only when every contributor agrees.
        let struct_ids: Vec<StructId> = inputs
            .iter()
            .filter_map(|d| match &d.value {
                Some(ScrValue::Struct(id)) => Some(*id),
                _ => None,
            })
            .collect();

        if struct_ids.len() == inputs.len() {
            let merged = self.merge_structs(&struct_ids);
            let mut result = ScrData::aggregate(merged, tag);
            result.read_only = read_only;
            return result;
        }

        let first = &inputs[0];
        let all_equal = inputs[1..].iter().all(|d| self.data_eq(first, d));
        let mut result = if all_equal {
            self.deep_copy(first)
        } else {
            ScrData::of(tag)
        };
        result.read_only = read_only;
        result.owner = None;
        result
    }

    fn merge_structs(&mut self, ids: &[StructId]) -> StructId {
        let schemas: Vec<Option<&'static EntitySchema>> = ids
            .iter()
            .filter_map(|id| self.get(*id))
            .map(|s| s.schema)
            .collect();
        let common_schema = match schemas.split_first() {
            Some((first, rest))
                if rest
                    .iter()
                    .all(|s| s.map(|x| x.name) == first.map(|x| x.name)) =>
            {
                *first
            }
            _ => None,
        };

        // Union of field names, in deterministic order.
        let mut names: Vec<String> = Vec::new();
        for id in ids {
            if let Some(aggregate) = self.get(*id) {
                for name in aggregate.fields.keys() {
                    if !names.contains(name) {
                        names.push(name.clone());
                    }
                }
            }
        }
        names.sort_unstable();

        let merged = self.alloc(common_schema);
        for name in names {
            let contributors: Vec<ScrData> = ids
                .iter()
                .filter_map(|id| self.get(*id))
                .filter_map(|s| s.fields.get(&name).cloned())
                .collect();
            if contributors.is_empty() {
                continue;
            }
            let mut field = self.merge(&contributors);
            if contributors.len() < ids.len() {
                // Some contributors are silent about this field: it may be
                // undefined on those paths, and any known value is stale.
                field.tag |= TypeTag::UNDEFINED;
                field.value = None;
            }
            if field.is_any() {
                continue;
            }
            self.set_field(merged, &name, field);
        }
        merged
    }
}
