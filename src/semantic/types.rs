//! Type tags for GSC/CSC semantic analysis.
//!
//! GSC is weakly typed: a variable's type is whatever was last assigned to
//! it, and a variable merged from several control-flow paths can be several
//! things at once. [`TypeTag`] is therefore a *bitset* rather than an enum —
//! a join over paths is a bitwise union.
//!
//! Two tags are proper supersets by construction:
//!
//! - `ISTRING` (interned/localized string) contains the `STRING` bit, so
//!   anything accepting a string accepts an interned string.
//! - `ENTITY` contains the `STRUCT` bit: engine entities behave as structs
//!   with a predefined field schema on top.
//!
//! Two sentinels bound the lattice:
//!
//! - [`TypeTag::ANY`] — all bits set, "could be anything". Absorbs under
//!   union; the graceful-degradation value whenever inference fails.
//! - [`TypeTag::VOID`] — no bits set, "this position never produces a
//!   value" (e.g. a threaded call). A `VOID` reaching a merge with a typed
//!   value signals an analyzer bug, not a script error.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Bitset of possible runtime types for one value position.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeTag: u32 {
        const UNDEFINED = 1 << 0;
        const BOOL = 1 << 1;
        const INT = 1 << 2;
        const FLOAT = 1 << 3;
        const STRING = 1 << 4;
        /// Interned (localized) string; a proper supertype of `STRING`.
        const ISTRING = (1 << 5) | Self::STRING.bits();
        const ARRAY = 1 << 6;
        const VECTOR3 = 1 << 7;
        const STRUCT = 1 << 8;
        /// Engine entity; a proper supertype of `STRUCT`.
        const ENTITY = (1 << 9) | Self::STRUCT.bits();
        const OBJECT = 1 << 10;
        const HASH = 1 << 11;
        const ANIMTREE = 1 << 12;
        const ANIM = 1 << 13;
        const FUNCTION = 1 << 14;
        const FUNCTION_POINTER = 1 << 15;
    }
}

impl TypeTag {
    /// Top of the lattice: all bits set, absorbs under union.
    pub const ANY: TypeTag = TypeTag::all();

    /// Bottom sentinel: no bits set, "never produces a value".
    pub const VOID: TypeTag = TypeTag::empty();

    /// The numeric tags.
    pub const NUMERIC: TypeTag = TypeTag::INT.union(TypeTag::FLOAT);

    /// Tags that support `[key]` indexing.
    pub const INDEXABLE: TypeTag = TypeTag::ARRAY.union(TypeTag::ISTRING);

    /// Tags whose values carry named fields.
    pub const COMPOSITE: TypeTag = TypeTag::ENTITY.union(TypeTag::OBJECT);

    /// Returns true if every bit is set.
    pub fn is_any(self) -> bool {
        self == TypeTag::ANY
    }

    /// Returns true if no bit is set.
    pub fn is_void(self) -> bool {
        self.is_empty()
    }

    /// Returns true if this value *could* be one of `other`'s types.
    ///
    /// This is the permissive check used for operand validation: a value of
    /// tag `INT | STRING` may be numeric, so arithmetic on it is not
    /// diagnosed.
    pub fn may_be(self, other: TypeTag) -> bool {
        self.intersects(other)
    }

    /// Returns true if this value is *definitely* one of `other`'s types
    /// (non-void and fully contained).
    ///
    /// This is the strict check used before constant folding and before
    /// committing to a folded result type.
    pub fn is_definitely(self, other: TypeTag) -> bool {
        !self.is_void() && other.contains(self)
    }

    /// Returns true if this value could be numeric (int or float).
    pub fn is_numeric(self) -> bool {
        self.may_be(TypeTag::NUMERIC)
    }

    /// Returns true if a conditional can test this value.
    ///
    /// GSC conditionals are weakly typed: any produced value works (an
    /// undefined or zero value is falsy, everything else truthy). Only
    /// `VOID` — a position that never produces a value at all — is invalid.
    pub fn can_evaluate_to_boolean(self) -> bool {
        !self.is_void()
    }
}

/// Display order for tag names. Supertypes come before their contained
/// subtypes so `ENTITY` prints as "entity", not "entity|struct".
const TAG_NAMES: &[(TypeTag, &str)] = &[
    (TypeTag::UNDEFINED, "undefined"),
    (TypeTag::BOOL, "bool"),
    (TypeTag::INT, "int"),
    (TypeTag::FLOAT, "float"),
    (TypeTag::ISTRING, "istring"),
    (TypeTag::STRING, "string"),
    (TypeTag::ARRAY, "array"),
    (TypeTag::VECTOR3, "vector"),
    (TypeTag::ENTITY, "entity"),
    (TypeTag::STRUCT, "struct"),
    (TypeTag::OBJECT, "object"),
    (TypeTag::HASH, "hash"),
    (TypeTag::ANIMTREE, "animtree"),
    (TypeTag::ANIM, "anim"),
    (TypeTag::FUNCTION, "function"),
    (TypeTag::FUNCTION_POINTER, "function pointer"),
];

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            return write!(f, "any");
        }
        if self.is_void() {
            return write!(f, "void");
        }

        let mut remaining = *self;
        let mut first = true;
        for (tag, name) in TAG_NAMES {
            if remaining.contains(*tag) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{}", name)?;
                remaining.remove(*tag);
                first = false;
            }
        }
        Ok(())
    }
}
