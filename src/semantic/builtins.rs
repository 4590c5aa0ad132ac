//! Built-in engine API signatures and entity schemas.
//!
//! The engine exposes a fixed set of script-callable functions and methods,
//! plus a handful of reserved globals (`level`, `game`, `self`, `anim`).
//! This table is what the analyzer resolves against after the workspace's
//! exported symbols, and what flags a hit as a language builtin for sense
//! tokens.
//!
//! Built-in entity types (player, weapon, vehicle, ...) carry a *schema*: a
//! static set of predefined fields, some read-only. Field reads on a
//! schema-backed entity materialize the declared type; writes to a
//! read-only schema field are diagnosed and never mutate the schema.
//!
//! The table here is representative, not exhaustive — the real registry is
//! generated from engine dumps and merged in by the workspace layer.

use crate::semantic::symbols::{FunctionFlags, FunctionSignature, ParameterInfo};
use crate::semantic::types::TypeTag;
use rustc_hash::FxHashMap;

/// One predefined field of a built-in entity type.
#[derive(Debug)]
pub struct SchemaField {
    pub name: &'static str,
    pub tag: TypeTag,
    pub read_only: bool,
}

/// The fixed field set of a built-in entity type.
#[derive(Debug)]
pub struct EntitySchema {
    pub name: &'static str,
    pub fields: &'static [SchemaField],
}

impl EntitySchema {
    /// Looks up a declared field by name.
    pub fn field(&self, name: &str) -> Option<&'static SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Schema for player entities.
pub static PLAYER_SCHEMA: EntitySchema = EntitySchema {
    name: "player",
    fields: &[
        SchemaField {
            name: "name",
            tag: TypeTag::STRING,
            read_only: true,
        },
        SchemaField {
            name: "classname",
            tag: TypeTag::STRING,
            read_only: true,
        },
        SchemaField {
            name: "origin",
            tag: TypeTag::VECTOR3,
            read_only: false,
        },
        SchemaField {
            name: "angles",
            tag: TypeTag::VECTOR3,
            read_only: false,
        },
        SchemaField {
            name: "health",
            tag: TypeTag::INT,
            read_only: false,
        },
        SchemaField {
            name: "team",
            tag: TypeTag::STRING,
            read_only: false,
        },
        SchemaField {
            name: "sessionstate",
            tag: TypeTag::STRING,
            read_only: false,
        },
    ],
};

/// Schema for weapon objects.
pub static WEAPON_SCHEMA: EntitySchema = EntitySchema {
    name: "weapon",
    fields: &[
        SchemaField {
            name: "name",
            tag: TypeTag::STRING,
            read_only: true,
        },
        SchemaField {
            name: "clipsize",
            tag: TypeTag::INT,
            read_only: true,
        },
        SchemaField {
            name: "isriotshield",
            tag: TypeTag::BOOL,
            read_only: true,
        },
    ],
};

/// Schema for vehicle entities.
pub static VEHICLE_SCHEMA: EntitySchema = EntitySchema {
    name: "vehicle",
    fields: &[
        SchemaField {
            name: "classname",
            tag: TypeTag::STRING,
            read_only: true,
        },
        SchemaField {
            name: "origin",
            tag: TypeTag::VECTOR3,
            read_only: false,
        },
        SchemaField {
            name: "angles",
            tag: TypeTag::VECTOR3,
            read_only: false,
        },
        SchemaField {
            name: "health",
            tag: TypeTag::INT,
            read_only: false,
        },
    ],
};

/// Looks up an entity schema by name.
pub fn schema(name: &str) -> Option<&'static EntitySchema> {
    match name {
        "player" => Some(&PLAYER_SCHEMA),
        "weapon" => Some(&WEAPON_SCHEMA),
        "vehicle" => Some(&VEHICLE_SCHEMA),
        _ => None,
    }
}

/// Reserved engine globals: always bound, never declarable over.
///
/// `game` is the persistent cross-map array; the rest are entities/objects
/// the engine injects into every thread.
pub const RESERVED_GLOBALS: &[(&str, TypeTag)] = &[
    ("level", TypeTag::ENTITY),
    ("game", TypeTag::ARRAY),
    ("self", TypeTag::ENTITY),
    ("anim", TypeTag::OBJECT),
];

/// The built-in API signature table, queried by lowercase name.
pub struct BuiltinApi {
    functions: FxHashMap<String, FunctionSignature>,
    methods: FxHashMap<String, FunctionSignature>,
    /// Builtin functions whose entity result carries a fixed schema.
    return_schemas: FxHashMap<String, &'static EntitySchema>,
}

impl BuiltinApi {
    /// Builds the table with the engine API pre-registered.
    pub fn new() -> Self {
        let mut api = Self {
            functions: FxHashMap::default(),
            methods: FxHashMap::default(),
            return_schemas: FxHashMap::default(),
        };
        api.register_functions();
        api.register_methods();
        api
    }

    /// Looks up a builtin function by name.
    pub fn function(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.get(&name.to_lowercase())
    }

    /// Looks up a builtin method by name.
    pub fn method(&self, name: &str) -> Option<&FunctionSignature> {
        self.methods.get(&name.to_lowercase())
    }

    /// Returns the entity schema a builtin's return value carries, if any.
    pub fn return_schema(&self, name: &str) -> Option<&'static EntitySchema> {
        self.return_schemas.get(&name.to_lowercase()).copied()
    }

    /// Returns true if `name` is a reserved engine global.
    pub fn is_reserved(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        RESERVED_GLOBALS.iter().any(|(n, _)| *n == lower)
    }

    /// Returns the declared tag of a reserved engine global.
    pub fn reserved_global(&self, name: &str) -> Option<TypeTag> {
        let lower = name.to_lowercase();
        RESERVED_GLOBALS
            .iter()
            .find(|(n, _)| *n == lower)
            .map(|(_, tag)| *tag)
    }

    fn register(&mut self, sig: FunctionSignature) {
        self.functions.insert(sig.name.to_lowercase(), sig);
    }

    fn register_method(&mut self, sig: FunctionSignature) {
        self.methods.insert(sig.name.to_lowercase(), sig);
    }

    fn register_functions(&mut self) {
        // Dvar access
        self.register(sig("getdvar", &["name", "?default"], false, TypeTag::STRING));
        self.register(sig("getdvarint", &["name", "?default"], false, TypeTag::INT));
        self.register(sig(
            "getdvarfloat",
            &["name", "?default"],
            false,
            TypeTag::FLOAT,
        ));
        self.register(sig("setdvar", &["name", "value"], false, TypeTag::UNDEFINED));

        // Entity lookup / creation
        self.register(sig("getent", &["name", "key"], false, TypeTag::ENTITY));
        self.register(sig("getentarray", &["?name", "?key"], false, TypeTag::ARRAY));
        self.register(sig("spawn", &["classname", "origin"], false, TypeTag::ENTITY));
        self.register(sig("spawnstruct", &[], false, TypeTag::STRUCT));
        self.register(sig("getweapon", &["name"], false, TypeTag::ENTITY));
        self.register(sig("getplayers", &["?team"], false, TypeTag::ARRAY));
        self.return_schemas.insert("getweapon".to_string(), &WEAPON_SCHEMA);

        // Math / vectors
        self.register(sig("distance", &["a", "b"], false, TypeTag::FLOAT));
        self.register(sig("distancesquared", &["a", "b"], false, TypeTag::FLOAT));
        self.register(sig("length", &["v"], false, TypeTag::FLOAT));
        self.register(sig("vectornormalize", &["v"], false, TypeTag::VECTOR3));
        self.register(sig("vectordot", &["a", "b"], false, TypeTag::FLOAT));
        self.register(sig("anglestoforward", &["angles"], false, TypeTag::VECTOR3));
        self.register(sig("randomint", &["max"], false, TypeTag::INT));
        self.register(sig("randomintrange", &["min", "max"], false, TypeTag::INT));
        self.register(sig("randomfloat", &["max"], false, TypeTag::FLOAT));
        self.register(sig("abs", &["n"], false, TypeTag::FLOAT));
        self.register(sig("int", &["value"], false, TypeTag::INT));
        self.register(sig("float", &["value"], false, TypeTag::FLOAT));

        // Introspection / time
        self.register(sig("isdefined", &["value"], false, TypeTag::BOOL));
        self.register(sig("isplayer", &["ent"], false, TypeTag::BOOL));
        self.register(sig("gettime", &[], false, TypeTag::INT));

        // Printing (variadic)
        self.register(sig("iprintln", &[], true, TypeTag::UNDEFINED));
        self.register(sig("iprintlnbold", &[], true, TypeTag::UNDEFINED));
        self.register(sig("println", &[], true, TypeTag::UNDEFINED));
    }

    fn register_methods(&mut self) {
        self.register_method(sig(
            "gettagorigin",
            &["tag"],
            false,
            TypeTag::VECTOR3,
        ));
        self.register_method(sig("getorigin", &[], false, TypeTag::VECTOR3));
        self.register_method(sig("setorigin", &["origin"], false, TypeTag::UNDEFINED));
        self.register_method(sig("setmodel", &["model"], false, TypeTag::UNDEFINED));
        self.register_method(sig("playsound", &["alias"], false, TypeTag::UNDEFINED));
        self.register_method(sig(
            "giveweapon",
            &["weapon", "?camo"],
            false,
            TypeTag::UNDEFINED,
        ));
        self.register_method(sig("takeallweapons", &[], false, TypeTag::UNDEFINED));
        self.register_method(sig(
            "getcurrentweapon",
            &[],
            false,
            TypeTag::ENTITY,
        ));
        self.register_method(sig("delete", &[], false, TypeTag::UNDEFINED));
        self.register_method(sig(
            "waittill",
            &["notify"],
            true,
            TypeTag::UNDEFINED,
        ));
        self.register_method(sig("notify", &["notify"], true, TypeTag::UNDEFINED));
        self.register_method(sig("endon", &["notify"], true, TypeTag::UNDEFINED));
        self.return_schemas
            .insert("getcurrentweapon".to_string(), &WEAPON_SCHEMA);
    }
}

impl Default for BuiltinApi {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a builtin signature. Parameter names prefixed with `?` are
/// optional.
fn sig(name: &str, params: &[&str], vararg: bool, return_tag: TypeTag) -> FunctionSignature {
    FunctionSignature {
        namespace: None,
        name: name.to_string(),
        params: params
            .iter()
            .map(|p| ParameterInfo {
                name: p.trim_start_matches('?').to_string(),
                optional: p.starts_with('?'),
            })
            .collect(),
        vararg,
        return_tag,
        flags: FunctionFlags::empty(),
        doc: None,
    }
}
