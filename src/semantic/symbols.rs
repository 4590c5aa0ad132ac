//! Symbol resolution for GSC/CSC semantic analysis.
//!
//! Two layers live here:
//!
//! - [`ExportedSymbols`]: the workspace-wide table of function and class
//!   signatures, aggregated by an external registry and read-only during a
//!   run. Lookup is O(1) by unqualified name and by namespace/name pair.
//! - [`SymbolTable`]: the per-CFG-node view. It is rebuilt for every node
//!   visit from the exported table, the built-in API, the node's IN-set of
//!   variable bindings, the node's lexical scope, and (inside a method) the
//!   enclosing class — and it is what the expression analyzer resolves
//!   identifiers against.
//!
//! Reserved engine globals (`level`, `game`, `self`, `anim`) resolve like
//! ordinary bindings but can never be declared over: attempting to does not
//! mutate anything and reports [`SetOutcome::FailedReserved`].

use crate::semantic::builtins::BuiltinApi;
use crate::semantic::types::TypeTag;
use crate::semantic::value::{ScrVariable, VarMap};
use bitflags::bitflags;
use rustc_hash::FxHashMap;

bitflags! {
    /// Declaration-site modifiers on an exported function.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FunctionFlags: u8 {
        const PRIVATE = 1 << 0;
        const AUTOEXEC = 1 << 1;
    }
}

/// A declared parameter of an exported or built-in function.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterInfo {
    pub name: String,
    /// Optional parameters have defaults and don't count toward the
    /// minimum argument count.
    pub optional: bool,
}

/// An exported or built-in function signature.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub namespace: Option<String>,
    pub name: String,
    pub params: Vec<ParameterInfo>,
    /// Variadic functions accept any number of trailing arguments.
    pub vararg: bool,
    /// Inferred tag of the call result. Script functions export `ANY`;
    /// builtins declare precise tags.
    pub return_tag: TypeTag,
    pub flags: FunctionFlags,
    /// Doc comment, surfaced on hover.
    pub doc: Option<String>,
}

impl FunctionSignature {
    /// Minimum number of call arguments (non-optional parameters).
    pub fn min_args(&self) -> usize {
        self.params.iter().filter(|p| !p.optional).count()
    }

    /// Maximum number of call arguments; `None` for variadic functions.
    pub fn max_args(&self) -> Option<usize> {
        if self.vararg {
            None
        } else {
            Some(self.params.len())
        }
    }

    /// Human-readable expected-count label for diagnostics: "2", "1 to 2",
    /// or "at least 1".
    pub fn expected_args_label(&self) -> String {
        let min = self.min_args();
        match self.max_args() {
            None => format!("at least {}", min),
            Some(max) if max == min => format!("{}", min),
            Some(max) => format!("{} to {}", min, max),
        }
    }
}

/// An exported class signature: members and methods.
#[derive(Debug, Clone, Default)]
pub struct ClassSignature {
    pub name: String,
    /// Member name -> inferred tag (refined by the class-members block).
    pub members: FxHashMap<String, TypeTag>,
    pub methods: FxHashMap<String, FunctionSignature>,
}

/// The workspace's exported symbols, read-only during a run.
#[derive(Debug, Clone, Default)]
pub struct ExportedSymbols {
    by_name: FxHashMap<String, FunctionSignature>,
    by_namespace: FxHashMap<String, FxHashMap<String, FunctionSignature>>,
    classes: FxHashMap<String, ClassSignature>,
}

impl ExportedSymbols {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a function under its unqualified name and, when it has a
    /// namespace, under the namespace/name pair as well.
    pub fn define_function(&mut self, sig: FunctionSignature) {
        let name_key = sig.name.to_lowercase();
        if let Some(ns) = &sig.namespace {
            self.by_namespace
                .entry(ns.to_lowercase())
                .or_default()
                .insert(name_key.clone(), sig.clone());
        }
        self.by_name.insert(name_key, sig);
    }

    /// Registers a class signature.
    pub fn define_class(&mut self, class: ClassSignature) {
        self.classes.insert(class.name.to_lowercase(), class);
    }

    /// Unqualified function lookup.
    pub fn function(&self, name: &str) -> Option<&FunctionSignature> {
        self.by_name.get(&name.to_lowercase())
    }

    /// Namespace-qualified function lookup.
    pub fn namespaced_function(&self, namespace: &str, name: &str) -> Option<&FunctionSignature> {
        self.by_namespace
            .get(&namespace.to_lowercase())?
            .get(&name.to_lowercase())
    }

    /// Class lookup.
    pub fn class(&self, name: &str) -> Option<&ClassSignature> {
        self.classes.get(&name.to_lowercase())
    }
}

/// Result of [`SymbolTable::add_or_set_variable_symbol`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// A binding with this name did not exist yet.
    New,
    /// An existing binding was overwritten.
    Mutated,
    /// The name is a reserved engine global; nothing was changed.
    FailedReserved,
}

/// The per-CFG-node symbol view.
///
/// Owns the node's working variable set (seeded from its IN-set); the
/// statement analyzer takes the set back with [`SymbolTable::into_vars`]
/// once the node is processed and stores it as the node's OUT-set.
pub struct SymbolTable<'a> {
    globals: &'a ExportedSymbols,
    builtins: &'a BuiltinApi,
    /// Snapshot of the enclosing class, inside methods only.
    class: Option<ClassSignature>,
    scope: u32,
    vars: VarMap,
}

impl<'a> SymbolTable<'a> {
    pub fn new(
        globals: &'a ExportedSymbols,
        builtins: &'a BuiltinApi,
        class: Option<ClassSignature>,
        scope: u32,
        vars: VarMap,
    ) -> Self {
        Self {
            globals,
            builtins,
            class,
            scope,
            vars,
        }
    }

    /// Lexical scope of the node this table serves.
    pub fn scope(&self) -> u32 {
        self.scope
    }

    /// The enclosing class, inside methods only.
    pub fn enclosing_class(&self) -> Option<&ClassSignature> {
        self.class.as_ref()
    }

    /// The built-in API table.
    pub fn builtins(&self) -> &BuiltinApi {
        self.builtins
    }

    /// Looks up a variable binding reaching this node.
    pub fn try_get_local_variable(&self, name: &str) -> Option<&ScrVariable> {
        self.vars.get(&name.to_lowercase())
    }

    /// Adds or overwrites a variable binding.
    ///
    /// Reserved engine globals fail with [`SetOutcome::FailedReserved`]
    /// rather than mutating.
    pub fn add_or_set_variable_symbol(&mut self, var: ScrVariable) -> SetOutcome {
        if self.builtins.is_reserved(&var.name) {
            return SetOutcome::FailedReserved;
        }
        let key = var.name.to_lowercase();
        if self.vars.insert(key, var).is_some() {
            SetOutcome::Mutated
        } else {
            SetOutcome::New
        }
    }

    /// Inserts a binding unconditionally. Entry-node analysis uses this to
    /// seed the reserved engine globals, which
    /// [`SymbolTable::add_or_set_variable_symbol`] refuses to touch.
    pub fn seed_builtin_global(&mut self, var: ScrVariable) {
        self.vars.insert(var.name.to_lowercase(), var);
    }

    /// Resolves an unqualified function name against the exported table,
    /// then the built-in API. The flag is true for builtins.
    pub fn try_get_function(&self, name: &str) -> Option<(&FunctionSignature, bool)> {
        if let Some(sig) = self.globals.function(name) {
            return Some((sig, false));
        }
        self.builtins.function(name).map(|sig| (sig, true))
    }

    /// Resolves a namespace-qualified function name. Builtins are never
    /// namespaced, so only the exported table is consulted.
    pub fn try_get_namespaced_function_symbol(
        &self,
        namespace: &str,
        name: &str,
    ) -> Option<(&FunctionSignature, bool)> {
        self.globals
            .namespaced_function(namespace, name)
            .map(|sig| (sig, false))
    }

    /// Resolves a method name: built-in methods first, then exported
    /// functions (script methods are plain functions called with a
    /// receiver).
    pub fn try_get_method(&self, name: &str) -> Option<(&FunctionSignature, bool)> {
        if let Some(sig) = self.builtins.method(name) {
            return Some((sig, true));
        }
        self.try_get_function(name)
    }

    /// Looks up an implicit class member, inside methods only.
    pub fn class_member(&self, name: &str) -> Option<TypeTag> {
        self.class
            .as_ref()
            .and_then(|c| c.members.get(&name.to_lowercase()).copied())
    }

    /// Returns true if `name` resolves to anything at all: a reaching
    /// binding, a class member, a reserved global, or a function.
    pub fn contains_symbol(&self, name: &str) -> bool {
        self.try_get_local_variable(name).is_some()
            || self.class_member(name).is_some()
            || self.builtins.is_reserved(name)
            || self.try_get_function(name).is_some()
    }

    /// Consumes the table, yielding the node's working variable set.
    pub fn into_vars(self) -> VarMap {
        self.vars
    }
}
