//! Scope graph and binding service.
//!
//! The scope-graph computation itself is an external collaborator; this
//! module defines the graph shape the core consumes, plus the augmentation
//! and bookkeeping the core performs on it: registering configured/declared
//! globals, resolving pending references against them, and tracking
//! used/exported status of bindings.
//!
//! `used`/`exported` are `Cell`s: rules flag bindings while the rest of the
//! graph stays frozen, under the crate's single-threaded execution model.

use crate::ast::NodeId;
use crate::config::GlobalSetting;
use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};

/// Index of a scope in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a variable binding in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableId(u32);

impl VariableId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of an identifier reference in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceId(u32);

impl ReferenceId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Kind of a lexical scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// The outermost scope.
    Global,
    /// Module top-level scope.
    Module,
    /// Ordinary function scope.
    Function,
    /// Synthetic scope holding only a function expression's own name;
    /// transparently unwrapped to its unique child by scope resolution.
    FunctionExpressionName,
    /// Braced block scope.
    Block,
    /// Class scope.
    Class,
    /// Scope of a class field initializer.
    ClassFieldInitializer,
    /// Scope of a class static initialization block.
    ClassStaticBlock,
    /// Catch-clause scope.
    Catch,
}

/// Optional bookkeeping for implicitly created globals.
///
/// Some scope-graph producers track assignments to undeclared names here;
/// others omit the structure entirely. It is an optional integration point,
/// never assumed to exist.
#[derive(Debug, Default)]
pub struct ImplicitBindings {
    /// Name lookup for implicitly created bindings.
    pub set: HashMap<String, VariableId>,
    /// The implicit bindings, in creation order.
    pub variables: Vec<VariableId>,
    /// References still pending resolution against implicit bindings.
    pub left: Vec<ReferenceId>,
}

/// One lexical scope.
#[derive(Debug)]
pub struct Scope {
    /// Scope kind.
    pub kind: ScopeKind,
    /// AST node that introduced the scope.
    pub node: NodeId,
    /// Enclosing scope; `None` only for the global scope.
    pub upper: Option<ScopeId>,
    /// Nested scopes, in source order.
    pub child_scopes: Vec<ScopeId>,
    /// Bindings declared in this scope.
    pub variables: Vec<VariableId>,
    set: HashMap<String, VariableId>,
    /// Identifier references occurring in this scope.
    pub references: Vec<ReferenceId>,
    through: Vec<ReferenceId>,
    implicit: Option<ImplicitBindings>,
}

impl Scope {
    /// Looks up a binding by name in this scope only.
    #[must_use]
    pub fn binding(&self, name: &str) -> Option<VariableId> {
        self.set.get(name).copied()
    }

    /// References that escaped this scope unresolved; pruned as outer
    /// augmentation resolves them.
    #[must_use]
    pub fn through(&self) -> &[ReferenceId] {
        &self.through
    }

    /// Implicit-binding bookkeeping, if the producer exposes one.
    #[must_use]
    pub fn implicit(&self) -> Option<&ImplicitBindings> {
        self.implicit.as_ref()
    }
}

/// A named binding.
#[derive(Debug)]
pub struct Variable {
    /// Binding name.
    pub name: String,
    /// Scope that owns the binding.
    pub scope: ScopeId,
    /// Definition sites; empty for augmented globals.
    pub defs: Vec<NodeId>,
    /// References resolved to this binding.
    pub references: Vec<ReferenceId>,
    used: Cell<bool>,
    exported: Cell<bool>,
    /// Writability derived from the effective global setting, if any.
    pub writeable: Option<bool>,
    implicit_setting: Option<GlobalSetting>,
    explicit_setting: Option<GlobalSetting>,
}

impl Variable {
    /// Whether any rule flagged this binding as used.
    #[must_use]
    pub fn is_used(&self) -> bool {
        self.used.get()
    }

    /// Whether the binding is marked as externally consumed.
    #[must_use]
    pub fn is_exported(&self) -> bool {
        self.exported.get()
    }

    /// Configuration-supplied setting, if any.
    #[must_use]
    pub fn implicit_setting(&self) -> Option<GlobalSetting> {
        self.implicit_setting
    }

    /// Inline-directive setting, if any. Takes precedence over the
    /// configuration-supplied one.
    #[must_use]
    pub fn explicit_setting(&self) -> Option<GlobalSetting> {
        self.explicit_setting
    }
}

/// An identifier occurrence, resolved or pending.
#[derive(Debug)]
pub struct Reference {
    /// The identifier node.
    pub identifier: NodeId,
    /// Referenced name.
    pub name: String,
    /// Scope the reference occurs in.
    pub from: ScopeId,
    /// Binding the reference resolved to, if any.
    pub resolved: Option<VariableId>,
}

/// A prebuilt scope graph plus the core's augmentation state.
#[derive(Debug)]
pub struct ScopeGraph {
    scopes: Vec<Scope>,
    variables: Vec<Variable>,
    references: Vec<Reference>,
    by_node: HashMap<NodeId, Vec<ScopeId>>,
    declared: HashMap<NodeId, Vec<VariableId>>,
    root: ScopeId,
}

impl ScopeGraph {
    /// The global scope.
    #[must_use]
    pub fn root(&self) -> ScopeId {
        self.root
    }

    /// Looks up a scope.
    #[must_use]
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    /// Looks up a variable.
    #[must_use]
    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.index()]
    }

    /// Looks up a reference.
    #[must_use]
    pub fn reference(&self, id: ReferenceId) -> &Reference {
        &self.references[id.index()]
    }

    /// Zero-or-one scopes introduced by `node`. With `inner`, the innermost
    /// of several scopes keyed to the same node is preferred.
    #[must_use]
    pub fn acquire(&self, node: NodeId, inner: bool) -> Option<ScopeId> {
        let scopes = self.by_node.get(&node)?;
        if inner {
            scopes.last().copied()
        } else {
            scopes.first().copied()
        }
    }

    /// Variables declared by `node`, if any.
    #[must_use]
    pub fn declared_variables(&self, node: NodeId) -> &[VariableId] {
        self.declared.get(&node).map_or(&[], Vec::as_slice)
    }

    /// Binding for `name` in the global scope, if any.
    #[must_use]
    pub fn global_binding(&self, name: &str) -> Option<VariableId> {
        self.scopes[self.root.index()].binding(name)
    }

    /// The scope where top-level name resolution starts: the module scope
    /// when the program is a module (the global scope's child keyed to the
    /// AST root), otherwise the global scope itself.
    #[must_use]
    pub fn top_level_scope(&self, ast_root: NodeId) -> ScopeId {
        let global = &self.scopes[self.root.index()];
        global
            .child_scopes
            .first()
            .copied()
            .filter(|&child| self.scopes[child.index()].node == ast_root)
            .unwrap_or(self.root)
    }

    /// Registers configured and inline-declared globals on the root scope.
    ///
    /// An inline declaration always overrides a configuration-supplied one
    /// for the same name. `Off` settings are skipped entirely. Existing
    /// unresolved references in the root scope's pending list whose name now
    /// matches a binding are resolved and removed; the implicit-binding
    /// bookkeeping, when present, is pruned the same way.
    ///
    /// Input is assumed normalized; malformed raw settings are rejected by
    /// [`crate::config::normalize_global_setting`] before this point.
    /// Idempotent: augmenting twice with the same inputs yields the same
    /// binding set and settings.
    pub fn augment_globals(
        &mut self,
        configured: &[(String, GlobalSetting)],
        inline: &[(String, GlobalSetting)],
    ) {
        let mut merged: BTreeMap<&str, (Option<GlobalSetting>, Option<GlobalSetting>)> =
            BTreeMap::new();
        for (name, setting) in configured {
            merged.entry(name).or_default().0 = Some(*setting);
        }
        for (name, setting) in inline {
            merged.entry(name).or_default().1 = Some(*setting);
        }

        let root = self.root.index();
        for (name, (implicit_setting, explicit_setting)) in merged {
            let Some(setting) = explicit_setting.or(implicit_setting) else {
                continue;
            };
            if setting == GlobalSetting::Off {
                continue;
            }

            let existing = self.scopes[root].binding(name).or_else(|| {
                self.scopes[root]
                    .implicit
                    .as_ref()
                    .and_then(|implicit| implicit.set.get(name).copied())
            });
            let var_id = match existing {
                Some(id) => id,
                None => {
                    let id = VariableId(u32::try_from(self.variables.len()).unwrap_or(u32::MAX));
                    self.variables.push(Variable {
                        name: name.to_string(),
                        scope: self.root,
                        defs: Vec::new(),
                        references: Vec::new(),
                        used: Cell::new(false),
                        exported: Cell::new(false),
                        writeable: None,
                        implicit_setting: None,
                        explicit_setting: None,
                    });
                    self.scopes[root].variables.push(id);
                    id
                }
            };
            self.scopes[root].set.insert(name.to_string(), var_id);

            let variable = &mut self.variables[var_id.index()];
            variable.implicit_setting = implicit_setting;
            variable.explicit_setting = explicit_setting;
            variable.writeable = Some(setting.is_writable());
        }

        self.resolve_pending_root_references();
    }

    /// Resolves root-scope pending references against the (possibly just
    /// augmented) binding table.
    fn resolve_pending_root_references(&mut self) {
        let root = self.root.index();

        let pending = std::mem::take(&mut self.scopes[root].through);
        let mut still_pending = Vec::new();
        for ref_id in pending {
            let name = &self.references[ref_id.index()].name;
            if let Some(&var_id) = self.scopes[root].set.get(name) {
                self.references[ref_id.index()].resolved = Some(var_id);
                self.variables[var_id.index()].references.push(ref_id);
            } else {
                still_pending.push(ref_id);
            }
        }
        self.scopes[root].through = still_pending;

        // Same pruning for the optional implicit bookkeeping.
        if let Some(mut implicit) = self.scopes[root].implicit.take() {
            implicit.left.retain(|ref_id| {
                let name = &self.references[ref_id.index()].name;
                !self.scopes[root].set.contains_key(name)
            });
            self.scopes[root].implicit = Some(implicit);
        }
    }

    /// Flags the first binding named `name` on the scope chain starting at
    /// `start` as used. Returns false when the chain is exhausted; callers
    /// interpret that as "not a tracked local".
    pub fn mark_used_from(&self, start: ScopeId, name: &str) -> bool {
        let mut current = Some(start);
        while let Some(id) = current {
            let scope = &self.scopes[id.index()];
            if let Some(var_id) = scope.binding(name) {
                self.variables[var_id.index()].used.set(true);
                return true;
            }
            current = scope.upper;
        }
        false
    }

    /// Flags each named root-scope binding as used and exported. Export
    /// implies implicit use, since external consumers may reference it.
    pub fn mark_exported(&self, names: &[String]) {
        for name in names {
            if let Some(var_id) = self.global_binding(name) {
                let variable = &self.variables[var_id.index()];
                variable.used.set(true);
                variable.exported.set(true);
            }
        }
    }

    /// True exactly when the root-scope binding for `name` has zero local
    /// definitions and `identifier` is registered among its references.
    #[must_use]
    pub fn is_global_reference(&self, name: &str, identifier: NodeId) -> bool {
        let Some(var_id) = self.global_binding(name) else {
            return false;
        };
        let variable = &self.variables[var_id.index()];
        variable.defs.is_empty()
            && variable
                .references
                .iter()
                .any(|&r| self.references[r.index()].identifier == identifier)
    }
}

/// Builder used by scope-graph producers and tests.
#[derive(Debug, Default)]
pub struct ScopeGraphBuilder {
    scopes: Vec<Scope>,
    variables: Vec<Variable>,
    references: Vec<Reference>,
    by_node: HashMap<NodeId, Vec<ScopeId>>,
    declared: HashMap<NodeId, Vec<VariableId>>,
}

impl ScopeGraphBuilder {
    /// Creates an empty builder. The first scope added must be the global
    /// scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a scope keyed to `node`. Scopes keyed to the same node must be
    /// added outermost first.
    pub fn scope(&mut self, kind: ScopeKind, node: NodeId, upper: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(u32::try_from(self.scopes.len()).unwrap_or(u32::MAX));
        if let Some(upper_id) = upper {
            self.scopes[upper_id.index()].child_scopes.push(id);
        }
        self.scopes.push(Scope {
            kind,
            node,
            upper,
            child_scopes: Vec::new(),
            variables: Vec::new(),
            set: HashMap::new(),
            references: Vec::new(),
            through: Vec::new(),
            implicit: None,
        });
        self.by_node.entry(node).or_default().push(id);
        id
    }

    /// Adds a binding to `scope`, recording its defining nodes.
    pub fn variable(&mut self, scope: ScopeId, name: &str, defs: Vec<NodeId>) -> VariableId {
        let id = VariableId(u32::try_from(self.variables.len()).unwrap_or(u32::MAX));
        for def in &defs {
            self.declared.entry(*def).or_default().push(id);
        }
        self.variables.push(Variable {
            name: name.to_string(),
            scope,
            defs,
            references: Vec::new(),
            used: Cell::new(false),
            exported: Cell::new(false),
            writeable: None,
            implicit_setting: None,
            explicit_setting: None,
        });
        self.scopes[scope.index()].variables.push(id);
        self.scopes[scope.index()].set.insert(name.to_string(), id);
        id
    }

    /// Adds a reference occurring in `scope`. Unresolved references are
    /// recorded as pending (`through`) on their scope and every enclosing
    /// scope.
    pub fn reference(
        &mut self,
        scope: ScopeId,
        identifier: NodeId,
        name: &str,
        resolved: Option<VariableId>,
    ) -> ReferenceId {
        let id = ReferenceId(u32::try_from(self.references.len()).unwrap_or(u32::MAX));
        self.references.push(Reference {
            identifier,
            name: name.to_string(),
            from: scope,
            resolved,
        });
        self.scopes[scope.index()].references.push(id);
        match resolved {
            Some(var_id) => self.variables[var_id.index()].references.push(id),
            None => {
                let mut current = Some(scope);
                while let Some(scope_id) = current {
                    self.scopes[scope_id.index()].through.push(id);
                    current = self.scopes[scope_id.index()].upper;
                }
            }
        }
        id
    }

    /// Attaches implicit-binding bookkeeping to a scope and registers a
    /// pending reference in its `left` list.
    pub fn implicit_left(&mut self, scope: ScopeId, reference: ReferenceId) {
        self.scopes[scope.index()]
            .implicit
            .get_or_insert_with(ImplicitBindings::default)
            .left
            .push(reference);
    }

    /// Finalizes the graph.
    ///
    /// # Panics
    ///
    /// Panics if no scope was added; a graph without a global scope is a
    /// programming-contract violation on the producer's side.
    #[must_use]
    pub fn build(self) -> ScopeGraph {
        assert!(
            !self.scopes.is_empty(),
            "scope graph must contain at least the global scope"
        );
        ScopeGraph {
            scopes: self.scopes,
            variables: self.variables,
            references: self.references,
            by_node: self.by_node,
            declared: self.declared,
            root: ScopeId(0),
        }
    }
}
