// module/lookup.rs
//
// Name lookup over the module tree. One algorithm serves every declaration
// kind; the kind only selects which owned and brought lists are searched.

use kiln_identity::{DeclId, ModuleId, Symbol};
use rustc_hash::FxHashSet;

use super::{DeclKind, ModuleKind, ModuleTree};
use crate::visibility::{AccessInfo, is_visible};

/// Why a qualified path failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathError {
    /// No visible module for the segment at this index.
    Module(usize),
    /// The modules resolved but the last segment names nothing visible.
    Decl,
}

impl ModuleTree {
    /// Look up a declaration of `kind` named `name` as seen from `module`.
    ///
    /// Order: owned declarations, then file and folder children, then
    /// brought declarations, then wildcard-brought modules. Libraries below
    /// `module` are never searched.
    pub fn get(
        &self,
        module: ModuleId,
        kind: DeclKind,
        name: Symbol,
        access: &AccessInfo,
    ) -> Option<DeclId> {
        let mut visited = FxHashSet::default();
        self.find_decl(module, kind, name, access, &mut visited)
    }

    pub fn has(&self, module: ModuleId, kind: DeclKind, name: Symbol, access: &AccessInfo) -> bool {
        self.get(module, kind, name, access).is_some()
    }

    /// [`ModuleTree::get`] over several kinds, first match in `kinds` order.
    pub fn get_any(
        &self,
        module: ModuleId,
        kinds: &[DeclKind],
        name: Symbol,
        access: &AccessInfo,
    ) -> Option<DeclId> {
        kinds
            .iter()
            .find_map(|&kind| self.get(module, kind, name, access))
    }

    fn find_decl(
        &self,
        module: ModuleId,
        kind: DeclKind,
        name: Symbol,
        access: &AccessInfo,
        visited: &mut FxHashSet<ModuleId>,
    ) -> Option<DeclId> {
        if !visited.insert(module) {
            return None;
        }
        let m = self.module(module);

        let owned = m.decls.of(kind).iter().copied().find(|&id| {
            let info = self.decl(id);
            info.name.name == name && is_visible(self, &info.visibility, access)
        });
        if owned.is_some() {
            return owned;
        }

        for &child in &m.children {
            if self.module(child).kind.is_transparent()
                && let Some(found) = self.find_decl(child, kind, name, access, visited)
            {
                return Some(found);
            }
        }

        for brought in m.brought.of(kind) {
            let target = self.decl(brought.target);
            if brought.local_name(target.name.name) == name
                && is_visible(self, &brought.visibility, access)
                && is_visible(self, &target.visibility, access)
            {
                return Some(brought.target);
            }
        }

        for wildcard in m.brought_modules.iter().filter(|b| b.wildcard) {
            let target = wildcard.brought.target;
            if is_visible(self, &wildcard.brought.visibility, access)
                && is_visible(self, &self.module(target).visibility, access)
                && let Some(found) = self.find_decl(target, kind, name, access, visited)
            {
                return Some(found);
            }
        }

        None
    }

    /// Look up a named (library) module visible from `module`, in the same
    /// order as declarations.
    pub fn get_module(&self, module: ModuleId, name: Symbol, access: &AccessInfo) -> Option<ModuleId> {
        let mut visited = FxHashSet::default();
        self.find_module(module, name, access, &mut visited)
    }

    pub fn has_module(&self, module: ModuleId, name: Symbol, access: &AccessInfo) -> bool {
        self.get_module(module, name, access).is_some()
    }

    fn find_module(
        &self,
        module: ModuleId,
        name: Symbol,
        access: &AccessInfo,
        visited: &mut FxHashSet<ModuleId>,
    ) -> Option<ModuleId> {
        if !visited.insert(module) {
            return None;
        }
        let m = self.module(module);

        let named = m.children.iter().copied().find(|&child| {
            let c = self.module(child);
            c.kind == ModuleKind::Library
                && c.name.name == name
                && is_visible(self, &c.visibility, access)
        });
        if named.is_some() {
            return named;
        }

        for &child in &m.children {
            if self.module(child).kind.is_transparent()
                && let Some(found) = self.find_module(child, name, access, visited)
            {
                return Some(found);
            }
        }

        for brought in m.brought_modules.iter().filter(|b| !b.wildcard) {
            let target = self.module(brought.brought.target);
            if brought.brought.local_name(target.name.name) == name
                && is_visible(self, &brought.brought.visibility, access)
                && is_visible(self, &target.visibility, access)
            {
                return Some(target.id);
            }
        }

        for wildcard in m.brought_modules.iter().filter(|b| b.wildcard) {
            let target = wildcard.brought.target;
            if is_visible(self, &wildcard.brought.visibility, access)
                && is_visible(self, &self.module(target).visibility, access)
                && let Some(found) = self.find_module(target, name, access, visited)
            {
                return Some(found);
            }
        }

        None
    }

    /// Unqualified lookup from inside `from`: the module itself, then each
    /// enclosing module up to and including the nearest library.
    pub fn resolve_unqualified(
        &self,
        from: ModuleId,
        kinds: &[DeclKind],
        name: Symbol,
        access: &AccessInfo,
    ) -> Option<DeclId> {
        for scope in self.ancestors(from) {
            if let Some(found) = self.get_any(scope, kinds, name, access) {
                return Some(found);
            }
            if self.module(scope).kind == ModuleKind::Library {
                break;
            }
        }
        None
    }

    /// Find the module a qualified path starts at: searched from `from`
    /// upward to the root, then among the top-level libraries.
    pub fn resolve_module(&self, from: ModuleId, name: Symbol, access: &AccessInfo) -> Option<ModuleId> {
        if let Some(found) = self
            .ancestors(from)
            .find_map(|scope| self.get_module(scope, name, access))
        {
            return Some(found);
        }
        self.roots.iter().copied().find(|&root| {
            let m = self.module(root);
            m.kind == ModuleKind::Library
                && m.name.name == name
                && is_visible(self, &m.visibility, access)
        })
    }

    /// Resolve `a::b::Name`. A single segment is an unqualified lookup.
    pub fn resolve_path(
        &self,
        from: ModuleId,
        segments: &[Symbol],
        kinds: &[DeclKind],
        access: &AccessInfo,
    ) -> Result<DeclId, PathError> {
        let Some((&last, modules)) = segments.split_last() else {
            return Err(PathError::Decl);
        };
        let Some((&first, rest)) = modules.split_first() else {
            return self
                .resolve_unqualified(from, kinds, last, access)
                .ok_or(PathError::Decl);
        };

        let mut current = self
            .resolve_module(from, first, access)
            .ok_or(PathError::Module(0))?;
        for (index, &segment) in rest.iter().enumerate() {
            current = self
                .get_module(current, segment, access)
                .ok_or(PathError::Module(index + 1))?;
        }
        self.get_any(current, kinds, last, access)
            .ok_or(PathError::Decl)
    }
}

/// Typed entry points, each a thin wrapper over `get`.
macro_rules! typed_lookups {
    ($($kind:ident => $get:ident, $has:ident;)*) => {
        impl ModuleTree {
            $(
                pub fn $get(&self, module: ModuleId, name: Symbol, access: &AccessInfo) -> Option<DeclId> {
                    self.get(module, DeclKind::$kind, name, access)
                }

                pub fn $has(&self, module: ModuleId, name: Symbol, access: &AccessInfo) -> bool {
                    self.$get(module, name, access).is_some()
                }
            )*
        }
    };
}

typed_lookups! {
    Function => get_function, has_function;
    Struct => get_struct, has_struct;
    Mix => get_mix, has_mix;
    Opaque => get_opaque, has_opaque;
    Choice => get_choice, has_choice;
    Global => get_global, has_global;
    Alias => get_alias, has_alias;
    Generic => get_generic, has_generic;
    Variant => get_variant, has_variant;
}
