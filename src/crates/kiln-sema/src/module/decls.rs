// module/decls.rs
//
// Declaration kinds, the per-kind lists a module keeps, and registration.

use kiln_identity::{DeclId, EntityId, Identifier, ModuleId, Symbol};

use super::{Brought, ModuleTree};
use crate::visibility::VisibilityInfo;

/// Declares the kinds together with one list field per kind, so that the
/// owned list and the brought list of a kind are always found the same way.
macro_rules! decl_kinds {
    ($($(#[$meta:meta])* $variant:ident => $field:ident, $label:literal;)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum DeclKind {
            $($(#[$meta])* $variant,)*
        }

        impl DeclKind {
            pub const ALL: &'static [DeclKind] = &[$(DeclKind::$variant,)*];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(DeclKind::$variant => $label,)*
                }
            }
        }

        /// Owned declarations of a module, one list per kind.
        #[derive(Debug, Default, Clone)]
        pub struct DeclLists {
            $($field: Vec<DeclId>,)*
        }

        impl DeclLists {
            pub fn of(&self, kind: DeclKind) -> &[DeclId] {
                match kind {
                    $(DeclKind::$variant => &self.$field,)*
                }
            }

            pub(crate) fn of_mut(&mut self, kind: DeclKind) -> &mut Vec<DeclId> {
                match kind {
                    $(DeclKind::$variant => &mut self.$field,)*
                }
            }
        }

        /// Brought declarations of a module, one list per kind.
        #[derive(Debug, Default, Clone)]
        pub struct BroughtLists {
            $($field: Vec<Brought<DeclId>>,)*
        }

        impl BroughtLists {
            pub fn of(&self, kind: DeclKind) -> &[Brought<DeclId>] {
                match kind {
                    $(DeclKind::$variant => &self.$field,)*
                }
            }

            pub(crate) fn of_mut(&mut self, kind: DeclKind) -> &mut Vec<Brought<DeclId>> {
                match kind {
                    $(DeclKind::$variant => &mut self.$field,)*
                }
            }
        }
    };
}

decl_kinds! {
    Function => functions, "function";
    Struct => structs, "struct";
    Mix => mixes, "mix";
    Opaque => opaques, "opaque";
    Choice => choices, "choice";
    Global => globals, "global";
    Alias => aliases, "alias";
    Generic => generics, "generic";
    /// A monomorphized instance of a generic.
    Variant => variants, "variant";
}

impl DeclKind {
    /// Kinds that can be named in a type position.
    pub const TYPES: &'static [DeclKind] = &[
        DeclKind::Struct,
        DeclKind::Mix,
        DeclKind::Opaque,
        DeclKind::Choice,
        DeclKind::Alias,
    ];

    /// Kinds that can be named in a value position.
    pub const VALUES: &'static [DeclKind] = &[DeclKind::Function, DeclKind::Global];

    /// The namespace a kind lives in. Generics and variants take the
    /// namespace of their template, so this is only a default for them.
    pub fn namespace(self) -> Namespace {
        match self {
            DeclKind::Function | DeclKind::Global => Namespace::Value,
            _ => Namespace::Type,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        DeclKind::ALL.iter().copied().find(|kind| kind.as_str() == name)
    }
}

/// Types and values may share a name; two types (or two values) may not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Type,
    Value,
}

/// A registered declaration.
#[derive(Debug, Clone)]
pub struct DeclInfo {
    pub id: DeclId,
    pub name: Identifier,
    pub kind: DeclKind,
    pub namespace: Namespace,
    pub module: ModuleId,
    pub visibility: VisibilityInfo,
    /// Scheduler state, linked once the entity is created.
    pub entity: Option<EntityId>,
    /// For variants: the generic they were instantiated from.
    pub generic: Option<DeclId>,
}

impl ModuleTree {
    /// Append a declaration to the matching list of `module`. Collisions
    /// are checked by the caller through [`ModuleTree::find_collision`].
    pub fn add_declaration(
        &mut self,
        module: ModuleId,
        kind: DeclKind,
        namespace: Namespace,
        name: Identifier,
        visibility: VisibilityInfo,
    ) -> DeclId {
        let id = DeclId::new(self.decls.len() as u32);
        self.decls.push(DeclInfo {
            id,
            name,
            kind,
            namespace,
            module,
            visibility,
            entity: None,
            generic: None,
        });
        self.module_mut(module).decls.of_mut(kind).push(id);
        id
    }

    pub fn decl(&self, id: DeclId) -> &DeclInfo {
        &self.decls[id.as_usize()]
    }

    pub(crate) fn decl_mut(&mut self, id: DeclId) -> &mut DeclInfo {
        &mut self.decls[id.as_usize()]
    }

    pub fn decl_count(&self) -> usize {
        self.decls.len()
    }

    pub fn decls(&self) -> impl Iterator<Item = &DeclInfo> {
        self.decls.iter()
    }

    /// An existing declaration that `name` in `namespace` would clash with
    /// if declared in `module`.
    ///
    /// The search covers the enclosing library and every file and folder
    /// below it, but not nested libraries. Variants never collide: their
    /// names are unique per argument list.
    pub fn find_collision(
        &self,
        module: ModuleId,
        namespace: Namespace,
        name: Symbol,
    ) -> Option<DeclId> {
        let root = self.namespace_root(module);
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let m = self.module(current);
            for &kind in DeclKind::ALL {
                if kind == DeclKind::Variant {
                    continue;
                }
                let clash = m.decls.of(kind).iter().copied().find(|&id| {
                    let info = self.decl(id);
                    info.namespace == namespace && info.name.name == name
                });
                if clash.is_some() {
                    return clash;
                }
            }
            stack.extend(
                m.children
                    .iter()
                    .copied()
                    .filter(|&child| self.module(child).kind.is_transparent()),
            );
        }
        None
    }
}
