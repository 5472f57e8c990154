// visibility.rs
//
// Visibility qualifiers and the predicate that evaluates them.

use kiln_identity::{DeclId, Identifier, ModuleId};

use crate::module::ModuleTree;

/// The kind of scope a declaration is visible in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisibilityKind {
    Public,
    Library,
    Folder,
    File,
    Type,
    Parent,
}

impl VisibilityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VisibilityKind::Public => "public",
            VisibilityKind::Library => "library",
            VisibilityKind::Folder => "folder",
            VisibilityKind::File => "file",
            VisibilityKind::Type => "type",
            VisibilityKind::Parent => "parent",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "public" => VisibilityKind::Public,
            "library" => VisibilityKind::Library,
            "folder" => VisibilityKind::Folder,
            "file" => VisibilityKind::File,
            "type" => VisibilityKind::Type,
            "parent" => VisibilityKind::Parent,
            _ => return None,
        })
    }
}

/// Resolved visibility of a declaration, module or brought reference.
///
/// Scoped kinds carry the module (library/folder/file/parent) or the type
/// (type, and parent inside a type) they are scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisibilityInfo {
    pub kind: VisibilityKind,
    pub module: Option<ModuleId>,
    pub ty: Option<DeclId>,
}

impl VisibilityInfo {
    pub fn public() -> Self {
        Self {
            kind: VisibilityKind::Public,
            module: None,
            ty: None,
        }
    }

    /// Visible from `scope` and every module below it.
    pub fn scoped(kind: VisibilityKind, scope: ModuleId) -> Self {
        Self {
            kind,
            module: Some(scope),
            ty: None,
        }
    }

    /// Visible only from inside the type `owner`.
    pub fn type_scoped(owner: DeclId) -> Self {
        Self {
            kind: VisibilityKind::Type,
            module: None,
            ty: Some(owner),
        }
    }

    pub fn parent(module: ModuleId, ty: Option<DeclId>) -> Self {
        Self {
            kind: VisibilityKind::Parent,
            module: Some(module),
            ty,
        }
    }
}

/// Visibility as written on a declaration, before its scope is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisibilitySpec {
    Public,
    Library,
    Folder,
    File,
    Parent,
    /// Only visible inside the named type.
    Type(Identifier),
}

impl VisibilitySpec {
    pub fn kind(&self) -> VisibilityKind {
        match self {
            VisibilitySpec::Public => VisibilityKind::Public,
            VisibilitySpec::Library => VisibilityKind::Library,
            VisibilitySpec::Folder => VisibilityKind::Folder,
            VisibilitySpec::File => VisibilityKind::File,
            VisibilitySpec::Parent => VisibilityKind::Parent,
            VisibilitySpec::Type(_) => VisibilityKind::Type,
        }
    }
}

/// Who is asking: the requesting module and, inside a type, that type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessInfo {
    pub module: ModuleId,
    pub ty: Option<DeclId>,
}

impl AccessInfo {
    pub fn from_module(module: ModuleId) -> Self {
        Self { module, ty: None }
    }

    pub fn in_type(module: ModuleId, ty: DeclId) -> Self {
        Self {
            module,
            ty: Some(ty),
        }
    }
}

/// Whether something declared with `visibility` may be referenced by
/// `access`.
pub fn is_visible(tree: &ModuleTree, visibility: &VisibilityInfo, access: &AccessInfo) -> bool {
    match visibility.kind {
        VisibilityKind::Public => true,
        VisibilityKind::Library | VisibilityKind::Folder | VisibilityKind::File => visibility
            .module
            .is_some_and(|scope| tree.descends_from(access.module, scope)),
        VisibilityKind::Type => visibility.ty.is_some() && visibility.ty == access.ty,
        VisibilityKind::Parent => match (visibility.ty, access.ty) {
            (Some(declared), Some(requested)) => declared == requested,
            _ => visibility
                .module
                .is_some_and(|scope| tree.descends_from(access.module, scope)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleKind;
    use kiln_identity::{Interner, Span};

    struct Fixture {
        tree: ModuleTree,
        lib: ModuleId,
        file_a: ModuleId,
        file_b: ModuleId,
        other: ModuleId,
    }

    fn fixture() -> Fixture {
        let mut interner = Interner::new();
        let mut tree = ModuleTree::new();
        let mut name = |s: &str| Identifier::intern(&mut interner, s, Span::default());
        let public = VisibilityInfo::public();
        let lib = tree.create(name("geo"), "geo", None, ModuleKind::Library, public);
        let file_a = tree.create(name("a.k"), "geo/a.k", Some(lib), ModuleKind::File, public);
        let file_b = tree.create(name("b.k"), "geo/b.k", Some(lib), ModuleKind::File, public);
        let other = tree.create(name("app"), "app", None, ModuleKind::Library, public);
        Fixture {
            tree,
            lib,
            file_a,
            file_b,
            other,
        }
    }

    #[test]
    fn public_is_visible_everywhere() {
        let f = fixture();
        let vis = VisibilityInfo::public();
        assert!(is_visible(&f.tree, &vis, &AccessInfo::from_module(f.other)));
        assert!(is_visible(&f.tree, &vis, &AccessInfo::from_module(f.file_a)));
    }

    #[test]
    fn library_scope_covers_descendants_only() {
        let f = fixture();
        let vis = VisibilityInfo::scoped(VisibilityKind::Library, f.lib);
        assert!(is_visible(&f.tree, &vis, &AccessInfo::from_module(f.lib)));
        assert!(is_visible(&f.tree, &vis, &AccessInfo::from_module(f.file_b)));
        assert!(!is_visible(&f.tree, &vis, &AccessInfo::from_module(f.other)));
    }

    #[test]
    fn file_scope_excludes_sibling_files() {
        let f = fixture();
        let vis = VisibilityInfo::scoped(VisibilityKind::File, f.file_a);
        assert!(is_visible(&f.tree, &vis, &AccessInfo::from_module(f.file_a)));
        assert!(!is_visible(&f.tree, &vis, &AccessInfo::from_module(f.file_b)));
    }

    #[test]
    fn type_scope_requires_identical_type() {
        let f = fixture();
        let owner = DeclId::new(3);
        let vis = VisibilityInfo::type_scoped(owner);
        assert!(is_visible(&f.tree, &vis, &AccessInfo::in_type(f.other, owner)));
        assert!(!is_visible(&f.tree, &vis, &AccessInfo::in_type(f.file_a, DeclId::new(4))));
        assert!(!is_visible(&f.tree, &vis, &AccessInfo::from_module(f.file_a)));
    }

    #[test]
    fn parent_compares_types_when_both_sides_have_one() {
        let f = fixture();
        let owner = DeclId::new(1);
        let vis = VisibilityInfo::parent(f.file_a, Some(owner));
        assert!(is_visible(&f.tree, &vis, &AccessInfo::in_type(f.other, owner)));
        assert!(!is_visible(&f.tree, &vis, &AccessInfo::in_type(f.file_a, DeclId::new(2))));
        // Requester outside any type falls back to the module rule.
        assert!(is_visible(&f.tree, &vis, &AccessInfo::from_module(f.file_a)));
        assert!(!is_visible(&f.tree, &vis, &AccessInfo::from_module(f.file_b)));
    }

    #[test]
    fn scoped_visibility_without_module_is_never_visible() {
        let f = fixture();
        let vis = VisibilityInfo {
            kind: VisibilityKind::Library,
            module: None,
            ty: None,
        };
        assert!(!is_visible(&f.tree, &vis, &AccessInfo::from_module(f.lib)));
    }
}
