use kiln_identity::{DeclId, Identifier, Interner, ModuleId, Span, Symbol};

use super::*;
use crate::visibility::{AccessInfo, VisibilityInfo, VisibilityKind};

struct Builder {
    interner: Interner,
    tree: ModuleTree,
}

impl Builder {
    fn new() -> Self {
        Self {
            interner: Interner::new(),
            tree: ModuleTree::new(),
        }
    }

    fn ident(&mut self, name: &str) -> Identifier {
        Identifier::intern(&mut self.interner, name, Span::default())
    }

    fn sym(&mut self, name: &str) -> Symbol {
        self.interner.intern(name)
    }

    fn module(&mut self, name: &str, parent: Option<ModuleId>, kind: ModuleKind) -> ModuleId {
        let ident = self.ident(name);
        self.tree
            .create(ident, name, parent, kind, VisibilityInfo::public())
    }

    fn declare(&mut self, module: ModuleId, kind: DeclKind, name: &str, vis: VisibilityKind) -> DeclId {
        let ident = self.ident(name);
        let visibility = match self.tree.visibility_scope(vis, module) {
            Some(scope) => VisibilityInfo::scoped(vis, scope),
            None => VisibilityInfo::public(),
        };
        self.tree
            .add_declaration(module, kind, kind.namespace(), ident, visibility)
    }
}

fn access(module: ModuleId) -> AccessInfo {
    AccessInfo::from_module(module)
}

#[test]
fn full_name_skips_files_and_folders() {
    let mut b = Builder::new();
    let std = b.module("std", None, ModuleKind::Library);
    let folder = b.module("collections", Some(std), ModuleKind::Folder);
    let inner = b.module("hash", Some(folder), ModuleKind::Library);
    let file = b.module("map.k", Some(inner), ModuleKind::File);

    assert_eq!(b.tree.full_name(file, &b.interner), "std::hash");
    assert_eq!(b.tree.full_name(folder, &b.interner), "std");
    assert_eq!(b.tree.full_name(std, &b.interner), "std");

    let loose = b.module("script.k", None, ModuleKind::File);
    assert_eq!(b.tree.full_name(loose, &b.interner), "");
}

#[test]
fn create_links_parent_and_children() {
    let mut b = Builder::new();
    let lib = b.module("geo", None, ModuleKind::Library);
    let a = b.module("a.k", Some(lib), ModuleKind::File);
    let c = b.module("c.k", Some(lib), ModuleKind::File);

    assert_eq!(b.tree.module(lib).children(), &[a, c]);
    assert_eq!(b.tree.module(a).parent, Some(lib));
    assert_eq!(b.tree.roots(), &[lib]);
    assert_eq!(b.tree.find_by_path("geo/c.k", &b.interner), Some(c));
    assert_eq!(b.tree.find_by_path("geo/missing", &b.interner), None);
}

#[test]
fn has_agrees_with_get_for_every_kind() {
    let mut b = Builder::new();
    let lib = b.module("geo", None, ModuleKind::Library);
    let file = b.module("a.k", Some(lib), ModuleKind::File);
    let other = b.module("app", None, ModuleKind::Library);
    for &kind in DeclKind::ALL {
        b.declare(file, kind, kind.as_str(), VisibilityKind::Library);
    }
    let names: Vec<Symbol> = DeclKind::ALL.iter().map(|k| b.sym(k.as_str())).collect();

    for &module in &[lib, file, other] {
        for &kind in DeclKind::ALL {
            for &name in &names {
                let acc = access(module);
                assert_eq!(
                    b.tree.has(lib, kind, name, &acc),
                    b.tree.get(lib, kind, name, &acc).is_some()
                );
            }
        }
    }
}

#[test]
fn repeated_get_is_stable() {
    let mut b = Builder::new();
    let lib = b.module("geo", None, ModuleKind::Library);
    let point = b.declare(lib, DeclKind::Struct, "Point", VisibilityKind::Public);
    let name = b.sym("Point");

    let first = b.tree.get_struct(lib, name, &access(lib));
    let second = b.tree.get_struct(lib, name, &access(lib));
    assert_eq!(first, Some(point));
    assert_eq!(first, second);
}

#[test]
fn library_scope_resolves_from_descendant_not_sibling() {
    let mut b = Builder::new();
    let geo = b.module("geo", None, ModuleKind::Library);
    let shapes = b.module("shapes.k", Some(geo), ModuleKind::File);
    let app = b.module("app", None, ModuleKind::Library);
    let hidden = b.declare(shapes, DeclKind::Function, "area", VisibilityKind::Library);
    let shown = b.declare(shapes, DeclKind::Function, "perimeter", VisibilityKind::Public);
    let area = b.sym("area");
    let perimeter = b.sym("perimeter");

    assert_eq!(b.tree.get_function(geo, area, &access(shapes)), Some(hidden));
    assert_eq!(b.tree.get_function(geo, area, &access(app)), None);
    assert_eq!(b.tree.get_function(geo, perimeter, &access(app)), Some(shown));
}

#[test]
fn wildcard_bring_respects_target_visibility() {
    let mut b = Builder::new();
    let a = b.module("A", None, ModuleKind::Library);
    let sibling = b.module("B", None, ModuleKind::Library);
    b.declare(a, DeclKind::Function, "f", VisibilityKind::Library);
    b.tree
        .bring_module(sibling, a, VisibilityInfo::public(), None, true, Span::default());
    let f = b.sym("f");

    assert!(!b.tree.has_function(sibling, f, &access(sibling)));
}

#[test]
fn wildcard_bring_exposes_public_declarations() {
    let mut b = Builder::new();
    let a = b.module("A", None, ModuleKind::Library);
    let file = b.module("lib.k", Some(a), ModuleKind::File);
    let sibling = b.module("B", None, ModuleKind::Library);
    let g = b.declare(file, DeclKind::Function, "g", VisibilityKind::Public);
    b.tree
        .bring_module(sibling, a, VisibilityInfo::public(), None, true, Span::default());
    let name = b.sym("g");

    assert_eq!(b.tree.get_function(sibling, name, &access(sibling)), Some(g));
}

#[test]
fn direct_declarations_shadow_brought_ones() {
    let mut b = Builder::new();
    let geo = b.module("geo", None, ModuleKind::Library);
    let app = b.module("app", None, ModuleKind::Library);
    let theirs = b.declare(geo, DeclKind::Struct, "Point", VisibilityKind::Public);
    let ours = b.declare(app, DeclKind::Struct, "Point", VisibilityKind::Public);
    b.tree
        .bring(app, theirs, VisibilityInfo::public(), None, Span::default());
    let name = b.sym("Point");

    assert_eq!(b.tree.get_struct(app, name, &access(app)), Some(ours));
}

#[test]
fn brought_declaration_found_by_rename_only() {
    let mut b = Builder::new();
    let geo = b.module("geo", None, ModuleKind::Library);
    let app = b.module("app", None, ModuleKind::Library);
    let point = b.declare(geo, DeclKind::Struct, "Point", VisibilityKind::Public);
    let rename = b.ident("P");
    b.tree
        .bring(app, point, VisibilityInfo::public(), Some(rename), Span::default());
    let p = b.sym("P");
    let original = b.sym("Point");

    assert_eq!(b.tree.get_struct(app, p, &access(app)), Some(point));
    assert_eq!(b.tree.get_struct(app, original, &access(app)), None);
}

#[test]
fn bring_visibility_gates_independently_of_target() {
    let mut b = Builder::new();
    let geo = b.module("geo", None, ModuleKind::Library);
    let app = b.module("app", None, ModuleKind::Library);
    let main = b.module("main.k", Some(app), ModuleKind::File);
    let tool = b.module("tool", None, ModuleKind::Library);
    let point = b.declare(geo, DeclKind::Struct, "Point", VisibilityKind::Public);
    b.tree.bring(
        app,
        point,
        VisibilityInfo::scoped(VisibilityKind::Library, app),
        None,
        Span::default(),
    );
    let name = b.sym("Point");

    assert_eq!(b.tree.get_struct(app, name, &access(main)), Some(point));
    assert_eq!(b.tree.get_struct(app, name, &access(tool)), None);
}

#[test]
fn libraries_are_opaque_to_unqualified_lookup() {
    let mut b = Builder::new();
    let outer = b.module("outer", None, ModuleKind::Library);
    let inner = b.module("inner", Some(outer), ModuleKind::Library);
    let file = b.module("x.k", Some(outer), ModuleKind::File);
    b.declare(inner, DeclKind::Global, "LIMIT", VisibilityKind::Public);
    let count = b.declare(file, DeclKind::Global, "COUNT", VisibilityKind::Public);
    let hidden = b.sym("LIMIT");
    let name = b.sym("COUNT");

    assert_eq!(b.tree.get_global(outer, hidden, &access(outer)), None);
    assert_eq!(b.tree.get_global(outer, name, &access(outer)), Some(count));
}

#[test]
fn cyclic_wildcard_brings_terminate() {
    let mut b = Builder::new();
    let a = b.module("A", None, ModuleKind::Library);
    let c = b.module("C", None, ModuleKind::Library);
    b.tree
        .bring_module(a, c, VisibilityInfo::public(), None, true, Span::default());
    b.tree
        .bring_module(c, a, VisibilityInfo::public(), None, true, Span::default());
    let missing = b.sym("missing");

    assert_eq!(b.tree.get_function(a, missing, &access(a)), None);
    assert_eq!(b.tree.get_module(a, missing, &access(a)), None);
}

#[test]
fn resolve_unqualified_reaches_sibling_files_of_the_library() {
    let mut b = Builder::new();
    let geo = b.module("geo", None, ModuleKind::Library);
    let a = b.module("a.k", Some(geo), ModuleKind::File);
    let other = b.module("b.k", Some(geo), ModuleKind::File);
    let point = b.declare(other, DeclKind::Struct, "Point", VisibilityKind::Library);
    let name = b.sym("Point");

    assert_eq!(b.tree.get_struct(a, name, &access(a)), None);
    assert_eq!(
        b.tree.resolve_unqualified(a, DeclKind::TYPES, name, &access(a)),
        Some(point)
    );
}

#[test]
fn resolve_path_walks_library_segments() {
    let mut b = Builder::new();
    let std = b.module("std", None, ModuleKind::Library);
    let math = b.module("math", Some(std), ModuleKind::Library);
    let file = b.module("vec.k", Some(math), ModuleKind::File);
    let app = b.module("app", None, ModuleKind::Library);
    let main = b.module("main.k", Some(app), ModuleKind::File);
    let vec2 = b.declare(file, DeclKind::Struct, "Vec2", VisibilityKind::Public);
    let segments = [b.sym("std"), b.sym("math"), b.sym("Vec2")];

    assert_eq!(
        b.tree.resolve_path(main, &segments, DeclKind::TYPES, &access(main)),
        Ok(vec2)
    );

    let wrong = [b.sym("std"), b.sym("geometry"), b.sym("Vec2")];
    assert_eq!(
        b.tree.resolve_path(main, &wrong, DeclKind::TYPES, &access(main)),
        Err(PathError::Module(1))
    );

    let missing = [b.sym("std"), b.sym("math"), b.sym("Vec3")];
    assert_eq!(
        b.tree.resolve_path(main, &missing, DeclKind::TYPES, &access(main)),
        Err(PathError::Decl)
    );
}

#[test]
fn brought_module_can_be_renamed() {
    let mut b = Builder::new();
    let geo = b.module("geometry", None, ModuleKind::Library);
    let app = b.module("app", None, ModuleKind::Library);
    let point = b.declare(geo, DeclKind::Struct, "Point", VisibilityKind::Public);
    let rename = b.ident("g");
    b.tree
        .bring_module(app, geo, VisibilityInfo::public(), Some(rename), false, Span::default());
    let g = b.sym("g");
    let segments = [g, b.sym("Point")];

    assert_eq!(b.tree.get_module(app, g, &access(app)), Some(geo));
    assert_eq!(
        b.tree.resolve_path(app, &segments, DeclKind::TYPES, &access(app)),
        Ok(point)
    );
}

#[test]
fn collisions_span_the_whole_library() {
    let mut b = Builder::new();
    let geo = b.module("geo", None, ModuleKind::Library);
    let folder = b.module("shapes", Some(geo), ModuleKind::Folder);
    let file = b.module("point.k", Some(folder), ModuleKind::File);
    let other = b.module("other.k", Some(geo), ModuleKind::File);
    let nested = b.module("nested", Some(geo), ModuleKind::Library);
    let point = b.declare(file, DeclKind::Struct, "Point", VisibilityKind::File);
    let name = b.sym("Point");

    assert_eq!(b.tree.find_collision(other, Namespace::Type, name), Some(point));
    assert_eq!(b.tree.find_collision(other, Namespace::Value, name), None);
    assert_eq!(b.tree.find_collision(nested, Namespace::Type, name), None);
}

#[test]
fn visibility_scope_picks_enclosing_module() {
    let mut b = Builder::new();
    let geo = b.module("geo", None, ModuleKind::Library);
    let folder = b.module("shapes", Some(geo), ModuleKind::Folder);
    let file = b.module("point.k", Some(folder), ModuleKind::File);
    let top = b.module("top.k", Some(geo), ModuleKind::File);
    let tree = &b.tree;

    assert_eq!(tree.visibility_scope(VisibilityKind::Library, file), Some(geo));
    assert_eq!(tree.visibility_scope(VisibilityKind::Folder, file), Some(folder));
    assert_eq!(tree.visibility_scope(VisibilityKind::Folder, top), Some(geo));
    assert_eq!(tree.visibility_scope(VisibilityKind::File, file), Some(file));
    assert_eq!(tree.visibility_scope(VisibilityKind::Public, file), None);
}
