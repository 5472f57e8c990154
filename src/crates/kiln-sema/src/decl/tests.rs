use kiln_identity::{DeclId, PrimitiveType};

use super::*;
use crate::codegen::Emitted;
use crate::entity::{
    AGGREGATE_PLAN, ALIAS_PLAN, FUNCTION_PLAN, GENERIC_PLAN, GLOBAL_PLAN, OPAQUE_PLAN, Status,
};
use crate::test_support::{Fixture, with_visibility};
use crate::types::Ty;

fn layout(f: &Fixture, decl: DeclId) -> Option<Emitted> {
    f.sink
        .items_for(decl)
        .find(|item| matches!(item.payload, Emitted::Layout { .. }))
        .map(|item| item.payload.clone())
}

#[test]
fn each_node_kind_has_its_plan() {
    let mut f = Fixture::new();
    let i32_ty = f.prim(PrimitiveType::I32);
    let function = DeclNode::Function(f.function("run", Vec::new(), None, Vec::new()));
    let strukt = f.strukt("Point", Vec::new());
    let opaque = f.opaque("Handle");
    let global = f.global("COUNT", i32_ty.clone(), Vec::new());
    let alias = f.alias("Int", i32_ty);
    let body = f.aggregate(AggregateKind::Struct, "Box", Vec::new());
    let params = vec![f.type_param("T", None)];
    let generic = f.generic("Box", params, None, GenericBody::Type(body));

    assert!(std::ptr::eq(function.plan(), &FUNCTION_PLAN));
    assert!(std::ptr::eq(strukt.plan(), &AGGREGATE_PLAN));
    assert!(std::ptr::eq(opaque.plan(), &OPAQUE_PLAN));
    assert!(std::ptr::eq(global.plan(), &GLOBAL_PLAN));
    assert!(std::ptr::eq(alias.plan(), &ALIAS_PLAN));
    assert!(std::ptr::eq(generic.plan(), &GENERIC_PLAN));
    assert_eq!(generic.namespace(), Namespace::Type);
    assert_eq!(global.namespace(), Namespace::Value);
}

#[test]
fn type_scoped_declarations_stay_inside_their_type() {
    let mut f = Fixture::new();
    let geo = f.library("geo", None);
    let inner_ref = f.named("Inner");
    let point = f.strukt("Point", vec![("inner", inner_ref)]);
    let point = f.declare(geo, point).unwrap();
    let x = f.prim(PrimitiveType::I32);
    let inner = f.strukt("Inner", vec![("x", x)]);
    let owner = f.ident("Point");
    let inner = f.declare(geo, with_visibility(inner, VisibilitySpec::Type(owner)));
    let outside = f.named("Inner");
    let leak = DeclNode::Function(f.function("leak", vec![outside], None, Vec::new()));
    let leak = f.declare(geo, leak).unwrap();

    f.run();

    assert_eq!(f.errors(), ["cannot find type 'Inner' in this scope"]);
    assert_eq!(f.status(point), Status::Complete);
    assert_eq!(
        layout(&f, point),
        Some(Emitted::Layout {
            fields: vec![(f.program.db().interner.lookup("inner").unwrap(), Ty::Named(inner.unwrap()))],
            mixins: Vec::new(),
            cases: Vec::new(),
        })
    );
    assert!(f.is_poisoned(leak));
}

#[test]
fn unknown_owner_type_is_reported_at_declaration() {
    let mut f = Fixture::new();
    let geo = f.library("geo", None);
    let inner = f.strukt("Inner", Vec::new());
    let owner = f.ident("Nowhere");

    let declared = f.declare(geo, with_visibility(inner, VisibilitySpec::Type(owner)));

    assert_eq!(declared, None);
    assert_eq!(f.errors(), ["cannot find type 'Nowhere' in this scope"]);
}

#[test]
fn files_of_one_library_share_a_namespace() {
    let mut f = Fixture::new();
    let geo = f.library("geo", None);
    let a = f.file("a.k", geo);
    let b = f.file("b.k", geo);
    let first = f.strukt("Point", Vec::new());
    assert!(f.declare(a, first).is_some());
    let second = f.strukt("Point", Vec::new());
    assert!(f.declare(b, second).is_none());

    assert_eq!(f.errors(), ["the name 'Point' is defined multiple times"]);
}

#[test]
fn types_and_values_do_not_collide() {
    let mut f = Fixture::new();
    let geo = f.library("geo", None);
    let shape = f.strukt("Shape", Vec::new());
    let shape = f.declare(geo, shape).unwrap();
    let shape_ty = f.named("Shape");
    let make = DeclNode::Function(f.function("Shape", Vec::new(), Some(shape_ty), Vec::new()));
    let make = f.declare(geo, make).unwrap();

    f.run();

    assert!(f.errors().is_empty(), "{:?}", f.errors());
    let ret = f.sink.items_for(make).find_map(|item| match &item.payload {
        Emitted::Signature { ret, .. } => ret.clone(),
        _ => None,
    });
    assert_eq!(ret, Some(Ty::Named(shape)));
}

#[test]
fn separate_libraries_may_reuse_names() {
    let mut f = Fixture::new();
    let geo = f.library("geo", None);
    let app = f.library("app", None);
    let first = f.strukt("Point", Vec::new());
    let second = f.strukt("Point", Vec::new());

    assert!(f.declare(geo, first).is_some());
    assert!(f.declare(app, second).is_some());
    assert!(f.errors().is_empty());
}

#[test]
fn qualified_paths_walk_nested_libraries() {
    let mut f = Fixture::new();
    let geo = f.library("geo", None);
    let shapes = f.library("shapes", Some(geo));
    let circle = f.strukt("Circle", Vec::new());
    let circle = f.declare(shapes, circle).unwrap();
    let app = f.library("app", None);
    let ty = f.named("geo::shapes::Circle");
    let draw = DeclNode::Function(f.function("draw", vec![ty], None, Vec::new()));
    let draw = f.declare(app, draw).unwrap();

    f.run();

    assert!(f.errors().is_empty(), "{:?}", f.errors());
    let params = f.sink.items_for(draw).find_map(|item| match &item.payload {
        Emitted::Signature { params, .. } => Some(params.clone()),
        _ => None,
    });
    assert_eq!(params, Some(vec![Ty::Named(circle)]));
}

#[test]
fn unknown_module_in_path() {
    let mut f = Fixture::new();
    let app = f.library("app", None);
    let ty = f.named("nowhere::Thing");
    let draw = DeclNode::Function(f.function("draw", vec![ty], None, Vec::new()));
    f.declare(app, draw);

    f.run();

    assert_eq!(f.errors(), ["cannot find module 'nowhere'"]);
}

#[test]
fn values_are_not_types() {
    let mut f = Fixture::new();
    let app = f.library("app", None);
    let i32_ty = f.prim(PrimitiveType::I32);
    let count = f.global("COUNT", i32_ty, Vec::new());
    f.declare(app, count);
    let ty = f.named("COUNT");
    let draw = DeclNode::Function(f.function("draw", vec![ty], None, Vec::new()));
    f.declare(app, draw);

    f.run();

    assert_eq!(f.errors(), ["cannot find type 'COUNT' in this scope"]);
}

#[test]
fn choice_cases_carry_payloads() {
    let mut f = Fixture::new();
    let geo = f.library("geo", None);
    let point = f.strukt("Point", Vec::new());
    let point = f.declare(geo, point).unwrap();
    let payload = f.named("Point");
    let shape = f.choice("Shape", vec![("Dot", Some(payload)), ("Empty", None)]);
    let shape = f.declare(geo, shape).unwrap();

    f.run();

    assert!(f.errors().is_empty(), "{:?}", f.errors());
    let Some(Emitted::Layout { cases, .. }) = layout(&f, shape) else {
        panic!("no layout for Shape");
    };
    let payloads: Vec<_> = cases.into_iter().map(|(_, payload)| payload).collect();
    assert_eq!(payloads, [Some(Ty::Named(point)), None]);
}

#[test]
fn mixins_are_laid_out_after_their_mix() {
    let mut f = Fixture::new();
    let geo = f.library("geo", None);
    let x = f.prim(PrimitiveType::I32);
    let named = f.aggregate(AggregateKind::Mix, "Named", vec![("id", x)]);
    let named = f.declare(geo, DeclNode::Type(named)).unwrap();
    let mut user = f.aggregate(AggregateKind::Struct, "User", Vec::new());
    user.mixins.push(f.named("Named"));
    let user = f.declare(geo, DeclNode::Type(user)).unwrap();

    f.run();

    assert!(f.errors().is_empty(), "{:?}", f.errors());
    let layouts: Vec<_> = f
        .sink
        .items
        .iter()
        .filter(|item| matches!(item.payload, Emitted::Layout { .. }))
        .map(|item| item.decl)
        .collect();
    assert_eq!(layouts, [named, user]);
    let Some(Emitted::Layout { mixins, .. }) = layout(&f, user) else {
        panic!("no layout for User");
    };
    assert_eq!(mixins, [Ty::Named(named)]);
}

#[test]
fn opaque_types_are_emitted_once() {
    let mut f = Fixture::new();
    let geo = f.library("geo", None);
    let handle = f.opaque("Handle");
    let handle = f.declare(geo, handle).unwrap();

    f.run();

    let emitted: Vec<_> = f.sink.items_for(handle).map(|item| item.payload.label()).collect();
    assert_eq!(emitted, ["opaque"]);
    assert_eq!(f.status(handle), Status::Complete);
}
