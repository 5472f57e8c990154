// generic/mod.rs
//
// Generic templates and the per-generic cache of their variants.

mod context;
mod instantiate;


use std::cell::Cell;

use kiln_identity::{DeclId, Identifier, ModuleId};
use rustc_hash::FxHashMap;

use crate::const_eval::ConstExpr;
use crate::decl::{GenericDecl, TypeRef};
use crate::types::{GenericArg, GenericArgs, ValueType};

pub use context::{BindingFrame, InstantiationContext};
pub use instantiate::instantiate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericParamKind {
    Type,
    Value(ValueType),
}

impl GenericParamKind {
    pub fn describe(self) -> &'static str {
        match self {
            GenericParamKind::Type => "type",
            GenericParamKind::Value(ty) => ty.as_str(),
        }
    }

    pub fn accepts(self, arg: &GenericArg) -> bool {
        match (self, arg) {
            (GenericParamKind::Type, GenericArg::Type(_)) => true,
            (GenericParamKind::Value(ty), GenericArg::Value(value)) => value.value_type() == ty,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GenericDefault {
    Type(TypeRef),
    Value(ConstExpr),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenericParam {
    pub name: Identifier,
    pub kind: GenericParamKind,
    pub default: Option<GenericDefault>,
}

/// Cache of instantiated variants, keyed by the full argument list.
#[derive(Debug, Default)]
pub struct VariantCache {
    instances: FxHashMap<GenericArgs, DeclId>,
    /// Variants in creation order.
    order: Vec<DeclId>,
    hits: Cell<u32>,
    misses: Cell<u32>,
}

impl Clone for VariantCache {
    fn clone(&self) -> Self {
        Self {
            instances: self.instances.clone(),
            order: self.order.clone(),
            hits: Cell::new(self.hits.get()),
            misses: Cell::new(self.misses.get()),
        }
    }
}

impl VariantCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a variant, counting the hit or miss.
    pub fn get(&self, args: &GenericArgs) -> Option<DeclId> {
        let result = self.instances.get(args).copied();
        let counter = if result.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.set(counter.get() + 1);
        result
    }

    pub fn contains(&self, args: &GenericArgs) -> bool {
        self.instances.contains_key(args)
    }

    pub fn insert(&mut self, args: GenericArgs, variant: DeclId) {
        if self.instances.insert(args, variant).is_none() {
            self.order.push(variant);
        }
    }

    pub fn variants(&self) -> &[DeclId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn hit_count(&self) -> u32 {
        self.hits.get()
    }

    pub fn miss_count(&self) -> u32 {
        self.misses.get()
    }
}

/// A registered generic declaration.
#[derive(Debug, Clone)]
pub struct GenericTemplate {
    pub decl: DeclId,
    pub module: ModuleId,
    pub node: GenericDecl,
}

impl GenericTemplate {
    /// Number of leading parameters without a default.
    pub fn min_args(&self) -> usize {
        self.node
            .params
            .iter()
            .rposition(|param| param.default.is_none())
            .map_or(0, |index| index + 1)
    }

    pub fn max_args(&self) -> usize {
        self.node.params.len()
    }
}

#[derive(Debug, Default, Clone)]
pub struct GenericRegistry {
    templates: FxHashMap<DeclId, GenericTemplate>,
    caches: FxHashMap<DeclId, VariantCache>,
}

impl GenericRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, decl: DeclId, module: ModuleId, node: GenericDecl) {
        self.templates
            .insert(decl, GenericTemplate { decl, module, node });
        self.caches.entry(decl).or_default();
    }

    pub fn template(&self, decl: DeclId) -> Option<&GenericTemplate> {
        self.templates.get(&decl)
    }

    pub fn cache(&self, decl: DeclId) -> Option<&VariantCache> {
        self.caches.get(&decl)
    }

    /// Whether `args` already has a variant, without counting a hit or
    /// miss.
    pub fn contains(&self, decl: DeclId, args: &GenericArgs) -> bool {
        self.caches.get(&decl).is_some_and(|cache| cache.contains(args))
    }

    pub fn lookup(&self, decl: DeclId, args: &GenericArgs) -> Option<DeclId> {
        self.caches.get(&decl)?.get(args)
    }

    pub(crate) fn insert(&mut self, decl: DeclId, args: GenericArgs, variant: DeclId) {
        self.caches.entry(decl).or_default().insert(args, variant);
    }

    /// Every variant of every generic, as (generic, variant) pairs.
    pub fn all_variants(&self) -> Vec<(DeclId, DeclId)> {
        let mut out: Vec<(DeclId, DeclId)> = self
            .caches
            .iter()
            .flat_map(|(&generic, cache)| cache.variants().iter().map(move |&v| (generic, v)))
            .collect();
        out.sort();
        out
    }

    pub fn variant_count(&self) -> usize {
        self.caches.values().map(VariantCache::len).sum()
    }

    pub fn hit_count(&self) -> u32 {
        self.caches.values().map(VariantCache::hit_count).sum()
    }

    pub fn miss_count(&self) -> u32 {
        self.caches.values().map(VariantCache::miss_count).sum()
    }
}
