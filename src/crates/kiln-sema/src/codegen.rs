// codegen.rs
//
// Hand-off of finished declarations to the code generator.

use kiln_identity::{DeclId, EntityId, ModuleId, Symbol};

use crate::types::Ty;

/// What a finished phase hands over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emitted {
    Signature {
        params: Vec<Ty>,
        ret: Option<Ty>,
    },
    Body {
        calls: Vec<DeclId>,
    },
    Layout {
        fields: Vec<(Symbol, Ty)>,
        mixins: Vec<Ty>,
        cases: Vec<(Symbol, Option<Ty>)>,
    },
    Opaque,
    GlobalType {
        ty: Ty,
    },
    GlobalInit {
        reads: Vec<DeclId>,
    },
    AliasTarget {
        target: Ty,
    },
}

impl Emitted {
    pub fn label(&self) -> &'static str {
        match self {
            Emitted::Signature { .. } => "signature",
            Emitted::Body { .. } => "body",
            Emitted::Layout { .. } => "layout",
            Emitted::Opaque => "opaque",
            Emitted::GlobalType { .. } => "global type",
            Emitted::GlobalInit { .. } => "global initializer",
            Emitted::AliasTarget { .. } => "alias target",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedItem {
    pub decl: DeclId,
    pub entity: EntityId,
    pub module: ModuleId,
    /// Library-qualified name of the declaration.
    pub name: String,
    pub payload: Emitted,
}

/// Receiver of finished declarations.
pub trait CodegenSink {
    fn emit(&mut self, item: EmittedItem);

    /// Every entity of `module` is settled and none failed. Sent once per
    /// module.
    fn module_complete(&mut self, module: ModuleId, full_name: &str) {
        let _ = (module, full_name);
    }
}

/// Discards everything; for runs that only check.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl CodegenSink for NullSink {
    fn emit(&mut self, _item: EmittedItem) {}
}

/// Keeps everything in arrival order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub items: Vec<EmittedItem>,
    pub completed_modules: Vec<(ModuleId, String)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items_for(&self, decl: DeclId) -> impl Iterator<Item = &EmittedItem> {
        self.items.iter().filter(move |item| item.decl == decl)
    }

    pub fn find(&self, name: &str) -> impl Iterator<Item = &EmittedItem> {
        self.items.iter().filter(move |item| item.name == name)
    }
}

impl CodegenSink for RecordingSink {
    fn emit(&mut self, item: EmittedItem) {
        self.items.push(item);
    }

    fn module_complete(&mut self, module: ModuleId, full_name: &str) {
        self.completed_modules.push((module, full_name.to_string()));
    }
}
