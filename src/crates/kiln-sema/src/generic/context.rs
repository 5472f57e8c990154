// generic/context.rs
//
// Parameter bindings of the instantiations in progress.

use kiln_identity::{DeclId, Symbol};
use smallvec::SmallVec;

use crate::types::GenericArg;

/// Bindings of one generic's parameters during one instantiation.
#[derive(Debug, Clone)]
pub struct BindingFrame {
    pub generic: DeclId,
    bindings: SmallVec<[(Symbol, GenericArg); 4]>,
}

impl BindingFrame {
    pub fn new(generic: DeclId) -> Self {
        Self {
            generic,
            bindings: SmallVec::new(),
        }
    }

    pub fn bind(&mut self, name: Symbol, arg: GenericArg) {
        self.bindings.push((name, arg));
    }

    pub fn get(&self, name: Symbol) -> Option<&GenericArg> {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| *bound == name)
            .map(|(_, arg)| arg)
    }

    /// Bound arguments in parameter order.
    pub fn args(&self) -> impl Iterator<Item = &GenericArg> {
        self.bindings.iter().map(|(_, arg)| arg)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Stack of binding frames. An instantiation triggered while another is
/// binding its parameters pushes its own frame and only sees that frame.
#[derive(Debug, Default, Clone)]
pub struct InstantiationContext {
    frames: Vec<BindingFrame>,
}

impl InstantiationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: BindingFrame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<BindingFrame> {
        self.frames.pop()
    }

    pub fn current(&self) -> Option<&BindingFrame> {
        self.frames.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut BindingFrame> {
        self.frames.last_mut()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether `generic` is already being instantiated further down the
    /// stack.
    pub fn is_active(&self, generic: DeclId) -> bool {
        self.frames.iter().any(|frame| frame.generic == generic)
    }
}
