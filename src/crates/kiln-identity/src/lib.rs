// src/crates/kiln-identity/src/lib.rs
//
// Foundational identity primitives shared by every kiln crate: interned
// symbols, source spans, identifiers and the typed ids of the compiler's
// arenas.

mod entities;
mod intern;
mod primitive_type;
mod span;
mod symbol;

pub use entities::{DeclId, EntityId, ModuleId};
pub use intern::Interner;
pub use primitive_type::PrimitiveType;
pub use span::Span;
pub use symbol::Symbol;

/// A name together with the place it was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub name: Symbol,
    pub span: Span,
}

impl Identifier {
    pub fn new(name: Symbol, span: Span) -> Self {
        Self { name, span }
    }

    /// Intern `name` and pair it with `span`.
    pub fn intern(interner: &mut Interner, name: &str, span: Span) -> Self {
        Self::new(interner.intern(name), span)
    }

    pub fn as_str<'a>(&self, interner: &'a Interner) -> &'a str {
        interner.resolve(self.name)
    }
}
