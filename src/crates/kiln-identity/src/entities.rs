//! Typed identities for the arenas of the module tree and the scheduler.
//!
//! Ids are plain indices; keeping one newtype per arena prevents a module
//! index from being used where a declaration index is expected.

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $vis:vis struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis struct $name(u32);

        impl $name {
            pub fn new(index: u32) -> Self {
                Self(index)
            }

            pub fn index(self) -> u32 {
                self.0
            }

            pub fn as_usize(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_entity_id! {
    /// Identity of a module (file, folder or library) in the module tree
    pub struct ModuleId;
}

define_entity_id! {
    /// Identity of a declaration registered in a module
    pub struct DeclId;
}

define_entity_id! {
    /// Identity of the scheduler state of a declaration
    pub struct EntityId;
}
