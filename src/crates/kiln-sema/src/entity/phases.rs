// entity/phases.rs
//
// Phase sequences per declaration kind and the status milestones they pass.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Header,
    Signature,
    Members,
    Layout,
    Body,
    Initializer,
    Target,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Header => "header",
            Phase::Signature => "signature",
            Phase::Members => "members",
            Phase::Layout => "layout",
            Phase::Body => "body",
            Phase::Initializer => "initializer",
            Phase::Target => "target",
        }
    }
}

/// Coarse progress of an entity, ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    NotStarted,
    Partial,
    ChildrenPartial,
    Complete,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::NotStarted => "not started",
            Status::Partial => "partial",
            Status::ChildrenPartial => "children partial",
            Status::Complete => "complete",
        }
    }
}

/// The ordered phases of one declaration kind.
#[derive(Debug, PartialEq, Eq)]
pub struct PhasePlan {
    pub phases: &'static [Phase],
    /// Number of completed phases after which the entity is partial.
    pub partial_after: Option<usize>,
    /// Number of completed phases after which the entity is children-partial.
    pub children_partial_after: Option<usize>,
    /// Plans that never complete and rest at children-partial.
    pub rests: bool,
}

pub static FUNCTION_PLAN: PhasePlan = PhasePlan {
    phases: &[Phase::Signature, Phase::Body],
    partial_after: Some(1),
    children_partial_after: None,
    rests: false,
};

pub static AGGREGATE_PLAN: PhasePlan = PhasePlan {
    phases: &[Phase::Header, Phase::Members, Phase::Layout],
    partial_after: Some(1),
    children_partial_after: Some(2),
    rests: false,
};

pub static OPAQUE_PLAN: PhasePlan = PhasePlan {
    phases: &[Phase::Header],
    partial_after: Some(1),
    children_partial_after: None,
    rests: false,
};

pub static GLOBAL_PLAN: PhasePlan = PhasePlan {
    phases: &[Phase::Signature, Phase::Initializer],
    partial_after: Some(1),
    children_partial_after: None,
    rests: false,
};

pub static ALIAS_PLAN: PhasePlan = PhasePlan {
    phases: &[Phase::Target],
    partial_after: Some(1),
    children_partial_after: None,
    rests: false,
};

pub static GENERIC_PLAN: PhasePlan = PhasePlan {
    phases: &[Phase::Header],
    partial_after: None,
    children_partial_after: Some(1),
    rests: true,
};

impl PhasePlan {
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Status once `completed` phases are done.
    pub fn status_after(&self, completed: usize) -> Status {
        if completed >= self.phases.len() && !self.rests {
            return Status::Complete;
        }
        if self.children_partial_after.is_some_and(|n| completed >= n) {
            return Status::ChildrenPartial;
        }
        if self.partial_after.is_some_and(|n| completed >= n) {
            return Status::Partial;
        }
        Status::NotStarted
    }
}
