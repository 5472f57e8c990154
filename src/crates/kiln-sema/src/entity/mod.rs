// entity/mod.rs
//
// Per-declaration scheduler state: which phases are done, what the next
// phase waits on, and whether the entity failed.

mod phases;

use kiln_identity::{DeclId, EntityId, ModuleId};
use smallvec::SmallVec;

use crate::module::DeclKind;

pub use phases::{
    AGGREGATE_PLAN, ALIAS_PLAN, FUNCTION_PLAN, GENERIC_PLAN, GLOBAL_PLAN, OPAQUE_PLAN, Phase,
    PhasePlan, Status,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyStrength {
    /// The target must be complete.
    Full,
    /// The target must be at least partial.
    Partial,
}

impl DependencyStrength {
    pub fn as_str(self) -> &'static str {
        match self {
            DependencyStrength::Full => "full",
            DependencyStrength::Partial => "partial",
        }
    }

    pub fn is_satisfied_by(self, status: Status) -> bool {
        match self {
            DependencyStrength::Full => status == Status::Complete,
            DependencyStrength::Partial => status >= Status::Partial,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub target: EntityId,
    pub strength: DependencyStrength,
}

#[derive(Debug, Clone)]
pub struct EntityState {
    pub id: EntityId,
    pub decl: DeclId,
    pub module: ModuleId,
    pub kind: DeclKind,
    plan: &'static PhasePlan,
    completed: usize,
    status: Status,
    deps: SmallVec<[Dependency; 4]>,
    deps_declared: bool,
    poisoned: bool,
}

impl EntityState {
    pub fn plan(&self) -> &'static PhasePlan {
        self.plan
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Last phase performed, if any.
    pub fn phase(&self) -> Option<Phase> {
        self.completed
            .checked_sub(1)
            .map(|index| self.plan.phases[index])
    }

    pub fn next_phase(&self) -> Option<Phase> {
        self.plan.phases.get(self.completed).copied()
    }

    pub fn completed_phases(&self) -> usize {
        self.completed
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Nothing more to do: every phase ran, or the entity failed.
    pub fn is_settled(&self) -> bool {
        self.poisoned || self.next_phase().is_none()
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.deps
    }

    pub fn dependencies_declared(&self) -> bool {
        self.deps_declared
    }
}

/// Every entity of a compilation, addressed by [`EntityId`].
#[derive(Debug, Default, Clone)]
pub struct EntityTable {
    states: Vec<EntityState>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &mut self,
        decl: DeclId,
        module: ModuleId,
        kind: DeclKind,
        plan: &'static PhasePlan,
    ) -> EntityId {
        let id = EntityId::new(self.states.len() as u32);
        self.states.push(EntityState {
            id,
            decl,
            module,
            kind,
            plan,
            completed: 0,
            status: plan.status_after(0),
            deps: SmallVec::new(),
            deps_declared: false,
            poisoned: false,
        });
        id
    }

    pub fn get(&self, id: EntityId) -> &EntityState {
        &self.states[id.as_usize()]
    }

    fn get_mut(&mut self, id: EntityId) -> &mut EntityState {
        &mut self.states[id.as_usize()]
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityState> {
        self.states.iter()
    }

    pub fn all_settled(&self) -> bool {
        self.states.iter().all(EntityState::is_settled)
    }

    /// Record an edge for the entity's next phase. Repeated edges to the
    /// same target keep the stronger requirement.
    pub fn add_dependency(&mut self, id: EntityId, dependency: Dependency) {
        let deps = &mut self.get_mut(id).deps;
        match deps.iter_mut().find(|d| d.target == dependency.target) {
            Some(existing) => {
                if dependency.strength == DependencyStrength::Full {
                    existing.strength = DependencyStrength::Full;
                }
            }
            None => deps.push(dependency),
        }
    }

    /// Forget the edges of the previous phase before new ones are declared.
    pub(crate) fn begin_dependencies(&mut self, id: EntityId) {
        let state = self.get_mut(id);
        state.deps.clear();
        state.deps_declared = false;
    }

    pub(crate) fn finish_dependencies(&mut self, id: EntityId) {
        self.get_mut(id).deps_declared = true;
    }

    pub fn is_satisfied(&self, dependency: &Dependency) -> bool {
        let target = self.get(dependency.target);
        !target.poisoned && dependency.strength.is_satisfied_by(target.status)
    }

    /// Declared and satisfied: the next phase may run.
    pub fn is_ready(&self, id: EntityId) -> bool {
        let state = self.get(id);
        state.deps_declared && state.deps.iter().all(|dep| self.is_satisfied(dep))
    }

    pub fn unmet(&self, id: EntityId) -> impl Iterator<Item = &Dependency> {
        self.get(id)
            .deps
            .iter()
            .filter(|dep| !self.is_satisfied(dep))
    }

    /// A dependency failed and can no longer be satisfied.
    pub fn waits_on_poison(&self, id: EntityId) -> bool {
        self.get(id)
            .deps
            .iter()
            .any(|dep| self.get(dep.target).poisoned)
    }

    /// Perform the bookkeeping of one phase transition. Settled entities
    /// are left untouched.
    pub(crate) fn advance(&mut self, id: EntityId) -> Status {
        let state = self.get_mut(id);
        if state.is_settled() {
            return state.status;
        }
        state.completed += 1;
        state.status = state.plan.status_after(state.completed);
        state.deps.clear();
        state.deps_declared = false;
        state.status
    }

    pub(crate) fn poison(&mut self, id: EntityId) {
        self.get_mut(id).poisoned = true;
    }
}
