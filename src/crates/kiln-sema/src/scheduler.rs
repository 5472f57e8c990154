// scheduler.rs
//
// Fixpoint loop driving every entity through its phases.

use kiln_identity::{EntityId, ModuleId};
use rustc_hash::FxHashSet;

use crate::codegen::CodegenSink;
use crate::config::SchedulerConfig;
use crate::db::SemaDb;
use crate::decl::DeclNode;
use crate::entity::Phase;
use crate::errors::{Abort, Diagnostics, SemanticError, StuckEntity};
use crate::module::DeclKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub passes: usize,
    pub transitions: usize,
    pub entities: usize,
    pub variants_created: usize,
    pub cache_hits: u32,
    pub cache_misses: u32,
    pub poisoned: usize,
}

/// Owns the declaration nodes and advances their entities.
#[derive(Debug, Default)]
pub struct Scheduler {
    config: SchedulerConfig,
    /// Indexed by entity id.
    nodes: Vec<Option<DeclNode>>,
    signaled: FxHashSet<ModuleId>,
    transitions: usize,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Take ownership of the node behind `entity`.
    pub fn adopt(&mut self, entity: EntityId, node: DeclNode) {
        let index = entity.as_usize();
        if self.nodes.len() <= index {
            self.nodes.resize_with(index + 1, || None);
        }
        self.nodes[index] = Some(node);
    }

    pub fn node(&self, entity: EntityId) -> Option<&DeclNode> {
        self.nodes.get(entity.as_usize()).and_then(Option::as_ref)
    }

    fn adopt_spawned(&mut self, db: &mut SemaDb) {
        for (entity, node) in db.take_spawned() {
            self.adopt(entity, node);
        }
    }

    /// Run passes until every entity is settled or no pass makes progress.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run(
        &mut self,
        db: &mut SemaDb,
        diagnostics: &mut Diagnostics,
        sink: &mut dyn CodegenSink,
    ) -> Result<SchedulerStats, Abort> {
        self.adopt_spawned(db);
        let variants_before = db.generics.variant_count();
        let transitions_before = self.transitions;
        let mut passes = 0;

        loop {
            if let Some(limit) = self.config.max_passes
                && passes >= limit
            {
                tracing::warn!(limit, "pass limit reached");
                diagnostics.report(SemanticError::PassLimitExceeded { limit })?;
                break;
            }
            passes += 1;

            let pass_start = self.transitions;
            let mut progress = false;
            // The table grows while we walk it.
            let mut index = 0;
            while index < db.entities.len() {
                progress |= self.step(EntityId::new(index as u32), db, diagnostics, sink)?;
                index += 1;
            }

            let settled = db.entities.all_settled();
            tracing::debug!(
                pass = passes,
                transitions = self.transitions - pass_start,
                entities = db.entities.len(),
                settled,
                "scheduler pass"
            );
            self.signal_modules(db, sink, settled);
            if settled {
                break;
            }
            if !progress {
                self.report_deadlock(db, diagnostics)?;
                break;
            }
        }

        Ok(SchedulerStats {
            passes,
            transitions: self.transitions - transitions_before,
            entities: db.entities.len(),
            variants_created: db.generics.variant_count() - variants_before,
            cache_hits: db.generics.hit_count(),
            cache_misses: db.generics.miss_count(),
            poisoned: db.entities.iter().filter(|s| s.is_poisoned()).count(),
        })
    }

    /// Give one entity its chance in this pass. Returns whether its state
    /// changed.
    fn step(
        &mut self,
        id: EntityId,
        db: &mut SemaDb,
        diagnostics: &mut Diagnostics,
        sink: &mut dyn CodegenSink,
    ) -> Result<bool, Abort> {
        let state = db.entities.get(id);
        if state.is_settled() {
            return Ok(false);
        }
        let Some(phase) = state.next_phase() else {
            return Ok(false);
        };
        let Some(node) = self.nodes.get_mut(id.as_usize()).and_then(Option::take) else {
            return Ok(false);
        };
        let outcome = self.advance(id, phase, &node, db, diagnostics, sink);
        self.nodes[id.as_usize()] = Some(node);
        outcome
    }

    fn advance(
        &mut self,
        id: EntityId,
        phase: Phase,
        node: &DeclNode,
        db: &mut SemaDb,
        diagnostics: &mut Diagnostics,
        sink: &mut dyn CodegenSink,
    ) -> Result<bool, Abort> {
        if !db.entities.get(id).dependencies_declared() {
            db.entities.begin_dependencies(id);
            let declared = node.update_dependencies(phase, id, db);
            self.adopt_spawned(db);
            match declared {
                Ok(()) => db.entities.finish_dependencies(id),
                Err(error) => return self.fail(id, error, db, diagnostics),
            }
        }

        if db.entities.waits_on_poison(id) {
            tracing::trace!(entity = %db.qualified_name(db.entities.get(id).decl), "poisoned by dependency");
            db.entities.poison(id);
            return Ok(true);
        }
        if !db.entities.is_ready(id) {
            return Ok(false);
        }

        let done = node.do_phase(phase, id, db, sink);
        self.adopt_spawned(db);
        match done {
            Ok(()) => {
                let status = db.entities.advance(id);
                self.transitions += 1;
                tracing::trace!(
                    entity = %db.qualified_name(db.entities.get(id).decl),
                    phase = phase.as_str(),
                    status = status.as_str(),
                    "phase done"
                );
                Ok(true)
            }
            Err(error) => self.fail(id, error, db, diagnostics),
        }
    }

    fn fail(
        &mut self,
        id: EntityId,
        error: SemanticError,
        db: &mut SemaDb,
        diagnostics: &mut Diagnostics,
    ) -> Result<bool, Abort> {
        db.entities.poison(id);
        diagnostics.report(error)?;
        Ok(true)
    }

    /// Signal modules whose entities, and those of every module below
    /// them, are all settled without failure.
    ///
    /// A subtree declaring generics can still receive variants until the
    /// whole run settles, so it waits for `finished`.
    fn signal_modules(&mut self, db: &SemaDb, sink: &mut dyn CodegenSink, finished: bool) {
        let mut open = vec![false; db.modules.len()];
        for state in db.entities.iter() {
            if !state.is_settled() || state.is_poisoned() {
                open[state.module.as_usize()] = true;
            }
        }
        if !finished {
            for module in db.modules.iter() {
                if !module.declarations(DeclKind::Generic).is_empty() {
                    open[module.id.as_usize()] = true;
                }
            }
        }
        // Children are created after their parents, so one backwards sweep
        // carries every mark up to the root.
        for module in db.modules.iter().rev() {
            if open[module.id.as_usize()]
                && let Some(parent) = module.parent
            {
                open[parent.as_usize()] = true;
            }
        }

        for module in db.modules.iter() {
            if open[module.id.as_usize()] || !self.signaled.insert(module.id) {
                continue;
            }
            let full_name = db.modules.full_name(module.id, &db.interner);
            tracing::debug!(module = %module.path.display(), "module complete");
            sink.module_complete(module.id, &full_name);
        }
    }

    fn report_deadlock(&mut self, db: &mut SemaDb, diagnostics: &mut Diagnostics) -> Result<(), Abort> {
        let stuck: Vec<EntityId> = db
            .entities
            .iter()
            .filter(|state| !state.is_settled())
            .map(|state| state.id)
            .collect();
        tracing::warn!(count = stuck.len(), "scheduler deadlock");

        let entries = stuck
            .iter()
            .map(|&id| {
                let state = db.entities.get(id);
                let waiting: Vec<String> = db
                    .entities
                    .unmet(id)
                    .map(|dep| format!("{} ({})", entity_name(db, dep.target), dep.strength.as_str()))
                    .collect();
                StuckEntity {
                    name: entity_name(db, id),
                    phase: state.next_phase().map_or("final", Phase::as_str),
                    waiting_on: if waiting.is_empty() {
                        "nothing".to_string()
                    } else {
                        waiting.join(", ")
                    },
                    chain: dependency_chain(db, id),
                    span: db.modules.decl(state.decl).name.span.into(),
                }
            })
            .collect();

        for &id in &stuck {
            db.entities.poison(id);
        }
        diagnostics.report(SemanticError::Deadlock {
            count: stuck.len(),
            stuck: entries,
        })
    }
}

fn entity_name(db: &SemaDb, entity: EntityId) -> String {
    db.qualified_name(db.entities.get(entity).decl)
}

/// Follow the first unmet dependency from `start` until it loops back or
/// ends: `a -> b -> a`.
fn dependency_chain(db: &SemaDb, start: EntityId) -> String {
    let mut seen = vec![start];
    let mut names = vec![entity_name(db, start)];
    let mut current = start;
    while let Some(dep) = db.entities.unmet(current).next() {
        names.push(entity_name(db, dep.target));
        if seen.contains(&dep.target) {
            break;
        }
        seen.push(dep.target);
        current = dep.target;
    }
    names.join(" -> ")
}
