// config.rs
//
// Scheduler configuration, built the way the driver sets it up.

use crate::errors::ReportMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchedulerConfig {
    pub mode: ReportMode,
    /// Give up after this many passes. `None` runs to fixpoint.
    pub max_passes: Option<usize>,
}

impl SchedulerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.mode = if fail_fast {
            ReportMode::FailFast
        } else {
            ReportMode::Batched
        };
        self
    }

    pub fn max_passes(mut self, max_passes: Option<usize>) -> Self {
        self.max_passes = max_passes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let config = SchedulerConfig::new().fail_fast(true).max_passes(Some(12));
        assert_eq!(config.mode, ReportMode::FailFast);
        assert_eq!(config.max_passes, Some(12));
        assert_eq!(SchedulerConfig::default().mode, ReportMode::Batched);
    }
}
