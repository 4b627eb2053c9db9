use serde::Serialize;

use crate::catalog::{Catalog, Stage};

/// Progression state for a given entry count against a catalog.
///
/// Total over its domain: every method returns a value for any count.
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    catalog: &'a Catalog,
    entries_count: u32,
}

impl<'a> Progress<'a> {
    pub fn new(catalog: &'a Catalog, entries_count: u32) -> Self {
        Self {
            catalog,
            entries_count,
        }
    }

    /// Build from a container length, saturating at `u32::MAX`.
    pub fn from_len(catalog: &'a Catalog, len: usize) -> Self {
        Self::new(catalog, u32::try_from(len).unwrap_or(u32::MAX))
    }

    pub fn entries_count(&self) -> u32 {
        self.entries_count
    }

    /// Highest-order stage whose requirement is met, or the first stage when
    /// none is.
    pub fn current_stage(&self) -> &'a Stage {
        self.catalog
            .stages()
            .iter()
            .rev()
            .find(|s| s.unlock_requirement <= self.entries_count)
            .unwrap_or_else(|| self.catalog.first())
    }

    pub fn is_unlocked(&self, stage: &Stage) -> bool {
        self.entries_count >= stage.unlock_requirement
    }

    /// Completion towards `stage`, clamped to `0.0..=100.0`.
    pub fn progress_percent(&self, stage: &Stage) -> f64 {
        if stage.unlock_requirement == 0 {
            return 100.0;
        }
        let ratio = f64::from(self.entries_count) / f64::from(stage.unlock_requirement);
        (ratio * 100.0).min(100.0)
    }

    /// The stage after the current one; the last stage when already there.
    pub fn next_stage(&self) -> &'a Stage {
        let current = self.current_stage();
        self.catalog
            .get(current.order + 1)
            .unwrap_or_else(|| self.catalog.last())
    }

    pub fn remaining_to_next(&self) -> u32 {
        self.next_stage()
            .unlock_requirement
            .saturating_sub(self.entries_count)
    }

    /// Effective stage order given the level stored on the profile.
    ///
    /// The stored level is a floor: the result is the larger of the two,
    /// clamped to the orders present in the catalog.
    pub fn effective_order(&self, stored_level: u32) -> u32 {
        let computed = self.current_stage().order;
        stored_level.max(computed).clamp(1, self.catalog.last().order)
    }

    pub fn stage_status(&self, stage: &Stage, effective_order: u32) -> StageStatus {
        StageStatus {
            stage: stage.clone(),
            unlocked: self.is_unlocked(stage),
            is_current: stage.order == effective_order,
            progress_percent: self.progress_percent(stage),
            counted: self.entries_count.min(stage.unlock_requirement),
        }
    }

    /// Everything a progress screen needs, in one serialisable value.
    pub fn report(&self, stored_level: Option<u32>) -> ProgressReport {
        let current = self.current_stage();
        let effective_order = self.effective_order(stored_level.unwrap_or(1));
        let last_order = self.catalog.last().order;

        ProgressReport {
            entries_count: self.entries_count,
            current: current.clone(),
            effective_order,
            next: (current.order < last_order).then(|| self.next_stage().clone()),
            remaining_to_next: self.remaining_to_next(),
            stages: self
                .catalog
                .stages()
                .iter()
                .map(|stage| self.stage_status(stage, effective_order))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageStatus {
    pub stage: Stage,
    pub unlocked: bool,
    pub is_current: bool,
    pub progress_percent: f64,
    /// Entry count capped at the requirement, for "3/5" style display
    pub counted: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressReport {
    pub entries_count: u32,
    /// Stage computed from the entry count alone
    pub current: Stage,
    /// Order after applying the stored level floor
    pub effective_order: u32,
    /// `None` when `current` is the last stage
    pub next: Option<Stage>,
    pub remaining_to_next: u32,
    pub stages: Vec<StageStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(order: u32, req: u32) -> Stage {
        Stage {
            id: format!("s{}", order),
            order,
            title: format!("Stage {}", order),
            focus: String::new(),
            description: String::new(),
            unlock_requirement: req,
            icon: String::new(),
            level_tag: String::new(),
            accent: String::new(),
        }
    }

    fn three_stage() -> Catalog {
        Catalog::new(vec![stage(1, 0), stage(2, 3), stage(3, 6)]).unwrap()
    }

    #[test]
    fn test_scenario_four_entries() {
        let catalog = three_stage();
        let progress = Progress::new(&catalog, 4);

        assert_eq!(progress.current_stage().order, 2);
        assert_eq!(progress.progress_percent(catalog.get(2).unwrap()), 100.0);
        assert_eq!(progress.next_stage().order, 3);
        assert_eq!(progress.remaining_to_next(), 2);
    }

    #[test]
    fn test_scenario_zero_entries() {
        let catalog = three_stage();
        let progress = Progress::new(&catalog, 0);

        assert_eq!(progress.current_stage().order, 1);
        assert!(progress.is_unlocked(catalog.get(1).unwrap()));
        assert!(!progress.is_unlocked(catalog.get(2).unwrap()));
        assert!(!progress.is_unlocked(catalog.get(3).unwrap()));
        assert_eq!(progress.remaining_to_next(), 3);
    }

    #[test]
    fn test_current_stage_is_highest_satisfied() {
        let catalog = Catalog::learning_stages();
        for count in 0..40 {
            let progress = Progress::new(&catalog, count);
            let current = progress.current_stage();
            assert!(current.unlock_requirement <= count);
            assert!(
                catalog
                    .stages()
                    .iter()
                    .filter(|s| s.order > current.order)
                    .all(|s| s.unlock_requirement > count)
            );
        }
    }

    #[test]
    fn test_defaults_to_first_when_nothing_qualifies() {
        let catalog = Catalog::achievement_levels();
        let progress = Progress::new(&catalog, 0);
        assert_eq!(progress.current_stage().order, 1);
        assert!(!progress.is_unlocked(progress.current_stage()));
        // next is level 2 (requirement 5)
        assert_eq!(progress.remaining_to_next(), 5);
    }

    #[test]
    fn test_progress_percent_monotonic_and_clamped() {
        let catalog = three_stage();
        let target = catalog.get(3).unwrap();
        let mut previous = 0.0;
        for count in 0..20 {
            let pct = Progress::new(&catalog, count).progress_percent(target);
            assert!((0.0..=100.0).contains(&pct));
            assert!(pct >= previous);
            previous = pct;
        }
        assert_eq!(Progress::new(&catalog, 3).progress_percent(target), 50.0);
        assert_eq!(Progress::new(&catalog, 0).progress_percent(catalog.first()), 100.0);
    }

    #[test]
    fn test_remaining_zero_iff_last_or_next_reached() {
        let catalog = three_stage();
        for count in 0..12 {
            let progress = Progress::new(&catalog, count);
            let is_last = progress.current_stage().order == catalog.last().order;
            let reached = count >= progress.next_stage().unlock_requirement;
            assert_eq!(progress.remaining_to_next() == 0, is_last || reached);
        }
    }

    #[test]
    fn test_single_stage_catalog() {
        let catalog = Catalog::new(vec![stage(1, 0)]).unwrap();
        for count in [0, 1, 50] {
            let progress = Progress::new(&catalog, count);
            assert_eq!(progress.current_stage().order, 1);
            assert_eq!(progress.remaining_to_next(), 0);
        }
    }

    #[test]
    fn test_effective_order_is_a_floor() {
        let catalog = three_stage();
        assert_eq!(Progress::new(&catalog, 0).effective_order(2), 2);
        assert_eq!(Progress::new(&catalog, 7).effective_order(1), 3);
        assert_eq!(Progress::new(&catalog, 0).effective_order(0), 1);
        assert_eq!(Progress::new(&catalog, 0).effective_order(9), 3);
    }

    #[test]
    fn test_report() {
        let catalog = three_stage();
        let report = Progress::new(&catalog, 4).report(Some(1));
        assert_eq!(report.current.order, 2);
        assert_eq!(report.effective_order, 2);
        assert_eq!(report.next.as_ref().map(|s| s.order), Some(3));
        assert_eq!(report.remaining_to_next, 2);

        let counted: Vec<u32> = report.stages.iter().map(|s| s.counted).collect();
        assert_eq!(counted, vec![0, 3, 4]);
        let current: Vec<bool> = report.stages.iter().map(|s| s.is_current).collect();
        assert_eq!(current, vec![false, true, false]);

        let last = Progress::new(&catalog, 9).report(None);
        assert!(last.next.is_none());
        assert_eq!(last.remaining_to_next, 0);
    }

    #[test]
    fn test_from_len_saturates() {
        let catalog = three_stage();
        assert_eq!(Progress::from_len(&catalog, usize::MAX).entries_count(), u32::MAX);
    }
}
