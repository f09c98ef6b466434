use std::time::Duration;

pub const DEFAULT_UNIT_MINUTES: u32 = 30;
pub const DEFAULT_STUDY_SECS: u32 = 25 * 60;
pub const DEFAULT_BREAK_SECS: u32 = 5 * 60;

/// A named sub-period of a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Study,
    Review,
    Break,
}

/// Phase lengths and the delays around transitions.
///
/// The phase sequence is data: a plan with `review_secs` set runs
/// study -> review -> break, otherwise study -> break.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhasePlan {
    pub unit_minutes: u32,
    pub study_secs: u32,
    pub review_secs: Option<u32>,
    pub break_secs: u32,
    pub transition_delay: Duration,
    pub completion_delay: Duration,
    pub completion_cue_hold: Duration,
    pub readiness_timeout: Duration,
}

impl Default for PhasePlan {
    fn default() -> Self {
        Self {
            unit_minutes: DEFAULT_UNIT_MINUTES,
            study_secs: DEFAULT_STUDY_SECS,
            review_secs: None,
            break_secs: DEFAULT_BREAK_SECS,
            transition_delay: Duration::from_secs(4),
            completion_delay: Duration::from_secs(3),
            completion_cue_hold: Duration::from_secs(8),
            readiness_timeout: Duration::from_secs(5),
        }
    }
}

impl PhasePlan {
    /// Whole cycles that fit in `total_minutes`; never less than one.
    pub fn cycles_for(&self, total_minutes: u32) -> u32 {
        (total_minutes / self.unit_minutes.max(1)).max(1)
    }

    pub fn duration_of(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Study => self.study_secs,
            Phase::Review => self.review_secs.unwrap_or(0),
            Phase::Break => self.break_secs,
        }
    }

    pub fn has_review(&self) -> bool {
        self.review_secs.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_floor_total_by_unit() {
        let plan = PhasePlan::default();
        assert_eq!(plan.cycles_for(120), 4);
        assert_eq!(plan.cycles_for(119), 3);
        assert_eq!(plan.cycles_for(30), 1);
    }

    #[test]
    fn short_sessions_still_plan_one_cycle() {
        let plan = PhasePlan::default();
        assert_eq!(plan.cycles_for(10), 1);
    }

    #[test]
    fn review_duration_only_when_planned() {
        let mut plan = PhasePlan::default();
        assert!(!plan.has_review());
        assert_eq!(plan.duration_of(Phase::Review), 0);

        plan.review_secs = Some(120);
        assert!(plan.has_review());
        assert_eq!(plan.duration_of(Phase::Review), 120);
        assert_eq!(plan.duration_of(Phase::Study), DEFAULT_STUDY_SECS);
        assert_eq!(plan.duration_of(Phase::Break), DEFAULT_BREAK_SECS);
    }

    #[test]
    fn phase_labels() {
        assert_eq!(Phase::Study.to_string(), "Study");
        assert_eq!(Phase::Break.to_string(), "Break");
    }
}
