use crate::phase::{Phase, PhasePlan};
use crate::util::format_time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    Idle,
    Running,
    Transitioning,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// One second came off the clock
    Counted,
    /// The clock hit zero; the phase needs to advance
    Exhausted,
    /// Not running, nothing happened
    Ignored,
}

/// Where a transition leads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Review,
    Break,
    Study,
    Finished,
}

/// Countdown and phase sequence for one session.
///
/// Pure state: the recurring tick and the transition delay are armed by
/// the owning [`crate::session::Session`].
#[derive(Debug, Clone)]
pub struct PhaseTimer {
    plan: PhasePlan,
    total_minutes: u32,
    total_cycles: u32,
    cycles_completed: u32,
    phase: Phase,
    remaining_secs: u32,
    status: TimerStatus,
}

impl PhaseTimer {
    pub fn new(plan: PhasePlan, total_minutes: u32) -> Self {
        let mut timer = Self {
            plan,
            total_minutes,
            total_cycles: 0,
            cycles_completed: 0,
            phase: Phase::Study,
            remaining_secs: 0,
            status: TimerStatus::Idle,
        };
        timer.configure(total_minutes);
        timer
    }

    pub fn configure(&mut self, total_minutes: u32) {
        self.total_minutes = total_minutes;
        self.total_cycles = self.plan.cycles_for(total_minutes);
        self.remaining_secs = self.plan.study_secs;
        self.phase = Phase::Study;
        self.cycles_completed = 0;
    }

    /// Idle -> Running. Returns false when the timer was not idle.
    pub fn begin(&mut self) -> bool {
        if self.status != TimerStatus::Idle {
            return false;
        }
        if self.remaining_secs == 0 {
            self.configure(self.total_minutes);
        }
        self.status = TimerStatus::Running;
        true
    }

    pub fn tick(&mut self) -> Tick {
        if self.status != TimerStatus::Running {
            return Tick::Ignored;
        }
        if self.remaining_secs > 0 {
            self.remaining_secs -= 1;
            Tick::Counted
        } else {
            self.status = TimerStatus::Transitioning;
            Tick::Exhausted
        }
    }

    /// Move to the next phase of the cycle
    pub fn advance(&mut self) -> Advance {
        let next = match self.phase {
            Phase::Study if self.plan.has_review() => Advance::Review,
            Phase::Study | Phase::Review => {
                self.cycles_completed = (self.cycles_completed + 1).min(self.total_cycles);
                if self.cycles_completed < self.total_cycles {
                    Advance::Break
                } else {
                    Advance::Finished
                }
            }
            Phase::Break => Advance::Study,
        };

        match next {
            Advance::Review => self.enter(Phase::Review),
            Advance::Break => self.enter(Phase::Break),
            Advance::Study => self.enter(Phase::Study),
            Advance::Finished => self.status = TimerStatus::Finished,
        }
        next
    }

    fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        self.remaining_secs = self.plan.duration_of(phase);
        self.status = TimerStatus::Transitioning;
    }

    /// Transitioning -> Running. Returns false from any other status.
    pub fn resume(&mut self) -> bool {
        if self.status != TimerStatus::Transitioning {
            return false;
        }
        self.status = TimerStatus::Running;
        true
    }

    pub fn reset(&mut self) {
        self.status = TimerStatus::Idle;
        self.configure(self.total_minutes);
    }

    pub fn countdown(&self) -> String {
        format_time(self.remaining_secs)
    }

    pub fn status_line(&self) -> String {
        format!(
            "{} (cycle {}/{})",
            self.phase,
            (self.cycles_completed + 1).min(self.total_cycles),
            self.total_cycles
        )
    }

    pub fn plan(&self) -> &PhasePlan {
        &self.plan
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn cycles_completed(&self) -> u32 {
        self.cycles_completed
    }

    pub fn total_cycles(&self) -> u32 {
        self.total_cycles
    }

    pub fn total_minutes(&self) -> u32 {
        self.total_minutes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn short_plan(review: Option<u32>) -> PhasePlan {
        PhasePlan {
            study_secs: 3,
            review_secs: review,
            break_secs: 2,
            ..PhasePlan::default()
        }
    }

    fn run_out(timer: &mut PhaseTimer) {
        while timer.tick() == Tick::Counted {}
    }

    #[test]
    fn configure_resets_to_study() {
        let timer = PhaseTimer::new(PhasePlan::default(), 120);
        assert_eq!(timer.total_cycles(), 4);
        assert_eq!(timer.phase(), Phase::Study);
        assert_eq!(timer.remaining_secs(), 25 * 60);
        assert_eq!(timer.cycles_completed(), 0);
        assert_eq!(timer.status(), TimerStatus::Idle);
        assert_eq!(timer.countdown(), "25:00");
    }

    #[test]
    fn begin_only_from_idle() {
        let mut timer = PhaseTimer::new(short_plan(None), 60);
        assert!(timer.begin());
        assert!(!timer.begin());
        assert_eq!(timer.status(), TimerStatus::Running);
    }

    #[test]
    fn ticks_ignored_while_idle() {
        let mut timer = PhaseTimer::new(short_plan(None), 60);
        assert_eq!(timer.tick(), Tick::Ignored);
        assert_eq!(timer.remaining_secs(), 3);
    }

    #[test]
    fn exhaustion_fires_once() {
        let mut timer = PhaseTimer::new(short_plan(None), 60);
        timer.begin();
        assert_eq!(timer.tick(), Tick::Counted);
        assert_eq!(timer.tick(), Tick::Counted);
        assert_eq!(timer.tick(), Tick::Counted);
        assert_eq!(timer.remaining_secs(), 0);
        assert_eq!(timer.tick(), Tick::Exhausted);
        assert_eq!(timer.status(), TimerStatus::Transitioning);
        assert_eq!(timer.tick(), Tick::Ignored);
    }

    #[test]
    fn study_break_sequence_without_review() {
        let mut timer = PhaseTimer::new(short_plan(None), 60);
        timer.begin();
        run_out(&mut timer);
        assert_matches!(timer.advance(), Advance::Break);
        assert_eq!(timer.cycles_completed(), 1);
        assert_eq!(timer.remaining_secs(), 2);

        assert!(timer.resume());
        run_out(&mut timer);
        assert_matches!(timer.advance(), Advance::Study);
        assert_eq!(timer.remaining_secs(), 3);

        assert!(timer.resume());
        run_out(&mut timer);
        assert_matches!(timer.advance(), Advance::Finished);
        assert_eq!(timer.cycles_completed(), 2);
        assert_eq!(timer.status(), TimerStatus::Finished);
        assert!(!timer.resume());
    }

    #[test]
    fn review_sits_between_study_and_break() {
        let mut timer = PhaseTimer::new(short_plan(Some(1)), 60);
        timer.begin();
        run_out(&mut timer);
        assert_matches!(timer.advance(), Advance::Review);
        assert_eq!(timer.cycles_completed(), 0);
        assert_eq!(timer.remaining_secs(), 1);

        timer.resume();
        run_out(&mut timer);
        assert_matches!(timer.advance(), Advance::Break);
        assert_eq!(timer.cycles_completed(), 1);
    }

    #[test]
    fn cycles_never_exceed_total() {
        let mut timer = PhaseTimer::new(short_plan(None), 120);
        timer.begin();
        let mut finished = 0;
        for _ in 0..20 {
            run_out(&mut timer);
            if timer.advance() == Advance::Finished {
                finished += 1;
                break;
            }
            timer.resume();
        }
        assert_eq!(finished, 1);
        assert_eq!(timer.cycles_completed(), timer.total_cycles());
    }

    #[test]
    fn begin_after_exhaustion_reconfigures() {
        let mut timer = PhaseTimer::new(short_plan(None), 60);
        timer.begin();
        run_out(&mut timer);
        // force an idle timer sitting at zero
        timer.status = TimerStatus::Idle;
        timer.cycles_completed = 1;
        assert!(timer.begin());
        assert_eq!(timer.remaining_secs(), 3);
        assert_eq!(timer.cycles_completed(), 0);
    }

    #[test]
    fn reset_returns_to_idle_study() {
        let mut timer = PhaseTimer::new(short_plan(None), 60);
        timer.begin();
        run_out(&mut timer);
        timer.advance();
        timer.reset();
        assert_eq!(timer.status(), TimerStatus::Idle);
        assert_eq!(timer.phase(), Phase::Study);
        assert_eq!(timer.cycles_completed(), 0);
        assert_eq!(timer.remaining_secs(), 3);
    }

    #[test]
    fn status_line_counts_from_one() {
        let timer = PhaseTimer::new(PhasePlan::default(), 120);
        assert_eq!(timer.status_line(), "Study (cycle 1/4)");
    }
}
