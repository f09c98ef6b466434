use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::{FocusError, Result};
use crate::phase::PhasePlan;
use crate::player::{WidgetFactory, WidgetNotice};
use crate::scheduler::{Scheduler, TaskId};
use crate::surface::{AlarmCue, Display, Notifier, Severity};
use crate::sync::PlaybackSynchronizer;
use crate::timer::{Advance, PhaseTimer, Tick, TimerStatus};
use crate::video::resolve_video_id;

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerTask {
    Tick,
    ResumeAfterTransition,
    FinishReset,
    StopCompletionCue,
}

/// One study session: the phase timer, the playback synchronizer and the
/// collaborators they report to.
///
/// Everything is driven from a single thread. The owner feeds wall-clock
/// instants into [`Session::poll`] and widget notices into
/// [`Session::on_widget_notice`]; no work happens in between.
pub struct Session<D: Display, N: Notifier, A: AlarmCue> {
    timer: PhaseTimer,
    sync: PlaybackSynchronizer,
    tasks: Scheduler<TimerTask>,
    tick: Option<TaskId>,
    pending: Option<TaskId>,
    cue_stop: Option<TaskId>,
    display: D,
    notifier: N,
    alarm: A,
}

impl<D: Display, N: Notifier, A: AlarmCue> Session<D, N, A> {
    pub fn new(
        plan: PhasePlan,
        total_minutes: u32,
        factory: Box<dyn WidgetFactory>,
        display: D,
        notifier: N,
        alarm: A,
    ) -> Self {
        let mut session = Self {
            timer: PhaseTimer::new(plan, total_minutes.max(1)),
            sync: PlaybackSynchronizer::new(factory, plan.readiness_timeout),
            tasks: Scheduler::new(),
            tick: None,
            pending: None,
            cue_stop: None,
            display,
            notifier,
            alarm,
        };
        session.render_idle();
        session
    }

    pub fn with_volume(mut self, volume: u8) -> Self {
        self.sync = self.sync.with_volume(volume);
        self
    }

    /// Change the planned session length. Only allowed while idle.
    pub fn configure(&mut self, total_minutes: u32) -> Result<()> {
        if total_minutes == 0 {
            return Err(FocusError::InvalidDuration);
        }
        if self.timer.status() != TimerStatus::Idle {
            return Err(FocusError::SessionActive);
        }
        self.timer.configure(total_minutes);
        debug!(total_minutes, cycles = self.timer.total_cycles(), "session configured");
        self.render_idle();
        Ok(())
    }

    /// Set the music link. Empty clears it; anything else must resolve
    /// to a video id.
    pub fn set_video_reference(&mut self, reference: &str) -> Result<()> {
        if self.timer.status() != TimerStatus::Idle {
            return Err(FocusError::SessionActive);
        }
        let reference = reference.trim();
        if !reference.is_empty() && resolve_video_id(reference).is_none() {
            return Err(FocusError::InvalidReference(reference.to_string()));
        }
        self.sync.set_reference(reference);
        Ok(())
    }

    /// Start ticking from idle. Returns false (and does nothing) otherwise.
    pub fn start(&mut self, now: Instant) -> bool {
        if !self.timer.begin() {
            return false;
        }
        info!(
            total_minutes = self.timer.total_minutes(),
            cycles = self.timer.total_cycles(),
            "session started"
        );
        if let Some(id) = self.cue_stop.take() {
            self.tasks.cancel(id);
            self.silence_alarm();
        }
        self.display.lock_inputs(true);
        if self.sync.has_music() {
            self.sync.play(now, &mut self.notifier);
        }
        self.refresh_display(now);
        self.arm_tick(now);
        true
    }

    /// User stop: back to idle immediately, from any state
    pub fn stop(&mut self) {
        info!("session stopped");
        self.reset(false);
    }

    pub fn toggle_music(&mut self, now: Instant) {
        self.sync.toggle(now, &mut self.notifier);
    }

    pub fn play_music(&mut self, now: Instant) {
        self.sync.play_manual(now, &mut self.notifier);
    }

    pub fn pause_music(&mut self) {
        self.sync.pause_manual();
    }

    pub fn volume_up(&mut self) {
        self.sync.adjust_volume(true, &mut self.notifier);
    }

    pub fn volume_down(&mut self) {
        self.sync.adjust_volume(false, &mut self.notifier);
    }

    pub fn on_widget_notice(&mut self, notice: WidgetNotice, now: Instant) {
        let running = self.timer.is_running();
        self.sync.on_notice(notice, running, now, &mut self.notifier);
    }

    /// Run every task due at or before `now`, in order
    pub fn poll(&mut self, now: Instant) {
        while let Some((_, task, at)) = self.tasks.pop_due(now) {
            match task {
                TimerTask::Tick => self.on_tick(at),
                TimerTask::ResumeAfterTransition => self.resume(at),
                TimerTask::FinishReset => {
                    self.pending = None;
                    self.reset(true);
                }
                TimerTask::StopCompletionCue => {
                    self.cue_stop = None;
                    self.silence_alarm();
                }
            }
        }
        self.sync.poll(now, &mut self.notifier);
    }

    fn arm_tick(&mut self, now: Instant) {
        if self.tick.is_none() {
            self.tick = Some(self.tasks.every(now, TICK, TimerTask::Tick));
        }
    }

    fn disarm_tick(&mut self) {
        if let Some(id) = self.tick.take() {
            self.tasks.cancel(id);
        }
    }

    fn on_tick(&mut self, at: Instant) {
        match self.timer.tick() {
            Tick::Counted => self.refresh_display(at),
            Tick::Exhausted => {
                self.disarm_tick();
                self.transition(at);
            }
            Tick::Ignored => self.disarm_tick(),
        }
    }

    fn transition(&mut self, at: Instant) {
        self.alarm.play();
        let plan = *self.timer.plan();
        let next = self.timer.advance();
        info!(?next, cycles_completed = self.timer.cycles_completed(), "phase over");

        match next {
            Advance::Finished => {
                self.display.show_countdown("DONE!");
                self.display.show_status("Session Completed!");
                self.notifier
                    .notify("Session complete. Great focus!", Severity::Success);
                self.sync.pause_auto();
                self.cue_stop = Some(self.tasks.once(
                    at,
                    plan.completion_cue_hold,
                    TimerTask::StopCompletionCue,
                ));
                self.pending = Some(
                    self.tasks
                        .once(at, plan.completion_delay, TimerTask::FinishReset),
                );
                return;
            }
            Advance::Review => {
                self.notifier.notify("Review Time!", Severity::Info);
                self.sync.pause_auto();
            }
            Advance::Break => {
                self.notifier.notify("Break Time!", Severity::Info);
                self.sync.pause_auto();
            }
            Advance::Study => {
                self.notifier.notify("Focus Mode!", Severity::Info);
                self.sync.resume_for_study(at, &mut self.notifier);
            }
        }

        self.pending = Some(self.tasks.once(
            at,
            plan.transition_delay,
            TimerTask::ResumeAfterTransition,
        ));
    }

    fn resume(&mut self, at: Instant) {
        self.pending = None;
        self.silence_alarm();
        if self.timer.resume() {
            self.refresh_display(at);
            self.arm_tick(at);
        }
    }

    /// Cancel every timer task, drop the player and reconfigure. A
    /// completed reset keeps the "done" rendering and lets the completion
    /// cue ring out.
    fn reset(&mut self, completed: bool) {
        self.disarm_tick();
        if let Some(id) = self.pending.take() {
            self.tasks.cancel(id);
        }
        if !completed {
            if let Some(id) = self.cue_stop.take() {
                self.tasks.cancel(id);
            }
            self.silence_alarm();
        }

        self.sync.destroy();
        self.display.lock_inputs(false);
        self.timer.reset();

        if !completed {
            self.render_idle();
        }
    }

    fn silence_alarm(&mut self) {
        self.alarm.pause();
        self.alarm.rewind();
    }

    fn render_idle(&mut self) {
        self.display.show_countdown(&self.timer.countdown());
        self.display.show_status("Ready to Start");
    }

    fn refresh_display(&mut self, at: Instant) {
        self.display.show_countdown(&self.timer.countdown());
        self.display.show_status(&self.timer.status_line());
        if self.timer.is_running() {
            self.sync.auto_sync(self.timer.phase(), at, &mut self.notifier);
        }
    }

    pub fn timer(&self) -> &PhaseTimer {
        &self.timer
    }

    pub fn sync(&self) -> &PlaybackSynchronizer {
        &self.sync
    }

    pub fn status(&self) -> TimerStatus {
        self.timer.status()
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn alarm(&self) -> &A {
        &self.alarm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        RecordingAlarm, RecordingDisplay, RecordingNotifier, RecordingWidgetFactory,
    };

    type TestSession = Session<RecordingDisplay, RecordingNotifier, RecordingAlarm>;

    fn session() -> TestSession {
        Session::new(
            PhasePlan::default(),
            120,
            Box::new(RecordingWidgetFactory::new()),
            RecordingDisplay::default(),
            RecordingNotifier::default(),
            RecordingAlarm::default(),
        )
    }

    #[test]
    fn new_session_renders_ready() {
        let s = session();
        assert_eq!(s.display().countdown(), Some("25:00"));
        assert_eq!(s.display().status(), Some("Ready to Start"));
        assert_eq!(s.timer().total_cycles(), 4);
    }

    #[test]
    fn configure_rejected_while_running() {
        let mut s = session();
        assert!(s.start(Instant::now()));
        assert!(matches!(s.configure(60), Err(FocusError::SessionActive)));
        assert!(matches!(
            s.set_video_reference("dQw4w9WgXcQ"),
            Err(FocusError::SessionActive)
        ));
    }

    #[test]
    fn configure_rejects_zero_minutes() {
        let mut s = session();
        assert!(matches!(s.configure(0), Err(FocusError::InvalidDuration)));
        s.configure(90).unwrap();
        assert_eq!(s.timer().total_cycles(), 3);
    }

    #[test]
    fn start_locks_inputs_and_stop_unlocks() {
        let mut s = session();
        s.start(Instant::now());
        assert!(s.display().inputs_locked);
        s.stop();
        assert!(!s.display().inputs_locked);
        assert_eq!(s.status(), TimerStatus::Idle);
        assert_eq!(s.display().status(), Some("Ready to Start"));
    }

    #[test]
    fn bad_links_are_rejected() {
        let mut s = session();
        assert!(matches!(
            s.set_video_reference("https://example.com/watch"),
            Err(FocusError::InvalidReference(_))
        ));
        assert!(!s.sync().has_music());

        s.set_video_reference(" https://youtu.be/dQw4w9WgXcQ ").unwrap();
        assert!(s.sync().has_music());
        s.set_video_reference("").unwrap();
        assert!(!s.sync().has_music());
    }

    #[test]
    fn start_without_link_creates_no_player() {
        let mut s = session();
        s.start(Instant::now());
        assert!(!s.sync().has_handle());
        assert!(s.notifier().messages.is_empty());
    }
}
