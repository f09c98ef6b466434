use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::phase::Phase;
use crate::player::{
    describe_widget_error, HandleId, PlaybackWidget, PlayerState, WidgetEvent, WidgetFactory,
    WidgetNotice,
};
use crate::scheduler::{Scheduler, TaskId};
use crate::surface::{Notifier, Severity};
use crate::util::step_volume;
use crate::video::{resolve_video_id, VideoId};

pub const DEFAULT_VOLUME: u8 = 50;
const POSITION_POLL: Duration = Duration::from_secs(1);

/// Widget lifecycle as seen from the synchronizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Absent,
    /// Created, waiting for the ready notice. `play_on_ready` is the single
    /// deferred intent slot.
    Loading { play_on_ready: bool },
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncTask {
    PollPosition,
    ReadinessDeadline,
}

struct Handle {
    id: HandleId,
    video: VideoId,
    widget: Box<dyn PlaybackWidget>,
}

/// Owns the playback widget and mirrors its play/pause state to the
/// session's phases.
pub struct PlaybackSynchronizer {
    factory: Box<dyn WidgetFactory>,
    reference: String,
    handle: Option<Handle>,
    next_handle: u64,
    readiness: Readiness,
    playing: bool,
    manually_paused: bool,
    /// Set by a readiness timeout or a widget error. Auto-sync stays off
    /// until an explicit request or a new study phase.
    stalled: bool,
    volume: u8,
    last_position: Option<f64>,
    readiness_timeout: Duration,
    tasks: Scheduler<SyncTask>,
    position_poll: Option<TaskId>,
    readiness_deadline: Option<TaskId>,
}

impl PlaybackSynchronizer {
    pub fn new(factory: Box<dyn WidgetFactory>, readiness_timeout: Duration) -> Self {
        Self {
            factory,
            reference: String::new(),
            handle: None,
            next_handle: 0,
            readiness: Readiness::Absent,
            playing: false,
            manually_paused: false,
            stalled: false,
            volume: DEFAULT_VOLUME,
            last_position: None,
            readiness_timeout,
            tasks: Scheduler::new(),
            position_poll: None,
            readiness_deadline: None,
        }
    }

    pub fn with_volume(mut self, volume: u8) -> Self {
        self.volume = volume.min(100);
        self
    }

    /// Replace the video reference. A live handle bound to a different
    /// video is torn down.
    pub fn set_reference(&mut self, reference: &str) {
        self.reference = reference.trim().to_string();
        let stale = match &self.handle {
            Some(handle) => resolve_video_id(&self.reference).as_ref() != Some(&handle.video),
            None => false,
        };
        if stale {
            debug!("video reference changed, dropping current player");
            self.destroy();
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn has_music(&self) -> bool {
        !self.reference.is_empty()
    }

    /// Create the widget if there is none yet. Returns false when no
    /// handle exists afterwards.
    pub fn ensure_handle(&mut self, notifier: &mut dyn Notifier) -> bool {
        if self.handle.is_some() {
            return true;
        }

        let Some(video) = resolve_video_id(&self.reference) else {
            notifier.notify(
                "Invalid YouTube link. Paste a video URL or an 11-character id.",
                Severity::Error,
            );
            return false;
        };

        let id = HandleId(self.next_handle);
        self.next_handle += 1;
        match self.factory.create(id, &video) {
            Ok(widget) => {
                info!(%video, handle = id.0, "music player created");
                self.handle = Some(Handle { id, video, widget });
                self.readiness = Readiness::Loading {
                    play_on_ready: false,
                };
                true
            }
            Err(e) => {
                warn!("failed to create music player: {e}");
                notifier.notify(&format!("Couldn't start the music player: {e}"), Severity::Error);
                false
            }
        }
    }

    /// Request playback. Before the widget is ready this only records
    /// the deferred intent; repeated requests collapse into it.
    pub fn play(&mut self, now: Instant, notifier: &mut dyn Notifier) {
        match self.readiness {
            Readiness::Absent => {
                if self.ensure_handle(notifier) {
                    self.defer_play(now);
                }
            }
            Readiness::Loading {
                play_on_ready: false,
            } => self.defer_play(now),
            Readiness::Loading {
                play_on_ready: true,
            } => {}
            Readiness::Ready => self.start_widget(),
        }
    }

    /// User asked for music: lifts the manual override first
    pub fn play_manual(&mut self, now: Instant, notifier: &mut dyn Notifier) {
        if !self.has_music() {
            notifier.notify("Add a YouTube link to play music.", Severity::Warning);
            return;
        }
        self.manually_paused = false;
        self.stalled = false;
        self.play(now, notifier);
    }

    /// A new study phase begins: the override is cleared and music resumes
    pub fn resume_for_study(&mut self, now: Instant, notifier: &mut dyn Notifier) {
        self.manually_paused = false;
        self.stalled = false;
        if self.has_music() {
            self.play(now, notifier);
        }
    }

    pub fn pause_manual(&mut self) {
        self.manually_paused = true;
        self.pause_widget();
    }

    /// Pause issued by the timer (break, finish); leaves the override alone
    pub fn pause_auto(&mut self) {
        self.pause_widget();
    }

    pub fn toggle(&mut self, now: Instant, notifier: &mut dyn Notifier) {
        if self.playing {
            self.pause_manual();
        } else {
            self.play_manual(now, notifier);
        }
    }

    pub fn adjust_volume(&mut self, up: bool, notifier: &mut dyn Notifier) {
        if self.readiness != Readiness::Ready {
            return;
        }
        let Some(handle) = self.handle.as_mut() else {
            return;
        };
        self.volume = step_volume(self.volume, up);
        handle.widget.set_volume(self.volume);
        notifier.notify(&format!("Volume: {}%", self.volume), Severity::Info);
    }

    /// Keep playback in line with the phase while the timer runs. Never
    /// overrides a manual pause.
    pub fn auto_sync(&mut self, phase: Phase, now: Instant, notifier: &mut dyn Notifier) {
        if self.readiness != Readiness::Ready {
            return;
        }
        match phase {
            Phase::Study if !self.playing && !self.manually_paused && !self.stalled => {
                debug!("auto-sync: resuming music for study");
                self.play(now, notifier);
            }
            Phase::Review | Phase::Break if self.playing => {
                debug!("auto-sync: pausing music outside study");
                self.pause_auto();
            }
            _ => {}
        }
    }

    /// Release the widget and forget everything tied to it
    pub fn destroy(&mut self) {
        self.tasks.cancel_all();
        self.position_poll = None;
        self.readiness_deadline = None;
        if let Some(mut handle) = self.handle.take() {
            info!(handle = handle.id.0, "music player destroyed");
            handle.widget.destroy();
        }
        self.readiness = Readiness::Absent;
        self.playing = false;
        self.manually_paused = false;
        self.stalled = false;
        self.last_position = None;
    }

    pub fn on_notice(
        &mut self,
        notice: WidgetNotice,
        session_running: bool,
        now: Instant,
        notifier: &mut dyn Notifier,
    ) {
        if self.handle.as_ref().map(|h| h.id) != Some(notice.handle) {
            debug!(handle = notice.handle.0, ?notice.event, "ignoring notice from stale player");
            return;
        }

        match notice.event {
            WidgetEvent::Ready => self.on_ready(),
            WidgetEvent::StateChange(state) => {
                self.on_state_change(state, session_running, now, notifier)
            }
            WidgetEvent::Error(code) => self.on_error(code, notifier),
        }
    }

    fn on_ready(&mut self) {
        let Readiness::Loading { play_on_ready } = self.readiness else {
            return;
        };
        info!("music player ready");
        self.readiness = Readiness::Ready;
        self.cancel_deadline();
        if let Some(handle) = self.handle.as_mut() {
            handle.widget.set_volume(self.volume);
        }
        if play_on_ready {
            self.start_widget();
        }
    }

    fn on_state_change(
        &mut self,
        state: PlayerState,
        session_running: bool,
        now: Instant,
        notifier: &mut dyn Notifier,
    ) {
        debug!(?state, "player state changed");
        match state {
            PlayerState::Playing => {
                self.playing = true;
                self.manually_paused = false;
                if self.position_poll.is_none() {
                    self.position_poll =
                        Some(self.tasks.every(now, POSITION_POLL, SyncTask::PollPosition));
                }
            }
            PlayerState::Paused => {
                self.playing = false;
                self.stop_position_poll();
            }
            PlayerState::Ended => {
                self.playing = false;
                self.stop_position_poll();
                self.last_position = None;
                if session_running && !self.manually_paused {
                    self.play(now, notifier);
                }
            }
            PlayerState::Unstarted | PlayerState::Buffering | PlayerState::Cued => {}
        }
    }

    fn on_error(&mut self, code: i32, notifier: &mut dyn Notifier) {
        warn!(code, "music player error");
        self.playing = false;
        self.stop_position_poll();
        if let Readiness::Loading { .. } = self.readiness {
            self.readiness = Readiness::Loading {
                play_on_ready: false,
            };
        }
        self.cancel_deadline();
        self.stalled = true;
        notifier.notify(&describe_widget_error(code), Severity::Error);
    }

    /// Fire due position polls and readiness deadlines
    pub fn poll(&mut self, now: Instant, notifier: &mut dyn Notifier) {
        while let Some((_, task, _)) = self.tasks.pop_due(now) {
            match task {
                SyncTask::PollPosition => self.record_position(),
                SyncTask::ReadinessDeadline => {
                    self.readiness_deadline = None;
                    if let Readiness::Loading {
                        play_on_ready: true,
                    } = self.readiness
                    {
                        warn!("music player not ready in time, giving up");
                        self.readiness = Readiness::Loading {
                            play_on_ready: false,
                        };
                        self.stalled = true;
                        notifier.notify(
                            "Music player took too long to load. Press m to try again.",
                            Severity::Warning,
                        );
                    }
                }
            }
        }
    }

    fn defer_play(&mut self, now: Instant) {
        debug!("player not ready, deferring play");
        self.readiness = Readiness::Loading {
            play_on_ready: true,
        };
        if self.readiness_deadline.is_none() {
            let id = self
                .tasks
                .once(now, self.readiness_timeout, SyncTask::ReadinessDeadline);
            self.readiness_deadline = Some(id);
        }
    }

    fn start_widget(&mut self) {
        let resume_at = self.last_position.filter(|secs| *secs > 0.0);
        if let Some(handle) = self.handle.as_mut() {
            if let Some(secs) = resume_at {
                handle.widget.seek_to(secs);
            }
            handle.widget.play_video();
        }
    }

    fn pause_widget(&mut self) {
        if let Readiness::Loading { .. } = self.readiness {
            self.readiness = Readiness::Loading {
                play_on_ready: false,
            };
            self.cancel_deadline();
        }
        if self.readiness == Readiness::Ready {
            self.record_position();
            if let Some(handle) = self.handle.as_mut() {
                handle.widget.pause_video();
            }
        }
    }

    fn record_position(&mut self) {
        if let Some(handle) = &self.handle {
            self.last_position = Some(handle.widget.current_time());
        }
    }

    fn stop_position_poll(&mut self) {
        if let Some(id) = self.position_poll.take() {
            self.tasks.cancel(id);
        }
    }

    fn cancel_deadline(&mut self) {
        if let Some(id) = self.readiness_deadline.take() {
            self.tasks.cancel(id);
        }
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }

    pub fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle_id(&self) -> Option<HandleId> {
        self.handle.as_ref().map(|h| h.id)
    }

    pub fn video(&self) -> Option<&VideoId> {
        self.handle.as_ref().map(|h| &h.video)
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_manually_paused(&self) -> bool {
        self.manually_paused
    }

    pub fn play_pending(&self) -> bool {
        self.readiness
            == Readiness::Loading {
                play_on_ready: true,
            }
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn last_position(&self) -> Option<f64> {
        self.last_position
    }
}
