//! Recording fakes for the session collaborators and the playback widget.
//!
//! Used by unit tests and by the headless integration tests under `tests/`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{FocusError, Result};
use crate::player::{HandleId, PlaybackWidget, WidgetFactory};
use crate::surface::{AlarmCue, Display, Notifier, Severity};
use crate::video::VideoId;

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetCall {
    Created(HandleId, String),
    Play(HandleId),
    Pause(HandleId),
    Seek(HandleId, f64),
    Volume(HandleId, u8),
    Destroy(HandleId),
}

#[derive(Debug, Default)]
struct WidgetLog {
    calls: RefCell<Vec<WidgetCall>>,
    position: Cell<f64>,
    fail_create: Cell<bool>,
}

/// Factory whose widgets write every call into a shared log
#[derive(Debug, Clone, Default)]
pub struct RecordingWidgetFactory {
    log: Rc<WidgetLog>,
}

impl RecordingWidgetFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<WidgetCall> {
        self.log.calls.borrow().clone()
    }

    pub fn clear(&self) {
        self.log.calls.borrow_mut().clear();
    }

    pub fn play_count(&self) -> usize {
        self.count(|c| matches!(c, WidgetCall::Play(_)))
    }

    pub fn pause_count(&self) -> usize {
        self.count(|c| matches!(c, WidgetCall::Pause(_)))
    }

    pub fn created_count(&self) -> usize {
        self.count(|c| matches!(c, WidgetCall::Created(..)))
    }

    fn count(&self, pred: impl Fn(&WidgetCall) -> bool) -> usize {
        self.log.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    /// Position reported by `current_time` on every widget
    pub fn set_position(&self, secs: f64) {
        self.log.position.set(secs);
    }

    pub fn fail_next_create(&self) {
        self.log.fail_create.set(true);
    }
}

impl WidgetFactory for RecordingWidgetFactory {
    fn create(&mut self, handle: HandleId, video: &VideoId) -> Result<Box<dyn PlaybackWidget>> {
        if self.log.fail_create.replace(false) {
            return Err(FocusError::PlayerUnavailable("widget refused to load".into()));
        }
        self.log
            .calls
            .borrow_mut()
            .push(WidgetCall::Created(handle, video.to_string()));
        Ok(Box::new(RecordingWidget {
            handle,
            log: Rc::clone(&self.log),
        }))
    }
}

struct RecordingWidget {
    handle: HandleId,
    log: Rc<WidgetLog>,
}

impl RecordingWidget {
    fn record(&self, call: WidgetCall) {
        self.log.calls.borrow_mut().push(call);
    }
}

impl PlaybackWidget for RecordingWidget {
    fn play_video(&mut self) {
        self.record(WidgetCall::Play(self.handle));
    }

    fn pause_video(&mut self) {
        self.record(WidgetCall::Pause(self.handle));
    }

    fn seek_to(&mut self, secs: f64) {
        self.record(WidgetCall::Seek(self.handle, secs));
    }

    fn set_volume(&mut self, volume: u8) {
        self.record(WidgetCall::Volume(self.handle, volume));
    }

    fn current_time(&self) -> f64 {
        self.log.position.get()
    }

    fn destroy(&mut self) {
        self.record(WidgetCall::Destroy(self.handle));
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    pub countdowns: Vec<String>,
    pub statuses: Vec<String>,
    pub inputs_locked: bool,
}

impl RecordingDisplay {
    pub fn countdown(&self) -> Option<&str> {
        self.countdowns.last().map(String::as_str)
    }

    pub fn status(&self) -> Option<&str> {
        self.statuses.last().map(String::as_str)
    }
}

impl Display for RecordingDisplay {
    fn show_countdown(&mut self, text: &str) {
        self.countdowns.push(text.to_string());
    }

    fn show_status(&mut self, text: &str) {
        self.statuses.push(text.to_string());
    }

    fn lock_inputs(&mut self, locked: bool) {
        self.inputs_locked = locked;
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    pub messages: Vec<(String, Severity)>,
}

impl RecordingNotifier {
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.iter().any(|(m, _)| m.contains(needle))
    }

    pub fn count_of(&self, severity: Severity) -> usize {
        self.messages.iter().filter(|(_, s)| *s == severity).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, message: &str, severity: Severity) {
        self.messages.push((message.to_string(), severity));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueCall {
    Play,
    Pause,
    Rewind,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingAlarm {
    pub calls: Vec<CueCall>,
}

impl RecordingAlarm {
    pub fn plays(&self) -> usize {
        self.calls.iter().filter(|c| **c == CueCall::Play).count()
    }

    /// True when the last call left the cue sounding
    pub fn is_sounding(&self) -> bool {
        self.calls.last() == Some(&CueCall::Play)
    }
}

impl AlarmCue for RecordingAlarm {
    fn play(&mut self) {
        self.calls.push(CueCall::Play);
    }

    fn pause(&mut self) {
        self.calls.push(CueCall::Pause);
    }

    fn rewind(&mut self) {
        self.calls.push(CueCall::Rewind);
    }
}
