use crate::error::Result;
use crate::video::VideoId;

/// Generation number of a widget instance. Notices carry it so that a
/// late notice from a destroyed widget can be told apart from the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(pub u64);

/// Playback states, numbered like the YouTube iframe player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl PlayerState {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::Unstarted),
            0 => Some(Self::Ended),
            1 => Some(Self::Playing),
            2 => Some(Self::Paused),
            3 => Some(Self::Buffering),
            5 => Some(Self::Cued),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Unstarted => -1,
            Self::Ended => 0,
            Self::Playing => 1,
            Self::Paused => 2,
            Self::Buffering => 3,
            Self::Cued => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WidgetEvent {
    Ready,
    StateChange(PlayerState),
    Error(i32),
}

/// A widget event tagged with the handle that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidgetNotice {
    pub handle: HandleId,
    pub event: WidgetEvent,
}

pub const ERROR_INVALID_PARAM: i32 = 2;
pub const ERROR_HTML5: i32 = 5;
pub const ERROR_NOT_FOUND: i32 = 100;
pub const ERROR_NOT_EMBEDDABLE: i32 = 101;
pub const ERROR_NOT_EMBEDDABLE_ALT: i32 = 150;

pub fn describe_widget_error(code: i32) -> String {
    match code {
        ERROR_INVALID_PARAM => "That video link looks invalid. Check it and try again.".into(),
        ERROR_HTML5 => "This video can't be played by the music player.".into(),
        ERROR_NOT_FOUND => "Video not found. It may be private or removed.".into(),
        ERROR_NOT_EMBEDDABLE | ERROR_NOT_EMBEDDABLE_ALT => {
            "This video cannot be played (Copyright). Try another link.".into()
        }
        other => format!("Music playback failed (error {other})."),
    }
}

/// Live handle to an external playback widget.
///
/// Calls are fire-and-forget; the widget reports back through
/// [`WidgetNotice`]s on its own schedule.
pub trait PlaybackWidget {
    fn play_video(&mut self);
    fn pause_video(&mut self);
    fn seek_to(&mut self, secs: f64);
    fn set_volume(&mut self, volume: u8);
    fn current_time(&self) -> f64;
    fn destroy(&mut self);
}

/// Builds widgets with the fixed player setup: no native controls,
/// no related videos, looping on, minimal branding.
pub trait WidgetFactory {
    fn create(&mut self, handle: HandleId, video: &VideoId) -> Result<Box<dyn PlaybackWidget>>;
}

/// Destination for notices produced off the main loop
pub trait NoticeSink: Send + Sync + 'static {
    fn deliver(&self, notice: WidgetNotice);
}
