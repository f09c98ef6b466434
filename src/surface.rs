use std::collections::VecDeque;
use std::io::{self, Write};
use std::time::{Duration, Instant};

pub const TOAST_LIFETIME: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Where the countdown and the phase/cycle line go
pub trait Display {
    fn show_countdown(&mut self, text: &str);
    fn show_status(&mut self, text: &str);
    /// Configuration inputs are locked while a session runs
    fn lock_inputs(&mut self, locked: bool);
}

/// Transient user-facing messages
pub trait Notifier {
    fn notify(&mut self, message: &str, severity: Severity);
}

/// Audible transition cue
pub trait AlarmCue {
    fn play(&mut self);
    fn pause(&mut self);
    fn rewind(&mut self);
}

/// Last rendered countdown/status, read back by the terminal UI
#[derive(Debug, Clone, Default)]
pub struct Screen {
    pub countdown: String,
    pub status: String,
    pub inputs_locked: bool,
}

impl Display for Screen {
    fn show_countdown(&mut self, text: &str) {
        self.countdown = text.to_string();
    }

    fn show_status(&mut self, text: &str) {
        self.status = text.to_string();
    }

    fn lock_inputs(&mut self, locked: bool) {
        self.inputs_locked = locked;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub message: String,
    pub severity: Severity,
    pub shown_at: Instant,
}

/// Toast stack; entries drop off after [`TOAST_LIFETIME`]
#[derive(Debug, Clone, Default)]
pub struct ToastBoard {
    toasts: VecDeque<Toast>,
}

const MAX_TOASTS: usize = 4;

impl ToastBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_at(&mut self, message: &str, severity: Severity, now: Instant) {
        if self.toasts.len() == MAX_TOASTS {
            self.toasts.pop_front();
        }
        self.toasts.push_back(Toast {
            message: message.to_string(),
            severity,
            shown_at: now,
        });
    }

    pub fn prune(&mut self, now: Instant) {
        self.toasts
            .retain(|t| now.saturating_duration_since(t.shown_at) < TOAST_LIFETIME);
    }

    pub fn visible(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn latest(&self) -> Option<&Toast> {
        self.toasts.back()
    }
}

impl Notifier for ToastBoard {
    fn notify(&mut self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => tracing::warn!(%message, "toast"),
            _ => tracing::debug!(%message, %severity, "toast"),
        }
        self.push_at(message, severity, Instant::now());
    }
}

/// Rings the terminal bell. A terminal can't hold a tone, so `pause`
/// and `rewind` only reset the ringing flag.
#[derive(Debug, Default)]
pub struct TerminalBell {
    ringing: bool,
}

impl TerminalBell {
    pub fn is_ringing(&self) -> bool {
        self.ringing
    }
}

impl AlarmCue for TerminalBell {
    fn play(&mut self) {
        self.ringing = true;
        let mut out = io::stdout();
        if let Err(e) = out.write_all(b"\x07").and_then(|_| out.flush()) {
            tracing::debug!("bell failed: {e}");
        }
    }

    fn pause(&mut self) {
        self.ringing = false;
    }

    fn rewind(&mut self) {
        self.ringing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toasts_expire_after_lifetime() {
        let t0 = Instant::now();
        let mut board = ToastBoard::new();
        board.push_at("Break Time!", Severity::Info, t0);
        board.push_at("Volume: 60%", Severity::Info, t0 + Duration::from_secs(2));

        board.prune(t0 + Duration::from_millis(2999));
        assert_eq!(board.visible().count(), 2);

        board.prune(t0 + Duration::from_secs(3));
        assert_eq!(board.visible().count(), 1);
        assert_eq!(board.latest().unwrap().message, "Volume: 60%");

        board.prune(t0 + Duration::from_secs(10));
        assert!(board.latest().is_none());
    }

    #[test]
    fn toast_stack_is_bounded() {
        let t0 = Instant::now();
        let mut board = ToastBoard::new();
        for i in 0..10 {
            board.push_at(&format!("m{i}"), Severity::Info, t0);
        }
        assert_eq!(board.visible().count(), MAX_TOASTS);
        assert_eq!(board.latest().unwrap().message, "m9");
    }

    #[test]
    fn screen_records_last_render() {
        let mut screen = Screen::default();
        screen.show_countdown("25:00");
        screen.show_status("Ready to Start");
        screen.lock_inputs(true);
        assert_eq!(screen.countdown, "25:00");
        assert_eq!(screen.status, "Ready to Start");
        assert!(screen.inputs_locked);
    }
}
