//! Music playback through an `mpv` child process.
//!
//! mpv resolves YouTube links with yt-dlp and is driven over its JSON IPC
//! socket. A reader thread per player turns mpv events into
//! [`WidgetNotice`]s for the main loop.

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use crate::player::{PlayerState, WidgetEvent, ERROR_HTML5, ERROR_NOT_FOUND};
#[cfg(unix)]
use crate::player::WidgetNotice;
use crate::player::{HandleId, NoticeSink, PlaybackWidget, WidgetFactory};
use crate::video::VideoId;

const OBSERVE_PAUSE: i64 = 1;
const OBSERVE_TIME: i64 = 2;

/// What one line from mpv means for us
#[derive(Debug, Clone, Copy, PartialEq)]
enum MpvMessage {
    Event(WidgetEvent),
    Position(f64),
}

fn translate(line: &str) -> Option<MpvMessage> {
    let value: Value = serde_json::from_str(line).ok()?;
    match value.get("event")?.as_str()? {
        "property-change" => match value.get("name")?.as_str()? {
            "pause" => {
                let paused = value.get("data")?.as_bool()?;
                let state = if paused {
                    PlayerState::Paused
                } else {
                    PlayerState::Playing
                };
                Some(MpvMessage::Event(WidgetEvent::StateChange(state)))
            }
            "time-pos" => value.get("data")?.as_f64().map(MpvMessage::Position),
            _ => None,
        },
        "end-file" => match value.get("reason").and_then(Value::as_str) {
            Some("eof") => Some(MpvMessage::Event(WidgetEvent::StateChange(
                PlayerState::Ended,
            ))),
            Some("error") => Some(MpvMessage::Event(WidgetEvent::Error(ERROR_NOT_FOUND))),
            _ => None,
        },
        _ => None,
    }
}

fn command_line(args: Value) -> String {
    let mut line = json!({ "command": args }).to_string();
    line.push('\n');
    line
}

#[derive(Default)]
struct Shared {
    position: Mutex<f64>,
    #[cfg(unix)]
    writer: Mutex<Option<std::os::unix::net::UnixStream>>,
}

impl Shared {
    #[cfg(unix)]
    fn send(&self, args: Value) {
        use std::io::Write;

        let Ok(mut guard) = self.writer.lock() else {
            return;
        };
        if let Some(stream) = guard.as_mut() {
            if let Err(e) = stream.write_all(command_line(args).as_bytes()) {
                tracing::debug!("mpv command dropped: {e}");
            }
        }
    }

    #[cfg(not(unix))]
    fn send(&self, _args: Value) {}
}

/// Spawns one mpv process per player handle
pub struct MpvWidgetFactory {
    sink: Arc<dyn NoticeSink>,
    binary: String,
}

impl MpvWidgetFactory {
    pub fn new(sink: Arc<dyn NoticeSink>) -> Self {
        Self {
            sink,
            binary: "mpv".to_string(),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }
}

#[cfg(unix)]
impl WidgetFactory for MpvWidgetFactory {
    fn create(
        &mut self,
        handle: HandleId,
        video: &VideoId,
    ) -> crate::error::Result<Box<dyn PlaybackWidget>> {
        use std::process::{Command, Stdio};

        use crate::error::FocusError;

        let socket = std::env::temp_dir().join(format!(
            "focusbeat-{}-{}.sock",
            std::process::id(),
            handle.0
        ));
        let _ = std::fs::remove_file(&socket);

        let child = Command::new(&self.binary)
            .arg("--no-video")
            .arg("--no-terminal")
            .arg("--pause")
            .arg("--loop-file=inf")
            .arg("--ytdl-format=bestaudio/best")
            .arg(format!("--input-ipc-server={}", socket.display()))
            .arg(video.watch_url())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    FocusError::PlayerUnavailable(format!("{} not found on PATH", self.binary))
                }
                _ => FocusError::Io(e),
            })?;
        tracing::info!(pid = child.id(), %video, "spawned mpv");

        let shared = Arc::new(Shared::default());
        ipc::spawn_reader(handle, socket.clone(), Arc::clone(&shared), Arc::clone(&self.sink));

        Ok(Box::new(MpvWidget {
            child: Some(child),
            shared,
            socket,
        }))
    }
}

#[cfg(not(unix))]
impl WidgetFactory for MpvWidgetFactory {
    fn create(
        &mut self,
        _handle: HandleId,
        _video: &VideoId,
    ) -> crate::error::Result<Box<dyn PlaybackWidget>> {
        Err(crate::error::FocusError::PlayerUnavailable(
            "music playback needs mpv IPC sockets, which this platform lacks".into(),
        ))
    }
}

#[cfg(unix)]
mod ipc {
    use std::io::{BufRead, BufReader};
    use std::os::unix::net::UnixStream;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use serde_json::json;

    use super::*;

    const CONNECT_ATTEMPTS: u32 = 100;
    const CONNECT_BACKOFF: Duration = Duration::from_millis(100);

    pub(super) fn spawn_reader(
        handle: HandleId,
        socket: PathBuf,
        shared: Arc<Shared>,
        sink: Arc<dyn NoticeSink>,
    ) {
        thread::spawn(move || {
            let deliver = |event| sink.deliver(WidgetNotice { handle, event });

            let Some(stream) = connect(&socket) else {
                tracing::warn!(socket = %socket.display(), "mpv IPC never came up");
                deliver(WidgetEvent::Error(ERROR_HTML5));
                return;
            };
            let writer = match stream.try_clone() {
                Ok(w) => w,
                Err(e) => {
                    tracing::warn!("mpv IPC clone failed: {e}");
                    deliver(WidgetEvent::Error(ERROR_HTML5));
                    return;
                }
            };
            if let Ok(mut guard) = shared.writer.lock() {
                *guard = Some(writer);
            }

            deliver(WidgetEvent::Ready);
            shared.send(json!(["observe_property", OBSERVE_PAUSE, "pause"]));
            shared.send(json!(["observe_property", OBSERVE_TIME, "time-pos"]));

            for line in BufReader::new(stream).lines() {
                let Ok(line) = line else {
                    break;
                };
                match translate(&line) {
                    Some(MpvMessage::Event(event)) => deliver(event),
                    Some(MpvMessage::Position(secs)) => {
                        if let Ok(mut pos) = shared.position.lock() {
                            *pos = secs;
                        }
                    }
                    None => {}
                }
            }
            tracing::debug!(handle = handle.0, "mpv IPC closed");
        });
    }

    fn connect(socket: &Path) -> Option<UnixStream> {
        for _ in 0..CONNECT_ATTEMPTS {
            if let Ok(stream) = UnixStream::connect(socket) {
                return Some(stream);
            }
            thread::sleep(CONNECT_BACKOFF);
        }
        None
    }
}

/// Handle to one running mpv process
pub struct MpvWidget {
    child: Option<std::process::Child>,
    shared: Arc<Shared>,
    socket: std::path::PathBuf,
}

impl PlaybackWidget for MpvWidget {
    fn play_video(&mut self) {
        self.shared.send(json!(["set_property", "pause", false]));
    }

    fn pause_video(&mut self) {
        self.shared.send(json!(["set_property", "pause", true]));
    }

    fn seek_to(&mut self, secs: f64) {
        self.shared.send(json!(["seek", secs, "absolute"]));
    }

    fn set_volume(&mut self, volume: u8) {
        self.shared.send(json!(["set_property", "volume", volume]));
    }

    fn current_time(&self) -> f64 {
        self.shared.position.lock().map(|p| *p).unwrap_or(0.0)
    }

    fn destroy(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        self.shared.send(json!(["quit"]));
        if let Err(e) = child.kill() {
            tracing::debug!("mpv already gone: {e}");
        }
        let _ = child.wait();
        let _ = std::fs::remove_file(&self.socket);
    }
}

impl Drop for MpvWidget {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_property_maps_to_state() {
        let paused = r#"{"event":"property-change","id":1,"name":"pause","data":true}"#;
        let playing = r#"{"event":"property-change","id":1,"name":"pause","data":false}"#;
        assert_eq!(
            translate(paused),
            Some(MpvMessage::Event(WidgetEvent::StateChange(
                PlayerState::Paused
            )))
        );
        assert_eq!(
            translate(playing),
            Some(MpvMessage::Event(WidgetEvent::StateChange(
                PlayerState::Playing
            )))
        );
    }

    #[test]
    fn time_pos_is_a_position() {
        let line = r#"{"event":"property-change","id":2,"name":"time-pos","data":12.5}"#;
        assert_eq!(translate(line), Some(MpvMessage::Position(12.5)));

        // time-pos is null while nothing is loaded
        let unloaded = r#"{"event":"property-change","id":2,"name":"time-pos"}"#;
        assert_eq!(translate(unloaded), None);
    }

    #[test]
    fn end_file_reasons() {
        let eof = r#"{"event":"end-file","reason":"eof"}"#;
        let error = r#"{"event":"end-file","reason":"error","file_error":"loading failed"}"#;
        let quit = r#"{"event":"end-file","reason":"quit"}"#;
        assert_eq!(
            translate(eof),
            Some(MpvMessage::Event(WidgetEvent::StateChange(
                PlayerState::Ended
            )))
        );
        assert_eq!(
            translate(error),
            Some(MpvMessage::Event(WidgetEvent::Error(ERROR_NOT_FOUND)))
        );
        assert_eq!(translate(quit), None);
    }

    #[test]
    fn replies_and_noise_are_ignored() {
        assert_eq!(translate(r#"{"data":null,"error":"success"}"#), None);
        assert_eq!(translate("not json"), None);
        assert_eq!(translate(r#"{"event":"idle"}"#), None);
    }

    #[test]
    fn commands_are_newline_terminated_json() {
        let line = command_line(json!(["set_property", "volume", 60]));
        assert_eq!(line, "{\"command\":[\"set_property\",\"volume\",60]}\n");
    }
}
