// Library surface for the binary, headless integration tests and reuse.
// Terminal rendering stays in the binary.
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod logging;
pub mod mpv;
pub mod phase;
pub mod player;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod surface;
pub mod sync;
pub mod testing;
pub mod timer;
pub mod util;
pub mod video;

pub use error::{FocusError, Result};
pub use session::Session;
