use thiserror::Error;

/// Errors surfaced by the library. None of these abort a running timer.
#[derive(Error, Debug)]
pub enum FocusError {
    #[error("total session length must be at least one minute")]
    InvalidDuration,

    #[error("session length can't change while the timer is running")]
    SessionActive,

    #[error("not a YouTube link or video id: {0:?}")]
    InvalidReference(String),

    #[error("music player unavailable: {0}")]
    PlayerUnavailable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FocusError>;
