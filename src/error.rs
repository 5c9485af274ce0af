use std::io;
use thiserror::Error;

/// Lifecycle violations of a navigation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidState {
    AlreadyActive,
    NotActive,
}

impl std::fmt::Display for InvalidState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidState::AlreadyActive => write!(f, "navigation session is already active"),
            InvalidState::NotActive => write!(f, "navigation session is not active"),
        }
    }
}

/// Failures surfaced to callers of the navigation core.
///
/// Everything else (signal sink hiccups, silent or malformed position feeds)
/// is logged and absorbed by the next tick.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NavError {
    #[error("invalid state: {0}")]
    InvalidState(InvalidState),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid waypoint: {0}")]
    InvalidWaypoint(String),
}

pub type NavResult<T> = Result<T, NavError>;

/// Actuator sink could not take a command. Never fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalError {
    #[error("signal output unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while reading an external position feed.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("position feed I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("position feed unavailable: {0}")]
    Unavailable(String),

    #[error("position feed already consumed")]
    Consumed,
}

/// Errors raised while loading settings from disk.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read settings: {0}")]
    Io(#[from] io::Error),

    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] NavError),
}
