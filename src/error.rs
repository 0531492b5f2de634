//! Error types for the media controller and its playback engines

use thiserror::Error;

/// Result type alias for controller and engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or mounting a media controller
///
/// Playback failures reported by an engine after mount are never returned
/// through this type; they surface as [`PlaybackFault`] and the
/// `Errored` playback state instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to initialize a playback engine
    #[error("Engine initialization failed: {0}")]
    InitializationError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// The engine refused a command outright
    #[error("Engine error: {0}")]
    EngineError(String),

    /// Reading a configuration file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Why a playback start request did not result in playback.
///
/// Engines translate their platform's failure taxonomy into this enum so
/// the controller never string-matches runtime error names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackRejectionReason {
    /// Autoplay policy requires a user gesture or permission
    NotAllowed,
    /// A later start request replaced this one before it resolved
    Superseded,
    /// No source has a container/codec the engine can play
    Unsupported,
    /// Fetching the source failed
    Network,
    /// The source was fetched but could not be decoded
    Decode,
    /// The engine aborted playback for another reason
    Aborted,
}

impl PlaybackRejectionReason {
    /// Benign rejections leave the component paused instead of errored.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            PlaybackRejectionReason::NotAllowed | PlaybackRejectionReason::Superseded
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackRejectionReason::NotAllowed => "not_allowed",
            PlaybackRejectionReason::Superseded => "superseded",
            PlaybackRejectionReason::Unsupported => "unsupported",
            PlaybackRejectionReason::Network => "network",
            PlaybackRejectionReason::Decode => "decode",
            PlaybackRejectionReason::Aborted => "aborted",
        }
    }
}

impl std::fmt::Display for PlaybackRejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-benign playback failure, terminal for the current mount.
#[derive(Error, Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[error("playback fault ({reason}): {detail}")]
pub struct PlaybackFault {
    pub reason: PlaybackRejectionReason,
    pub detail: String,
}

/// Outcome of classifying an engine rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Recovered locally; the component stays paused
    Benign(PlaybackRejectionReason),
    /// Surfaced as the `Errored` state
    Fault(PlaybackFault),
}

/// Split an engine rejection into benign and fatal causes.
pub fn classify_rejection(reason: PlaybackRejectionReason, detail: impl Into<String>) -> Classification {
    if reason.is_benign() {
        Classification::Benign(reason)
    } else {
        Classification::Fault(PlaybackFault {
            reason,
            detail: detail.into(),
        })
    }
}
