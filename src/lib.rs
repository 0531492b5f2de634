//! Hoverclip
//!
//! A media component controller for hover-to-play previews and looping
//! background clips. The controller owns a single visual surface (a poster
//! image or a video surface), drives a pluggable playback engine, and turns
//! the engine's lifecycle events into a small playback state machine.
//!
//! # Features
//!
//! - **Inline engine** (default, feature `inline`): resolves `file://`,
//!   `http(s)://` and `data:` sources and checks the container header
//! - **Noop engine**: in-memory scripted engine for deterministic tests
//! - **Safe fallbacks**: hover mode without a thumbnail degrades to plain
//!   background playback, autoplay policy blocks are treated as benign
//!
//! # Example
//!
//! ```
//! use hoverclip::{Callbacks, MediaConfig, MediaController, NoopEngine, PlaybackState};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MediaConfig::new("a.mp4").hover_to_play("a.jpg");
//! let engine = NoopEngine::new();
//! let mut player = MediaController::mount(config, Callbacks::default(), engine)?;
//! assert_eq!(player.state(), PlaybackState::ShowingThumbnail);
//!
//! player.pointer_enter();
//! assert_eq!(player.state(), PlaybackState::Playing);
//! player.pointer_leave();
//! assert_eq!(player.state(), PlaybackState::ShowingThumbnail);
//! player.unmount();
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

pub mod error;
pub use error::{Error, PlaybackFault, PlaybackRejectionReason, Result};

pub mod controller;
pub use controller::{MediaController, Mode};

// Scripted in-memory engine
pub mod noop;
pub use noop::NoopEngine;

// Real backend: source resolution and container sniffing
#[cfg(feature = "inline")]
pub mod inline;
#[cfg(feature = "inline")]
pub use inline::InlineVideoEngine;

// Surface description and framing
pub mod rendering;

// Autoplay policy, media type support, in-view trigger
pub mod platform;

fn default_true() -> bool {
    true
}

fn default_mime_type() -> String {
    "video/mp4".to_string()
}

fn default_alt_text() -> String {
    "Video content".to_string()
}

/// One candidate source for the playback engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSource {
    pub uri: String,
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
}

impl MediaSource {
    pub fn new(uri: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            mime_type: mime_type.into(),
        }
    }

    /// A source with the default `video/mp4` type
    pub fn mp4(uri: impl Into<String>) -> Self {
        Self::new(uri, default_mime_type())
    }
}

/// A CSS-like length for the component container
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DimensionRepr", into = "String")]
pub enum Dimension {
    Auto,
    Percent(f32),
    Pixels(u32),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DimensionRepr {
    Number(u32),
    Text(String),
}

impl TryFrom<DimensionRepr> for Dimension {
    type Error = Error;

    fn try_from(repr: DimensionRepr) -> Result<Self> {
        match repr {
            DimensionRepr::Number(px) => Ok(Dimension::Pixels(px)),
            DimensionRepr::Text(s) => s.parse(),
        }
    }
}

impl FromStr for Dimension {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Dimension::Auto);
        }
        if let Some(pct) = s.strip_suffix('%') {
            let value: f32 = pct
                .trim()
                .parse()
                .map_err(|_| Error::ConfigError(format!("invalid percentage '{}'", s)))?;
            if !value.is_finite() || value < 0.0 {
                return Err(Error::ConfigError(format!("invalid percentage '{}'", s)));
            }
            return Ok(Dimension::Percent(value));
        }
        let px = s.strip_suffix("px").unwrap_or(s).trim();
        px.parse::<u32>()
            .map(Dimension::Pixels)
            .map_err(|_| Error::ConfigError(format!("invalid dimension '{}'", s)))
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Auto => f.write_str("auto"),
            Dimension::Percent(p) => write!(f, "{}%", p),
            Dimension::Pixels(px) => write!(f, "{}px", px),
        }
    }
}

impl From<Dimension> for String {
    fn from(d: Dimension) -> Self {
        d.to_string()
    }
}

fn default_width() -> Dimension {
    Dimension::Percent(100.0)
}

fn default_height() -> Dimension {
    Dimension::Auto
}

/// Declarative configuration supplied by the hosting page
///
/// Only `primary_source` is required; every other field has a default
/// matching a decorative background clip: autoplaying, looping, muted and
/// without native controls.
///
/// # Examples
///
/// ```
/// let cfg: hoverclip::MediaConfig =
///     serde_json::from_str(r#"{"primarySource":{"uri":"hero.mp4"}}"#).unwrap();
/// assert!(cfg.autoplay && cfg.loop_playback && cfg.muted);
/// assert!(!cfg.hover_to_play);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaConfig {
    /// Main clip, tried first
    pub primary_source: MediaSource,
    /// Further formats, tried in order after the primary source
    #[serde(default)]
    pub alternate_sources: Vec<MediaSource>,
    /// Poster image shown in hover mode
    #[serde(default)]
    pub thumbnail_uri: Option<String>,
    #[serde(default = "default_true")]
    pub autoplay: bool,
    #[serde(default = "default_true", rename = "loop")]
    pub loop_playback: bool,
    #[serde(default = "default_true")]
    pub muted: bool,
    #[serde(default)]
    pub show_native_controls: bool,
    #[serde(default)]
    pub hover_to_play: bool,
    #[serde(default = "default_width")]
    pub width: Dimension,
    #[serde(default = "default_height")]
    pub height: Dimension,
    #[serde(default = "default_alt_text")]
    pub alt_text: String,
}

impl MediaConfig {
    /// Background clip configuration for a single mp4 source
    pub fn new(uri: impl Into<String>) -> Self {
        Self::with_source(MediaSource::mp4(uri))
    }

    pub fn with_source(primary_source: MediaSource) -> Self {
        Self {
            primary_source,
            alternate_sources: Vec::new(),
            thumbnail_uri: None,
            autoplay: true,
            loop_playback: true,
            muted: true,
            show_native_controls: false,
            hover_to_play: false,
            width: default_width(),
            height: default_height(),
            alt_text: default_alt_text(),
        }
    }

    /// Enable hover-to-play with the given poster image
    pub fn hover_to_play(mut self, thumbnail_uri: impl Into<String>) -> Self {
        self.hover_to_play = true;
        self.thumbnail_uri = Some(thumbnail_uri.into());
        self
    }

    pub fn alternate(mut self, source: MediaSource) -> Self {
        self.alternate_sources.push(source);
        self
    }

    pub fn autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    pub fn looping(mut self, loop_playback: bool) -> Self {
        self.loop_playback = loop_playback;
        self
    }

    pub fn muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    pub fn controls(mut self, show_native_controls: bool) -> Self {
        self.show_native_controls = show_native_controls;
        self
    }

    pub fn size(mut self, width: Dimension, height: Dimension) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn alt(mut self, alt_text: impl Into<String>) -> Self {
        self.alt_text = alt_text.into();
        self
    }

    /// Parse a configuration from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Sources in the order the engine should try them
    pub fn sources(&self) -> Vec<MediaSource> {
        std::iter::once(self.primary_source.clone())
            .chain(self.alternate_sources.iter().cloned())
            .collect()
    }

    /// Hover mode needs a poster; without one the component plays inline.
    pub fn hover_enabled(&self) -> bool {
        self.hover_to_play && self.thumbnail_uri.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        for source in self.sources() {
            if source.uri.trim().is_empty() {
                return Err(Error::ConfigError("source uri must not be empty".into()));
            }
            if source.mime_type.trim().is_empty() {
                return Err(Error::ConfigError(format!(
                    "source '{}' has an empty mime type",
                    source.uri
                )));
            }
        }
        if let Some(thumb) = &self.thumbnail_uri {
            if thumb.trim().is_empty() {
                return Err(Error::ConfigError("thumbnail uri must not be empty".into()));
            }
        }
        Ok(())
    }
}

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Optional notifications forwarded from the playback engine
#[derive(Clone, Default)]
pub struct Callbacks {
    pub on_play: Option<Callback>,
    pub on_pause: Option<Callback>,
    pub on_ended: Option<Callback>,
}

impl Callbacks {
    pub fn on_play<F>(mut self, cb: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_play = Some(Arc::new(cb));
        self
    }

    pub fn on_pause<F>(mut self, cb: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_pause = Some(Arc::new(cb));
        self
    }

    pub fn on_ended<F>(mut self, cb: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_ended = Some(Arc::new(cb));
        self
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_play", &self.on_play.is_some())
            .field("on_pause", &self.on_pause.is_some())
            .field("on_ended", &self.on_ended.is_some())
            .finish()
    }
}

/// Playback state owned by a [`MediaController`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Idle,
    ShowingThumbnail,
    Playing,
    Paused,
    Ended,
    Errored,
}

/// Identifies one attach of an engine; events from older sessions are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Session(pub u64);

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Preload hint handed to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Preload {
    None,
    Metadata,
    Auto,
}

/// Lifecycle notification reported by an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEventKind {
    Play,
    Pause,
    Ended,
    /// A start request was rejected or playback failed
    Failed {
        reason: PlaybackRejectionReason,
        detail: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEvent {
    pub session: Session,
    pub kind: EngineEventKind,
}

/// Channel end through which an engine reports events for one session
#[derive(Debug, Clone)]
pub struct EventSink {
    session: Session,
    tx: UnboundedSender<EngineEvent>,
}

impl EventSink {
    pub(crate) fn new(session: Session, tx: UnboundedSender<EngineEvent>) -> Self {
        Self { session, tx }
    }

    pub fn session(&self) -> Session {
        self.session
    }

    /// Report an event; returns false once the controller is gone.
    pub fn emit(&self, kind: EngineEventKind) -> bool {
        self.tx
            .send(EngineEvent {
                session: self.session,
                kind,
            })
            .is_ok()
    }

    pub fn fail(&self, reason: PlaybackRejectionReason, detail: impl Into<String>) -> bool {
        self.emit(EngineEventKind::Failed {
            reason,
            detail: detail.into(),
        })
    }
}

/// Everything an engine needs to mount a playback surface
#[derive(Debug, Clone)]
pub struct AttachRequest {
    pub session: Session,
    pub sources: Vec<MediaSource>,
    pub autoplay: bool,
    pub loop_playback: bool,
    pub muted: bool,
    pub plays_inline: bool,
    pub preload: Preload,
    pub events: EventSink,
}

/// Core trait for playback backends
///
/// Start requests are fire-and-forget: the outcome arrives later as an
/// [`EngineEvent`] on the session's [`EventSink`]. After `detach` an engine
/// must stop the session and should not report anything further for it.
pub trait PlaybackEngine: Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &'static str;

    /// Mount a playback surface for a new session
    fn attach(&self, request: AttachRequest) -> Result<()>;

    /// Ask the session to start playing
    fn request_start(&self, session: Session, user_gesture: bool) -> Result<()>;

    /// Pause a playing session
    fn pause(&self, session: Session) -> Result<()>;

    /// Stop buffering and playing; releases the session
    fn detach(&self, session: Session);
}

/// Create the default playback engine
///
/// This is the inline engine when the `inline` feature is enabled (default)
/// and must be called from within a tokio runtime.
#[cfg(feature = "inline")]
pub fn new_engine() -> Result<impl PlaybackEngine> {
    InlineVideoEngine::new()
}

// Without a real backend only the scripted engine is available.
#[cfg(not(feature = "inline"))]
pub fn new_engine() -> Result<impl PlaybackEngine> {
    Ok(NoopEngine::new())
}
