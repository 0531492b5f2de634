//! Rendering model: which surface is visible and how it is framed

pub mod layout;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::controller::SurfaceFlags;
use crate::{Dimension, MediaSource, Preload};

/// The complete visible output of a media component
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderOutput {
    pub container: Container,
    pub surface: Surface,
    /// Drawn over the surface when playback failed
    pub overlay: Option<Placeholder>,
}

impl RenderOutput {
    /// Content-addressed digest of the output, stable across runs.
    pub fn fingerprint(&self) -> String {
        // Serializing plain data cannot fail; an empty payload still hashes.
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&bytes))
    }

    pub fn shows_video(&self) -> bool {
        matches!(self.surface, Surface::Video { .. })
    }

    pub fn shows_thumbnail(&self) -> bool {
        matches!(self.surface, Surface::Thumbnail { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Container {
    pub width: Dimension,
    pub height: Dimension,
    pub cursor: Cursor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cursor {
    Default,
    /// Signals that hovering the surface does something
    Pointer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectFit {
    Cover,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Surface {
    Thumbnail {
        uri: String,
        alt: String,
        draggable: bool,
        fit: ObjectFit,
    },
    Video {
        sources: Vec<MediaSource>,
        autoplay: bool,
        loop_playback: bool,
        muted: bool,
        controls: bool,
        plays_inline: bool,
        preload: Preload,
        fit: ObjectFit,
    },
}

impl Surface {
    pub fn thumbnail(uri: impl Into<String>, alt: impl Into<String>) -> Self {
        Surface::Thumbnail {
            uri: uri.into(),
            alt: alt.into(),
            draggable: false,
            fit: ObjectFit::Cover,
        }
    }

    pub(crate) fn video(flags: &SurfaceFlags) -> Self {
        Surface::Video {
            sources: flags.sources.clone(),
            autoplay: flags.autoplay,
            loop_playback: flags.loop_playback,
            muted: flags.muted,
            controls: flags.controls,
            plays_inline: true,
            preload: flags.preload,
            fit: ObjectFit::Cover,
        }
    }

    /// URI of the image or of the first video source
    pub fn primary_uri(&self) -> Option<&str> {
        match self {
            Surface::Thumbnail { uri, .. } => Some(uri),
            Surface::Video { sources, .. } => sources.first().map(|s| s.uri.as_str()),
        }
    }
}

/// Panel shown in place of media that failed to play
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placeholder {
    pub message: String,
    pub background: String,
    pub color: String,
    pub font_size_px: u32,
}

impl Placeholder {
    pub fn unavailable() -> Self {
        Self {
            message: "Video unavailable".to_string(),
            background: "#f0f0f0".to_string(),
            color: "#666".to_string(),
            font_size_px: 14,
        }
    }
}
