//! Platform primitives: autoplay policy, media type support, in-view trigger
//!
//! These are the deterministic stand-ins for browser behavior that engines
//! and hosts consult; none of them perform I/O.

pub mod autoplay;
pub mod media;
pub mod visibility;

pub use autoplay::AutoplayPolicy;
pub use media::{can_play_type, sniff_container, CanPlayType, Container};
pub use visibility::{InViewOptions, InViewTrigger, RootMargin};

/// Sources whose type the platform might play, in preference order
pub fn playable_sources(sources: Vec<crate::MediaSource>) -> Vec<crate::MediaSource> {
    sources
        .into_iter()
        .filter(|s| can_play_type(&s.mime_type) != CanPlayType::Empty)
        .collect()
}
