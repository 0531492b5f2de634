//! Media playback controller.
//!
//! [`MediaController`] owns the playback state of one media component and
//! decides which surface is visible.
//!
//! # State Machine
//!
//! ```text
//! Hover mode (hover_to_play + thumbnail):
//!   mount                        → ShowingThumbnail
//!   pointer_enter [thumbnail]    → Playing   (engine attached, start requested)
//!   pointer_leave [not thumbnail]→ ShowingThumbnail (engine detached)
//!   engine fault                 → Errored (terminal)
//!   pointer_leave [Errored]      → Errored   (engine detached)
//!
//! Background mode (everything else):
//!   mount, autoplay              → Playing   (start requested)
//!   mount, no autoplay           → Paused
//!   benign rejection             → Paused
//!   engine fault                 → Errored (terminal)
//! ```
//!
//! Engine events are tagged with the [`Session`] of the attach that
//! produced them. Only the currently attached session is honored, so a
//! detach always wins over a start request that completes late.

use log::{debug, info, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::{classify_rejection, Classification};
use crate::rendering::{Container, Cursor, Placeholder, RenderOutput, Surface};
use crate::{
    AttachRequest, Callbacks, EngineEvent, EngineEventKind, EventSink, MediaConfig,
    PlaybackEngine, PlaybackFault, PlaybackRejectionReason, PlaybackState, Preload, Result,
    Session,
};

/// Which branch of the component is active, fixed at mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Poster image until hovered
    Hover,
    /// Video surface rendered directly
    Background,
}

impl Mode {
    pub fn for_config(config: &MediaConfig) -> Self {
        if config.hover_enabled() {
            Mode::Hover
        } else {
            Mode::Background
        }
    }
}

/// Controller for a single media surface
pub struct MediaController<E: PlaybackEngine> {
    config: MediaConfig,
    mode: Mode,
    state: PlaybackState,
    engine: E,
    callbacks: Callbacks,
    events_tx: UnboundedSender<EngineEvent>,
    events_rx: UnboundedReceiver<EngineEvent>,
    next_session: u64,
    attached: Option<Session>,
    fault: Option<PlaybackFault>,
}

impl<E: PlaybackEngine> MediaController<E> {
    /// Mount a component for `config`.
    ///
    /// Only configuration problems are returned as errors. Engine failures
    /// during mount put the component into [`PlaybackState::Errored`].
    pub fn mount(config: MediaConfig, callbacks: Callbacks, engine: E) -> Result<Self> {
        config.validate()?;
        let mode = Mode::for_config(&config);
        if config.hover_to_play && mode == Mode::Background {
            debug!("hover-to-play requested without a thumbnail; playing inline");
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut controller = Self {
            config,
            mode,
            state: PlaybackState::Idle,
            engine,
            callbacks,
            events_tx,
            events_rx,
            next_session: 0,
            attached: None,
            fault: None,
        };

        match mode {
            Mode::Hover => controller.state = PlaybackState::ShowingThumbnail,
            Mode::Background => {
                if let Some(session) = controller.attach() {
                    if controller.config.autoplay {
                        controller.state = PlaybackState::Playing;
                        controller.start(session, false);
                    } else {
                        controller.state = PlaybackState::Paused;
                    }
                }
            }
        }

        info!(
            "mounted media controller ({:?} mode, engine {}) in state {:?}",
            mode,
            controller.engine.name(),
            controller.state
        );
        Ok(controller)
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The fault that put the component into `Errored`, if any
    pub fn fault(&self) -> Option<&PlaybackFault> {
        self.fault.as_ref()
    }

    pub fn attached_session(&self) -> Option<Session> {
        self.attached
    }

    /// Pointer moved over the component
    pub fn pointer_enter(&mut self) {
        if self.mode != Mode::Hover || self.state != PlaybackState::ShowingThumbnail {
            return;
        }
        debug!("pointer enter: swapping thumbnail for video");
        // The swap is immediate; the engine load completes in the background.
        self.state = PlaybackState::Playing;
        if let Some(session) = self.attach() {
            self.start(session, false);
        }
    }

    /// Pointer left the component
    pub fn pointer_leave(&mut self) {
        if self.mode != Mode::Hover {
            return;
        }
        match self.state {
            PlaybackState::Playing | PlaybackState::Paused | PlaybackState::Ended => {
                debug!("pointer leave: restoring thumbnail");
                self.detach();
                self.state = PlaybackState::ShowingThumbnail;
            }
            PlaybackState::Errored => {
                // The placeholder stays for the rest of the mount; the
                // faulted session has nothing left to play.
                self.detach();
            }
            _ => {}
        }
    }

    /// Explicit play interaction (native controls) in background mode
    pub fn play(&mut self) {
        if self.mode != Mode::Background {
            return;
        }
        match self.state {
            PlaybackState::Paused | PlaybackState::Ended | PlaybackState::Idle => {
                if let Some(session) = self.attached {
                    self.state = PlaybackState::Playing;
                    self.start(session, true);
                }
            }
            _ => {}
        }
    }

    /// Explicit pause interaction (native controls) in background mode
    pub fn pause(&mut self) {
        if self.mode != Mode::Background || self.state != PlaybackState::Playing {
            return;
        }
        if let Some(session) = self.attached {
            self.state = PlaybackState::Paused;
            if let Err(e) = self.engine.pause(session) {
                warn!("engine {} refused pause for session {}: {}", self.engine.name(), session, e);
            }
        }
    }

    /// Dispatch every engine event already queued; returns how many were read.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.dispatch(event);
            handled += 1;
        }
        handled
    }

    /// Wait for the next engine event and dispatch it.
    pub async fn next_event(&mut self) -> Option<PlaybackState> {
        let event = self.events_rx.recv().await?;
        self.dispatch(event);
        Some(self.state)
    }

    /// Apply one engine event to the state machine
    pub fn dispatch(&mut self, event: EngineEvent) {
        if self.attached != Some(event.session) {
            debug!("dropping {:?} from stale session {}", event.kind, event.session);
            return;
        }
        if self.state == PlaybackState::Errored {
            return;
        }

        match event.kind {
            EngineEventKind::Play => {
                self.state = PlaybackState::Playing;
                if let Some(cb) = &self.callbacks.on_play {
                    cb();
                }
            }
            EngineEventKind::Pause => {
                self.state = PlaybackState::Paused;
                if let Some(cb) = &self.callbacks.on_pause {
                    cb();
                }
            }
            EngineEventKind::Ended => {
                self.state = PlaybackState::Ended;
                if let Some(cb) = &self.callbacks.on_ended {
                    cb();
                }
            }
            EngineEventKind::Failed { reason, detail } => match classify_rejection(reason, detail) {
                Classification::Benign(reason) => {
                    debug!("benign playback rejection ({}); staying paused", reason);
                    if self.state == PlaybackState::Playing {
                        self.state = PlaybackState::Paused;
                    }
                }
                Classification::Fault(fault) => self.enter_fault(fault),
            },
        }
    }

    /// Describe the visible surface for the current state
    pub fn render(&self) -> RenderOutput {
        let container = Container {
            width: self.config.width,
            height: self.config.height,
            cursor: match self.mode {
                Mode::Hover => Cursor::Pointer,
                Mode::Background => Cursor::Default,
            },
        };

        let surface = match (self.mode, self.state) {
            (Mode::Hover, PlaybackState::ShowingThumbnail) => Surface::thumbnail(
                self.config.thumbnail_uri.clone().unwrap_or_default(),
                self.config.alt_text.clone(),
            ),
            (Mode::Hover, _) => Surface::video(&self.hover_request_flags()),
            (Mode::Background, _) => Surface::video(&self.background_request_flags()),
        };

        let overlay = match self.state {
            PlaybackState::Errored => Some(Placeholder::unavailable()),
            _ => None,
        };

        RenderOutput {
            container,
            surface,
            overlay,
        }
    }

    /// Tear down the component, detaching any attached engine session.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.attached.is_some() {
            info!("unmounting media controller in state {:?}", self.state);
        }
        self.detach();
    }

    fn hover_request_flags(&self) -> SurfaceFlags {
        SurfaceFlags {
            sources: self.config.sources(),
            autoplay: true,
            loop_playback: true,
            muted: true,
            controls: false,
            preload: Preload::Auto,
        }
    }

    fn background_request_flags(&self) -> SurfaceFlags {
        SurfaceFlags {
            sources: self.config.sources(),
            autoplay: self.config.autoplay,
            loop_playback: self.config.loop_playback,
            muted: self.config.muted,
            controls: self.config.show_native_controls,
            preload: if self.config.show_native_controls {
                Preload::Metadata
            } else {
                Preload::Auto
            },
        }
    }

    fn attach(&mut self) -> Option<Session> {
        self.next_session += 1;
        let session = Session(self.next_session);
        let flags = match self.mode {
            Mode::Hover => self.hover_request_flags(),
            Mode::Background => self.background_request_flags(),
        };
        let request = AttachRequest {
            session,
            sources: flags.sources,
            autoplay: flags.autoplay,
            loop_playback: flags.loop_playback,
            muted: flags.muted,
            plays_inline: true,
            preload: flags.preload,
            events: EventSink::new(session, self.events_tx.clone()),
        };

        match self.engine.attach(request) {
            Ok(()) => {
                debug!("attached engine {} as session {}", self.engine.name(), session);
                self.attached = Some(session);
                Some(session)
            }
            Err(e) => {
                self.enter_fault(PlaybackFault {
                    reason: PlaybackRejectionReason::Aborted,
                    detail: format!("attach failed: {}", e),
                });
                None
            }
        }
    }

    fn start(&mut self, session: Session, user_gesture: bool) {
        if let Err(e) = self.engine.request_start(session, user_gesture) {
            self.enter_fault(PlaybackFault {
                reason: PlaybackRejectionReason::Aborted,
                detail: format!("start request failed: {}", e),
            });
        }
    }

    fn detach(&mut self) {
        if let Some(session) = self.attached.take() {
            debug!("detaching engine session {}", session);
            self.engine.detach(session);
        }
    }

    fn enter_fault(&mut self, fault: PlaybackFault) {
        if self.state == PlaybackState::Errored {
            return;
        }
        warn!("media unavailable: {}", fault);
        self.state = PlaybackState::Errored;
        self.fault = Some(fault);
    }
}

impl<E: PlaybackEngine> Drop for MediaController<E> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Playback flags shared by the attach request and the rendered surface
pub(crate) struct SurfaceFlags {
    pub(crate) sources: Vec<crate::MediaSource>,
    pub(crate) autoplay: bool,
    pub(crate) loop_playback: bool,
    pub(crate) muted: bool,
    pub(crate) controls: bool,
    pub(crate) preload: Preload,
}
