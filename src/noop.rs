//! Scripted in-memory playback engine for deterministic tests
//!
//! `NoopEngine` records every command it receives and lets the test decide
//! when (and how) a start request resolves. Clones share state, so a test
//! can hand one clone to the controller and keep another to drive it.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{
    AttachRequest, EngineEventKind, Error, EventSink, PlaybackEngine, PlaybackRejectionReason,
    Result, Session,
};

/// A command received by the engine, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Attach(Session),
    Start { session: Session, user_gesture: bool },
    Pause(Session),
    Detach(Session),
}

/// How the engine answers a start request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartBehavior {
    /// Leave the request in flight until the test resolves it
    #[default]
    Pending,
    /// Report `Play` immediately
    Resolve,
    /// Report a rejection immediately
    Reject(PlaybackRejectionReason),
}

#[derive(Default)]
struct NoopState {
    calls: Vec<EngineCall>,
    requests: HashMap<Session, AttachRequest>,
    attached: HashSet<Session>,
    pending: Vec<Session>,
    start_behavior: StartBehavior,
    fail_attach: bool,
}

#[derive(Clone, Default)]
pub struct NoopEngine {
    inner: Arc<Mutex<NoopState>>,
}

impl NoopEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_behavior(self, behavior: StartBehavior) -> Self {
        self.lock().start_behavior = behavior;
        self
    }

    /// Make every attach fail, as an engine without a usable surface would
    pub fn failing_attach(self) -> Self {
        self.lock().fail_attach = true;
        self
    }

    fn lock(&self) -> MutexGuard<'_, NoopState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.lock().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&EngineCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn detach_count(&self) -> usize {
        self.count(|c| matches!(c, EngineCall::Detach(_)))
    }

    pub fn start_count(&self) -> usize {
        self.count(|c| matches!(c, EngineCall::Start { .. }))
    }

    /// The attach request for `session`, kept after detach
    pub fn request(&self, session: Session) -> Option<AttachRequest> {
        self.lock().requests.get(&session).cloned()
    }

    /// Most recent attach request
    pub fn last_request(&self) -> Option<AttachRequest> {
        let state = self.lock();
        state
            .requests
            .keys()
            .max()
            .and_then(|s| state.requests.get(s))
            .cloned()
    }

    pub fn is_attached(&self, session: Session) -> bool {
        self.lock().attached.contains(&session)
    }

    /// Starts requested but not yet resolved
    pub fn pending_starts(&self) -> Vec<Session> {
        self.lock().pending.clone()
    }

    fn sink(&self, session: Session) -> Option<EventSink> {
        self.lock().requests.get(&session).map(|r| r.events.clone())
    }

    /// Report an event for any session, detached or not
    pub fn emit(&self, session: Session, kind: EngineEventKind) -> bool {
        match self.sink(session) {
            Some(sink) => sink.emit(kind),
            None => false,
        }
    }

    /// Resolve an in-flight start with `Play`
    pub fn resolve_start(&self, session: Session) -> bool {
        self.lock().pending.retain(|s| *s != session);
        self.emit(session, EngineEventKind::Play)
    }

    /// Resolve an in-flight start with a rejection
    pub fn reject_start(&self, session: Session, reason: PlaybackRejectionReason) -> bool {
        self.lock().pending.retain(|s| *s != session);
        self.emit(
            session,
            EngineEventKind::Failed {
                reason,
                detail: format!("scripted {} rejection", reason),
            },
        )
    }
}

impl PlaybackEngine for NoopEngine {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn attach(&self, request: AttachRequest) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(EngineCall::Attach(request.session));
        if state.fail_attach {
            return Err(Error::EngineError("no playback surface available".into()));
        }
        state.attached.insert(request.session);
        state.requests.insert(request.session, request);
        Ok(())
    }

    fn request_start(&self, session: Session, user_gesture: bool) -> Result<()> {
        let behavior = {
            let mut state = self.lock();
            state.calls.push(EngineCall::Start { session, user_gesture });
            if !state.attached.contains(&session) {
                return Err(Error::EngineError(format!("session {} is not attached", session)));
            }
            state.pending.push(session);
            state.start_behavior
        };
        match behavior {
            StartBehavior::Pending => {}
            StartBehavior::Resolve => {
                self.resolve_start(session);
            }
            StartBehavior::Reject(reason) => {
                self.reject_start(session, reason);
            }
        }
        Ok(())
    }

    fn pause(&self, session: Session) -> Result<()> {
        let attached = {
            let mut state = self.lock();
            state.calls.push(EngineCall::Pause(session));
            state.attached.contains(&session)
        };
        if attached {
            self.emit(session, EngineEventKind::Pause);
        }
        Ok(())
    }

    fn detach(&self, session: Session) {
        let mut state = self.lock();
        state.calls.push(EngineCall::Detach(session));
        state.attached.remove(&session);
        state.pending.retain(|s| *s != session);
    }
}
