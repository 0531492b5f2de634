//! InlineVideoEngine: pure-Rust playback backend.
//!
//! The engine resolves the attached sources in order, skipping types the
//! platform cannot play, fetches the head of the first reachable one
//! (`file://`, `http(s)://`, `data:` or a path relative to the base
//! directory) and checks its container header against the declared MIME
//! type. A successful probe reports `Play`; failures are mapped onto
//! [`PlaybackRejectionReason`].
//!
//! Probes run as tokio tasks. Each start request gets a ticket; a probe
//! only reports if its session is still attached and its ticket is still
//! the latest, so detaching silently cancels an in-flight start.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use base64::Engine as _;
use futures::future::{BoxFuture, FutureExt};
use log::{debug, warn};
use reqwest::Client;
use tokio::io::AsyncReadExt;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use url::Url;

use crate::platform::media::{expected_container, sniff_container};
use crate::platform::{playable_sources, AutoplayPolicy};
use crate::{
    AttachRequest, EngineEventKind, Error, MediaSource, PlaybackEngine, PlaybackRejectionReason,
    Result, Session,
};

const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_PROBE_BYTES: usize = 64;

type ProbeError = (PlaybackRejectionReason, String);

struct Slot {
    request: AttachRequest,
    ticket: u64,
    inflight: Option<JoinHandle<()>>,
    playing: bool,
    selected: Option<MediaSource>,
}

type Sessions = Arc<Mutex<HashMap<Session, Slot>>>;

fn lock(sessions: &Sessions) -> MutexGuard<'_, HashMap<Session, Slot>> {
    sessions.lock().unwrap_or_else(|e| e.into_inner())
}

/// Everything a probe task needs, detached from the engine
#[derive(Clone)]
struct Fetcher {
    client: Client,
    base_dir: Option<PathBuf>,
    probe_bytes: usize,
}

impl Fetcher {
    fn probe(self, sources: Vec<MediaSource>) -> BoxFuture<'static, std::result::Result<MediaSource, ProbeError>> {
        self.resolve(sources).boxed()
    }

    async fn resolve(self, sources: Vec<MediaSource>) -> std::result::Result<MediaSource, ProbeError> {
        let playable = playable_sources(sources);
        if playable.is_empty() {
            return Err((
                PlaybackRejectionReason::Unsupported,
                "no source has a playable type".to_string(),
            ));
        }

        // Unreachable sources fall through to the next one; a source that
        // loads but does not decode ends the search.
        let mut last_error = None;
        for source in playable {
            match self.fetch_head(&source.uri).await {
                Ok(head) => {
                    check_container(&source, &head)?;
                    return Ok(source);
                }
                Err(err) => {
                    debug!("source {} unavailable: {}", source.uri, err.1);
                    last_error = Some(err);
                }
            }
        }
        Err(last_error.unwrap_or((
            PlaybackRejectionReason::Network,
            "no source could be loaded".to_string(),
        )))
    }

    async fn fetch_head(&self, uri: &str) -> std::result::Result<Vec<u8>, ProbeError> {
        if let Some(rest) = uri.strip_prefix("data:") {
            let mut head = decode_data_uri(rest)?;
            head.truncate(self.probe_bytes);
            return Ok(head);
        }
        match Url::parse(uri) {
            Ok(url) if url.scheme() == "file" => {
                let path = url.to_file_path().map_err(|_| {
                    (PlaybackRejectionReason::Network, format!("invalid file uri '{}'", uri))
                })?;
                self.read_file(&path).await
            }
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => self.fetch_http(url).await,
            Ok(url) => Err((
                PlaybackRejectionReason::Unsupported,
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(_) => {
                let path = self.local_path(uri);
                self.read_file(&path).await
            }
        }
    }

    /// Site-root paths like `/hero.mp4` stay inside the base directory
    fn local_path(&self, uri: &str) -> PathBuf {
        match &self.base_dir {
            Some(base) => base.join(uri.trim_start_matches('/')),
            None => PathBuf::from(uri),
        }
    }

    async fn read_file(&self, path: &Path) -> std::result::Result<Vec<u8>, ProbeError> {
        let io_err = |e: std::io::Error| {
            (PlaybackRejectionReason::Network, format!("{}: {}", path.display(), e))
        };
        let file = tokio::fs::File::open(path).await.map_err(io_err)?;
        let mut head = Vec::with_capacity(self.probe_bytes);
        file.take(self.probe_bytes as u64)
            .read_to_end(&mut head)
            .await
            .map_err(io_err)?;
        Ok(head)
    }

    async fn fetch_http(&self, url: Url) -> std::result::Result<Vec<u8>, ProbeError> {
        let range = format!("bytes=0-{}", self.probe_bytes.saturating_sub(1));
        let mut resp = self
            .client
            .get(url.clone())
            .header(reqwest::header::RANGE, range)
            .send()
            .await
            .map_err(|e| (PlaybackRejectionReason::Network, format!("{}: {}", url, e)))?;
        if !resp.status().is_success() {
            return Err((
                PlaybackRejectionReason::Network,
                format!("{} returned {}", url, resp.status()),
            ));
        }
        // Servers that ignore `Range` answer 200 with the whole body; stop
        // reading once the header is buffered and drop the response.
        let mut head = Vec::with_capacity(self.probe_bytes);
        while head.len() < self.probe_bytes {
            match resp
                .chunk()
                .await
                .map_err(|e| (PlaybackRejectionReason::Network, format!("{}: {}", url, e)))?
            {
                Some(chunk) => head.extend_from_slice(&chunk),
                None => break,
            }
        }
        drop(resp);
        head.truncate(self.probe_bytes);
        Ok(head)
    }
}

/// Decode the part of a `data:` URI after the scheme
fn decode_data_uri(rest: &str) -> std::result::Result<Vec<u8>, ProbeError> {
    let (meta, payload) = rest.split_once(',').ok_or_else(|| {
        (PlaybackRejectionReason::Decode, "malformed data uri".to_string())
    })?;
    if meta.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| (PlaybackRejectionReason::Decode, format!("bad base64 payload: {}", e)))
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}

fn check_container(source: &MediaSource, head: &[u8]) -> std::result::Result<(), ProbeError> {
    let found = sniff_container(head).ok_or_else(|| {
        (
            PlaybackRejectionReason::Decode,
            format!("{}: unrecognized container header", source.uri),
        )
    })?;
    match expected_container(&source.mime_type) {
        Some(expected) if expected != found => Err((
            PlaybackRejectionReason::Decode,
            format!(
                "{}: declared {} but found {:?} data",
                source.uri, source.mime_type, found
            ),
        )),
        _ => Ok(()),
    }
}

/// Playback engine that validates real sources before reporting playback
pub struct InlineVideoEngine {
    runtime: Handle,
    policy: AutoplayPolicy,
    fetcher: Fetcher,
    sessions: Sessions,
}

impl InlineVideoEngine {
    /// Create an engine bound to the current tokio runtime
    pub fn new() -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::InitializationError(format!("no tokio runtime: {}", e)))?;
        Self::with_handle(runtime)
    }

    pub fn with_handle(runtime: Handle) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .build()
            .map_err(|e| {
                Error::InitializationError(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(Self {
            runtime,
            policy: AutoplayPolicy::default(),
            fetcher: Fetcher {
                client,
                base_dir: None,
                probe_bytes: DEFAULT_PROBE_BYTES,
            },
            sessions: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn with_policy(mut self, policy: AutoplayPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Directory that relative source paths are resolved against
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fetcher.base_dir = Some(dir.into());
        self
    }

    pub fn is_attached(&self, session: Session) -> bool {
        lock(&self.sessions).contains_key(&session)
    }

    /// The source that won the probe for `session`
    pub fn selected_source(&self, session: Session) -> Option<MediaSource> {
        lock(&self.sessions)
            .get(&session)
            .and_then(|slot| slot.selected.clone())
    }

    pub fn is_playing(&self, session: Session) -> bool {
        lock(&self.sessions)
            .get(&session)
            .map(|slot| slot.playing)
            .unwrap_or(false)
    }
}

impl PlaybackEngine for InlineVideoEngine {
    fn name(&self) -> &'static str {
        "inline"
    }

    fn attach(&self, request: AttachRequest) -> Result<()> {
        let mut sessions = lock(&self.sessions);
        if sessions.contains_key(&request.session) {
            return Err(Error::EngineError(format!(
                "session {} is already attached",
                request.session
            )));
        }
        debug!(
            "attaching session {} with {} source(s)",
            request.session,
            request.sources.len()
        );
        sessions.insert(
            request.session,
            Slot {
                request,
                ticket: 0,
                inflight: None,
                playing: false,
                selected: None,
            },
        );
        Ok(())
    }

    fn request_start(&self, session: Session, user_gesture: bool) -> Result<()> {
        let mut sessions = lock(&self.sessions);
        let slot = sessions
            .get_mut(&session)
            .ok_or_else(|| Error::EngineError(format!("session {} is not attached", session)))?;

        if !self.policy.permits(slot.request.muted, user_gesture) {
            debug!("autoplay blocked for session {}", session);
            slot.request.events.fail(
                PlaybackRejectionReason::NotAllowed,
                "playback requires a user gesture",
            );
            return Ok(());
        }

        if let Some(previous) = slot.inflight.take() {
            previous.abort();
            slot.request.events.fail(
                PlaybackRejectionReason::Superseded,
                "start interrupted by a new start request",
            );
        }

        slot.ticket += 1;
        let ticket = slot.ticket;
        let probe = self.fetcher.clone().probe(slot.request.sources.clone());
        let sessions_ref = Arc::clone(&self.sessions);

        let handle = self.runtime.spawn(async move {
            let outcome = probe.await;
            let mut sessions = lock(&sessions_ref);
            let Some(slot) = sessions.get_mut(&session) else {
                debug!("session {} detached before its start resolved", session);
                return;
            };
            if slot.ticket != ticket {
                return;
            }
            slot.inflight = None;
            match outcome {
                Ok(source) => {
                    debug!("session {} playing {}", session, source.uri);
                    slot.playing = true;
                    slot.selected = Some(source);
                    slot.request.events.emit(EngineEventKind::Play);
                }
                Err((reason, detail)) => {
                    warn!("session {} failed to start ({}): {}", session, reason, detail);
                    slot.request.events.fail(reason, detail);
                }
            }
        });
        slot.inflight = Some(handle);
        Ok(())
    }

    fn pause(&self, session: Session) -> Result<()> {
        let mut sessions = lock(&self.sessions);
        let slot = sessions
            .get_mut(&session)
            .ok_or_else(|| Error::EngineError(format!("session {} is not attached", session)))?;
        if let Some(pending) = slot.inflight.take() {
            pending.abort();
            slot.request.events.fail(
                PlaybackRejectionReason::Superseded,
                "start interrupted by a pause request",
            );
        }
        slot.playing = false;
        slot.request.events.emit(EngineEventKind::Pause);
        Ok(())
    }

    fn detach(&self, session: Session) {
        if let Some(slot) = lock(&self.sessions).remove(&session) {
            if let Some(pending) = slot.inflight {
                pending.abort();
            }
            debug!("detached session {}", session);
        }
    }
}

impl Drop for InlineVideoEngine {
    fn drop(&mut self) {
        for (_, slot) in lock(&self.sessions).drain() {
            if let Some(pending) = slot.inflight {
                pending.abort();
            }
        }
    }
}
