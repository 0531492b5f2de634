//! Integration tests for the inline engine against real sources
#![cfg(feature = "inline")]

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use hoverclip::platform::AutoplayPolicy;
use hoverclip::{
    Callbacks, InlineVideoEngine, MediaConfig, MediaController, MediaSource, PlaybackEngine,
    PlaybackRejectionReason, PlaybackState, Session,
};
use tiny_http::{Response, Server, StatusCode};

const MP4_HEAD: &[u8] = b"\0\0\0\x18ftypisom\0\0\x02\0isomiso2avc1mp41";
const WEBM_HEAD: &[u8] = &[0x1A, 0x45, 0xDF, 0xA3, 0x9F, 0x42, 0x86, 0x81, 0x01];

static FIXTURE_ID: AtomicU64 = AtomicU64::new(0);

/// Write a fixture clip into the temp dir and return its path
fn fixture(ext: &str, bytes: &[u8]) -> PathBuf {
    let id = FIXTURE_ID.fetch_add(1, Ordering::SeqCst);
    let mut p = std::env::temp_dir();
    p.push(format!("hoverclip-{}-{}.{}", std::process::id(), id, ext));
    std::fs::write(&p, bytes).expect("write fixture");
    p
}

fn file_uri(path: &Path) -> String {
    url::Url::from_file_path(path).expect("absolute path").to_string()
}

/// Serve `/clip.mp4`, `/slow.mp4` (delayed), `/live.mp4` (ignores `Range`
/// and never ends) and 404 for everything else
fn start_clip_server() -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().expect("tcp listener");
    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            let path = request.url().to_string();
            if path == "/live.mp4" {
                // Respond from a separate thread; the write only stops once
                // the client hangs up.
                std::thread::spawn(move || {
                    let body = MP4_HEAD.chain(std::io::repeat(0));
                    let _ = request.respond(Response::new(StatusCode(200), vec![], body, None, None));
                });
                continue;
            }
            let response = match path.as_str() {
                "/clip.mp4" => Response::from_data(MP4_HEAD.to_vec()),
                "/slow.mp4" => {
                    std::thread::sleep(Duration::from_millis(300));
                    Response::from_data(MP4_HEAD.to_vec())
                }
                "/page.html" => Response::from_data(b"<!DOCTYPE html><html></html>".to_vec()),
                _ => Response::from_data(b"Not Found".to_vec()).with_status_code(404),
            };
            let _ = request.respond(response);
        }
    });
    format!("http://{}", addr)
}

async fn settle<E: PlaybackEngine>(player: &mut MediaController<E>, wait: Duration) {
    while let Ok(Some(_)) = tokio::time::timeout(wait, player.next_event()).await {}
}

const WAIT: Duration = Duration::from_millis(500);

#[tokio::test(flavor = "multi_thread")]
async fn local_file_source_starts_playing() {
    let path = fixture("mp4", MP4_HEAD);
    let engine = InlineVideoEngine::new().unwrap();
    let mut player =
        MediaController::mount(MediaConfig::new(file_uri(&path)), Callbacks::default(), engine).unwrap();
    settle(&mut player, WAIT).await;
    assert_eq!(player.state(), PlaybackState::Playing);
    assert!(player.engine().is_playing(Session(1)));
    player.unmount();
    let _ = std::fs::remove_file(path);
}

#[tokio::test(flavor = "multi_thread")]
async fn relative_path_resolves_against_base_dir() {
    let path = fixture("webm", WEBM_HEAD);
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    let engine = InlineVideoEngine::new().unwrap().with_base_dir(std::env::temp_dir());
    let cfg = MediaConfig::with_source(MediaSource::new(name, "video/webm"));
    let mut player = MediaController::mount(cfg, Callbacks::default(), engine).unwrap();
    settle(&mut player, WAIT).await;
    assert_eq!(player.state(), PlaybackState::Playing);
    let _ = std::fs::remove_file(path);
}

#[tokio::test(flavor = "multi_thread")]
async fn http_source_starts_playing() {
    let base = start_clip_server();
    let engine = InlineVideoEngine::new().unwrap();
    let cfg = MediaConfig::new(format!("{}/clip.mp4", base));
    let mut player = MediaController::mount(cfg, Callbacks::default(), engine).unwrap();
    settle(&mut player, WAIT).await;
    assert_eq!(player.state(), PlaybackState::Playing);
    let selected = player.engine().selected_source(Session(1)).unwrap();
    assert!(selected.uri.ends_with("/clip.mp4"));
}

#[tokio::test(flavor = "multi_thread")]
async fn endless_body_without_range_support_still_starts() {
    let base = start_clip_server();
    let engine = InlineVideoEngine::new().unwrap();
    let cfg = MediaConfig::new(format!("{}/live.mp4", base));
    let started = Instant::now();
    let mut player = MediaController::mount(cfg, Callbacks::default(), engine).unwrap();
    settle(&mut player, WAIT).await;
    assert_eq!(player.state(), PlaybackState::Playing);
    assert!(player.fault().is_none());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test(flavor = "multi_thread")]
async fn root_relative_source_resolves_inside_base_dir() {
    let mut dir = std::env::temp_dir();
    dir.push(format!("hoverclip-site-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("hero.mp4"), MP4_HEAD).unwrap();

    let engine = InlineVideoEngine::new().unwrap().with_base_dir(dir.clone());
    let mut player =
        MediaController::mount(MediaConfig::new("/hero.mp4"), Callbacks::default(), engine).unwrap();
    settle(&mut player, WAIT).await;
    assert_eq!(player.state(), PlaybackState::Playing);
    assert_eq!(player.engine().selected_source(Session(1)).unwrap().uri, "/hero.mp4");
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_primary_falls_back_to_alternate() {
    let base = start_clip_server();
    let engine = InlineVideoEngine::new().unwrap();
    let cfg = MediaConfig::new(format!("{}/missing.mp4", base))
        .alternate(MediaSource::new("data:video/webm;base64,GkXfo59ChoEB", "video/webm"));
    let mut player = MediaController::mount(cfg, Callbacks::default(), engine).unwrap();
    settle(&mut player, WAIT).await;
    assert_eq!(player.state(), PlaybackState::Playing);
    let selected = player.engine().selected_source(Session(1)).unwrap();
    assert_eq!(selected.mime_type, "video/webm");
}

#[tokio::test(flavor = "multi_thread")]
async fn all_sources_unreachable_is_a_network_fault() {
    let base = start_clip_server();
    let engine = InlineVideoEngine::new().unwrap();
    let cfg = MediaConfig::new(format!("{}/missing.mp4", base));
    let mut player = MediaController::mount(cfg, Callbacks::default(), engine).unwrap();
    settle(&mut player, WAIT).await;
    assert_eq!(player.state(), PlaybackState::Errored);
    assert_eq!(player.fault().unwrap().reason, PlaybackRejectionReason::Network);
    assert!(player.render().overlay.is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn wrong_container_is_a_decode_fault() {
    let base = start_clip_server();
    let engine = InlineVideoEngine::new().unwrap();
    let cfg = MediaConfig::new(format!("{}/page.html", base));
    let mut player = MediaController::mount(cfg, Callbacks::default(), engine).unwrap();
    settle(&mut player, WAIT).await;
    assert_eq!(player.state(), PlaybackState::Errored);
    assert_eq!(player.fault().unwrap().reason, PlaybackRejectionReason::Decode);
}

#[tokio::test(flavor = "multi_thread")]
async fn unsupported_types_fault_without_fetching() {
    let engine = InlineVideoEngine::new().unwrap();
    let cfg = MediaConfig::with_source(MediaSource::new("clip.flv", "video/x-flv"));
    let mut player = MediaController::mount(cfg, Callbacks::default(), engine).unwrap();
    settle(&mut player, WAIT).await;
    assert_eq!(player.fault().unwrap().reason, PlaybackRejectionReason::Unsupported);
}

#[tokio::test(flavor = "multi_thread")]
async fn unmuted_autoplay_is_blocked_until_gesture() {
    let path = fixture("mp4", MP4_HEAD);
    let engine = InlineVideoEngine::new().unwrap().with_policy(AutoplayPolicy::default());
    let cfg = MediaConfig::new(file_uri(&path)).muted(false);
    let mut player = MediaController::mount(cfg, Callbacks::default(), engine).unwrap();
    settle(&mut player, WAIT).await;
    assert_eq!(player.state(), PlaybackState::Paused);
    assert!(player.fault().is_none());

    player.play();
    settle(&mut player, WAIT).await;
    assert_eq!(player.state(), PlaybackState::Playing);
    let _ = std::fs::remove_file(path);
}

#[tokio::test(flavor = "multi_thread")]
async fn pause_stops_playback() {
    let path = fixture("mp4", MP4_HEAD);
    let engine = InlineVideoEngine::new().unwrap();
    let mut player =
        MediaController::mount(MediaConfig::new(file_uri(&path)), Callbacks::default(), engine).unwrap();
    settle(&mut player, WAIT).await;
    player.pause();
    settle(&mut player, WAIT).await;
    assert_eq!(player.state(), PlaybackState::Paused);
    assert!(!player.engine().is_playing(Session(1)));
    let _ = std::fs::remove_file(path);
}

#[tokio::test(flavor = "multi_thread")]
async fn leave_during_slow_start_keeps_thumbnail() {
    let base = start_clip_server();
    let engine = InlineVideoEngine::new().unwrap();
    let cfg = MediaConfig::new(format!("{}/slow.mp4", base)).hover_to_play("thumb.jpg");
    let mut player = MediaController::mount(cfg, Callbacks::default(), engine).unwrap();

    player.pointer_enter();
    player.pointer_leave();
    assert!(!player.engine().is_attached(Session(1)));

    tokio::time::sleep(Duration::from_millis(600)).await;
    player.pump();
    assert_eq!(player.state(), PlaybackState::ShowingThumbnail);
    assert!(player.render().shows_thumbnail());
}

#[tokio::test(flavor = "multi_thread")]
async fn second_start_supersedes_the_first() {
    let base = start_clip_server();
    let engine = InlineVideoEngine::new().unwrap();
    let cfg = MediaConfig::new(format!("{}/slow.mp4", base)).autoplay(false);
    let mut player = MediaController::mount(cfg, Callbacks::default(), engine).unwrap();

    player.play();
    // Start again directly on the engine while the first probe is in flight
    player.engine().request_start(Session(1), true).unwrap();
    tokio::time::sleep(Duration::from_millis(800)).await;
    player.pump();
    assert_eq!(player.state(), PlaybackState::Playing);
    assert!(player.fault().is_none());
}
