//! Hover-to-play behavior of the media controller

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hoverclip::noop::{EngineCall, NoopEngine};
use hoverclip::rendering::Surface;
use hoverclip::{
    Callbacks, EngineEventKind, MediaConfig, MediaController, MediaSource, Mode,
    PlaybackRejectionReason, PlaybackState, Session,
};

fn hover_config() -> MediaConfig {
    MediaConfig::with_source(MediaSource::new("a.mp4", "video/mp4")).hover_to_play("a.jpg")
}

#[derive(Default, Clone)]
struct Counters {
    play: Arc<AtomicUsize>,
    pause: Arc<AtomicUsize>,
    ended: Arc<AtomicUsize>,
}

impl Counters {
    fn callbacks(&self) -> Callbacks {
        let (play, pause, ended) = (self.play.clone(), self.pause.clone(), self.ended.clone());
        Callbacks::default()
            .on_play(move || {
                play.fetch_add(1, Ordering::SeqCst);
            })
            .on_pause(move || {
                pause.fetch_add(1, Ordering::SeqCst);
            })
            .on_ended(move || {
                ended.fetch_add(1, Ordering::SeqCst);
            })
    }

    fn plays(&self) -> usize {
        self.play.load(Ordering::SeqCst)
    }
}

#[test]
fn enter_and_leave_swap_thumbnail_and_video() {
    let engine = NoopEngine::new();
    let mut player = MediaController::mount(hover_config(), Callbacks::default(), engine.clone()).unwrap();
    assert_eq!(player.mode(), Mode::Hover);

    let out = player.render();
    assert!(out.shows_thumbnail());
    assert_eq!(out.surface.primary_uri(), Some("a.jpg"));
    assert!(engine.calls().is_empty());

    player.pointer_enter();
    let out = player.render();
    match &out.surface {
        Surface::Video { sources, muted, loop_playback, autoplay, plays_inline, controls, .. } => {
            assert_eq!(sources[0].uri, "a.mp4");
            assert!(*muted && *loop_playback && *autoplay && *plays_inline);
            assert!(!*controls);
        }
        other => panic!("expected video surface, got {:?}", other),
    }
    let req = engine.last_request().unwrap();
    assert!(req.muted && req.loop_playback && req.plays_inline);

    player.pointer_leave();
    let out = player.render();
    assert_eq!(out.surface.primary_uri(), Some("a.jpg"));
    assert_eq!(player.state(), PlaybackState::ShowingThumbnail);
    assert!(!engine.is_attached(Session(1)));
    assert_eq!(engine.detach_count(), 1);
}

#[test]
fn hover_forces_silent_loop_even_when_config_disagrees() {
    let cfg = hover_config().muted(false).looping(false).autoplay(false).controls(true);
    let engine = NoopEngine::new();
    let mut player = MediaController::mount(cfg, Callbacks::default(), engine.clone()).unwrap();
    player.pointer_enter();
    let req = engine.last_request().unwrap();
    assert!(req.muted && req.loop_playback && req.autoplay);
    assert_eq!(engine.start_count(), 1);
}

#[test]
fn leave_before_start_resolves_wins_over_stale_start() {
    let counters = Counters::default();
    let engine = NoopEngine::new();
    let mut player = MediaController::mount(hover_config(), counters.callbacks(), engine.clone()).unwrap();

    player.pointer_enter();
    player.pointer_leave();

    // The first start completes after the leave
    assert!(engine.resolve_start(Session(1)));
    player.pump();

    assert_eq!(player.state(), PlaybackState::ShowingThumbnail);
    assert!(player.render().shows_thumbnail());
    assert_eq!(counters.plays(), 0);
}

#[test]
fn stale_events_from_previous_hover_are_ignored() {
    let counters = Counters::default();
    let engine = NoopEngine::new();
    let mut player = MediaController::mount(hover_config(), counters.callbacks(), engine.clone()).unwrap();

    player.pointer_enter();
    player.pointer_leave();
    player.pointer_enter();
    assert_eq!(player.attached_session(), Some(Session(2)));

    engine.reject_start(Session(1), PlaybackRejectionReason::Decode);
    engine.resolve_start(Session(2));
    player.pump();

    assert_eq!(player.state(), PlaybackState::Playing);
    assert!(player.fault().is_none());
    assert_eq!(counters.plays(), 1);
}

#[test]
fn repeated_pointer_events_are_noops() {
    let engine = NoopEngine::new();
    let mut player = MediaController::mount(hover_config(), Callbacks::default(), engine.clone()).unwrap();

    player.pointer_leave();
    player.pointer_leave();
    assert!(engine.calls().is_empty());

    player.pointer_enter();
    player.pointer_enter();
    player.pointer_enter();
    assert_eq!(
        engine.calls(),
        vec![
            EngineCall::Attach(Session(1)),
            EngineCall::Start { session: Session(1), user_gesture: false },
        ]
    );

    player.pointer_leave();
    player.pointer_leave();
    assert_eq!(engine.detach_count(), 1);
}

#[test]
fn callbacks_fire_once_per_engine_event() {
    let counters = Counters::default();
    let engine = NoopEngine::new();
    let mut player = MediaController::mount(hover_config(), counters.callbacks(), engine.clone()).unwrap();

    player.pointer_enter();
    engine.resolve_start(Session(1));
    engine.emit(Session(1), EngineEventKind::Pause);
    engine.emit(Session(1), EngineEventKind::Play);
    engine.emit(Session(1), EngineEventKind::Ended);
    assert_eq!(player.pump(), 4);

    assert_eq!(counters.plays(), 2);
    assert_eq!(counters.pause.load(Ordering::SeqCst), 1);
    assert_eq!(counters.ended.load(Ordering::SeqCst), 1);
    assert_eq!(player.state(), PlaybackState::Ended);
}

#[test]
fn fault_while_hovering_is_terminal() {
    let engine = NoopEngine::new();
    let mut player = MediaController::mount(hover_config(), Callbacks::default(), engine.clone()).unwrap();

    player.pointer_enter();
    engine.reject_start(Session(1), PlaybackRejectionReason::Network);
    player.pump();
    assert_eq!(player.state(), PlaybackState::Errored);
    let out = player.render();
    assert_eq!(out.overlay.as_ref().unwrap().message, "Video unavailable");

    player.pointer_leave();
    assert_eq!(player.state(), PlaybackState::Errored);
    assert!(!engine.is_attached(Session(1)));
    assert_eq!(player.attached_session(), None);
    assert!(player.render().overlay.is_some());

    player.pointer_enter();
    player.pointer_leave();
    assert_eq!(player.state(), PlaybackState::Errored);
    assert_eq!(engine.count(|c| matches!(c, EngineCall::Attach(_))), 1);

    player.unmount();
    assert_eq!(engine.detach_count(), 1);
}

#[test]
fn benign_rejection_while_hovering_pauses() {
    let engine = NoopEngine::new();
    let mut player = MediaController::mount(hover_config(), Callbacks::default(), engine.clone()).unwrap();
    player.pointer_enter();
    engine.reject_start(Session(1), PlaybackRejectionReason::NotAllowed);
    player.pump();
    assert_eq!(player.state(), PlaybackState::Paused);
    assert!(player.render().overlay.is_none());

    player.pointer_leave();
    assert_eq!(player.state(), PlaybackState::ShowingThumbnail);
}

#[test]
fn unmount_while_playing_detaches_exactly_once() {
    let engine = NoopEngine::new();
    let mut player = MediaController::mount(hover_config(), Callbacks::default(), engine.clone()).unwrap();
    player.pointer_enter();
    player.unmount();
    assert_eq!(engine.detach_count(), 1);
    assert_eq!(engine.calls().last(), Some(&EngineCall::Detach(Session(1))));
}

#[test]
fn unmount_while_showing_thumbnail_issues_no_engine_calls() {
    let engine = NoopEngine::new();
    let player = MediaController::mount(hover_config(), Callbacks::default(), engine.clone()).unwrap();
    player.unmount();
    assert!(engine.calls().is_empty());
}

#[test]
fn dropping_the_controller_detaches() {
    let engine = NoopEngine::new();
    {
        let mut player = MediaController::mount(hover_config(), Callbacks::default(), engine.clone()).unwrap();
        player.pointer_enter();
    }
    assert_eq!(engine.detach_count(), 1);
}

#[test]
fn hover_container_uses_pointer_cursor() {
    let player = MediaController::mount(hover_config(), Callbacks::default(), NoopEngine::new()).unwrap();
    assert_eq!(player.render().container.cursor, hoverclip::rendering::Cursor::Pointer);
}
