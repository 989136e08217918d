use super::*;
use crate::catalog::{Catalog, Track};
use crate::engine::{AudioEngine, EngineStatus, FinishedCallback};
use crate::error::{EngineError, PlayerError};
use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Load(String),
    Pause(u64),
    Resume(u64),
    Seek(u64, u64),
    Status(u64),
    Release(u64),
    OnFinished(u64),
}

#[derive(Default)]
struct MockState {
    next_id: u64,
    live: Vec<u64>,
    calls: Vec<Call>,
    // Kept after release on purpose: the controller must cope with late
    // callbacks from an engine that races its own release.
    callbacks: HashMap<u64, FinishedCallback>,
    fail_urls: HashSet<String>,
    fail_release: bool,
    status: EngineStatus,
}

/// Engine double that records every command. Clones share state, so a test
/// can keep one as a spy while the controller owns another.
#[derive(Clone, Default)]
struct MockEngine {
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug)]
struct MockHandle(u64);

impl MockEngine {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| pred(*c)).count()
    }

    fn loads(&self) -> usize {
        self.count(|c| matches!(c, Call::Load(_)))
    }

    fn statuses(&self) -> usize {
        self.count(|c| matches!(c, Call::Status(_)))
    }

    fn live(&self) -> Vec<u64> {
        self.lock().live.clone()
    }

    fn last_live(&self) -> u64 {
        *self.lock().live.last().expect("a live handle")
    }

    fn fail_url(&self, url: &str) {
        self.lock().fail_urls.insert(url.to_string());
    }

    fn set_status(&self, status: EngineStatus) {
        self.lock().status = status;
    }

    /// Fire the finished callback registered for `id`, as the engine would
    /// at the end of the track.
    fn finish(&self, id: u64) -> bool {
        let cb = self.lock().callbacks.remove(&id);
        match cb {
            Some(cb) => {
                cb();
                true
            }
            None => false,
        }
    }
}

impl MockState {
    fn check_live(&self, id: u64) -> Result<(), EngineError> {
        if self.live.contains(&id) {
            Ok(())
        } else {
            Err(EngineError::UnknownHandle(id))
        }
    }
}

impl AudioEngine for MockEngine {
    type Handle = MockHandle;

    fn load(&mut self, url: &str, _autoplay: bool) -> Result<MockHandle, EngineError> {
        let mut s = self.lock();
        s.calls.push(Call::Load(url.to_string()));
        if s.fail_urls.contains(url) {
            return Err(EngineError::Unsupported(url.to_string()));
        }
        s.next_id += 1;
        let id = s.next_id;
        s.live.push(id);
        Ok(MockHandle(id))
    }

    fn pause(&mut self, handle: &MockHandle) -> Result<(), EngineError> {
        let mut s = self.lock();
        s.calls.push(Call::Pause(handle.0));
        s.check_live(handle.0)
    }

    fn resume(&mut self, handle: &MockHandle) -> Result<(), EngineError> {
        let mut s = self.lock();
        s.calls.push(Call::Resume(handle.0));
        s.check_live(handle.0)
    }

    fn seek(&mut self, handle: &MockHandle, position_ms: u64) -> Result<(), EngineError> {
        let mut s = self.lock();
        s.calls.push(Call::Seek(handle.0, position_ms));
        s.check_live(handle.0)
    }

    fn status(&mut self, handle: &MockHandle) -> Result<EngineStatus, EngineError> {
        let mut s = self.lock();
        s.calls.push(Call::Status(handle.0));
        s.check_live(handle.0)?;
        Ok(s.status)
    }

    fn release(&mut self, handle: MockHandle) -> Result<(), EngineError> {
        let mut s = self.lock();
        s.calls.push(Call::Release(handle.0));
        s.live.retain(|&id| id != handle.0);
        if s.fail_release {
            return Err(EngineError::Output("release failed".into()));
        }
        Ok(())
    }

    fn on_finished(&mut self, handle: &MockHandle, callback: FinishedCallback) {
        let mut s = self.lock();
        s.calls.push(Call::OnFinished(handle.0));
        s.callbacks.insert(handle.0, callback);
    }
}

fn url(i: usize) -> String {
    format!("/music/{i}.mp3")
}

fn catalog(n: usize) -> Catalog {
    Catalog::new(
        (0..n)
            .map(|i| Track {
                id: format!("t{i}"),
                title: format!("Song {i}"),
                artist: "Band".into(),
                url: url(i),
                artwork: String::new(),
            })
            .collect(),
    )
    .unwrap()
}

fn controller(n: usize) -> (Controller<MockEngine>, MockEngine, Receiver<PlayerMsg>) {
    let engine = MockEngine::default();
    let (tx, rx) = mpsc::channel();
    (Controller::new(engine.clone(), catalog(n), tx), engine, rx)
}

/// Deliver queued finished notifications, as the playback thread would.
fn pump(c: &mut Controller<MockEngine>, rx: &Receiver<PlayerMsg>) {
    while let Ok(msg) = rx.try_recv() {
        if let PlayerMsg::Finished { generation } = msg {
            let _ = c.on_finished(generation);
        }
    }
}

fn playing_status(position_ms: u64, duration_ms: Option<u64>) -> EngineStatus {
    EngineStatus {
        position_ms,
        duration_ms,
        is_loaded: true,
        just_finished: false,
    }
}

#[test]
fn starts_empty_with_sentinel_duration() {
    let (c, engine, _rx) = controller(3);
    assert_eq!(c.phase(), Phase::Empty);
    assert_eq!(c.current_index(), None);
    assert!(!c.is_playing());
    assert_eq!(c.duration_ms(), SENTINEL_DURATION_MS);
    assert!(!c.has_handle());
    assert!(engine.calls().is_empty());
}

#[test]
fn play_selects_track_and_keeps_exactly_one_live_handle() {
    let (mut c, engine, _rx) = controller(3);

    for index in [0, 2, 1, 1, 0] {
        c.play(index).unwrap();
        assert_eq!(c.current_index(), Some(index));
        assert!(c.is_playing());
        assert_eq!(c.phase(), Phase::Playing);
        assert_eq!(engine.live().len(), 1);
    }
    assert_eq!(engine.loads(), 5);
    assert_eq!(engine.count(|c| matches!(c, Call::Release(_))), 4);
    assert_eq!(c.current_track().unwrap().id, "t0");
}

#[test]
fn play_releases_before_loading_and_registers_one_callback() {
    let (mut c, engine, _rx) = controller(2);
    c.play(0).unwrap();
    let first = engine.last_live();
    c.play(1).unwrap();
    let second = engine.last_live();

    assert_eq!(
        engine.calls(),
        vec![
            Call::Load(url(0)),
            Call::OnFinished(first),
            Call::Release(first),
            Call::Load(url(1)),
            Call::OnFinished(second),
        ]
    );
}

#[test]
fn play_resets_position_and_duration() {
    let (mut c, engine, _rx) = controller(2);
    engine.set_status(playing_status(30_000, Some(120_000)));
    c.play(0).unwrap();
    c.poll();
    assert_eq!(c.position_ms(), 30_000);

    c.play(1).unwrap();
    assert_eq!(c.position_ms(), 0);
    assert_eq!(c.duration_ms(), SENTINEL_DURATION_MS);
}

#[test]
fn play_out_of_range_is_an_invalid_transition() {
    let (mut c, engine, _rx) = controller(3);
    let err = c.play(3).unwrap_err();
    assert!(matches!(
        err,
        PlayerError::InvalidTransition {
            intent: Intent::Play(3),
            phase: Phase::Empty
        }
    ));
    assert_eq!(engine.loads(), 0);
}

#[test]
fn next_applied_n_times_returns_to_start() {
    let (mut c, _engine, _rx) = controller(4);
    c.play(1).unwrap();
    for _ in 0..4 {
        c.next().unwrap();
    }
    assert_eq!(c.current_index(), Some(1));
}

#[test]
fn previous_undoes_next_including_wraparound() {
    let (mut c, _engine, _rx) = controller(4);
    c.play(3).unwrap();
    c.next().unwrap();
    assert_eq!(c.current_index(), Some(0));
    c.previous().unwrap();
    assert_eq!(c.current_index(), Some(3));

    c.play(0).unwrap();
    c.previous().unwrap();
    assert_eq!(c.current_index(), Some(3));
}

#[test]
fn next_and_previous_from_nothing_loaded() {
    let (mut c, _engine, _rx) = controller(5);
    c.next().unwrap();
    assert_eq!(c.current_index(), Some(0));

    let (mut c, _engine, _rx) = controller(5);
    c.previous().unwrap();
    assert_eq!(c.current_index(), Some(4));
}

#[test]
fn empty_catalog_makes_navigation_a_no_op() {
    let (mut c, engine, _rx) = controller(0);
    c.next().unwrap();
    c.previous().unwrap();
    assert!(c.toggle().is_err());
    assert!(c.seek(10).is_err());
    assert!(engine.calls().is_empty());
    assert_eq!(c.phase(), Phase::Empty);
}

#[test]
fn toggle_twice_pauses_then_resumes() {
    let (mut c, engine, _rx) = controller(2);
    c.play(0).unwrap();
    let id = engine.last_live();

    c.toggle().unwrap();
    assert!(!c.is_playing());
    assert_eq!(c.phase(), Phase::Paused);
    c.toggle().unwrap();
    assert!(c.is_playing());
    assert_eq!(c.phase(), Phase::Playing);

    let calls = engine.calls();
    assert_eq!(&calls[calls.len() - 2..], &[Call::Pause(id), Call::Resume(id)]);
}

#[test]
fn toggle_without_a_track_is_rejected_without_engine_calls() {
    let (mut c, engine, _rx) = controller(2);
    assert!(matches!(
        c.toggle(),
        Err(PlayerError::InvalidTransition {
            intent: Intent::Toggle,
            phase: Phase::Empty
        })
    ));
    assert!(engine.calls().is_empty());
}

#[test]
fn seek_updates_position_optimistically_and_leaves_the_rest() {
    let (mut c, engine, _rx) = controller(3);
    c.play(2).unwrap();
    c.toggle().unwrap();
    let id = engine.last_live();

    c.seek(42_000).unwrap();
    assert_eq!(c.position_ms(), 42_000);
    assert_eq!(c.current_index(), Some(2));
    assert!(!c.is_playing());
    assert_eq!(engine.calls().last(), Some(&Call::Seek(id, 42_000)));
}

#[test]
fn seek_clamps_to_a_known_duration() {
    let (mut c, engine, _rx) = controller(1);
    engine.set_status(playing_status(1_000, Some(180_000)));
    c.play(0).unwrap();
    c.poll();

    c.seek(999_999).unwrap();
    assert_eq!(c.position_ms(), 180_000);
    assert_eq!(
        engine.calls().last(),
        Some(&Call::Seek(engine.last_live(), 180_000))
    );
}

#[test]
fn seek_without_a_handle_is_rejected() {
    let (mut c, engine, _rx) = controller(2);
    assert!(matches!(
        c.seek(5),
        Err(PlayerError::InvalidTransition {
            intent: Intent::Seek(5),
            ..
        })
    ));
    assert!(engine.calls().is_empty());
}

#[test]
fn finishing_the_last_track_wraps_to_the_first() {
    let (mut c, engine, rx) = controller(3);
    c.play(2).unwrap();

    assert!(engine.finish(engine.last_live()));
    pump(&mut c, &rx);

    assert_eq!(c.current_index(), Some(0));
    assert!(c.is_playing());
    assert_eq!(engine.live().len(), 1);
}

#[test]
fn stale_finished_notifications_are_ignored() {
    let (mut c, engine, rx) = controller(3);
    c.play(0).unwrap();
    let old = engine.last_live();
    c.play(1).unwrap();

    // Callback of the replaced handle arrives late.
    assert!(engine.finish(old));
    pump(&mut c, &rx);

    assert_eq!(c.current_index(), Some(1));
    assert_eq!(engine.loads(), 2);
}

#[test]
fn a_repeated_finished_notification_advances_only_once() {
    let (mut c, _engine, _rx) = controller(4);
    c.play(0).unwrap();
    let generation = c.generation();

    c.on_finished(generation).unwrap();
    c.on_finished(generation).unwrap();

    assert_eq!(c.current_index(), Some(1));
}

#[test]
fn poll_copies_position_and_duration() {
    let (mut c, engine, _rx) = controller(1);
    c.play(0).unwrap();
    engine.set_status(playing_status(12_345, Some(200_000)));

    c.poll();
    assert_eq!(c.position_ms(), 12_345);
    assert_eq!(c.duration_ms(), 200_000);
}

#[test]
fn poll_leaves_a_just_finished_status_to_the_callback() {
    let (mut c, engine, _rx) = controller(2);
    c.play(0).unwrap();
    engine.set_status(playing_status(5_000, Some(60_000)));
    c.poll();

    engine.set_status(EngineStatus {
        position_ms: 60_000,
        duration_ms: Some(60_000),
        is_loaded: true,
        just_finished: true,
    });
    c.poll();

    assert_eq!(c.position_ms(), 5_000);
    assert_eq!(c.current_index(), Some(0));
    assert_eq!(engine.loads(), 1);
}

#[test]
fn poll_keeps_the_sentinel_while_duration_is_unknown() {
    let (mut c, engine, _rx) = controller(1);
    c.play(0).unwrap();
    engine.set_status(playing_status(2_500, None));

    c.poll();
    assert_eq!(c.duration_ms(), SENTINEL_DURATION_MS);
    assert_eq!(c.position_ms(), 2_500);

    engine.set_status(playing_status(3_000, Some(0)));
    c.poll();
    assert_eq!(c.duration_ms(), SENTINEL_DURATION_MS);
}

#[test]
fn poll_ignores_an_unloaded_status() {
    let (mut c, engine, _rx) = controller(1);
    c.play(0).unwrap();
    engine.set_status(EngineStatus {
        position_ms: 9_000,
        duration_ms: Some(10_000),
        is_loaded: false,
        just_finished: false,
    });
    c.poll();
    assert_eq!(c.position_ms(), 0);
}

#[test]
fn poll_does_nothing_while_paused_or_empty() {
    let (mut c, engine, _rx) = controller(1);
    c.poll();
    assert_eq!(engine.statuses(), 0);

    c.play(0).unwrap();
    c.toggle().unwrap();
    assert!(!c.wants_poll());
    c.poll();
    assert_eq!(engine.statuses(), 0);
}

#[test]
fn load_failure_keeps_selection_and_leaves_the_controller_usable() {
    let (mut c, engine, _rx) = controller(3);
    c.play(0).unwrap();
    engine.fail_url(&url(1));

    let err = c.handle_intent(Intent::Play(1)).unwrap_err();
    assert!(matches!(err, PlayerError::Load { index: 1, .. }));
    assert_eq!(c.current_index(), Some(0));
    assert!(!c.is_playing());
    assert_eq!(c.phase(), Phase::Empty);
    assert!(!c.has_handle());
    assert!(engine.live().is_empty());
    assert!(c.snapshot().last_error.unwrap().contains("track 1"));

    c.handle_intent(Intent::Play(2)).unwrap();
    assert_eq!(c.current_index(), Some(2));
    assert!(c.snapshot().last_error.is_none());
}

#[test]
fn first_load_failure_stays_empty() {
    let (mut c, engine, _rx) = controller(2);
    engine.fail_url(&url(0));
    assert!(c.play(0).is_err());
    assert_eq!(c.current_index(), None);
    assert_eq!(c.phase(), Phase::Empty);
}

#[test]
fn release_failure_does_not_block_the_next_load() {
    let (mut c, engine, _rx) = controller(2);
    c.play(0).unwrap();
    engine.lock().fail_release = true;

    c.play(1).unwrap();
    assert_eq!(c.current_index(), Some(1));
    assert!(c.is_playing());
}

#[test]
fn toggle_and_seek_issue_a_single_engine_command() {
    let (mut c, engine, _rx) = controller(1);
    c.play(0).unwrap();

    let before = engine.calls().len();
    c.toggle().unwrap();
    assert_eq!(engine.calls().len(), before + 1);
    c.seek(100).unwrap();
    assert_eq!(engine.calls().len(), before + 2);
}

#[test]
fn teardown_releases_and_nothing_mutates_afterwards() {
    let (mut c, engine, rx) = controller(3);
    c.play(1).unwrap();
    let id = engine.last_live();

    c.teardown();
    assert!(engine.live().is_empty());
    assert!(c.snapshot().closed);
    let calls = engine.calls().len();
    let snapshot = c.snapshot();

    assert!(engine.finish(id));
    pump(&mut c, &rx);
    c.poll();
    assert!(matches!(
        c.handle_intent(Intent::Next),
        Err(PlayerError::Disconnected)
    ));
    assert!(matches!(c.toggle(), Err(PlayerError::Disconnected)));
    assert!(matches!(c.seek(1_000), Err(PlayerError::Disconnected)));
    c.teardown();

    assert_eq!(engine.calls().len(), calls);
    assert_eq!(c.snapshot().current_index, snapshot.current_index);
    assert_eq!(c.snapshot().position_ms, snapshot.position_ms);
    assert!(!c.snapshot().is_playing);
}

fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(3);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}

fn spawn_player(n: usize) -> (PlayerHandle, MockEngine) {
    let engine = MockEngine::default();
    let spy = engine.clone();
    let player = PlayerHandle::spawn(
        move || Ok::<_, EngineError>(engine),
        catalog(n),
        Duration::from_millis(10),
    )
    .unwrap();
    (player, spy)
}

#[test]
fn player_thread_handles_requests_and_polls_while_playing() {
    let (player, spy) = spawn_player(3);

    player.request(Intent::Play(1)).unwrap();
    let s = player.snapshot();
    assert_eq!(s.current_index, Some(1));
    assert!(s.is_playing);
    assert_eq!(s.phase, Phase::Playing);

    spy.set_status(playing_status(4_200, Some(200_000)));
    assert!(wait_for(|| player.snapshot().position_ms == 4_200));
    assert_eq!(player.snapshot().duration_ms, 200_000);

    player.request(Intent::Toggle).unwrap();
    let polls = spy.statuses();
    std::thread::sleep(Duration::from_millis(60));
    assert_eq!(spy.statuses(), polls);
}

#[test]
fn player_thread_reports_load_errors_to_the_caller_and_snapshot() {
    let (player, spy) = spawn_player(2);
    spy.fail_url(&url(0));

    assert!(matches!(
        player.request(Intent::Play(0)),
        Err(PlayerError::Load { index: 0, .. })
    ));
    assert!(player.snapshot().last_error.is_some());

    player.send(Intent::Play(1)).unwrap();
    assert!(wait_for(|| player.snapshot().current_index == Some(1)));
}

#[test]
fn player_thread_advances_when_a_track_finishes() {
    let (player, spy) = spawn_player(3);
    player.request(Intent::Play(2)).unwrap();

    assert!(spy.finish(spy.last_live()));
    assert!(wait_for(|| player.snapshot().current_index == Some(0)));
    assert!(player.snapshot().is_playing);
}

#[test]
fn player_thread_goes_quiet_after_shutdown() {
    let (player, spy) = spawn_player(3);
    player.request(Intent::Play(0)).unwrap();
    let id = spy.last_live();

    player.shutdown();
    assert!(spy.live().is_empty());
    assert!(player.snapshot().closed);
    let calls = spy.calls().len();

    spy.finish(id);
    std::thread::sleep(Duration::from_millis(40));
    assert_eq!(spy.calls().len(), calls);
    assert!(matches!(
        player.request(Intent::Toggle),
        Err(PlayerError::Disconnected)
    ));
}

#[test]
fn dropping_the_player_handle_shuts_the_thread_down() {
    let (player, spy) = spawn_player(2);
    player.request(Intent::Play(1)).unwrap();
    let id = spy.last_live();

    drop(player);
    assert!(spy.live().is_empty());
    assert_eq!(spy.calls().last(), Some(&Call::Release(id)));
}

#[test]
fn player_thread_survives_a_missing_engine() {
    let player = PlayerHandle::spawn(
        || Err::<MockEngine, _>(EngineError::Output("no device".into())),
        catalog(1),
        Duration::from_millis(10),
    )
    .unwrap();

    assert!(wait_for(|| player.snapshot().closed));
    assert!(player.snapshot().last_error.unwrap().contains("no device"));
    assert!(matches!(
        player.request(Intent::Next),
        Err(PlayerError::Disconnected)
    ));
}
