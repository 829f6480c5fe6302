//! Last-session persistence across player lifetimes

mod support;

use narrator_playback::persister::{file_uri, KEY_LAST_FILE, KEY_LAST_POSITION, KEY_WAS_PLAYING};
use narrator_playback::{Intent, Preferences, SessionRecord, SessionStore, TransportState};
use std::path::Path;
use support::{is_silent, Harness, SineLoader, BUFFER, RATE, TIMEOUT};

fn save_record(prefs_dir: &Path, uri: &str, position: f64, playing: bool) {
    let mut store = SessionStore::open(prefs_dir);
    store
        .save(&SessionRecord {
            last_file_uri: uri.to_string(),
            last_position: position,
            was_playing: playing,
        })
        .unwrap();
}

fn saved(prefs_dir: &Path) -> Preferences {
    Preferences::load_from_dir(prefs_dir)
}

/// Drop the player (persisting on close) and start a new one on the same
/// preferences
fn relaunch(h: Harness, loader: SineLoader) -> Harness {
    let Harness { dir, player, .. } = h;
    drop(player);
    Harness::in_dir(dir, loader)
}

#[test]
fn resume_while_playing_starts_at_saved_position() {
    let h = Harness::new(SineLoader::default());
    let book = h.file("book.mp3");
    save_record(&h.prefs_dir(), &file_uri(&book).unwrap(), 42.5, true);

    let mut h = relaunch(h, SineLoader::default());
    let offer = h.player.startup().unwrap();
    assert_eq!(offer.file_name, "book.mp3");
    assert_eq!(offer.path, book);
    assert!(offer.was_playing);

    h.player.accept_resume(&offer).unwrap();
    assert_eq!(h.player.state(), TransportState::Playing);
    assert_eq!(h.view.snapshot().status, "Resumed: book.mp3");

    let target = (42.5 * f64::from(RATE)).round() as usize;
    let position = h.position();
    assert!(
        (target..=target + BUFFER + 2048).contains(&position),
        "position {position}"
    );
}

#[test]
fn resume_while_paused_waits_for_play() {
    let h = Harness::new(SineLoader::default());
    let book = h.file("book.mp3");
    save_record(&h.prefs_dir(), &file_uri(&book).unwrap(), 42.5, false);

    let mut h = relaunch(h, SineLoader::default());
    let offer = h.player.startup().unwrap();
    h.player.accept_resume(&offer).unwrap();

    assert_eq!(h.player.state(), TransportState::Paused);
    assert!(h.view.snapshot().controls.play);
    let target = (42.5 * f64::from(RATE)).round() as usize;
    assert_eq!(h.position(), target);

    for buffer in h.output.recv_many(3, TIMEOUT).unwrap() {
        assert!(is_silent(&buffer));
    }
    assert_eq!(h.position(), target);

    h.player.handle(Intent::Play);
    h.output.recv(TIMEOUT).unwrap();
    h.output.recv(TIMEOUT).unwrap();
    assert!(h.position() > target);
}

#[test]
fn resume_past_end_clamps_to_last_frame() {
    let loader = SineLoader::default().with("short.mp3", 10.0);
    let h = Harness::new(loader.clone());
    let book = h.file("short.mp3");
    save_record(&h.prefs_dir(), &file_uri(&book).unwrap(), 3600.0, false);

    let mut h = relaunch(h, loader);
    let offer = h.player.startup().unwrap();
    h.player.accept_resume(&offer).unwrap();

    assert_eq!(h.player.state(), TransportState::Paused);
    assert_eq!(h.len(), 10 * RATE as usize);
    assert_eq!(h.position(), h.len() - 1);
}

#[test]
fn missing_file_clears_saved_session() {
    let h = Harness::new(SineLoader::default());
    let gone = h.dir.path().join("gone.mp3");
    save_record(&h.prefs_dir(), &file_uri(&gone).unwrap(), 12.0, true);

    let mut h = relaunch(h, SineLoader::default());
    assert!(h.player.startup().is_none());
    assert_eq!(h.player.state(), TransportState::NoFile);

    let prefs = saved(&h.prefs_dir());
    assert_eq!(prefs.string(KEY_LAST_FILE), "");
    assert_eq!(prefs.float(KEY_LAST_POSITION), 0.0);
    assert!(!prefs.bool(KEY_WAS_PLAYING));
}

#[test]
fn malformed_uri_clears_only_file() {
    let h = Harness::new(SineLoader::default());
    save_record(&h.prefs_dir(), "not a uri", 12.0, true);

    let mut h = relaunch(h, SineLoader::default());
    assert!(h.player.startup().is_none());

    let prefs = saved(&h.prefs_dir());
    assert_eq!(prefs.string(KEY_LAST_FILE), "");
    assert_eq!(prefs.float(KEY_LAST_POSITION), 12.0);
    assert!(prefs.bool(KEY_WAS_PLAYING));
}

#[test]
fn zero_position_is_not_offered() {
    let h = Harness::new(SineLoader::default());
    let book = h.file("book.mp3");
    let uri = file_uri(&book).unwrap();
    save_record(&h.prefs_dir(), &uri, 0.0, true);

    let mut h = relaunch(h, SineLoader::default());
    assert!(h.player.startup().is_none());
    assert_eq!(saved(&h.prefs_dir()).string(KEY_LAST_FILE), uri);
}

#[test]
fn decline_clears_saved_session() {
    let h = Harness::new(SineLoader::default());
    let book = h.file("book.mp3");
    save_record(&h.prefs_dir(), &file_uri(&book).unwrap(), 42.5, true);

    let mut h = relaunch(h, SineLoader::default());
    assert!(h.player.startup().is_some());
    h.player.decline_resume().unwrap();

    assert_eq!(h.player.state(), TransportState::NoFile);
    assert!(h.player.startup().is_none());
    assert_eq!(saved(&h.prefs_dir()).string(KEY_LAST_FILE), "");
}

#[test]
fn failed_resume_reports_and_clears() {
    let h = Harness::new(SineLoader::default());
    let bad = h.file("corrupt.mp3");
    save_record(&h.prefs_dir(), &file_uri(&bad).unwrap(), 5.0, true);

    let mut h = relaunch(h, SineLoader::default());
    let offer = h.player.startup().unwrap();
    assert!(h.player.accept_resume(&offer).is_err());

    assert_eq!(h.player.state(), TransportState::NoFile);
    assert_eq!(h.view.snapshot().errors.len(), 1);
    assert_eq!(saved(&h.prefs_dir()).string(KEY_LAST_FILE), "");
}

#[test]
fn close_persists_playing_session() {
    let mut h = Harness::new(SineLoader::default());
    let book = h.file("book.mp3");
    h.player.handle(Intent::Open(book.clone()));
    h.player.handle(Intent::Play);
    h.output.recv_many(2, TIMEOUT).unwrap();
    h.settle();

    let position = h.position();
    h.player.close();

    let prefs = saved(&h.prefs_dir());
    assert_eq!(prefs.string(KEY_LAST_FILE), file_uri(&book).unwrap());
    let seconds = position as f64 / f64::from(RATE);
    assert!((prefs.float(KEY_LAST_POSITION) - seconds).abs() < 1e-9);
    assert!(prefs.bool(KEY_WAS_PLAYING));

    // A second close does not overwrite anything
    h.player.close();
    assert_eq!(saved(&h.prefs_dir()).string(KEY_LAST_FILE), file_uri(&book).unwrap());
}

#[test]
fn close_without_file_saves_nothing() {
    let mut h = Harness::new(SineLoader::default());
    h.player.close();
    assert!(!h.prefs_dir().join("preferences.json").exists());
}

#[test]
fn paused_session_round_trips_exact_frame() {
    let mut h = Harness::new(SineLoader::default());
    let book = h.file("book.mp3");
    h.player.handle(Intent::Open(book));
    h.player.handle(Intent::Play);
    h.output.recv(TIMEOUT).unwrap();
    h.settle();
    h.player.handle(Intent::SkipForward);
    h.player.handle(Intent::Pause);
    let position = h.position();

    let mut h = relaunch(h, SineLoader::default());
    assert!(!saved(&h.prefs_dir()).bool(KEY_WAS_PLAYING));

    let offer = h.player.startup().unwrap();
    h.player.accept_resume(&offer).unwrap();
    assert_eq!(h.player.state(), TransportState::Paused);
    assert_eq!(h.position(), position);
}
