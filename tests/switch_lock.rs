// ABOUTME: Integration tests for the single-flight switch lock.
// ABOUTME: Tests lock acquisition, stale detection, corrupted files, and force breaking.

mod support;

use chrono::{Duration, Utc};
use fleetkeeper::switch::{LockInfo, STATE_LOCK_SCOPE, SwitchErrorKind, SwitchLock};
use std::fs;
use support::pair;

#[test]
fn second_acquire_is_refused_while_held() {
    let dir = tempfile::tempdir().unwrap();
    let pair = pair();

    let lock = SwitchLock::acquire(dir.path(), &pair, false).unwrap();
    let err = SwitchLock::acquire(dir.path(), &pair, false).unwrap_err();
    assert_eq!(err.kind(), SwitchErrorKind::LockHeld);
    assert!(err.to_string().contains(&format!("pid {}", std::process::id())));

    lock.release().unwrap();
    let again = SwitchLock::acquire(dir.path(), &pair, false).unwrap();
    again.release().unwrap();
}

#[test]
fn lock_file_records_the_holder() {
    let dir = tempfile::tempdir().unwrap();
    let pair = pair();

    let lock = SwitchLock::acquire(dir.path(), &pair, false).unwrap();
    let info: LockInfo = serde_json::from_str(&fs::read_to_string(lock.path()).unwrap()).unwrap();
    assert_eq!(info.pid, std::process::id());
    assert_eq!(info.pair, pair.key());
    assert_eq!(lock.path(), LockInfo::lock_path(dir.path(), &pair));
}

#[test]
fn dropping_the_lock_removes_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let pair = pair();

    let path = {
        let lock = SwitchLock::acquire(dir.path(), &pair, false).unwrap();
        lock.path().to_path_buf()
    };
    assert!(!path.exists());
}

#[test]
fn force_breaks_a_live_lock() {
    let dir = tempfile::tempdir().unwrap();
    let pair = pair();

    let _held = SwitchLock::acquire(dir.path(), &pair, false).unwrap();
    let forced = SwitchLock::acquire(dir.path(), &pair, true).unwrap();
    assert!(forced.path().exists());
}

#[test]
fn stale_lock_is_broken_automatically() {
    let dir = tempfile::tempdir().unwrap();
    let pair = pair();

    let mut info = LockInfo::new(&pair);
    info.holder = "old-runner".to_string();
    info.started_at = Utc::now() - Duration::hours(2);
    let path = LockInfo::lock_path(dir.path(), &pair);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, serde_json::to_string(&info).unwrap()).unwrap();

    let lock = SwitchLock::acquire(dir.path(), &pair, false).unwrap();
    let current: LockInfo = serde_json::from_str(&fs::read_to_string(lock.path()).unwrap()).unwrap();
    assert_ne!(current.holder, "old-runner");
}

#[test]
fn corrupted_lock_is_broken() {
    let dir = tempfile::tempdir().unwrap();
    let pair = pair();

    let path = LockInfo::lock_path(dir.path(), &pair);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "not json").unwrap();

    assert!(SwitchLock::acquire(dir.path(), &pair, false).is_ok());
}

#[test]
fn different_pairs_do_not_contend() {
    let dir = tempfile::tempdir().unwrap();
    let first = pair();
    let second = fleetkeeper::types::EnvironmentPair::new(
        support::fleet("web-blue"),
        support::fleet("web-green"),
    );

    let _a = SwitchLock::acquire(dir.path(), &first, false).unwrap();
    assert!(SwitchLock::acquire(dir.path(), &second, false).is_ok());
}

#[test]
fn state_lock_is_single_flight() {
    let dir = tempfile::tempdir().unwrap();

    let held = SwitchLock::acquire_state(dir.path(), false).unwrap();
    let info: LockInfo = serde_json::from_str(&fs::read_to_string(held.path()).unwrap()).unwrap();
    assert_eq!(info.pair, STATE_LOCK_SCOPE);
    assert_eq!(held.path(), LockInfo::state_lock_path(dir.path()));

    let err = SwitchLock::acquire_state(dir.path(), false).unwrap_err();
    assert_eq!(err.kind(), SwitchErrorKind::LockHeld);

    held.release().unwrap();
    SwitchLock::acquire_state(dir.path(), false).unwrap().release().unwrap();
}

#[test]
fn state_lock_and_pair_lock_are_independent() {
    let dir = tempfile::tempdir().unwrap();

    let _switch = SwitchLock::acquire(dir.path(), &pair(), false).unwrap();
    let state = SwitchLock::acquire_state(dir.path(), false).unwrap();
    state.release().unwrap();
}
