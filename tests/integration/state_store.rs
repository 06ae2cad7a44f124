use backupy::store::{StateMap, StateStore};
use backupy::{BackupError, PersistedState, RunOutcome};
use serde_json::{Value, json};

use crate::helpers::reload_state;

#[test]
fn updates_survive_reopen() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join(".backupy.state");

    let mut store = StateStore::open(&path, PersistedState::store_defaults()).expect("open");
    store
        .update([("last_source", json!("/home/a")), ("last_state", json!("failed"))])
        .expect("update");
    store
        .update([("extra", json!({"runs": 3}))])
        .expect("update extra");

    let reopened = StateStore::open(&path, StateMap::new()).expect("reopen");
    assert!(reopened.is_saved());
    assert_eq!(reopened.get("last_source").expect("key"), &json!("/home/a"));
    assert_eq!(reopened.get("last_state").expect("key"), &json!("failed"));
    assert_eq!(reopened.get("extra").expect("key"), &json!({"runs": 3}));

    let typed = reload_state(&path);
    assert_eq!(typed.last_state, Some(RunOutcome::Failed));
}

#[test]
fn corrupted_bytes_open_as_defaults() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join(".backupy.state");
    std::fs::write(&path, [0x80, 0x04, 0x95, 0xff, 0x00, 0x13]).expect("write garbage");

    let store = StateStore::open(&path, PersistedState::store_defaults()).expect("open");
    assert!(!store.is_saved());
    assert_eq!(store.get("last_source").expect("key"), &Value::Null);
    assert_eq!(store.get("last_state").expect("key"), &Value::Null);
}

#[test]
fn truncated_file_opens_as_defaults_and_recovers_on_write() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join(".backupy.state");

    let mut store = StateStore::open(&path, PersistedState::store_defaults()).expect("open");
    PersistedState::mark_started(&mut store, "/srv/www").expect("mark");
    let full = std::fs::read(&path).expect("read");
    std::fs::write(&path, &full[..full.len() / 2]).expect("truncate");

    let mut reopened = StateStore::open(&path, PersistedState::store_defaults()).expect("reopen");
    assert_eq!(PersistedState::load(&reopened), PersistedState::default());

    PersistedState::mark_started(&mut reopened, "/etc").expect("mark again");
    assert_eq!(reload_state(&path).last_source.as_deref(), Some("/etc"));
}

#[test]
fn shorter_rewrite_leaves_no_stale_bytes() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join(".backupy.state");

    let mut store = StateStore::open(&path, PersistedState::store_defaults()).expect("open");
    store
        .update([("last_source", json!("x".repeat(4096)))])
        .expect("long write");
    let long_len = std::fs::metadata(&path).expect("metadata").len();

    store
        .update([("last_source", json!("y"))])
        .expect("short write");
    let short_len = std::fs::metadata(&path).expect("metadata").len();

    assert!(short_len < long_len);
    let bytes = std::fs::read(&path).expect("read");
    assert!(serde_json::from_slice::<Value>(&bytes).is_ok(), "file is a single JSON document");
}

#[test]
fn missing_key_without_defaults_is_key_not_found() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store =
        StateStore::open(temp.path().join(".backupy.state"), StateMap::new()).expect("open");

    assert!(!store.has("last_state"));
    assert!(matches!(
        store.get("last_state"),
        Err(BackupError::KeyNotFound { .. })
    ));
}

#[cfg(unix)]
#[test]
fn directory_in_place_of_store_is_an_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join(".backupy.state");
    std::fs::create_dir(&path).expect("mkdir");

    let result = StateStore::open(&path, PersistedState::store_defaults());
    assert!(matches!(result, Err(BackupError::Store(_))));
}
