use ippo_core::db::migrations::latest_version;
use ippo_core::db::{open_db, open_db_in_memory};
use ippo_core::kv::{CACHE_KEY, QUEUE_KEY};
use ippo_core::{
    Cache, CacheRepository, EntryMemoService, FixedClock, KeyValueStore, NewEntryRequest,
    SettingsRepository, SqliteKvStore, StoreError,
};
use rusqlite::Connection;
use serde_json::json;

#[test]
fn open_db_in_memory_creates_kv_table() {
    let conn = open_db_in_memory().unwrap();
    assert_eq!(schema_version(&conn), latest_version());

    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'kv');",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1);
}

#[test]
fn sqlite_store_upserts_and_removes() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKvStore::new(&conn);

    assert_eq!(store.get("k").unwrap(), None);
    store.set("k", "one").unwrap();
    store.set("k", "two").unwrap();
    store.set("a", "first").unwrap();
    assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));
    assert_eq!(store.keys().unwrap(), vec!["a".to_string(), "k".to_string()]);

    store.remove("k").unwrap();
    store.remove("k").unwrap();
    assert_eq!(store.get("k").unwrap(), None);
}

#[test]
fn journal_survives_reopening_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ippo.db");

    {
        let conn = open_db(&path).unwrap();
        let store = SqliteKvStore::new(&conn);
        let service = EntryMemoService::new(&store);
        service
            .add_entry(NewEntryRequest::new("2026-10-16", "21:00", "journal", "Family"))
            .unwrap();
        service.add_memo("water plants").unwrap();
        SettingsRepository::new(&store)
            .save(&json!({"filePath": "/Apps/IppoDashboard/ippo_data.json"}))
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let store = SqliteKvStore::new(&conn);
    let service = EntryMemoService::new(&store);
    let cache = service.cache().load();
    assert_eq!(cache.entries.len(), 1);
    assert_eq!(cache.entries[0].category(), Some("Family"));
    assert_eq!(cache.memos.len(), 1);
    assert_eq!(service.pending_count(), 2);
    assert!(store.get(CACHE_KEY).unwrap().is_some());
    assert_eq!(
        SettingsRepository::new(&store).load(),
        Some(json!({"filePath": "/Apps/IppoDashboard/ippo_data.json"}))
    );
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        StoreError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn set_many_commits_all_pairs() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKvStore::new(&conn);
    store.set("a", "old").unwrap();

    store.set_many(&[("a", "new"), ("b", "fresh")]).unwrap();

    assert_eq!(store.get("a").unwrap().as_deref(), Some("new"));
    assert_eq!(store.get("b").unwrap().as_deref(), Some("fresh"));
    assert!(conn.is_autocommit());
}

#[test]
fn set_many_rolls_back_when_a_statement_fails() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_locked BEFORE INSERT ON kv
         WHEN NEW.key = 'locked'
         BEGIN SELECT RAISE(ABORT, 'locked key'); END;",
    )
    .unwrap();
    let store = SqliteKvStore::new(&conn);
    store.set("a", "old").unwrap();

    let err = store
        .set_many(&[("a", "new"), ("locked", "x")])
        .unwrap_err();

    assert!(matches!(err, StoreError::Sqlite(_)));
    assert_eq!(store.get("a").unwrap().as_deref(), Some("old"));
    assert_eq!(store.get("locked").unwrap(), None);
    assert!(conn.is_autocommit());
}

#[test]
fn cache_save_lands_cache_and_marker_in_one_transaction() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKvStore::new(&conn);
    let clock = FixedClock::new(7);

    CacheRepository::with_clock(&store, &clock)
        .save(&Cache::empty())
        .unwrap();

    assert!(store.get(CACHE_KEY).unwrap().is_some());
    assert_eq!(store.get(QUEUE_KEY).unwrap().as_deref(), Some(r#"[{"ts":7}]"#));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}
