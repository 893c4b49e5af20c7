//! Tests for Store
//!
//! These tests verify:
//! - Default seeding and active domain resolution
//! - Key and domain operations, including misses
//! - Flush idempotence and dirty tracking
//! - Persistence across reopen
//! - Close, scoped use and flush on drop

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use flatkv::{Config, FlatKvError, KeyValueStore, Store, Value, DEFAULT_DOMAIN};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_path() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store.json");
    (temp_dir, path)
}

fn open(path: &Path) -> Store {
    Store::open_path(path, None).unwrap()
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_missing_file_is_fresh_store() {
    let (_temp, path) = setup_temp_path();

    let store = open(&path);

    assert_eq!(store.domain(), DEFAULT_DOMAIN);
    assert_eq!(store.domains(), vec![DEFAULT_DOMAIN.to_string()]);
    assert!(!store.is_dirty());
}

#[test]
fn test_open_empty_file_is_fresh_store() {
    let (_temp, path) = setup_temp_path();
    fs::write(&path, "").unwrap();

    let store = open(&path);

    assert_eq!(store.get("foo", None), Some(Value::from("bar")));
    assert!(store.updated().is_none());
}

#[test]
fn test_clean_store_never_writes() {
    let (_temp, path) = setup_temp_path();

    drop(open(&path));

    assert!(!path.exists());
}

#[test]
fn test_open_directory_fails_with_file_access() {
    let temp_dir = TempDir::new().unwrap();

    let err = Store::open_path(temp_dir.path(), None).unwrap_err();

    assert!(matches!(err, FlatKvError::FileAccess { .. }));
}

#[test]
fn test_open_in_missing_directory_fails_with_file_access() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing").join("store.json");

    let err = Store::open_path(&path, None).unwrap_err();

    assert!(matches!(err, FlatKvError::FileAccess { .. }));
}

#[cfg(unix)]
#[test]
fn test_open_in_read_only_directory_fails_with_file_access() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let locked = temp_dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

    // Root ignores directory modes; nothing to check there
    let writable = fs::write(locked.join("canary"), "").is_ok();

    let result = Store::open_path(locked.join("store.json"), None);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    if writable {
        return;
    }
    assert!(matches!(result, Err(FlatKvError::FileAccess { .. })));
}

#[test]
fn test_open_empty_path_is_config_error() {
    let config = Config::builder().path("").build();

    let err = Store::open(config).unwrap_err();

    assert!(matches!(err, FlatKvError::Config(_)));
}

#[test]
fn test_open_with_new_domain_creates_it() {
    let (_temp, path) = setup_temp_path();

    let store = Store::open_path(&path, Some("tenant")).unwrap();

    assert_eq!(store.domain(), "tenant");
    assert!(store.domain_exists("tenant"));
    assert!(store.domain_exists(DEFAULT_DOMAIN));
    assert!(store.is_dirty());
}

#[test]
fn test_open_with_new_domain_persists_it() {
    let (_temp, path) = setup_temp_path();

    Store::open_path(&path, Some("tenant")).unwrap().close().unwrap();

    let store = open(&path);
    assert!(store.domain_exists("tenant"));
}

#[test]
fn test_open_with_empty_domain_uses_default() {
    let (_temp, path) = setup_temp_path();

    let store = Store::open_path(&path, Some("")).unwrap();

    assert_eq!(store.domain(), DEFAULT_DOMAIN);
    assert!(!store.is_dirty());
}

// =============================================================================
// Default Seeding Tests
// =============================================================================

#[test]
fn test_default_seed_visible_in_fresh_store() {
    let (_temp, path) = setup_temp_path();

    let store = open(&path);

    assert_eq!(store.get("foo", None), Some(Value::from("bar")));
    assert_eq!(store.get("foo", Some(DEFAULT_DOMAIN)), Some(Value::from("bar")));
}

#[test]
fn test_loaded_file_replaces_seed() {
    let (_temp, path) = setup_temp_path();

    {
        let mut store = open(&path);
        store.remove("foo", None);
        store.put("own", "value", None);
        store.close().unwrap();
    }

    let store = open(&path);

    assert!(!store.exists("foo", None));
    assert_eq!(store.get("own", None), Some(Value::from("value")));
}

#[test]
fn test_loaded_file_without_default_domain_recreates_it_empty() {
    let (_temp, path) = setup_temp_path();

    {
        let mut store = Store::open_path(&path, Some("app")).unwrap();
        store.domain_remove(DEFAULT_DOMAIN);
        store.close().unwrap();
    }

    let store = open(&path);

    assert!(store.domain_exists(DEFAULT_DOMAIN));
    assert!(!store.exists("foo", None));
    assert!(store.is_dirty());
}

// =============================================================================
// Key Operation Tests
// =============================================================================

#[test]
fn test_put_get_exists() {
    let (_temp, path) = setup_temp_path();
    let mut store = open(&path);

    assert!(store.put("hello", "world", None));

    assert!(store.exists("hello", None));
    assert_eq!(store.get("hello", None), Some(Value::from("world")));
}

#[test]
fn test_put_overwrite() {
    let (_temp, path) = setup_temp_path();
    let mut store = open(&path);

    store.put("key", 1, None);
    store.put("key", 2, None);

    assert_eq!(store.get("key", None), Some(Value::Integer(2)));
}

#[test]
fn test_get_missing_key() {
    let (_temp, path) = setup_temp_path();
    let store = open(&path);

    assert_eq!(store.get("nonexistent", None), None);
    assert!(!store.exists("nonexistent", None));
}

#[test]
fn test_empty_key_is_a_valid_key() {
    let (_temp, path) = setup_temp_path();
    let mut store = open(&path);

    assert!(store.put("", "empty", None));
    assert!(store.exists("", None));
}

#[test]
fn test_null_value_still_exists() {
    let (_temp, path) = setup_temp_path();
    let mut store = open(&path);

    store.put("nothing", Value::Null, None);

    assert!(store.exists("nothing", None));
    assert_eq!(store.get("nothing", None), Some(Value::Null));
}

#[test]
fn test_remove() {
    let (_temp, path) = setup_temp_path();
    let mut store = open(&path);

    store.put("key", "value", None);

    assert!(store.remove("key", None));
    assert!(!store.exists("key", None));
    assert!(!store.remove("key", None));
}

#[test]
fn test_get_returns_a_copy() {
    let (_temp, path) = setup_temp_path();
    let mut store = open(&path);
    store.put("list", vec![1, 2], None);
    store.flush().unwrap();

    let mut copy = store.get("list", None).unwrap();
    if let Value::Array(items) = &mut copy {
        items.push(Value::Integer(3));
    }

    assert_eq!(store.get("list", None), Some(Value::from(vec![1, 2])));
    assert!(!store.is_dirty());
}

#[test]
fn test_keys_sorted() {
    let (_temp, path) = setup_temp_path();
    let mut store = open(&path);

    store.put("b", 1, None);
    store.put("a", 2, None);

    assert_eq!(
        store.keys(None),
        Some(vec!["a".to_string(), "b".to_string(), "foo".to_string()])
    );
    assert_eq!(store.keys(Some("missing")), None);
}

// =============================================================================
// Domain Tests
// =============================================================================

#[test]
fn test_domain_isolation() {
    let (_temp, path) = setup_temp_path();
    let mut store = open(&path);
    store.domain_add("A");
    store.domain_add("B");

    assert!(store.put("k", "v", Some("A")));

    assert!(store.exists("k", Some("A")));
    assert!(!store.exists("k", Some("B")));
    assert!(!store.exists("k", None));
    assert_eq!(store.get("k", Some("B")), None);
}

#[test]
fn test_missing_domain_rejected() {
    let (_temp, path) = setup_temp_path();
    let mut store = open(&path);

    assert!(!store.put("k", "v", Some("ghost")));
    assert_eq!(store.get("k", Some("ghost")), None);
    assert!(!store.exists("k", Some("ghost")));
    assert!(!store.remove("k", Some("ghost")));
    assert!(!store.domain_exists("ghost"));
}

#[test]
fn test_domain_add_twice() {
    let (_temp, path) = setup_temp_path();
    let mut store = open(&path);

    assert!(store.domain_add("tenant"));
    assert!(!store.domain_add("tenant"));
    assert!(store.domain_exists("tenant"));
}

#[test]
fn test_domain_remove_drops_keys() {
    let (_temp, path) = setup_temp_path();
    let mut store = open(&path);
    store.domain_add("tenant");
    store.put("k", 1, Some("tenant"));

    assert!(store.domain_remove("tenant"));
    assert!(store.domain_add("tenant"));

    assert!(!store.exists("k", Some("tenant")));
}

#[test]
fn test_removing_active_domain_disables_default_calls() {
    let (_temp, path) = setup_temp_path();
    let mut store = open(&path);

    assert!(store.domain_remove(DEFAULT_DOMAIN));

    assert!(!store.put("k", "v", None));
    assert_eq!(store.get("foo", None), None);

    assert!(store.domain_add(DEFAULT_DOMAIN));
    assert!(store.put("k", "v", None));
}

// =============================================================================
// Flush Tests
// =============================================================================

#[test]
fn test_flush_clean_store_is_noop() {
    let (_temp, path) = setup_temp_path();
    let mut store = open(&path);

    store.flush().unwrap();

    assert!(!path.exists());
}

#[test]
fn test_flush_twice_writes_once() {
    let (_temp, path) = setup_temp_path();
    let mut store = open(&path);

    store.put("x", 1, None);
    store.flush().unwrap();
    assert!(path.exists());

    // A second write would recreate the file
    fs::remove_file(&path).unwrap();
    store.flush().unwrap();

    assert!(!path.exists());
    assert!(!store.is_dirty());
}

#[test]
fn test_non_finite_float_flushes_as_null() {
    let (_temp, path) = setup_temp_path();

    {
        let mut store = open(&path);
        store.put("nan", f64::NAN, None);
        store.put("inf", f64::INFINITY, None);
        store.close().unwrap();
    }

    let store = open(&path);
    assert_eq!(store.get("nan", None), Some(Value::Null));
    assert_eq!(store.get("inf", None), Some(Value::Null));
}

#[test]
fn test_put_alone_is_persisted() {
    let (_temp, path) = setup_temp_path();

    {
        let mut store = open(&path);
        store.put("only", "put", None);
        store.close().unwrap();
    }

    assert_eq!(open(&path).get("only", None), Some(Value::from("put")));
}

#[test]
fn test_envelope_layout_on_disk() {
    let (_temp, path) = setup_temp_path();
    let mut store = open(&path);
    store.put("x", 42, None);
    store.flush().unwrap();

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

    let domains = raw["domains"].as_str().unwrap();
    let inner: serde_json::Value = serde_json::from_str(domains).unwrap();
    assert_eq!(inner["default"]["x"], 42);

    assert_eq!(raw["meta"]["checksum"].as_str(), store.checksum());
    assert_eq!(raw["meta"]["updated"].as_str(), store.updated());
}

#[test]
fn test_compact_envelope() {
    let (_temp, path) = setup_temp_path();
    let config = Config::builder().path(&path).pretty(false).build();

    Store::scoped(config, |store| {
        store.put("x", 1, None);
        Ok(())
    })
    .unwrap();

    assert!(!fs::read_to_string(&path).unwrap().contains('\n'));
}

#[test]
fn test_locked_flush() {
    let (_temp, path) = setup_temp_path();
    let config = Config::builder().path(&path).lock_on_flush(true).build();

    Store::scoped(config, |store| {
        store.put("x", 1, None);
        Ok(())
    })
    .unwrap();

    assert_eq!(open(&path).get("x", None), Some(Value::Integer(1)));
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_round_trip_all_value_types() {
    let (_temp, path) = setup_temp_path();

    let mut nested = BTreeMap::new();
    nested.insert("inner".to_string(), Value::from(vec![Value::Null, Value::Bool(true)]));

    let values = vec![
        ("null", Value::Null),
        ("bool", Value::Bool(false)),
        ("int", Value::Integer(-7)),
        ("big", Value::Integer(i64::MAX)),
        ("float", Value::Float(2.5)),
        ("string", Value::from("héllo \"quoted\" / \\ \n")),
        ("array", Value::from(vec![1, 2, 3])),
        ("object", Value::Object(nested)),
    ];

    {
        let mut store = open(&path);
        for (key, value) in &values {
            assert!(store.put(key, value.clone(), None));
        }
        store.close().unwrap();
    }

    let store = open(&path);
    for (key, value) in &values {
        assert_eq!(store.get(key, None).as_ref(), Some(value), "key {}", key);
    }
}

#[test]
fn test_round_trip_domains() {
    let (_temp, path) = setup_temp_path();

    {
        let mut store = open(&path);
        store.domain_add("one");
        store.domain_add("empty");
        store.put("a", 1, Some("one"));
        store.put("b", "two", Some("one"));
        store.close().unwrap();
    }

    let store = open(&path);
    assert_eq!(
        store.domains(),
        vec!["default".to_string(), "empty".to_string(), "one".to_string()]
    );
    assert_eq!(store.keys(Some("one")), Some(vec!["a".to_string(), "b".to_string()]));
    assert_eq!(store.keys(Some("empty")), Some(vec![]));
    assert!(!store.is_dirty());
}

#[test]
fn test_reopen_keeps_meta() {
    let (_temp, path) = setup_temp_path();

    let checksum = {
        let mut store = open(&path);
        store.put("k", "v", None);
        store.flush().unwrap();
        store.checksum().unwrap().to_string()
    };

    assert_eq!(open(&path).checksum(), Some(checksum.as_str()));
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_drop_flushes() {
    let (_temp, path) = setup_temp_path();

    {
        let mut store = open(&path);
        store.put("k", "v", None);
    }

    assert_eq!(open(&path).get("k", None), Some(Value::from("v")));
}

#[test]
fn test_close_reports_write_error() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("sub");
    fs::create_dir(&dir).unwrap();
    let path = dir.join("store.json");

    let mut store = open(&path);
    store.put("k", "v", None);

    fs::remove_dir(&dir).unwrap();

    let err = store.close().unwrap_err();
    assert!(matches!(err, FlatKvError::Write { .. }));
}

#[test]
fn test_scoped_closes_on_error() {
    let (_temp, path) = setup_temp_path();
    let config = Config::builder().path(&path).build();

    let result: flatkv::Result<()> = Store::scoped(config, |store| {
        store.put("k", "kept", None);
        Err(FlatKvError::Config("caller failed".to_string()))
    });

    assert!(matches!(result, Err(FlatKvError::Config(_))));
    assert_eq!(open(&path).get("k", None), Some(Value::from("kept")));
}

#[test]
fn test_scoped_returns_value() {
    let (_temp, path) = setup_temp_path();
    let config = Config::builder().path(&path).build();

    let found = Store::scoped(config, |store| Ok(store.get("foo", None))).unwrap();

    assert_eq!(found, Some(Value::from("bar")));
}

// =============================================================================
// Trait Tests
// =============================================================================

fn exercise(store: &mut dyn KeyValueStore) {
    assert!(store.domain_add("t"));
    assert!(store.put("k", Value::from(1), Some("t")));
    assert!(store.exists("k", Some("t")));
    assert_eq!(store.get("k", Some("t")), Some(Value::Integer(1)));
    assert!(store.remove("k", Some("t")));
    assert!(store.domain_remove("t"));
    assert!(!store.domain_exists("t"));
    store.flush().unwrap();
}

#[test]
fn test_store_through_trait_object() {
    let (_temp, path) = setup_temp_path();
    let mut store = open(&path);

    exercise(&mut store);

    assert!(!store.is_dirty());
}
