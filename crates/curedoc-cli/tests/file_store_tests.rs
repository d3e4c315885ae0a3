use curedoc_cli::FileStore;
use curedoc_client::KeyValueStore;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

#[test]
fn test_missing_key_reads_as_none() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path()).unwrap();
    assert_eq!(store.get("chatHistory").unwrap(), None);
}

#[test]
fn test_set_then_get() {
    let dir = TempDir::new().unwrap();
    let mut store = FileStore::new(dir.path()).unwrap();
    store.set("chatHistory", "[]").unwrap();
    store.set("chatHistory", r#"[{"type":"text"}]"#).unwrap();

    assert_eq!(store.get("chatHistory").unwrap().as_deref(), Some(r#"[{"type":"text"}]"#));
    assert!(dir.path().join("chatHistory.json").exists());
    assert!(!dir.path().join("chatHistory.json.tmp").exists());
}

#[test]
fn test_creates_nested_directory() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b");
    let store = FileStore::new(&nested).unwrap();
    assert_eq!(store.dir(), nested.as_path());
    assert!(nested.is_dir());
}
