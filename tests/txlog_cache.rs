use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use StrataDB::txlog::LogType;
use StrataDB::{
    KeyValuePage, PageKind, RecordPageContainer, StoreConfig, SynchronizedTransactionLog,
};

const CAP: usize = 16;

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("sdb-{}-{}-{}", prefix, pid, t))
}

fn container(page_key: u64, revision: u64, tag: &str) -> RecordPageContainer<u64, String> {
    let mut complete = KeyValuePage::new(page_key, PageKind::Node, None, CAP, revision);
    complete.put_record(0, tag.to_string()).unwrap();
    let mut modified = KeyValuePage::new(page_key, PageKind::Node, None, CAP, revision);
    modified.put_record(0, tag.to_string()).unwrap();
    RecordPageContainer::new(complete, modified)
}

fn open_log(root: &PathBuf, slots: usize) -> Result<SynchronizedTransactionLog<u64, String>> {
    let cfg = StoreConfig::default()
        .with_log_cache_slots(slots)
        .with_node_count(CAP);
    SynchronizedTransactionLog::open(root, 1, LogType::Records, &cfg)
}

fn tag_of(c: &RecordPageContainer<u64, String>) -> Option<String> {
    c.complete().and_then(|p| p.get_record(&0)).cloned()
}

#[test]
fn miss_returns_the_empty_sentinel() -> Result<()> {
    let root = unique_root("log-miss");
    fs::create_dir_all(&root)?;
    let log = open_log(&root, 4)?;

    let got = log.get(99)?;
    assert!(got.is_empty(), "a miss must return the EMPTY sentinel");
    assert!(got.complete().is_none());
    log.close()
}

#[test]
fn put_get_roundtrip() -> Result<()> {
    let root = unique_root("log-roundtrip");
    fs::create_dir_all(&root)?;
    let log = open_log(&root, 4)?;

    log.put(1, container(1, 1, "one"))?;
    let got = log.get(1)?;
    assert!(!got.is_empty());
    assert_eq!(got.page_key(), Some(1));
    assert_eq!(tag_of(&got).as_deref(), Some("one"));
    assert_eq!(log.len(), 1);
    log.close()
}

#[test]
fn eviction_spills_the_least_recent_entry() -> Result<()> {
    let root = unique_root("log-evict");
    fs::create_dir_all(&root)?;
    let log = open_log(&root, 2)?;

    log.put(1, container(1, 1, "one"))?;
    log.put(2, container(2, 1, "two"))?;
    log.put(3, container(3, 1, "three"))?;

    // RAM holds the two most recent entries, the first one was spilled.
    assert_eq!(log.len(), 2);
    let ram = log.as_map();
    assert!(!ram.contains_key(&1));
    assert!(ram.contains_key(&2) && ram.contains_key(&3));

    // The spilled container is still reachable through the log.
    let got = log.get(1)?;
    assert!(!got.is_empty(), "evicted containers must stay reachable");
    assert_eq!(tag_of(&got).as_deref(), Some("one"));
    log.close()
}

#[test]
fn updates_refresh_recency() -> Result<()> {
    let root = unique_root("log-recency");
    fs::create_dir_all(&root)?;
    let log = open_log(&root, 2)?;

    log.put(1, container(1, 1, "one"))?;
    log.put(2, container(2, 1, "two"))?;
    // Updating page 1 makes page 2 the eviction victim.
    log.put(1, container(1, 2, "one'"))?;
    log.put(3, container(3, 1, "three"))?;

    let ram = log.as_map();
    assert!(ram.contains_key(&1) && ram.contains_key(&3));
    assert!(!ram.contains_key(&2));
    let got = log.get(2)?;
    assert_eq!(tag_of(&got).as_deref(), Some("two"));
    log.close()
}

#[test]
fn remove_deletes_from_both_tiers() -> Result<()> {
    let root = unique_root("log-remove");
    fs::create_dir_all(&root)?;
    let log = open_log(&root, 1)?;

    log.put(1, container(1, 1, "one"))?;
    log.put(2, container(2, 1, "two"))?; // spills page 1

    assert!(log.remove(1)?, "page 1 lives in the second tier");
    assert!(log.get(1)?.is_empty());
    assert!(log.remove(2)?, "page 2 lives in RAM");
    assert!(log.get(2)?.is_empty());
    assert!(!log.remove(3)?, "unknown keys report false");
    log.close()
}

#[test]
fn clear_touches_only_the_ram_tier() -> Result<()> {
    let root = unique_root("log-clear");
    fs::create_dir_all(&root)?;
    let log = open_log(&root, 1)?;

    log.put(1, container(1, 1, "one"))?;
    log.put(2, container(2, 1, "two"))?; // spills page 1
    log.clear();

    assert_eq!(log.len(), 0);
    assert!(
        !log.get(1)?.is_empty(),
        "spilled entries survive a RAM clear"
    );
    assert!(log.get(2)?.is_empty(), "RAM-only entries are gone");
    log.close()
}

#[test]
fn get_all_returns_the_ram_subset() -> Result<()> {
    let root = unique_root("log-getall");
    fs::create_dir_all(&root)?;
    let log = open_log(&root, 4)?;

    log.put(1, container(1, 1, "one"))?;
    log.put(2, container(2, 1, "two"))?;

    let snapshot = log.get_all(&[1, 2, 3]);
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.contains_key(&1) && snapshot.contains_key(&2));
    log.close()
}

#[test]
fn drain_preserves_ram_and_survives_reopen() -> Result<()> {
    let root = unique_root("log-drain");
    fs::create_dir_all(&root)?;

    {
        let log = open_log(&root, 8)?;
        for key in 1..=5u64 {
            log.put(key, container(key, 1, &format!("v{key}")))?;
        }
        let drained = log.drain_to_secondary()?;
        assert_eq!(drained, 5);
        assert_eq!(log.len(), 5, "drain must not clear the RAM tier");
        log.close()?;
    }

    // A fresh log over the same partition sees the drained containers.
    let log = open_log(&root, 8)?;
    assert_eq!(log.len(), 0);
    for key in 1..=5u64 {
        let got = log.get(key)?;
        assert_eq!(tag_of(&got).as_deref(), Some(format!("v{key}").as_str()));
    }
    log.close()
}
