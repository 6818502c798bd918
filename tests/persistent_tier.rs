use anyhow::Result;
use std::fs;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use StrataDB::txlog::{LogType, PersistentCache};
use StrataDB::{KeyValuePage, PageKind, Record, RecordPageContainer, StoreError};

const CAP: usize = 8;

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("sdb-{}-{}-{}", prefix, pid, t))
}

fn container(page_key: u64, payload: &[u8]) -> RecordPageContainer<u64, Record> {
    let mut complete = KeyValuePage::new(page_key, PageKind::Node, None, CAP, 1);
    complete.put_record(7, Record::from(payload)).unwrap();
    let mut modified = KeyValuePage::new(page_key, PageKind::Node, None, CAP, 1);
    modified.put_record(7, Record::from(payload)).unwrap();
    RecordPageContainer::new(complete, modified)
}

#[test]
fn frames_roundtrip() -> Result<()> {
    let root = unique_root("tier-roundtrip");
    fs::create_dir_all(&root)?;

    let mut cache = PersistentCache::<u64, Record>::open(&root, 3, LogType::Records, CAP)?;
    let c1 = container(1, b"alpha");
    let c2 = container(2, b"beta");
    cache.put(1, &c1)?;
    cache.put(2, &c2)?;

    assert_eq!(cache.len(), 2);
    assert!(cache.contains(1));
    assert_eq!(cache.get(1)?.as_ref(), Some(&c1));
    assert_eq!(cache.get(2)?.as_ref(), Some(&c2));
    assert!(cache.get(3)?.is_none());
    cache.close()
}

#[test]
fn reopen_reads_the_index_back() -> Result<()> {
    let root = unique_root("tier-reopen");
    fs::create_dir_all(&root)?;

    let c1 = container(1, b"alpha");
    {
        let mut cache = PersistentCache::<u64, Record>::open(&root, 3, LogType::Names, CAP)?;
        cache.put(1, &c1)?;
        cache.put(2, &container(2, b"beta"))?;
        assert!(cache.remove(2)?, "key 2 was present");
        cache.close()?;
    }

    let cache = PersistentCache::<u64, Record>::open(&root, 3, LogType::Names, CAP)?;
    assert_eq!(cache.len(), 1);
    assert!(!cache.contains(2), "removed keys stay removed across reopen");
    assert_eq!(cache.get(1)?.as_ref(), Some(&c1));
    assert_eq!(cache.revision(), 3);
    assert_eq!(cache.log_type(), LogType::Names);
    cache.close()
}

#[test]
fn meta_mismatch_is_rejected() -> Result<()> {
    let root = unique_root("tier-meta");
    fs::create_dir_all(&root)?;

    {
        let cache = PersistentCache::<u64, Record>::open(&root, 5, LogType::Records, CAP)?;
        cache.close()?;
    }

    // Same partition, different page capacity: refuse to open.
    let err = PersistentCache::<u64, Record>::open(&root, 5, LogType::Records, CAP * 2)
        .err()
        .expect("mismatched meta must fail");
    assert!(
        format!("{err:#}").contains("was created as"),
        "unexpected error: {err:#}"
    );
    Ok(())
}

#[test]
fn corrupt_frames_are_detected() -> Result<()> {
    let root = unique_root("tier-corrupt");
    fs::create_dir_all(&root)?;

    let store_path;
    {
        let mut cache = PersistentCache::<u64, Record>::open(&root, 1, LogType::Records, CAP)?;
        cache.put(1, &container(1, b"payload-payload-payload"))?;
        store_path = cache.dir_path().join("store.bin");
        cache.close()?;
    }

    // Flip one payload byte behind the frame header.
    {
        let mut f = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(&store_path)?;
        let mut byte = [0u8; 1];
        f.seek(SeekFrom::Start(20))?;
        f.read_exact(&mut byte)?;
        byte[0] ^= 0xFF;
        f.seek(SeekFrom::Start(20))?;
        f.write_all(&byte)?;
        f.sync_all()?;
    }

    let cache = PersistentCache::<u64, Record>::open(&root, 1, LogType::Records, CAP)?;
    let err = cache.get(1).err().expect("crc mismatch must surface");
    assert!(
        matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::StorageIo(_))
        ),
        "unexpected error: {err:#}"
    );
    cache.close()
}

#[test]
fn partition_lock_admits_a_single_owner() -> Result<()> {
    let root = unique_root("tier-lock");
    fs::create_dir_all(&root)?;

    let cache = PersistentCache::<u64, Record>::open(&root, 9, LogType::Paths, CAP)?;
    let second = PersistentCache::<u64, Record>::open(&root, 9, LogType::Paths, CAP);
    assert!(second.is_err(), "second owner must be refused");
    cache.close()?;

    // Released on close: the partition can be taken again.
    let cache = PersistentCache::<u64, Record>::open(&root, 9, LogType::Paths, CAP)?;
    cache.close()
}

#[test]
fn put_all_appends_a_whole_batch() -> Result<()> {
    let root = unique_root("tier-batch");
    fs::create_dir_all(&root)?;

    let mut cache = PersistentCache::<u64, Record>::open(&root, 2, LogType::Indexes, CAP)?;
    let containers: Vec<(u64, RecordPageContainer<u64, Record>)> = (1..=4u64)
        .map(|key| (key, container(key, format!("v{key}").as_bytes())))
        .collect();

    let count = cache.put_all(containers.iter().map(|(k, c)| (*k, c)))?;
    assert_eq!(count, 4);
    assert_eq!(cache.len(), 4);
    for (key, expected) in &containers {
        assert_eq!(cache.get(*key)?.as_ref(), Some(expected));
    }
    cache.close()
}
