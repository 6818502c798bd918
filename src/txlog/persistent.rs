//! Persistent second tier of a transaction log.
//!
//! One directory per (revision, log_type) partition,
//! `<root>/.txlog/<log_type>-r<revision>/`:
//! - store.bin — frames [page_key u64][len u32][crc32 u32] + payload
//! - index.bin — full snapshot [magic 8][ver u32][count u32] +
//!               [page_key u64][offset u64] per entry
//! - meta.json — {revision, log_type, node_count}, written via tmp+rename
//! - LOCK      — fs2 exclusive advisory lock held for the partition lifetime
//!
//! Notes:
//! - frames of removed keys stay in store.bin until the partition directory
//!   is deleted; only the index forgets them.
//! - index.bin is rewritten fully on changes (simple and robust).

use anyhow::{anyhow, Context, Result};
use byteorder::{ByteOrder, LittleEndian};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::consts::{
    FRAME_HDR_SIZE, INDEX_ENTRY_SIZE, INDEX_FILE, INDEX_HDR_SIZE, INDEX_MAGIC, INDEX_VERSION,
    META_FILE, STORE_FILE, TXLOG_DIR,
};
use crate::errors::StoreError;
use crate::lock::{try_acquire_exclusive, LockGuard};
use crate::metrics::{record_second_tier_read, record_second_tier_write};
use crate::page::RecordPageContainer;
use crate::txlog::codec::{decode_frame, encode_frame, read_frame_header};
use crate::txlog::LogType;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct PartitionMeta {
    revision: u64,
    log_type: LogType,
    node_count: usize,
}

pub struct PersistentCache<K: Ord, V> {
    dir: PathBuf,
    store_path: PathBuf,
    index_path: PathBuf,
    revision: u64,
    log_type: LogType,
    node_count: usize,
    map: HashMap<u64, u64>, // page_key -> frame offset
    _lock: LockGuard,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> PersistentCache<K, V>
where
    K: Ord + Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    /// Open (or create) the partition for `(revision, log_type)` under
    /// `root`. Loads index.bin if present and verifies meta.json against the
    /// requested parameters.
    pub fn open(root: &Path, revision: u64, log_type: LogType, node_count: usize) -> Result<Self> {
        let dir = root
            .join(TXLOG_DIR)
            .join(format!("{}-r{}", log_type.as_str(), revision));
        fs::create_dir_all(&dir).with_context(|| format!("create partition {}", dir.display()))?;

        let lock = try_acquire_exclusive(&dir)?;

        let store_path = dir.join(STORE_FILE);
        if !store_path.exists() {
            let f = OpenOptions::new()
                .create(true)
                .write(true)
                .read(true)
                .open(&store_path)
                .with_context(|| format!("create {}", store_path.display()))?;
            let _ = f.sync_all();
        }

        let mut cache = Self {
            index_path: dir.join(INDEX_FILE),
            store_path,
            dir,
            revision,
            log_type,
            node_count,
            map: HashMap::new(),
            _lock: lock,
            _marker: PhantomData,
        };

        cache.check_or_write_meta()?;
        if cache.index_path.exists() {
            cache.load_index()?;
        }

        info!(
            "txlog partition {} opened ({} entries)",
            cache.dir.display(),
            cache.map.len()
        );
        Ok(cache)
    }

    pub fn dir_path(&self) -> &Path {
        &self.dir
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn log_type(&self) -> LogType {
        self.log_type
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn contains(&self, page_key: u64) -> bool {
        self.map.contains_key(&page_key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Read one container back. Opens the store file per call so shared
    /// readers need no mutable handle.
    pub fn get(&self, page_key: u64) -> Result<Option<RecordPageContainer<K, V>>> {
        let offset = match self.map.get(&page_key) {
            Some(off) => *off,
            None => return Ok(None),
        };

        let mut f = OpenOptions::new()
            .read(true)
            .open(&self.store_path)
            .with_context(|| format!("open {}", self.store_path.display()))?;

        let mut hdr = [0u8; FRAME_HDR_SIZE];
        f.seek(SeekFrom::Start(offset))
            .with_context(|| format!("seek {}", self.store_path.display()))?;
        f.read_exact(&mut hdr)
            .with_context(|| format!("read frame header at {offset}"))?;

        let header = read_frame_header(&hdr);
        if header.page_key != page_key {
            return Err(StoreError::StorageIo(format!(
                "frame at {offset} holds page {}, index says {page_key}",
                header.page_key
            ))
            .into());
        }

        let mut payload = vec![0u8; header.len as usize];
        f.read_exact(&mut payload)
            .with_context(|| format!("read frame payload at {offset}"))?;

        let container = decode_frame(&hdr, &payload)?;
        record_second_tier_read();
        Ok(Some(container))
    }

    /// Append one container and rewrite the index.
    pub fn put(&mut self, page_key: u64, container: &RecordPageContainer<K, V>) -> Result<()> {
        let frame = encode_frame(page_key, container)?;
        self.append_frames(&[(page_key, frame)])?;
        self.write_index()
    }

    /// Append a batch of containers with a single index rewrite.
    pub fn put_all<'a, I>(&mut self, entries: I) -> Result<usize>
    where
        I: IntoIterator<Item = (u64, &'a RecordPageContainer<K, V>)>,
        K: 'a,
        V: 'a,
    {
        let mut frames = Vec::new();
        for (page_key, container) in entries {
            frames.push((page_key, encode_frame(page_key, container)?));
        }
        if frames.is_empty() {
            return Ok(0);
        }
        let count = frames.len();
        self.append_frames(&frames)?;
        self.write_index()?;
        debug!(
            "txlog partition {}: appended {} frame(s)",
            self.dir.display(),
            count
        );
        Ok(count)
    }

    /// Forget a key. The frame stays in store.bin; only the index changes.
    pub fn remove(&mut self, page_key: u64) -> Result<bool> {
        if self.map.remove(&page_key).is_none() {
            return Ok(false);
        }
        self.write_index()?;
        Ok(true)
    }

    /// Flush the index and let Drop release the partition lock.
    pub fn close(mut self) -> Result<()> {
        self.write_index()?;
        info!(
            "txlog partition {} closed ({} entries)",
            self.dir.display(),
            self.map.len()
        );
        Ok(())
    }

    // ---------------- internal helpers ----------------

    fn append_frames(&mut self, frames: &[(u64, Vec<u8>)]) -> Result<()> {
        let mut f = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.store_path)
            .with_context(|| format!("open {}", self.store_path.display()))?;
        let mut offset = f
            .seek(SeekFrom::End(0))
            .with_context(|| format!("seek end {}", self.store_path.display()))?;

        for (page_key, frame) in frames {
            f.write_all(frame)
                .with_context(|| format!("append frame for page {page_key}"))?;
            self.map.insert(*page_key, offset);
            record_second_tier_write(frame.len() as u64);
            offset += frame.len() as u64;
        }

        f.sync_all()
            .with_context(|| format!("sync {}", self.store_path.display()))?;
        Ok(())
    }

    fn write_index(&self) -> Result<()> {
        let mut entries: Vec<(u64, u64)> = self.map.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_unstable();

        let mut buf = vec![0u8; INDEX_HDR_SIZE + entries.len() * INDEX_ENTRY_SIZE];
        buf[0..8].copy_from_slice(INDEX_MAGIC);
        LittleEndian::write_u32(&mut buf[8..12], INDEX_VERSION);
        LittleEndian::write_u32(&mut buf[12..16], entries.len() as u32);
        for (i, (page_key, offset)) in entries.iter().enumerate() {
            let base = INDEX_HDR_SIZE + i * INDEX_ENTRY_SIZE;
            LittleEndian::write_u64(&mut buf[base..base + 8], *page_key);
            LittleEndian::write_u64(&mut buf[base + 8..base + 16], *offset);
        }

        let tmp = self.dir.join(format!("{INDEX_FILE}.tmp"));
        let mut f = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&tmp)
            .with_context(|| format!("create {}", tmp.display()))?;
        f.write_all(&buf)
            .with_context(|| format!("write {}", tmp.display()))?;
        f.sync_all()
            .with_context(|| format!("sync {}", tmp.display()))?;
        fs::rename(&tmp, &self.index_path)
            .with_context(|| format!("rename into {}", self.index_path.display()))?;
        Ok(())
    }

    fn load_index(&mut self) -> Result<()> {
        let bytes = fs::read(&self.index_path)
            .with_context(|| format!("read {}", self.index_path.display()))?;
        if bytes.len() < INDEX_HDR_SIZE || &bytes[0..8] != INDEX_MAGIC {
            return Err(StoreError::StorageIo(format!(
                "bad index magic in {}",
                self.index_path.display()
            ))
            .into());
        }
        let version = LittleEndian::read_u32(&bytes[8..12]);
        if version != INDEX_VERSION {
            return Err(StoreError::StorageIo(format!(
                "unsupported index version {version} in {}",
                self.index_path.display()
            ))
            .into());
        }
        let count = LittleEndian::read_u32(&bytes[12..16]) as usize;
        if bytes.len() < INDEX_HDR_SIZE + count * INDEX_ENTRY_SIZE {
            return Err(StoreError::StorageIo(format!(
                "truncated index {}",
                self.index_path.display()
            ))
            .into());
        }

        self.map.clear();
        for i in 0..count {
            let base = INDEX_HDR_SIZE + i * INDEX_ENTRY_SIZE;
            let page_key = LittleEndian::read_u64(&bytes[base..base + 8]);
            let offset = LittleEndian::read_u64(&bytes[base + 8..base + 16]);
            self.map.insert(page_key, offset);
        }
        Ok(())
    }

    fn check_or_write_meta(&self) -> Result<()> {
        let meta_path = self.dir.join(META_FILE);
        let expected = PartitionMeta {
            revision: self.revision,
            log_type: self.log_type,
            node_count: self.node_count,
        };

        if meta_path.exists() {
            let bytes = fs::read(&meta_path)
                .with_context(|| format!("read {}", meta_path.display()))?;
            let found: PartitionMeta =
                serde_json::from_slice(&bytes).context("parse meta.json")?;
            if found != expected {
                return Err(anyhow!(
                    "partition {} was created as {:?}, reopened as {:?}",
                    self.dir.display(),
                    found,
                    expected
                ));
            }
            return Ok(());
        }

        let tmp = self.dir.join(format!("{META_FILE}.tmp"));
        let mut f = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&tmp)
            .with_context(|| format!("create {}", tmp.display()))?;
        f.write_all(&serde_json::to_vec_pretty(&expected)?)
            .with_context(|| format!("write {}", tmp.display()))?;
        f.sync_all()
            .with_context(|| format!("sync {}", tmp.display()))?;
        fs::rename(&tmp, &meta_path)
            .with_context(|| format!("rename into {}", meta_path.display()))?;
        Ok(())
    }
}
