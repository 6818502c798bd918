// Page model defaults

/// Default number of entries a record page can hold (records + references
/// combined). The effective capacity is per-database configuration
/// (`StoreConfig::node_count`) and never changes after creation.
pub const NDP_NODE_COUNT: usize = 512;

/// Default reconstruction window: how many revisions a fold may range across.
pub const DEFAULT_REVS_TO_RESTORE: u32 = 3;

/// Default number of first-tier slots in a transaction log.
pub const DEFAULT_LOG_CACHE_SLOTS: usize = 1024;

// Second tier (one directory per (revision, log_type) partition)

/// Directory holding all log partitions, relative to the database root.
pub const TXLOG_DIR: &str = ".txlog";

/// Append-only frame file inside a partition.
pub const STORE_FILE: &str = "store.bin";

/// Full-snapshot index file inside a partition.
pub const INDEX_FILE: &str = "index.bin";

/// JSON sidecar describing the partition.
pub const META_FILE: &str = "meta.json";

/// Advisory lock file inside a partition.
pub const LOCK_FILE: &str = "LOCK";

/// 8-byte magic of index.bin.
pub const INDEX_MAGIC: &[u8; 8] = b"SDBIDX01";

/// index.bin format version.
pub const INDEX_VERSION: u32 = 1;

/// index.bin header: [magic 8][ver u32][count u32], then per entry
/// [page_key u64][offset u64].
pub const INDEX_HDR_SIZE: usize = 16;

/// Entry size in index.bin.
pub const INDEX_ENTRY_SIZE: usize = 16;

/// Frame header in store.bin: [page_key u64][len u32][crc32 u32].
/// CRC covers the header without the crc field, then the payload.
pub const FRAME_HDR_SIZE: usize = 16;
