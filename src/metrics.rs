//! Lightweight global metrics for StrataDB.
//!
//! Thread-safe atomic counters for the transaction-log tiers:
//! - first-tier lookups (hits/misses)
//! - evictions spilled to the persistent tier
//! - persistent-tier reads/writes and written bytes
//! - containers drained at commit
//!
//! No timestamps, no histograms; callers that need rates sample
//! `metrics_snapshot()` around the section they measure.

use std::sync::atomic::{AtomicU64, Ordering};

// ----- First tier -----
static TXLOG_HITS: AtomicU64 = AtomicU64::new(0);
static TXLOG_MISSES: AtomicU64 = AtomicU64::new(0);
static TXLOG_EVICTIONS: AtomicU64 = AtomicU64::new(0);

// ----- Second tier -----
static SECOND_TIER_READS: AtomicU64 = AtomicU64::new(0);
static SECOND_TIER_WRITES: AtomicU64 = AtomicU64::new(0);
static SECOND_TIER_BYTES_WRITTEN: AtomicU64 = AtomicU64::new(0);

// ----- Commit drain -----
static DRAINED_CONTAINERS: AtomicU64 = AtomicU64::new(0);

pub fn record_txlog_hit() {
    TXLOG_HITS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_txlog_miss() {
    TXLOG_MISSES.fetch_add(1, Ordering::Relaxed);
}

pub fn record_txlog_eviction() {
    TXLOG_EVICTIONS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_second_tier_read() {
    SECOND_TIER_READS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_second_tier_write(bytes: u64) {
    SECOND_TIER_WRITES.fetch_add(1, Ordering::Relaxed);
    SECOND_TIER_BYTES_WRITTEN.fetch_add(bytes, Ordering::Relaxed);
}

pub fn record_drained(containers: u64) {
    DRAINED_CONTAINERS.fetch_add(containers, Ordering::Relaxed);
}

pub fn txlog_hits() -> u64 {
    TXLOG_HITS.load(Ordering::Relaxed)
}

pub fn txlog_misses() -> u64 {
    TXLOG_MISSES.load(Ordering::Relaxed)
}

pub fn txlog_evictions() -> u64 {
    TXLOG_EVICTIONS.load(Ordering::Relaxed)
}

pub fn second_tier_reads() -> u64 {
    SECOND_TIER_READS.load(Ordering::Relaxed)
}

pub fn second_tier_writes() -> u64 {
    SECOND_TIER_WRITES.load(Ordering::Relaxed)
}

pub fn second_tier_bytes_written() -> u64 {
    SECOND_TIER_BYTES_WRITTEN.load(Ordering::Relaxed)
}

pub fn drained_containers() -> u64 {
    DRAINED_CONTAINERS.load(Ordering::Relaxed)
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub txlog_hits: u64,
    pub txlog_misses: u64,
    pub txlog_evictions: u64,
    pub second_tier_reads: u64,
    pub second_tier_writes: u64,
    pub second_tier_bytes_written: u64,
    pub drained_containers: u64,
}

pub fn metrics_snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        txlog_hits: txlog_hits(),
        txlog_misses: txlog_misses(),
        txlog_evictions: txlog_evictions(),
        second_tier_reads: second_tier_reads(),
        second_tier_writes: second_tier_writes(),
        second_tier_bytes_written: second_tier_bytes_written(),
        drained_containers: drained_containers(),
    }
}

/// Zero every counter (tests).
pub fn reset_metrics() {
    TXLOG_HITS.store(0, Ordering::Relaxed);
    TXLOG_MISSES.store(0, Ordering::Relaxed);
    TXLOG_EVICTIONS.store(0, Ordering::Relaxed);
    SECOND_TIER_READS.store(0, Ordering::Relaxed);
    SECOND_TIER_WRITES.store(0, Ordering::Relaxed);
    SECOND_TIER_BYTES_WRITTEN.store(0, Ordering::Relaxed);
    DRAINED_CONTAINERS.store(0, Ordering::Relaxed);
}
