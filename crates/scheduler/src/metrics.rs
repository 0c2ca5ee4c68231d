use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
struct Counters {
    ticks: AtomicU64,
    skipped_ticks: AtomicU64,
    assigned: AtomicU64,
}

static COUNTERS: Lazy<Counters> = Lazy::new(Counters::default);

pub fn record_tick() {
    COUNTERS.ticks.fetch_add(1, Ordering::Relaxed);
}

pub fn record_skipped_tick() {
    COUNTERS.skipped_ticks.fetch_add(1, Ordering::Relaxed);
}

pub fn record_assigned(count: usize) {
    COUNTERS.assigned.fetch_add(count as u64, Ordering::Relaxed);
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncMetricsSnapshot {
    pub ticks: u64,
    pub skipped_ticks: u64,
    pub assigned: u64,
}

pub fn snapshot() -> SyncMetricsSnapshot {
    SyncMetricsSnapshot {
        ticks: COUNTERS.ticks.load(Ordering::Relaxed),
        skipped_ticks: COUNTERS.skipped_ticks.load(Ordering::Relaxed),
        assigned: COUNTERS.assigned.load(Ordering::Relaxed),
    }
}
