use std::sync::atomic::{AtomicI64, Ordering};

use time::OffsetDateTime;

/// Millisecond-epoch identifiers that never repeat within a process.
///
/// Each call returns the current time in milliseconds, bumped past the last
/// value handed out, so two calls in the same millisecond still differ.
#[derive(Debug, Default)]
pub struct MillisIds {
    last: AtomicI64,
}

impl MillisIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> i64 {
        self.next_after(i64::MIN)
    }

    /// Like [`next`](Self::next) but also strictly greater than `floor`.
    pub fn next_after(&self, floor: i64) -> i64 {
        let now = now_millis();
        let mut issued = now;
        // fetch_update only fails when the closure returns None, which it never does
        let _ = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                issued = now.max(last.saturating_add(1)).max(floor.saturating_add(1));
                Some(issued)
            });
        issued
    }
}

pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

pub fn now_secs() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
