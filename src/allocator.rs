//! Identity allocator – issues `PREFIX` + zero-padded sequence numbers.
//!
//! The counter is an `AtomicU64`, so concurrent callers each get a distinct
//! number without external locking. It lives only as long as the allocator.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
pub struct IdentityAllocator {
    prefix: String,
    width: usize,
    counter: AtomicU64,
}

impl IdentityAllocator {
    pub fn new(prefix: impl Into<String>, width: usize) -> Self {
        Self {
            prefix: prefix.into(),
            width,
            counter: AtomicU64::new(0),
        }
    }

    /// Increment the counter and return the new identifier.
    pub fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.format(n)
    }

    /// Restart numbering at 1. Identifiers already handed out stay valid.
    pub fn reset(&self) {
        self.counter.store(0, Ordering::SeqCst);
        log::info!("Identity counter reset");
    }

    /// Number of identifiers issued since creation or the last reset.
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }

    fn format(&self, n: u64) -> String {
        format!("{}{:0width$}", self.prefix, n, width = self.width)
    }
}

impl Default for IdentityAllocator {
    fn default() -> Self {
        Self::new("GWGM", 3)
    }
}
