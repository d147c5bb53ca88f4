//! Request id generation
//!
//! Every outbound request carries a numeric id the hub echoes back in its
//! `result` frame. All requests on one connection must draw from the same
//! sequence, so the generator is owned by the session and shared by `Arc`.

use std::sync::atomic::{AtomicI64, Ordering};

/// Monotonically increasing request id source
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicI64,
}

impl IdGenerator {
    /// Create a generator whose first id is 1
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Create a generator whose first id is `first`
    pub fn starting_at(first: i64) -> Self {
        Self {
            next: AtomicI64::new(first),
        }
    }

    /// Take the next id
    pub fn next_id(&self) -> i64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Make sure a caller-supplied id is never handed out again
    pub fn reserve(&self, id: i64) {
        self.next.fetch_max(id.saturating_add(1), Ordering::Relaxed);
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
