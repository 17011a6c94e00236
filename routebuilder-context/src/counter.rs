use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Monotonic creation-order counter handed to every node built against a
/// [`ModelContext`](crate::ModelContext).
#[derive(Debug, Default)]
pub struct NodeCounter {
    next: AtomicU64,
}

impl NodeCounter {
    /// Creates a counter starting at zero
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Creates a counter whose first index is `value`
    pub fn starting_at(value: u64) -> Self {
        Self {
            next: AtomicU64::new(value),
        }
    }

    /// Process-wide counter shared by contexts that do not inject their own
    pub fn global() -> Arc<NodeCounter> {
        static GLOBAL: OnceLock<Arc<NodeCounter>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(NodeCounter::new())).clone()
    }

    /// Returns the next creation index.
    ///
    /// Route builders may run on several threads at once; every caller gets a
    /// distinct value and values handed out later are always larger.
    pub fn next_index(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// The index the next call to [`next_index`](Self::next_index) returns
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}
