//! Request correlation ids.
//!
//! Outgoing network calls carry an opaque request id so they can be traced
//! end to end. [`CorrelationContext`] generates those ids and remembers the
//! most recent ones in a bounded ring buffer. It is an explicitly
//! constructed, lifetime-scoped object — never a process-wide singleton —
//! so independent components (and tests) each get their own instance.
//!
//! # Example
//!
//! ```
//! use clipcheck::correlation::CorrelationContext;
//!
//! let context = CorrelationContext::new("validate");
//! let id = context.next_id();
//! assert!(id.starts_with("validate-"));
//! assert_eq!(context.recent_ids(), vec![id]);
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default number of recent ids retained.
const DEFAULT_CAPACITY: usize = 32;

/// Scoped generator of opaque request ids with a bounded history.
#[derive(Debug)]
pub struct CorrelationContext {
    prefix: String,
    counter: AtomicU64,
    recent: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl CorrelationContext {
    /// Create a context whose ids carry the given prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_capacity(prefix, DEFAULT_CAPACITY)
    }

    /// Create a context retaining at most `capacity` recent ids.
    pub fn with_capacity(prefix: impl Into<String>, capacity: usize) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
            recent: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
            capacity: capacity.max(1),
        }
    }

    /// Generate the next request id and record it in the history.
    ///
    /// Ids are opaque; the embedded timestamp and counter exist only to
    /// make them unique within and across contexts.
    pub fn next_id(&self) -> String {
        let sequence = self.counter.fetch_add(1, Ordering::Relaxed);
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0);
        let id = format!("{}-{millis:x}-{sequence:04x}", self.prefix);

        if let Ok(mut recent) = self.recent.lock() {
            if recent.len() == self.capacity {
                recent.pop_front();
            }
            recent.push_back(id.clone());
        }
        id
    }

    /// The retained recent ids, oldest first.
    pub fn recent_ids(&self) -> Vec<String> {
        self.recent
            .lock()
            .map(|recent| recent.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// How many ids the history retains.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total ids generated so far.
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}
