//! Emotion history: the rolling window of recent detections.
//!
//! This buffer is the only state shared between the sensing thread and the
//! rest of the application:
//! - The sensing loop is the single writer (`push`)
//! - Any number of foreground readers take `snapshot`s
//! - The critical section is a push-with-eviction or a copy, nothing else
//!
//! Oldest entries are evicted FIFO once the capacity is reached, so a
//! snapshot is always the last `capacity` labels in detection order.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::types::EmotionLabel;

/// Default number of labels kept in the window.
pub const DEFAULT_CAPACITY: usize = 5;

/// Thread-safe, fixed-capacity history of detected emotions.
///
/// Cloning is cheap and every clone shares the same storage.
pub struct EmotionHistory {
    inner: Arc<Mutex<HistoryInner>>,
}

struct HistoryInner {
    labels: VecDeque<EmotionLabel>,
    capacity: usize,
    total_pushed: u64,
    total_evicted: u64,
}

/// Counters describing how the buffer has been used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryStats {
    /// Labels currently held.
    pub len: usize,
    /// Labels pushed since creation.
    pub total_pushed: u64,
    /// Labels evicted to make room.
    pub total_evicted: u64,
}

impl EmotionHistory {
    /// Create a history holding at most `capacity` labels (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Mutex::new(HistoryInner {
                labels: VecDeque::with_capacity(capacity),
                capacity,
                total_pushed: 0,
                total_evicted: 0,
            })),
        }
    }

    /// Append a label, evicting the oldest one if the buffer is full.
    pub fn push(&self, label: EmotionLabel) {
        let mut inner = self.inner.lock();
        if inner.labels.len() >= inner.capacity {
            inner.labels.pop_front();
            inner.total_evicted += 1;
        }
        inner.labels.push_back(label);
        inner.total_pushed += 1;
    }

    /// Copy of the current contents, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<EmotionLabel> {
        self.inner.lock().labels.iter().copied().collect()
    }

    /// The most recently detected label, if any.
    #[must_use]
    pub fn latest(&self) -> Option<EmotionLabel> {
        self.inner.lock().labels.back().copied()
    }

    /// Number of labels currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().labels.len()
    }

    /// Whether nothing has been detected yet (or the buffer was cleared).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().labels.is_empty()
    }

    /// Maximum number of labels held.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    /// Drop every held label. Counters are kept.
    pub fn clear(&self) {
        self.inner.lock().labels.clear();
    }

    /// Usage counters.
    #[must_use]
    pub fn stats(&self) -> HistoryStats {
        let inner = self.inner.lock();
        HistoryStats {
            len: inner.labels.len(),
            total_pushed: inner.total_pushed,
            total_evicted: inner.total_evicted,
        }
    }
}

impl Default for EmotionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Clone for EmotionHistory {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for EmotionHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("EmotionHistory")
            .field("labels", &inner.labels)
            .field("capacity", &inner.capacity)
            .finish()
    }
}
