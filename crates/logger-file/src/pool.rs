//! Lock-free pool of reusable log events
//!
//! Producers take an event with [`EventPool::acquire`], the writer gives it
//! back with [`EventPool::release`] once the entry has been rendered. Under
//! steady load this means no per-entry allocation for the event itself or
//! its message buffer.

use crate::event::LogEvent;
use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicU64, Ordering};

/// Messages whose buffer grew beyond this are not pooled
pub const MAX_POOLED_MESSAGE_CAPACITY: usize = 4 * 1024;

/// Bounded free list of [`LogEvent`]s
pub struct EventPool {
    /// Lock-free queue of available events
    queue: ArrayQueue<LogEvent>,

    /// Counters
    metrics: Counters,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    returns: AtomicU64,
    drops: AtomicU64,
}

/// Point-in-time snapshot of pool activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolMetrics {
    /// Acquisitions served from the free list
    pub hits: u64,
    /// Acquisitions that had to allocate
    pub misses: u64,
    /// Events put back on the free list
    pub returns: u64,
    /// Events discarded on release (pool full or message too large)
    pub drops: u64,
}

impl PoolMetrics {
    /// Fraction of acquisitions served from the free list (0.0 to 1.0)
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            1.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl EventPool {
    /// Create a pool that keeps at most `capacity` idle events.
    ///
    /// Events are allocated lazily; the pool only bounds how many are
    /// retained between uses.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(capacity.max(1)),
            metrics: Counters::default(),
        }
    }

    /// Take a cleared event, allocating one when the pool is empty
    #[inline]
    pub fn acquire(&self) -> LogEvent {
        if let Some(event) = self.queue.pop() {
            self.metrics.hits.fetch_add(1, Ordering::Relaxed);
            event
        } else {
            self.metrics.misses.fetch_add(1, Ordering::Relaxed);
            LogEvent::default()
        }
    }

    /// Clear `event` and return it to the pool.
    ///
    /// Taking the event by value means it cannot be touched after release.
    #[inline]
    pub fn release(&self, mut event: LogEvent) {
        if event.message.capacity() > MAX_POOLED_MESSAGE_CAPACITY {
            self.metrics.drops.fetch_add(1, Ordering::Relaxed);
            return;
        }

        event.reset();
        match self.queue.push(event) {
            Ok(()) => {
                self.metrics.returns.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.metrics.drops.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Number of idle events currently held
    #[must_use]
    pub fn available(&self) -> usize {
        self.queue.len()
    }

    /// Maximum number of idle events retained
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Snapshot of the pool counters
    #[must_use]
    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            hits: self.metrics.hits.load(Ordering::Relaxed),
            misses: self.metrics.misses.load(Ordering::Relaxed),
            returns: self.metrics.returns.load(Ordering::Relaxed),
            drops: self.metrics.drops.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for EventPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPool")
            .field("available", &self.available())
            .field("capacity", &self.capacity())
            .field("metrics", &self.metrics())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use sluice_logger::{Level, Record};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn reuses_released_events() {
        let pool = EventPool::new(4);

        let mut event = pool.acquire();
        event.fill(&Record::new(Level::Error, "first"), Local::now());
        pool.release(event);
        assert_eq!(pool.available(), 1);

        let event = pool.acquire();
        assert!(event.message.is_empty(), "released events come back cleared");
        assert_eq!(event.level, Level::Debug);

        let metrics = pool.metrics();
        assert_eq!(metrics.misses, 1);
        assert_eq!(metrics.hits, 1);
        assert_eq!(metrics.returns, 1);
        assert!((metrics.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn drops_when_full() {
        let pool = EventPool::new(2);
        let events: Vec<_> = (0..3).map(|_| pool.acquire()).collect();
        for event in events {
            pool.release(event);
        }

        assert_eq!(pool.available(), 2);
        assert_eq!(pool.metrics().drops, 1);
    }

    #[test]
    fn oversized_messages_are_not_retained() {
        let pool = EventPool::new(2);
        let mut event = pool.acquire();
        event.message = "x".repeat(MAX_POOLED_MESSAGE_CAPACITY * 2);

        pool.release(event);

        assert_eq!(pool.available(), 0);
        assert_eq!(pool.metrics().drops, 1);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let pool = EventPool::new(0);
        assert_eq!(pool.capacity(), 1);
    }

    #[test]
    fn concurrent_acquire_and_release() {
        let pool = Arc::new(EventPool::new(16));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        let event = pool.acquire();
                        pool.release(event);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let metrics = pool.metrics();
        assert_eq!(metrics.hits + metrics.misses, 4_000);
        assert!(pool.available() <= 16);
    }
}
