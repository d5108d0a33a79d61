//! Shared progress counters and the cooperative cancellation flag.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Monotone counters of decoded elements, safe to poll from any thread.
///
/// Each counter is bumped once per decoded element, before any downstream
/// work on it. Reads may race with increments; the only guarantee is that
/// each observed value is monotonically non-decreasing.
#[derive(Debug, Default)]
pub struct ProgressProbe {
    nodes_seen: AtomicU64,
    ways_seen: AtomicU64,
}

impl ProgressProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_node(&self) {
        self.nodes_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_way(&self) {
        self.ways_seen.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of node elements observed so far.
    pub fn nodes_seen(&self) -> u64 {
        self.nodes_seen.load(Ordering::Relaxed)
    }

    /// Number of way elements observed so far.
    pub fn ways_seen(&self) -> u64 {
        self.ways_seen.load(Ordering::Relaxed)
    }

    /// Reads both counters. The pair is not atomic as a whole.
    pub fn snapshot(&self) -> (u64, u64) {
        (self.nodes_seen(), self.ways_seen())
    }
}

/// Cooperative stop signal for a running pass.
///
/// The coordinator honors a cancellation after the element it is currently
/// processing, including any flush that element triggered.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the pass to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_counters_start_at_zero() {
        let probe = ProgressProbe::new();
        assert_eq!(probe.snapshot(), (0, 0));
    }

    #[test]
    fn test_counters_increment_independently() {
        let probe = ProgressProbe::new();
        probe.record_node();
        probe.record_node();
        probe.record_way();

        assert_eq!(probe.nodes_seen(), 2);
        assert_eq!(probe.ways_seen(), 1);
    }

    #[test]
    fn test_concurrent_reads_observe_monotone_values() {
        let probe = Arc::new(ProgressProbe::new());

        let writer = {
            let probe = Arc::clone(&probe);
            thread::spawn(move || {
                for _ in 0..10_000 {
                    probe.record_node();
                }
            })
        };

        let reader = {
            let probe = Arc::clone(&probe);
            thread::spawn(move || {
                let mut last = 0;
                for _ in 0..1_000 {
                    let seen = probe.nodes_seen();
                    assert!(seen >= last, "counter went backwards");
                    last = seen;
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();
        assert_eq!(probe.nodes_seen(), 10_000);
    }

    #[test]
    fn test_cancel_flag_is_shared_between_clones() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        assert!(!clone.is_cancelled());

        flag.cancel();
        assert!(clone.is_cancelled());
    }
}
