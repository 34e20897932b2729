//! Flags shared with the signal listener.
//!
//! These two atomics are the only state touched outside the dispatch thread.
//! Setters are plain stores; the dispatcher consumes the trigger with a single
//! swap so an activation that lands while the previous one is being resolved
//! is kept for the next drain rather than lost or counted twice.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Flags {
    trigger: AtomicBool,
    stop: AtomicBool,
}

/// Cheap to clone; every clone refers to the same pair of flags.
#[derive(Debug, Clone, Default)]
pub struct ControlFlags {
    inner: Arc<Flags>,
}

impl ControlFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the trigger signal. Safe to call from any thread, any number of
    /// times; repeated calls before a drain collapse into one activation.
    pub fn trigger(&self) {
        self.inner.trigger.store(true, Ordering::Release);
    }

    /// Test-and-clear the trigger signal.
    pub fn take_trigger(&self) -> bool {
        self.inner.trigger.swap(false, Ordering::AcqRel)
    }

    pub fn request_stop(&self) {
        self.inner.stop.store(true, Ordering::Release);
    }

    pub fn stop_requested(&self) -> bool {
        self.inner.stop.load(Ordering::Acquire)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[test]
    fn double_trigger_drains_once() {
        let flags = ControlFlags::new();
        flags.trigger();
        flags.trigger();
        assert!(flags.take_trigger());
        assert!(!flags.take_trigger());
    }

    #[test]
    fn clones_share_state() {
        let flags = ControlFlags::new();
        let remote = flags.clone();
        remote.request_stop();
        remote.trigger();
        assert!(flags.stop_requested());
        assert!(flags.take_trigger());
    }

    #[test]
    fn concurrent_triggers_are_never_double_counted() {
        // Each producer arms once and waits until the consumer has drained
        // before arming again, so drains must equal arms exactly.
        let flags = ControlFlags::new();
        let drained = Arc::new(AtomicUsize::new(0));
        const ROUNDS: usize = 500;

        let producer = {
            let flags = flags.clone();
            let drained = Arc::clone(&drained);
            thread::spawn(move || {
                for round in 0..ROUNDS {
                    flags.trigger();
                    while drained.load(Ordering::Acquire) <= round {
                        thread::yield_now();
                    }
                }
            })
        };

        while drained.load(Ordering::Acquire) < ROUNDS {
            if flags.take_trigger() {
                drained.fetch_add(1, Ordering::AcqRel);
            } else {
                thread::yield_now();
            }
        }
        producer.join().unwrap();

        assert_eq!(drained.load(Ordering::Acquire), ROUNDS);
        assert!(!flags.take_trigger());
    }
}
