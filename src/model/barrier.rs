//! Generational rendezvous barrier for a population whose size changes
//! every tick.
//!
//! The barrier does not store a fixed participant count. Each arrival asks a
//! census closure for the current number of live creatures and compares it
//! against the arrived count, both under the barrier guard; the closure
//! takes every species-registry guard in one fixed order, so the total it
//! reports is a consistent snapshot, not a value that can drift between the
//! read and the compare. A creature registered before the check is counted
//! whether or not its thread has arrived yet, which is exactly what lets a
//! tick-N newborn join the cohort at generation N+1.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

/// What a creature observes when its barrier wait ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    /// The generation completed; proceed to the next tick.
    Released,
    /// Shutdown was raised; exit the tick loop without further ticks.
    Shutdown,
}

#[derive(Debug)]
struct BarrierState {
    arrived: usize,
    generation: u64,
}

pub struct TickBarrier {
    state: Mutex<BarrierState>,
    released: Condvar,
    census: Box<dyn Fn() -> usize + Send + Sync>,
    shutdown: AtomicBool,
    completed_ticks: AtomicU64,
    throttle: Duration,
}

impl TickBarrier {
    /// `census` must report the number of creatures currently expected at
    /// the barrier. It is invoked with the barrier guard held, so it may
    /// take registry guards but must never block on anything else.
    pub fn new(throttle: Duration, census: impl Fn() -> usize + Send + Sync + 'static) -> Self {
        Self {
            state: Mutex::new(BarrierState {
                arrived: 0,
                generation: 0,
            }),
            released: Condvar::new(),
            census: Box::new(census),
            shutdown: AtomicBool::new(false),
            completed_ticks: AtomicU64::new(0),
            throttle,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Arrives at the barrier for the current generation and blocks until
    /// the generation is released (or shutdown is raised).
    ///
    /// The last arrival resets the arrived count *before* anyone wakes,
    /// bumps the generation, sleeps the fixed pacing delay, and then wakes
    /// the whole cohort. Waiters gate on the generation number, so a thread
    /// can never be carried over into a later generation or left behind by
    /// a release it was part of.
    pub fn arrive(&self) -> Arrival {
        if self.is_shutdown() {
            return Arrival::Shutdown;
        }

        let mut state = self.lock_state();
        let total = (self.census)();

        if state.arrived + 1 > total {
            // More arrivals than live creatures means a creature arrived
            // without being registered, or a release leaked a waiter.
            tracing::error!(
                arrived = state.arrived + 1,
                total,
                generation = state.generation,
                "barrier invariant violated"
            );
            debug_assert!(
                state.arrived + 1 <= total,
                "barrier arrivals ({}) exceed census ({})",
                state.arrived + 1,
                total
            );
        }

        if state.arrived + 1 >= total {
            self.release_locked(state);
            Arrival::Released
        } else {
            state.arrived += 1;
            let generation = state.generation;
            while state.generation == generation && !self.is_shutdown() {
                state = self
                    .released
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            if state.generation == generation {
                Arrival::Shutdown
            } else {
                Arrival::Released
            }
        }
    }

    /// Re-evaluates the release condition after a creature deregisters
    /// without arriving (death paths only).
    ///
    /// A dying creature never arrives for the generation it dies in, but
    /// its peers may all have arrived already, each having compared against
    /// a census that still counted the dying one. Without this re-check the
    /// whole cohort would wait for an arrival that can never come. Callers
    /// must deregister first, then depart.
    pub fn depart(&self) {
        if self.is_shutdown() {
            return;
        }
        let state = self.lock_state();
        let total = (self.census)();
        if total > 0 && state.arrived >= total {
            self.release_locked(state);
        }
    }

    fn release_locked(&self, mut state: MutexGuard<'_, BarrierState>) {
        state.arrived = 0;
        state.generation = state.generation.wrapping_add(1);
        drop(state);
        self.completed_ticks.fetch_add(1, Ordering::SeqCst);
        // Pacing delay: ~100 ticks/second so render consumers keep up.
        thread::sleep(self.throttle);
        self.released.notify_all();
    }

    /// Raises the shutdown flag and wakes every blocked waiter. Creatures
    /// observe it on their next arrival or at the top of their tick loop.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        // Take the guard so the store can't slip between a waiter's
        // predicate check and its wait.
        drop(self.lock_state());
        self.released.notify_all();
        tracing::info!("shutdown requested");
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Number of completed generations.
    pub fn ticks(&self) -> u64 {
        self.completed_ticks.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sole_participant_releases_immediately() {
        let barrier = TickBarrier::new(Duration::ZERO, || 1);
        assert_eq!(barrier.arrive(), Arrival::Released);
        assert_eq!(barrier.arrive(), Arrival::Released);
        assert_eq!(barrier.ticks(), 2);
    }

    #[test]
    fn test_arrive_after_shutdown_returns_shutdown() {
        let barrier = TickBarrier::new(Duration::ZERO, || 5);
        barrier.request_shutdown();
        assert_eq!(barrier.arrive(), Arrival::Shutdown);
    }

    #[test]
    fn test_depart_releases_cohort_waiting_on_the_departed() {
        use std::sync::atomic::AtomicUsize;
        let count = std::sync::Arc::new(AtomicUsize::new(2));
        let barrier = {
            let count = std::sync::Arc::clone(&count);
            std::sync::Arc::new(TickBarrier::new(Duration::ZERO, move || {
                count.load(Ordering::SeqCst)
            }))
        };
        let waiter = {
            let barrier = std::sync::Arc::clone(&barrier);
            thread::spawn(move || barrier.arrive())
        };
        thread::sleep(Duration::from_millis(50));
        // The second participant dies instead of arriving.
        count.store(1, Ordering::SeqCst);
        barrier.depart();
        assert_eq!(waiter.join().expect("waiter panicked"), Arrival::Released);
        assert_eq!(barrier.ticks(), 1);
    }

    #[test]
    fn test_shutdown_wakes_blocked_waiter() {
        let barrier = std::sync::Arc::new(TickBarrier::new(Duration::ZERO, || 2));
        let waiter = {
            let barrier = std::sync::Arc::clone(&barrier);
            thread::spawn(move || barrier.arrive())
        };
        // Give the waiter time to block, then pull the plug.
        thread::sleep(Duration::from_millis(50));
        barrier.request_shutdown();
        assert_eq!(waiter.join().expect("waiter panicked"), Arrival::Shutdown);
    }
}
