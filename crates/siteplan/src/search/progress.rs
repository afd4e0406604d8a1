//! Progress notification and cooperative cancellation.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

/// Snapshot of a running search.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// Index of the seed that triggered the event.
    pub seed_index: usize,
    pub seed_count: usize,
    /// Seeds finished so far.
    pub seeds_done: usize,
    /// Complete candidates generated so far.
    pub processed: u64,
    /// Prefixes discarded so far.
    pub pruned: u64,
    pub feasible: u64,
    pub best_fitness: Option<f32>,
    pub elapsed: Duration,
    /// Extrapolated from the seeds finished so far.
    pub estimated_remaining: Option<Duration>,
}

/// Receives progress events from a running search.
///
/// Events are advisory. With parallel search enabled they may arrive from
/// several threads at once.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Shared flag that asks a running search to stop.
///
/// Clones share the flag. The search checks it before every frame and every
/// sample draw and returns what it has found so far.
///
/// # Examples
///
/// ```
/// use siteplan::search::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Counters shared by every worker of one search.
pub(crate) struct ProgressTracker {
    observers: Vec<Arc<dyn ProgressObserver>>,
    interval: u64,
    seed_count: usize,
    started: Instant,
    processed: AtomicU64,
    pruned: AtomicU64,
    feasible: AtomicU64,
    seeds_done: AtomicUsize,
    /// Bits of the best fitness seen, `f32::NEG_INFINITY` when none.
    best: AtomicU32,
}

impl ProgressTracker {
    pub(crate) fn new(observers: Vec<Arc<dyn ProgressObserver>>, interval: u64, seed_count: usize) -> Self {
        Self {
            observers,
            interval: interval.max(1),
            seed_count,
            started: Instant::now(),
            processed: AtomicU64::new(0),
            pruned: AtomicU64::new(0),
            feasible: AtomicU64::new(0),
            seeds_done: AtomicUsize::new(0),
            best: AtomicU32::new(f32::NEG_INFINITY.to_bits()),
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub(crate) fn pruned(&self, count: u64) {
        self.pruned.fetch_add(count, Ordering::Relaxed);
    }

    /// Records one complete candidate and emits an event every `interval`.
    pub(crate) fn candidate(&self, seed_index: usize, fitness: Option<f32>) {
        if let Some(fitness) = fitness {
            self.feasible.fetch_add(1, Ordering::Relaxed);
            let _ = self.best.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                (fitness > f32::from_bits(bits)).then_some(fitness.to_bits())
            });
        }
        let processed = self.processed.fetch_add(1, Ordering::Relaxed) + 1;
        if processed % self.interval == 0 {
            self.emit(seed_index);
        }
    }

    pub(crate) fn seed_finished(&self, seed_index: usize) {
        self.seeds_done.fetch_add(1, Ordering::Relaxed);
        self.emit(seed_index);
    }

    fn emit(&self, seed_index: usize) {
        if self.observers.is_empty() {
            return;
        }
        let event = self.snapshot(seed_index);
        for observer in &self.observers {
            observer.on_progress(&event);
        }
    }

    pub(crate) fn snapshot(&self, seed_index: usize) -> ProgressEvent {
        let elapsed = self.elapsed();
        let seeds_done = self.seeds_done.load(Ordering::Relaxed);
        let best = f32::from_bits(self.best.load(Ordering::Relaxed));
        let estimated_remaining = (seeds_done > 0).then(|| {
            let left = self.seed_count.saturating_sub(seeds_done);
            elapsed.mul_f64(left as f64 / seeds_done as f64)
        });

        ProgressEvent {
            seed_index,
            seed_count: self.seed_count,
            seeds_done,
            processed: self.processed.load(Ordering::Relaxed),
            pruned: self.pruned.load(Ordering::Relaxed),
            feasible: self.feasible.load(Ordering::Relaxed),
            best_fitness: best.is_finite().then_some(best),
            elapsed,
            estimated_remaining,
        }
    }
}

impl fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("observers", &self.observers.len())
            .field("interval", &self.interval)
            .field("seed_count", &self.seed_count)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_cancellation_token_is_shared() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        token.clone().cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_events_every_interval() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let observer: Arc<dyn ProgressObserver> = Arc::new(move |event: &ProgressEvent| {
            sink.lock().unwrap().push(event.clone());
        });

        let tracker = ProgressTracker::new(vec![observer], 3, 2);
        for idx in 0..7 {
            tracker.candidate(0, (idx % 2 == 0).then_some(idx as f32));
        }
        tracker.pruned(4);
        tracker.seed_finished(0);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].processed, 3);
        assert_eq!(events[1].processed, 6);

        let last = &events[2];
        assert_eq!(last.processed, 7);
        assert_eq!(last.feasible, 4);
        assert_eq!(last.pruned, 4);
        assert_eq!(last.best_fitness, Some(6.0));
        assert_eq!(last.seeds_done, 1);
        assert!(last.estimated_remaining.is_some());
    }

    #[test]
    fn test_snapshot_without_candidates() {
        let tracker = ProgressTracker::new(Vec::new(), 10, 1);
        let event = tracker.snapshot(0);
        assert_eq!(event.best_fitness, None);
        assert_eq!(event.estimated_remaining, None);
    }
}
