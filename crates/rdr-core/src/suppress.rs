//! Loop-suppression cache.
//!
//! A redirect's destination becomes the next incoming URL, so a rule can
//! catch its own output and loop forever. Two records per destination
//! prevent that:
//!
//! - a one-shot entry armed when a redirect is produced and consumed by
//!   the first evaluation request for that URL, skipping it once;
//! - a windowed tally counting redirects to the same destination. Past
//!   the threshold the destination is refused until the window lapses,
//!   which catches genuine loops that survive one-shot suppression
//!   (e.g. two rules bouncing a URL back and forth).
//!
//! Expiry is checked on access; there is no background timer.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long suppression records stay live.
pub const SUPPRESSION_WINDOW: Duration = Duration::from_secs(3);

/// Redirects to the same destination tolerated within one window.
pub const LOOP_THRESHOLD: u32 = 3;

/// Outcome of recording a produced redirect destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Destination recorded; the next request for it is suppressed once.
    Recorded,
    /// The destination exceeded the loop threshold inside the window.
    /// The caller must not redirect until the window lapses.
    ThresholdExceeded { count: u32 },
}

#[derive(Debug)]
struct Tally {
    first_seen: Instant,
    count: u32,
}

/// Time-windowed record of URLs just produced as redirect targets.
#[derive(Debug)]
pub struct LoopSuppressionCache {
    pending: HashMap<String, Instant>,
    tallies: HashMap<String, Tally>,
    window: Duration,
    threshold: u32,
}

impl LoopSuppressionCache {
    pub fn new() -> Self {
        Self::with_window(SUPPRESSION_WINDOW, LOOP_THRESHOLD)
    }

    /// Override window and threshold; used by tests and callers with
    /// unusual navigation patterns.
    pub fn with_window(window: Duration, threshold: u32) -> Self {
        Self {
            pending: HashMap::new(),
            tallies: HashMap::new(),
            window,
            threshold,
        }
    }

    /// Check whether this URL was just produced as a redirect target.
    ///
    /// A live one-shot entry is consumed and `true` is returned: the
    /// caller skips evaluation for this request, exactly once. An expired
    /// entry is dropped without counting as a suppression.
    pub fn should_suppress(&mut self, url: &str) -> bool {
        self.should_suppress_at(url, Instant::now())
    }

    fn should_suppress_at(&mut self, url: &str, now: Instant) -> bool {
        match self.pending.remove(url) {
            Some(armed) => now.duration_since(armed) <= self.window,
            None => false,
        }
    }

    /// Record a destination the engine is about to redirect to.
    ///
    /// Arms one-shot suppression and bumps the windowed tally. Returns
    /// `ThresholdExceeded` once the same destination has been produced
    /// more than `threshold` times inside the window; the one-shot entry
    /// is not armed in that case because the redirect must not happen.
    pub fn record_redirect(&mut self, destination: &str) -> RecordOutcome {
        self.record_redirect_at(destination, Instant::now())
    }

    fn record_redirect_at(&mut self, destination: &str, now: Instant) -> RecordOutcome {
        let tally = self
            .tallies
            .entry(destination.to_string())
            .or_insert(Tally {
                first_seen: now,
                count: 0,
            });

        if now.duration_since(tally.first_seen) > self.window {
            tally.first_seen = now;
            tally.count = 0;
        }
        tally.count += 1;

        if tally.count > self.threshold {
            RecordOutcome::ThresholdExceeded { count: tally.count }
        } else {
            self.pending.insert(destination.to_string(), now);
            RecordOutcome::Recorded
        }
    }

    /// Drop all expired records. Optional; reads already ignore expired
    /// entries, this just bounds memory for long-lived processes.
    pub fn sweep(&mut self) {
        self.sweep_at(Instant::now());
    }

    fn sweep_at(&mut self, now: Instant) {
        let window = self.window;
        self.pending
            .retain(|_, armed| now.duration_since(*armed) <= window);
        self.tallies
            .retain(|_, tally| now.duration_since(tally.first_seen) <= window);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.pending.len() + self.tallies.len()
    }
}

impl Default for LoopSuppressionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suppress_exactly_once() {
        let mut cache = LoopSuppressionCache::new();
        assert_eq!(cache.record_redirect("http://a.com/"), RecordOutcome::Recorded);

        assert!(cache.should_suppress("http://a.com/"));
        // Consumed: normal evaluation resumes.
        assert!(!cache.should_suppress("http://a.com/"));
    }

    #[test]
    fn test_unrelated_url_not_suppressed() {
        let mut cache = LoopSuppressionCache::new();
        cache.record_redirect("http://a.com/");
        assert!(!cache.should_suppress("http://b.com/"));
    }

    #[test]
    fn test_expired_entry_not_suppressed() {
        let mut cache = LoopSuppressionCache::new();
        let t0 = Instant::now();
        cache.record_redirect_at("http://a.com/", t0);

        let late = t0 + SUPPRESSION_WINDOW + Duration::from_millis(1);
        assert!(!cache.should_suppress_at("http://a.com/", late));
    }

    #[test]
    fn test_threshold_exceeded_on_fourth_redirect() {
        let mut cache = LoopSuppressionCache::new();
        let t0 = Instant::now();
        for _ in 0..3 {
            assert_eq!(
                cache.record_redirect_at("http://loop.com/", t0),
                RecordOutcome::Recorded
            );
        }
        assert_eq!(
            cache.record_redirect_at("http://loop.com/", t0),
            RecordOutcome::ThresholdExceeded { count: 4 }
        );
        // Still refused inside the window.
        assert_eq!(
            cache.record_redirect_at("http://loop.com/", t0 + Duration::from_millis(10)),
            RecordOutcome::ThresholdExceeded { count: 5 }
        );
    }

    #[test]
    fn test_tally_resets_after_window() {
        let mut cache = LoopSuppressionCache::new();
        let t0 = Instant::now();
        for _ in 0..4 {
            cache.record_redirect_at("http://loop.com/", t0);
        }

        let later = t0 + SUPPRESSION_WINDOW + Duration::from_millis(1);
        assert_eq!(
            cache.record_redirect_at("http://loop.com/", later),
            RecordOutcome::Recorded
        );
    }

    #[test]
    fn test_sweep_prunes_expired() {
        let mut cache = LoopSuppressionCache::new();
        let t0 = Instant::now();
        cache.record_redirect_at("http://a.com/", t0);
        cache.record_redirect_at("http://b.com/", t0);
        assert!(cache.len() > 0);

        cache.sweep_at(t0 + SUPPRESSION_WINDOW + Duration::from_millis(1));
        assert_eq!(cache.len(), 0);
    }
}
