// Tap tempo - BPM estimation from user taps

use ringbuf::HeapRb;
use ringbuf::traits::{Consumer, Observer, RingBuffer};
use std::time::{Duration, Instant};

/// Number of taps kept for the estimate
pub const TAP_CAPACITY: usize = 5;

/// Taps older than this (measured from the oldest tap) start a fresh measurement
pub const TAP_RESET_THRESHOLD: Duration = Duration::from_secs(5);

/// Rolling tap-to-BPM estimator
///
/// Keeps the last [`TAP_CAPACITY`] tap timestamps, oldest first. The
/// estimate is an iterative average of consecutive tap distances where every
/// new distance pulls the average half-way towards itself.
pub struct TapTempoEstimator {
    taps: HeapRb<Instant>,
}

impl TapTempoEstimator {
    pub fn new() -> Self {
        Self {
            taps: HeapRb::new(TAP_CAPACITY),
        }
    }

    /// Record a tap at the current time
    pub fn record_tap(&mut self) -> Option<u32> {
        self.record_tap_at(Instant::now())
    }

    /// Record a tap at the given time and return the new estimate
    ///
    /// Returns None until at least two taps of the current measurement exist.
    pub fn record_tap_at(&mut self, now: Instant) -> Option<u32> {
        let oldest = Consumer::iter(&self.taps).next().copied();
        if let Some(oldest) = oldest
            && now.saturating_duration_since(oldest) > TAP_RESET_THRESHOLD
        {
            Consumer::clear(&mut self.taps);
        }

        // Full ring: the oldest tap is evicted
        RingBuffer::push_overwrite(&mut self.taps, now);

        self.estimate()
    }

    /// Current estimate without recording a tap
    pub fn estimate(&self) -> Option<u32> {
        let taps: Vec<Instant> = Consumer::iter(&self.taps).copied().collect();

        let mut average_ms: Option<f64> = None;
        for pair in taps.windows(2) {
            let delta_ms = pair[1].saturating_duration_since(pair[0]).as_secs_f64() * 1000.0;
            average_ms = Some(match average_ms {
                Some(average) => (average + delta_ms) / 2.0,
                None => delta_ms,
            });
        }

        let average_ms = average_ms?;
        if average_ms <= 0.0 {
            return None;
        }

        Some((60_000.0 / average_ms).round() as u32)
    }

    /// Number of taps in the current measurement
    pub fn tap_count(&self) -> usize {
        Observer::occupied_len(&self.taps)
    }

    pub fn reset(&mut self) {
        Consumer::clear(&mut self.taps);
    }
}

impl Default for TapTempoEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_single_tap_has_no_estimate() {
        let mut tap = TapTempoEstimator::new();
        assert_eq!(tap.record_tap_at(Instant::now()), None);
        assert_eq!(tap.tap_count(), 1);
    }

    #[test]
    fn test_steady_taps_120_bpm() {
        let mut tap = TapTempoEstimator::new();
        let base = Instant::now();

        assert_eq!(tap.record_tap_at(base), None);
        for i in 1..8 {
            assert_eq!(tap.record_tap_at(base + ms(500 * i)), Some(120));
        }
        assert_eq!(tap.tap_count(), TAP_CAPACITY);
    }

    #[test]
    fn test_recent_deltas_weigh_more() {
        let mut tap = TapTempoEstimator::new();
        let base = Instant::now();

        // Deltas 1000, 1000, 500: average 1000 → 1000 → 750 ⇒ 80 BPM
        tap.record_tap_at(base);
        tap.record_tap_at(base + ms(1000));
        tap.record_tap_at(base + ms(2000));
        assert_eq!(tap.record_tap_at(base + ms(2500)), Some(80));
    }

    #[test]
    fn test_gap_resets_measurement() {
        let mut tap = TapTempoEstimator::new();
        let base = Instant::now();

        tap.record_tap_at(base);
        assert_eq!(tap.record_tap_at(base + ms(500)), Some(120));

        // More than 5s after the oldest tap
        assert_eq!(tap.record_tap_at(base + ms(5600)), None);
        assert_eq!(tap.tap_count(), 1);
        assert_eq!(tap.record_tap_at(base + ms(6600)), Some(60));
    }

    #[test]
    fn test_oldest_tap_is_evicted() {
        let mut tap = TapTempoEstimator::new();
        let base = Instant::now();

        // A slow first delta is forgotten once the ring has rolled over
        tap.record_tap_at(base);
        for i in 0..5 {
            tap.record_tap_at(base + ms(2000 + 400 * i));
        }
        assert_eq!(tap.tap_count(), TAP_CAPACITY);
        assert_eq!(tap.estimate(), Some(150));
    }

    #[test]
    fn test_identical_timestamps_give_no_estimate() {
        let mut tap = TapTempoEstimator::new();
        let now = Instant::now();
        tap.record_tap_at(now);
        assert_eq!(tap.record_tap_at(now), None);
    }

    #[test]
    fn test_reset() {
        let mut tap = TapTempoEstimator::new();
        let base = Instant::now();
        tap.record_tap_at(base);
        tap.record_tap_at(base + ms(500));
        tap.reset();
        assert_eq!(tap.tap_count(), 0);
        assert_eq!(tap.estimate(), None);
    }
}
