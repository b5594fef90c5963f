// Tempo - BPM value and derived step period

use crate::sequencer::clock::ClockError;
use std::fmt;
use std::time::Duration;

/// Tempo in BPM (one sequencer step per beat)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tempo {
    bpm: u32,
}

/// Relative tempo changes offered by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempoNudge {
    PlusTen,
    MinusTen,
    Double,
    Half,
}

impl Tempo {
    /// Creates a new tempo, BPM must be > 0
    pub fn new(bpm: u32) -> Result<Self, ClockError> {
        if bpm == 0 {
            return Err(ClockError::InvalidTempo(bpm));
        }
        Ok(Self { bpm })
    }

    /// Get BPM value
    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    /// Step period in whole milliseconds (60000 / BPM, at least 1)
    pub fn period_ms(&self) -> u64 {
        (60_000 / self.bpm as u64).max(1)
    }

    /// Step period
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms())
    }

    /// Apply a nudge
    /// Returns None when the nudge would leave the usable range
    pub fn nudged(&self, nudge: TempoNudge) -> Option<Self> {
        let bpm = match nudge {
            TempoNudge::PlusTen if self.bpm < 231 => self.bpm + 10,
            TempoNudge::MinusTen if self.bpm > 69 => self.bpm - 10,
            TempoNudge::Double if self.bpm < 121 => self.bpm * 2,
            TempoNudge::Half if self.bpm > 119 => self.bpm / 2,
            _ => return None,
        };
        Some(Self { bpm })
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self { bpm: 60 }
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.bpm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period() {
        assert_eq!(Tempo::new(120).unwrap().period_ms(), 500);
        assert_eq!(Tempo::new(60).unwrap().period(), Duration::from_secs(1));
        // Integer milliseconds
        assert_eq!(Tempo::new(140).unwrap().period_ms(), 428);
    }

    #[test]
    fn test_zero_bpm_rejected() {
        assert_eq!(Tempo::new(0), Err(ClockError::InvalidTempo(0)));
    }

    #[test]
    fn test_nudges_within_bounds() {
        let tempo = Tempo::new(100).unwrap();
        assert_eq!(tempo.nudged(TempoNudge::PlusTen).map(|t| t.bpm()), Some(110));
        assert_eq!(tempo.nudged(TempoNudge::MinusTen).map(|t| t.bpm()), Some(90));
        assert_eq!(tempo.nudged(TempoNudge::Double).map(|t| t.bpm()), Some(200));
        assert_eq!(tempo.nudged(TempoNudge::Half), None);
    }

    #[test]
    fn test_nudges_at_limits() {
        assert_eq!(Tempo::new(231).unwrap().nudged(TempoNudge::PlusTen), None);
        assert_eq!(Tempo::new(69).unwrap().nudged(TempoNudge::MinusTen), None);
        assert_eq!(Tempo::new(121).unwrap().nudged(TempoNudge::Double), None);
        assert_eq!(
            Tempo::new(120).unwrap().nudged(TempoNudge::Half).map(|t| t.bpm()),
            Some(60)
        );
    }
}
