//! Frame clock
//!
//! Turns wall-clock frame callbacks into a whole number of fixed simulation
//! steps. Hidden time is never simulated.

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};

/// What to do with the world after becoming visible again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// Short absence; just keep going
    Continue,
    /// Long absence; re-lay the lanes before the next tick
    Renormalize,
}

#[derive(Debug, Clone)]
pub struct FrameClock {
    accumulator: f32,
    last_ms: Option<f64>,
    hidden_since: Option<f64>,
    long_absence_ms: f64,
}

impl FrameClock {
    pub fn new(long_absence_ms: f64) -> Self {
        Self {
            accumulator: 0.0,
            last_ms: None,
            hidden_since: None,
            long_absence_ms,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.hidden_since.is_some()
    }

    pub fn hide(&mut self, now_ms: f64) {
        if self.hidden_since.is_none() {
            self.hidden_since = Some(now_ms);
            log::info!("Paused (hidden)");
        }
    }

    /// Re-base on `now_ms` and report how long we were away
    pub fn show(&mut self, now_ms: f64) -> Resume {
        self.last_ms = Some(now_ms);
        self.accumulator = 0.0;
        let Some(since) = self.hidden_since.take() else {
            return Resume::Continue;
        };
        let away = now_ms - since;
        if away > self.long_absence_ms {
            log::info!("Resumed after {:.0}ms away; renormalizing lanes", away);
            Resume::Renormalize
        } else {
            log::info!("Resumed after {:.0}ms away", away);
            Resume::Continue
        }
    }

    /// Number of fixed steps to run for a frame at `now_ms`
    pub fn advance(&mut self, now_ms: f64) -> u32 {
        if self.is_paused() {
            return 0;
        }
        let dt = match self.last_ms {
            Some(last) => ((now_ms - last) / 1000.0) as f32,
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        self.accumulator += dt.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        substeps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_only_sets_the_base() {
        let mut clock = FrameClock::new(5000.0);
        assert_eq!(clock.advance(1000.0), 0);
        assert_eq!(clock.advance(1040.0), 2);
        // 6.67ms carried over
        assert_eq!(clock.advance(1080.0), 2);
    }

    #[test]
    fn test_huge_frame_gap_is_clamped() {
        let mut clock = FrameClock::new(5000.0);
        clock.advance(0.0);
        let steps = clock.advance(60_000.0);
        assert!(steps <= 6, "got {steps}");
    }

    #[test]
    fn test_hidden_clock_does_not_step() {
        let mut clock = FrameClock::new(5000.0);
        clock.advance(0.0);
        clock.hide(10.0);
        assert_eq!(clock.advance(500.0), 0);
        assert!(clock.is_paused());
    }

    #[test]
    fn test_short_absence_continues_and_rebases() {
        let mut clock = FrameClock::new(5000.0);
        clock.advance(0.0);
        clock.hide(100.0);
        assert_eq!(clock.show(2100.0), Resume::Continue);
        // Elapsed hidden time is not simulated
        assert_eq!(clock.advance(2110.0), 0);
    }

    #[test]
    fn test_long_absence_requests_renormalize() {
        let mut clock = FrameClock::new(5000.0);
        clock.advance(0.0);
        clock.hide(100.0);
        assert_eq!(clock.show(5200.0), Resume::Renormalize);
        assert!(!clock.is_paused());
    }
}
