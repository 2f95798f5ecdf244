use crate::config::{DriveTuning, MAX_SPEED};

/// Proportional left/right balance on encoder transitions.
///
/// Only the wheel that is ahead ever slows down, the other keeps the target
/// speed, so the output never goes negative and never exceeds the cruise
/// speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriftCorrection {
    target: u8,
    floor: u8,
    gain: u16,
}

impl DriftCorrection {
    pub fn new(tuning: &DriveTuning) -> Self {
        Self {
            target: tuning.target_speed,
            floor: tuning.minimum_speed,
            gain: tuning.correction_gain,
        }
    }

    /// Speeds for the (left, right) wheels given their transition counts.
    pub fn correct(&self, left: u32, right: u32) -> (u8, u8) {
        let lead = i64::from(left) - i64::from(right);
        let slowed = self.slowed(lead.unsigned_abs());

        match lead {
            l if l > 0 => (slowed, self.target),
            l if l < 0 => (self.target, slowed),
            _ => (self.target, self.target),
        }
    }

    fn slowed(&self, lead: u64) -> u8 {
        let cut = lead.saturating_mul(u64::from(self.gain));
        let raw = i64::from(self.target) - i64::try_from(cut).unwrap_or(i64::MAX);
        let speed = num_traits::clamp(raw, 0, i64::from(MAX_SPEED));
        if speed < i64::from(self.floor) {
            0
        } else {
            speed as u8
        }
    }
}
