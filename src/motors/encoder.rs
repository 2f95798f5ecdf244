use crate::hal::PinState;

/// Debounced rising-edge counter for a single-channel wheel encoder.
///
/// A raw level is only believed once it has been read `min_stable_count`
/// more times after it first appeared. Bounces shorter than that never
/// change the accepted level, so the filter undercounts rather than
/// overcounts when the signal is noisier than the polling rate can resolve.
#[derive(Debug, Clone)]
pub struct EncoderFilter {
    min_stable_count: u16,
    last_sample: PinState,
    // reads of `last_sample` since it last changed
    stable_count: u16,
    accepted: PinState,
    transitions: u32,
}

impl EncoderFilter {
    pub fn new(min_stable_count: u16) -> Self {
        Self {
            min_stable_count,
            last_sample: PinState::Low,
            stable_count: 0,
            accepted: PinState::Low,
            transitions: 0,
        }
    }

    /// Feed one raw read of the encoder pin.
    pub fn observe(&mut self, sample: PinState) {
        if sample != self.last_sample {
            self.last_sample = sample;
            self.stable_count = 0;
        } else {
            self.stable_count = self.stable_count.saturating_add(1);
        }

        if self.stable_count >= self.min_stable_count && sample != self.accepted {
            self.accepted = sample;
            if sample == PinState::High {
                self.transitions = self.transitions.saturating_add(1);
            }
        }
    }

    pub fn accepted_level(&self) -> PinState {
        self.accepted
    }

    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    /// Zero the count, returning what it was.
    pub fn reset(&mut self) -> u32 {
        core::mem::replace(&mut self.transitions, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(filter: &mut EncoderFilter, level: PinState, times: usize) {
        for _ in 0..times {
            filter.observe(level);
        }
    }

    #[test]
    fn counts_a_clean_rising_edge_once() {
        let mut filter = EncoderFilter::new(5);
        feed(&mut filter, PinState::High, 5);
        assert_eq!(filter.accepted_level(), PinState::Low);

        filter.observe(PinState::High);
        assert_eq!(filter.accepted_level(), PinState::High);
        assert_eq!(filter.transitions(), 1);

        feed(&mut filter, PinState::High, 50);
        assert_eq!(filter.transitions(), 1);
    }

    #[test]
    fn falling_edge_does_not_count() {
        let mut filter = EncoderFilter::new(5);
        feed(&mut filter, PinState::High, 10);
        feed(&mut filter, PinState::Low, 10);
        assert_eq!(filter.accepted_level(), PinState::Low);
        assert_eq!(filter.transitions(), 1);

        feed(&mut filter, PinState::High, 10);
        assert_eq!(filter.transitions(), 2);
    }

    #[test]
    fn fast_bounce_is_rejected() {
        let mut filter = EncoderFilter::new(5);
        for run in 1..=5 {
            for _ in 0..20 {
                feed(&mut filter, PinState::High, run);
                feed(&mut filter, PinState::Low, run);
            }
        }
        assert_eq!(filter.accepted_level(), PinState::Low);
        assert_eq!(filter.transitions(), 0);
    }

    #[test]
    fn noise_inside_a_run_restarts_the_window() {
        let mut filter = EncoderFilter::new(5);
        feed(&mut filter, PinState::High, 4);
        filter.observe(PinState::Low);
        feed(&mut filter, PinState::High, 4);
        assert_eq!(filter.transitions(), 0);

        feed(&mut filter, PinState::High, 2);
        assert_eq!(filter.transitions(), 1);
    }

    #[test]
    fn reset_returns_previous_count() {
        let mut filter = EncoderFilter::new(1);
        for _ in 0..3 {
            feed(&mut filter, PinState::High, 2);
            feed(&mut filter, PinState::Low, 2);
        }
        assert_eq!(filter.reset(), 3);
        assert_eq!(filter.transitions(), 0);
    }
}
