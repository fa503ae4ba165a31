//! Host-facing block interface and block-rate gain smoothing.

/// Something the host audio graph drives once per callback.
///
/// `push_block` hands over the live input, `produce_block` asks for the unit's
/// contribution to the output bus. Both run on the audio thread and must not
/// allocate, lock or loop unboundedly.
pub trait BlockProcessor: Send {
    fn push_block(&mut self, input: &[f32]);

    /// Overwrite `out` with `out.len()` output samples.
    fn produce_block(&mut self, out: &mut [f32]);

    /// Push then produce, for hosts with a single in/out callback.
    fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        self.push_block(input);
        self.produce_block(output);
    }

    /// Drop all history and in-flight playback.
    fn reset(&mut self);
}

/// Linear gain ramp applied across one block.
///
/// Used to fade readers in and out at block boundaries instead of hard-cutting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainRamp {
    current: f32,
    target: f32,
}

impl GainRamp {
    pub fn new(gain: f32) -> Self {
        Self {
            current: gain,
            target: gain,
        }
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Jump to `gain` immediately.
    pub fn reset(&mut self, gain: f32) {
        self.current = gain;
        self.target = gain;
    }

    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    #[inline]
    pub fn is_silent(&self) -> bool {
        self.current == 0.0 && self.target == 0.0
    }

    /// Multiply `block` by a ramp from the current gain to the target, ending
    /// exactly on the target.
    pub fn apply(&mut self, block: &mut [f32]) {
        if self.current == self.target {
            if self.current != 1.0 {
                block.iter_mut().for_each(|s| *s *= self.current);
            }
            return;
        }
        let len = block.len();
        if len == 0 {
            return;
        }
        let step = (self.target - self.current) / len as f32;
        for (i, sample) in block.iter_mut().enumerate() {
            *sample *= self.current + step * (i + 1) as f32;
        }
        self.current = self.target;
    }
}

impl Default for GainRamp {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_unity_passthrough() {
        let mut ramp = GainRamp::default();
        let mut block = [0.5, -0.5, 1.0];
        ramp.apply(&mut block);
        assert_eq!(block, [0.5, -0.5, 1.0]);
    }

    #[test]
    fn test_fade_out_ends_at_zero() {
        let mut ramp = GainRamp::new(1.0);
        ramp.set_target(0.0);
        let mut block = [1.0; 4];
        ramp.apply(&mut block);
        assert_abs_diff_eq!(block[0], 0.75);
        assert_abs_diff_eq!(block[3], 0.0);
        assert!(ramp.is_silent());

        let mut next = [1.0; 4];
        ramp.apply(&mut next);
        assert_eq!(next, [0.0; 4]);
    }

    #[test]
    fn test_fade_in() {
        let mut ramp = GainRamp::new(0.0);
        ramp.set_target(1.0);
        let mut block = [1.0; 2];
        ramp.apply(&mut block);
        assert_eq!(block, [0.5, 1.0]);
        assert_eq!(ramp.current(), 1.0);
    }

    #[test]
    fn test_empty_block_keeps_ramp_pending() {
        let mut ramp = GainRamp::new(1.0);
        ramp.set_target(0.0);
        ramp.apply(&mut []);
        assert_eq!(ramp.current(), 1.0);
        assert_eq!(ramp.target(), 0.0);
    }
}
