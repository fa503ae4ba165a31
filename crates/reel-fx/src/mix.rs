//! Dry/wet blending with per-block gain smoothing.

use reel_core::{EngineConfig, GainRamp};

/// Blends a dry signal already in the output buffer with a wet signal
/// rendered into preallocated scratch.
///
/// Mix changes ramp over the next block instead of stepping.
#[derive(Debug, Clone)]
pub struct DryWet {
    dry: GainRamp,
    wet: GainRamp,
    mix: f32,
    scratch: Vec<f32>,
}

impl DryWet {
    /// `mix` of 0 is fully dry, 1 fully wet. Out-of-range values are clamped.
    pub fn new(mix: f32) -> Self {
        Self::with_max_block(mix, EngineConfig::MAX_BLOCK_SIZE)
    }

    pub fn with_max_block(mix: f32, max_block: usize) -> Self {
        let mix = clamp_mix(mix);
        Self {
            dry: GainRamp::new(1.0 - mix),
            wet: GainRamp::new(mix),
            mix,
            scratch: vec![0.0; max_block.max(1)],
        }
    }

    #[inline]
    pub fn mix(&self) -> f32 {
        self.mix
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix = clamp_mix(mix);
        self.dry.set_target(1.0 - self.mix);
        self.wet.set_target(self.mix);
    }

    /// Jump to the current mix without ramping.
    pub fn reset(&mut self) {
        self.dry.reset(1.0 - self.mix);
        self.wet.reset(self.mix);
    }

    /// `out` holds the dry signal on entry and the blend on return. `render`
    /// fills the wet signal; it is called once per block, or once per chunk of
    /// the scratch size for oversized blocks.
    pub fn process(&mut self, out: &mut [f32], mut render: impl FnMut(&mut [f32])) {
        let chunk_len = self.scratch.len();
        for chunk in out.chunks_mut(chunk_len) {
            let wet = &mut self.scratch[..chunk.len()];
            render(wet);
            self.dry.apply(chunk);
            self.wet.apply(wet);
            for (sample, wet) in chunk.iter_mut().zip(wet.iter()) {
                *sample += *wet;
            }
        }
    }

    /// Stereo [`process`](Self::process): both channels share one mix ramp.
    /// Only `min(left.len(), right.len())` samples are processed.
    pub fn process_stereo(
        &mut self,
        left: &mut [f32],
        right: &mut [f32],
        mut render: impl FnMut(&mut [f32], &mut [f32]),
    ) {
        let len = left.len().min(right.len());
        let chunk_len = (self.scratch.len() / 2).max(1);
        let mut start = 0;
        while start < len {
            let end = (start + chunk_len).min(len);
            let (wet_left, wet_right) = self.scratch.split_at_mut(chunk_len);
            let wet_left = &mut wet_left[..end - start];
            let wet_right = &mut wet_right[..end - start];
            render(wet_left, wet_right);

            let (mut dry, mut wet) = (self.dry, self.wet);
            dry.apply(&mut left[start..end]);
            wet.apply(wet_left);
            self.dry.apply(&mut right[start..end]);
            self.wet.apply(wet_right);

            for (sample, wet) in left[start..end].iter_mut().zip(wet_left.iter()) {
                *sample += *wet;
            }
            for (sample, wet) in right[start..end].iter_mut().zip(wet_right.iter()) {
                *sample += *wet;
            }
            start = end;
        }
    }
}

fn clamp_mix(mix: f32) -> f32 {
    if mix.is_finite() {
        mix.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_fully_dry_and_fully_wet() {
        let mut dry = DryWet::new(0.0);
        let mut out = [1.0f32; 4];
        dry.process(&mut out, |wet| wet.fill(5.0));
        assert_eq!(out, [1.0; 4]);

        let mut wet = DryWet::new(1.0);
        let mut out = [1.0f32; 4];
        wet.process(&mut out, |w| w.fill(5.0));
        assert_eq!(out, [5.0; 4]);
    }

    #[test]
    fn test_half_mix() {
        let mut mix = DryWet::new(0.5);
        let mut out = [2.0f32; 3];
        mix.process(&mut out, |wet| wet.fill(4.0));
        assert_eq!(out, [3.0; 3]);
    }

    #[test]
    fn test_mix_change_ramps() {
        let mut mix = DryWet::new(0.0);
        mix.set_mix(1.0);
        let mut out = [1.0f32; 4];
        mix.process(&mut out, |wet| wet.fill(0.0));
        // Dry fades out over the block.
        assert_abs_diff_eq!(out[0], 0.75);
        assert_abs_diff_eq!(out[3], 0.0);
    }

    #[test]
    fn test_oversized_block_is_chunked() {
        let mut mix = DryWet::with_max_block(1.0, 4);
        let mut calls = 0;
        let mut out = [0.0f32; 10];
        mix.process(&mut out, |wet| {
            calls += 1;
            wet.fill(1.0);
        });
        assert_eq!(calls, 3);
        assert_eq!(out, [1.0; 10]);
    }

    #[test]
    fn test_stereo_channels_share_ramp() {
        let mut mix = DryWet::new(0.0);
        mix.set_mix(1.0);
        let mut left = [1.0f32; 4];
        let mut right = [2.0f32; 4];
        mix.process_stereo(&mut left, &mut right, |l, r| {
            l.fill(0.0);
            r.fill(0.0);
        });
        assert_abs_diff_eq!(left[0], 0.75);
        assert_abs_diff_eq!(right[0], 1.5);
        assert_eq!(left[3], 0.0);
        assert_eq!(right[3], 0.0);
    }

    #[test]
    fn test_mix_clamped() {
        assert_eq!(DryWet::new(3.0).mix(), 1.0);
        assert_eq!(DryWet::new(-1.0).mix(), 0.0);
    }
}
