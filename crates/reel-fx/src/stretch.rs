//! Granular time-stretch playback of a loaded clip.
//!
//! The clip is copied into a ring of exactly its length, so ring slots are
//! clip indices. A playhead walks the clip at `speed`; every hop a grain of
//! `grain_ms` starts at the playhead and plays at `pitch_ratio`. Speed and
//! pitch are therefore independent.

use crate::error::require_positive;
use crate::Result;
use reel_core::{BlockProcessor, Rate, StreamWriter, MAX_RATE};
use reel_grain::{GrainEnvelope, GrainPool, GrainSpec};

/// Playback settings for [`StretchPlayer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StretchParams {
    /// Playhead speed; 0.5 plays twice as long. Clamped to `0..=16`.
    pub speed: f64,
    pub pitch_ratio: f64,
    pub grain_ms: f64,
    /// Grains overlapping at any instant; the hop is `grain / overlap`.
    pub overlap: f64,
    pub looping: bool,
}

impl Default for StretchParams {
    fn default() -> Self {
        Self {
            speed: 1.0,
            pitch_ratio: 1.0,
            grain_ms: 50.0,
            overlap: 2.0,
            looping: false,
        }
    }
}

const MAX_OVERLAP: f64 = 16.0;

#[derive(Debug)]
pub struct StretchPlayer {
    writer: StreamWriter,
    pool: GrainPool,
    clip_len: usize,
    playhead: f64,
    speed: f64,
    pitch: Rate,
    grain_len: u32,
    hop: u32,
    countdown: u32,
    looping: bool,
    reached_end: bool,
}

impl StretchPlayer {
    pub fn new(clip: &[f32], sample_rate: f64, params: StretchParams) -> Result<Self> {
        let sample_rate = require_positive("sample_rate", sample_rate)?;
        let grain_ms = require_positive("grain_ms", params.grain_ms)?;
        let overlap = require_positive("overlap", params.overlap)?.clamp(1.0, MAX_OVERLAP);
        require_positive("pitch_ratio", params.pitch_ratio)?;

        let mut writer = StreamWriter::with_capacity(clip.len())?;
        writer.push_block(clip);

        let grain_len = ((grain_ms * sample_rate / 1000.0).round() as u32).max(2);
        let hop = ((grain_len as f64 / overlap).round() as u32).max(1);
        let voices = (grain_len as f64 / hop as f64).ceil() as usize + 1;
        let pool = GrainPool::new(voices, GrainEnvelope::triangle(), hop.max(1))?;
        tracing::debug!(
            "Loaded clip of {} samples: grain {} samples, hop {}, {} voices",
            clip.len(),
            grain_len,
            hop,
            voices
        );

        let mut player = Self {
            writer,
            pool,
            clip_len: clip.len(),
            playhead: 0.0,
            speed: 1.0,
            pitch: Rate::UNITY,
            grain_len,
            hop,
            countdown: 0,
            looping: params.looping,
            reached_end: false,
        };
        player.set_speed(params.speed);
        player.set_pitch_ratio(params.pitch_ratio);
        Ok(player)
    }

    pub fn clip_len(&self) -> usize {
        self.clip_len
    }

    /// Playhead in clip samples.
    pub fn playhead(&self) -> f64 {
        self.playhead
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = if speed.is_finite() {
            speed.clamp(0.0, MAX_RATE)
        } else {
            1.0
        };
    }

    pub fn pitch_ratio(&self) -> f64 {
        self.pitch.get()
    }

    pub fn set_pitch_ratio(&mut self, ratio: f64) {
        self.pitch = Rate::new(ratio.abs());
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// True once a non-looping playhead passed the end and every grain died out.
    pub fn is_finished(&self) -> bool {
        self.reached_end && self.pool.is_silent()
    }

    /// Rewind to the start of the clip.
    pub fn restart(&mut self) {
        self.pool.retire_all();
        self.playhead = 0.0;
        self.countdown = 0;
        self.reached_end = false;
    }

    /// Start a grain at the playhead. Without looping the grain is cut short
    /// so its last read lands on the last clip sample, not the ring's start.
    fn trigger_grain(&mut self) {
        let mut length = self.grain_len;
        if !self.looping {
            let room = (self.clip_len as f64 - 1.0 - self.playhead) / self.pitch.get();
            if room < 1.0 {
                return;
            }
            length = length.min(room.floor() as u32 + 1);
        }
        self.pool
            .trigger_at(GrainSpec::new(self.playhead, length, self.pitch));
    }

    fn advance_playhead(&mut self, samples: u32) {
        self.playhead += self.speed * samples as f64;
        let len = self.clip_len as f64;
        if self.playhead >= len {
            if self.looping {
                self.playhead = self.playhead.rem_euclid(len);
            } else {
                self.playhead = len;
                self.reached_end = true;
            }
        }
    }
}

impl BlockProcessor for StretchPlayer {
    /// Live input is ignored: the player only plays its clip.
    fn push_block(&mut self, _input: &[f32]) {}

    fn produce_block(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        let len = out.len();
        let mut start = 0;
        while start < len {
            let remaining = (len - start).min(u32::MAX as usize) as u32;
            if self.reached_end {
                self.pool.mix_mono(self.writer.ring(), &mut out[start..]);
                return;
            }
            if self.countdown == 0 {
                self.trigger_grain();
                self.countdown = self.hop;
            }
            let step = self.countdown.min(remaining);
            let end = start + step as usize;
            self.pool.mix_mono(self.writer.ring(), &mut out[start..end]);
            self.advance_playhead(step);
            self.countdown -= step;
            start = end;
        }
    }

    fn reset(&mut self) {
        self.restart();
    }
}
