//! Effect unit tests
//!
//! The ready-made units driven block by block at host-like sizes.
//!
//! Run with:
//! ```bash
//! cargo test -p reel --test fx_tests
//! ```

#![cfg(feature = "fx")]

mod helpers;

use helpers::tolerances::*;
use helpers::*;
use reel::prelude::*;
use reel::StretchParams;

// =============================================================================
// Reverse Delay
// =============================================================================

#[test]
fn test_reverse_delay_two_sample_windows() {
    init_tracing();
    let mut fx = ReverseDelay::new(1000.0, 0.002, 1.0).unwrap();
    let input = generate_integer_staircase(0, 12);
    let output = run_blocks(&mut fx, &input, 3);
    assert_eq!(
        output,
        vec![0.0, 0.0, 1.0, 0.0, 3.0, 2.0, 5.0, 4.0, 7.0, 6.0, 9.0, 8.0]
    );
}

#[test]
fn test_reverse_delay_half_mix_blends() {
    let mut fx = ReverseDelay::new(1000.0, 0.002, 0.5).unwrap();
    let input = generate_integer_staircase(0, 12);
    let output = run_blocks(&mut fx, &input, 4);
    let reversed = [0.0, 0.0, 1.0, 0.0, 3.0, 2.0, 5.0, 4.0, 7.0, 6.0, 9.0, 8.0];
    let expected: Vec<f32> = input
        .iter()
        .zip(reversed.iter())
        .map(|(dry, wet)| 0.5 * dry + 0.5 * wet)
        .collect();
    assert_signals_equal(&output, &expected, FLOAT_EPSILON, "half mix");
}

#[test]
fn test_reverse_delay_long_run_stays_aligned() {
    // A window that does not divide the block size still lines up with the
    // absolute stream position after many blocks.
    let window = 300;
    let mut fx = ReverseDelay::new(TEST_SAMPLE_RATE, window as f64 / TEST_SAMPLE_RATE, 1.0).unwrap();
    let input = generate_integer_staircase(0, TEST_BLOCK_SIZE * 40);
    let output = run_blocks(&mut fx, &input, TEST_BLOCK_SIZE);

    for n in window..output.len() {
        let start = n / window * window;
        let mirrored = start - 1 - (n - start);
        assert_eq!(output[n], mirrored as f32, "sample {n}");
    }
}

// =============================================================================
// Pitch Shifter
// =============================================================================

#[test]
fn test_pitch_shift_fifth_up() {
    // 50 ms windows hold whole cycles of 200 Hz, so both taps stay in phase.
    let mut fx = PitchShifter::new(TEST_SAMPLE_RATE, 1.5, 50.0, 1.0).unwrap();
    let input = generate_sine(200.0, TEST_SAMPLE_RATE, TEST_SAMPLE_RATE as usize * 2);
    let output = run_blocks(&mut fx, &input, TEST_BLOCK_SIZE);

    // One second of 300 Hz crosses zero 600 times.
    let crossings = zero_crossings(&output[TEST_SAMPLE_RATE as usize..]);
    assert!((570..=630).contains(&crossings), "got {crossings} crossings");
    assert!(peak(&output) <= 1.0 + DSP_EPSILON);
}

#[test]
fn test_pitch_shift_dry_mix_is_transparent() {
    let mut fx = PitchShifter::new(TEST_SAMPLE_RATE, 0.7, 30.0, 0.0).unwrap();
    let input = generate_noise(TEST_BLOCK_SIZE * 8, 11);
    let output = run_blocks(&mut fx, &input, TEST_BLOCK_SIZE);
    assert_signals_equal(&output, &input, 0.0, "dry");
}

// =============================================================================
// Time Stretch
// =============================================================================

#[test]
fn test_stretch_double_speed_halves_duration() {
    let clip = generate_dc(0.5, TEST_SAMPLE_RATE as usize);
    let params = StretchParams {
        speed: 2.0,
        ..StretchParams::default()
    };
    let mut player = StretchPlayer::new(&clip, TEST_SAMPLE_RATE, params).unwrap();

    let mut out = vec![0.0f32; TEST_BLOCK_SIZE];
    let mut played = 0;
    while !player.is_finished() && played < clip.len() * 2 {
        player.produce_block(&mut out);
        played += out.len();
    }
    // The last grain rings out for up to 50 ms past the end.
    let half = clip.len() / 2;
    assert!(
        played >= half && played <= half + 2400 + TEST_BLOCK_SIZE,
        "played {played} samples"
    );
}

#[test]
fn test_stretch_reset_rewinds() {
    let clip = generate_sine(200.0, TEST_SAMPLE_RATE, 4800);
    let mut player = StretchPlayer::new(&clip, TEST_SAMPLE_RATE, StretchParams::default()).unwrap();
    let first = run_blocks(&mut player, &vec![0.0; 4096], TEST_BLOCK_SIZE);
    player.reset();
    assert_eq!(player.playhead(), 0.0);
    let again = run_blocks(&mut player, &vec![0.0; 4096], TEST_BLOCK_SIZE);
    assert_signals_equal(&first, &again, FLOAT_EPSILON, "after reset");
}

// =============================================================================
// Buffer Repeat
// =============================================================================

#[test]
fn test_buffer_repeat_stutters_then_returns_dry() {
    let slice = 480;
    let mut fx = BufferRepeat::new(TEST_SAMPLE_RATE, 10.0, 1.0, 1.0).unwrap();
    let input = generate_noise(TEST_BLOCK_SIZE * 16, 5);
    let blocks: Vec<&[f32]> = input.chunks(TEST_BLOCK_SIZE).collect();
    let mut out = vec![0.0f32; TEST_BLOCK_SIZE];

    for block in &blocks[..4] {
        fx.process_block(block, &mut out);
        assert_signals_equal(&out, block, 0.0, "dry before engage");
    }

    fx.engage();
    let mut engaged = Vec::new();
    for block in &blocks[4..12] {
        fx.process_block(block, &mut out);
        engaged.extend_from_slice(&out);
    }
    // Skip the block the mix ramps in over.
    let wet = &engaged[TEST_BLOCK_SIZE..];
    assert_not_silent(wet, 0.1, "repeat");
    assert_signals_equal(&wet[..wet.len() - slice], &wet[slice..], FLOAT_EPSILON, "period");

    fx.disengage();
    fx.process_block(blocks[12], &mut out);
    for block in &blocks[13..] {
        fx.process_block(block, &mut out);
        assert_signals_equal(&out, block, 0.0, "dry after disengage");
    }
}

// =============================================================================
// Shimmer
// =============================================================================

#[test]
fn test_shimmer_stereo_cloud_and_freeze() {
    let params = ScatterParams {
        pitch_semitones: (12.0, 12.0),
        pan_spread: 1.0,
        ..ScatterParams::default()
    };
    let mut fx = Shimmer::new(TEST_SAMPLE_RATE, params, 1.0, 3, 16).unwrap();
    let input = generate_sine(220.0, TEST_SAMPLE_RATE, TEST_BLOCK_SIZE * 120);

    let mut left = vec![0.0f32; TEST_BLOCK_SIZE];
    let mut right = vec![0.0f32; TEST_BLOCK_SIZE];
    let (mut all_left, mut all_right) = (Vec::new(), Vec::new());
    for block in input[..TEST_BLOCK_SIZE * 100].chunks(TEST_BLOCK_SIZE) {
        fx.process_stereo(block, &mut left, &mut right);
        all_left.extend_from_slice(&left);
        all_right.extend_from_slice(&right);
    }
    assert!(all_left.iter().chain(&all_right).all(|s| s.is_finite()));
    assert_not_silent(&all_left, 0.05, "left");
    assert_not_silent(&all_right, 0.05, "right");
    assert!(!compare_audio(&all_left, &all_right, PERCEPTUAL_EPSILON).equal);
    assert!(fx.scheduler().stats().triggered > 0);

    fx.freeze_cloud();
    for block in input[TEST_BLOCK_SIZE * 100..].chunks(TEST_BLOCK_SIZE) {
        fx.process_stereo(block, &mut left, &mut right);
    }
    assert_is_silent(&left, 0.0, "frozen left");
    assert_is_silent(&right, 0.0, "frozen right");
}
