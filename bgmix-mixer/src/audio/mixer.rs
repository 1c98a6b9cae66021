//! Two-input mixer
//!
//! # Architecture
//!
//! - **Primary** (main track) is always mixed at unit gain
//! - **Secondary** (background track) is scaled by `gain`
//! - Output length and channel count are the maximum of the two inputs;
//!   a missing frame or channel contributes silence
//! - Every output sample is hard-clamped to [-1.0, 1.0]
//!
//! There is no resampling: inputs must share a sample rate. There is no
//! normalization pass either; sums above unity clip.

use crate::audio::types::SampleBuffer;
use crate::error::{Error, Result};
use tracing::debug;

/// Mix `secondary` under `primary`.
///
/// Per sample: `clamp(primary + secondary × gain, -1.0, 1.0)`.
///
/// # Errors
/// - `SampleRateMismatch` if the inputs' sample rates differ
pub fn mix(primary: &SampleBuffer, secondary: &SampleBuffer, gain: f32) -> Result<SampleBuffer> {
    if primary.sample_rate() != secondary.sample_rate() {
        return Err(Error::SampleRateMismatch {
            primary: primary.sample_rate(),
            secondary: secondary.sample_rate(),
        });
    }

    let frame_count = primary.frame_count().max(secondary.frame_count());
    let channel_count = primary.channel_count().max(secondary.channel_count()) as usize;

    debug!(
        "Mixing {}ch/{} frames with {}ch/{} frames at gain {} → {}ch/{} frames",
        primary.channel_count(),
        primary.frame_count(),
        secondary.channel_count(),
        secondary.frame_count(),
        gain,
        channel_count,
        frame_count
    );

    let channels = (0..channel_count)
        .map(|ch| {
            mix_channel(
                primary.channel(ch).unwrap_or(&[]),
                secondary.channel(ch).unwrap_or(&[]),
                gain,
                frame_count,
            )
        })
        .collect();

    SampleBuffer::new(primary.sample_rate(), channels)
}

/// Mix one channel; slices shorter than `frame_count` read as silence past their end
fn mix_channel(primary: &[f32], secondary: &[f32], gain: f32, frame_count: usize) -> Vec<f32> {
    (0..frame_count)
        .map(|i| {
            let p = primary.get(i).copied().unwrap_or(0.0);
            let s = secondary.get(i).copied().unwrap_or(0.0);
            (p + s * gain).clamp(-1.0, 1.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(sample_rate: u32, channel_count: u16, frame_count: usize, value: f32) -> SampleBuffer {
        SampleBuffer::new(sample_rate, vec![vec![value; frame_count]; channel_count as usize]).unwrap()
    }

    #[test]
    fn test_sum_above_unity_clamps() {
        let primary = constant(44100, 1, 10, 0.8);
        let secondary = constant(44100, 1, 10, 0.8);

        let mixed = mix(&primary, &secondary, 1.0).unwrap();

        assert!(mixed.channel(0).unwrap().iter().all(|&s| s == 1.0));
    }

    #[test]
    fn test_sum_below_negative_unity_clamps() {
        let primary = constant(44100, 1, 4, -0.9);
        let secondary = constant(44100, 1, 4, -0.6);

        let mixed = mix(&primary, &secondary, 0.5).unwrap();

        assert!(mixed.channel(0).unwrap().iter().all(|&s| s == -1.0));
    }

    #[test]
    fn test_gain_applies_only_to_secondary() {
        let primary = constant(44100, 1, 4, 0.5);
        let secondary = constant(44100, 1, 4, 0.2);

        let mixed = mix(&primary, &secondary, 0.5).unwrap();

        for &s in mixed.channel(0).unwrap() {
            assert!((s - 0.6).abs() < 1e-6, "expected 0.5 + 0.2*0.5, got {}", s);
        }
    }

    #[test]
    fn test_zero_gain_passes_primary_through() {
        let primary = SampleBuffer::new(8000, vec![vec![0.1, -0.2, 0.3]]).unwrap();
        let secondary = constant(8000, 1, 3, 0.9);

        let mixed = mix(&primary, &secondary, 0.0).unwrap();
        assert_eq!(mixed, primary);
    }

    #[test]
    fn test_silence_fill_for_shorter_and_narrower_secondary() {
        let primary = SampleBuffer::new(
            44100,
            vec![
                (0..100).map(|i| i as f32 / 200.0).collect(),
                (0..100).map(|i| -(i as f32) / 200.0).collect(),
            ],
        )
        .unwrap();
        let secondary = constant(44100, 1, 50, 0.4);

        let mixed = mix(&primary, &secondary, 0.5).unwrap();

        assert_eq!(mixed.channel_count(), 2);
        assert_eq!(mixed.frame_count(), 100);

        // Channel 1: secondary has no such channel → primary unchanged everywhere
        assert_eq!(mixed.channel(1), primary.channel(1));

        // Channel 0: secondary contributes for frames 0..50 only
        for i in 0..50 {
            let expected = primary.sample(0, i).unwrap() + 0.2;
            assert!((mixed.sample(0, i).unwrap() - expected).abs() < 1e-6);
        }
        for i in 50..100 {
            assert_eq!(mixed.sample(0, i), primary.sample(0, i));
        }
    }

    #[test]
    fn test_longer_secondary_extends_output() {
        let primary = constant(44100, 1, 2, 0.5);
        let secondary = constant(44100, 2, 5, 0.5);

        let mixed = mix(&primary, &secondary, 1.0).unwrap();

        assert_eq!(mixed.frame_count(), 5);
        assert_eq!(mixed.channel_count(), 2);
        assert_eq!(mixed.channel(0).unwrap(), &[1.0, 1.0, 0.5, 0.5, 0.5]);
        assert_eq!(mixed.channel(1).unwrap(), &[0.5; 5]);
    }

    #[test]
    fn test_sample_rate_mismatch() {
        let primary = constant(44100, 1, 10, 0.1);
        let secondary = constant(48000, 1, 10, 0.1);

        let err = mix(&primary, &secondary, 0.5).unwrap_err();
        assert!(matches!(
            err,
            Error::SampleRateMismatch {
                primary: 44100,
                secondary: 48000
            }
        ));
    }

    #[test]
    fn test_mix_is_deterministic() {
        let primary = SampleBuffer::new(
            22050,
            vec![(0..1000).map(|i| ((i as f32) * 0.01).sin() * 0.7).collect()],
        )
        .unwrap();
        let secondary = SampleBuffer::new(
            22050,
            vec![(0..800).map(|i| ((i as f32) * 0.03).cos() * 0.9).collect()],
        )
        .unwrap();

        let first = mix(&primary, &secondary, 0.35).unwrap();
        let second = mix(&primary, &secondary, 0.35).unwrap();

        let bits = |b: &SampleBuffer| -> Vec<u32> {
            b.channels().iter().flatten().map(|s| s.to_bits()).collect()
        };
        assert_eq!(bits(&first), bits(&second));
    }

    #[test]
    fn test_output_always_within_unit_range() {
        let primary = SampleBuffer::new(
            1000,
            vec![(0..500).map(|i| ((i as f32) * 0.37).sin() * 1.5).collect()],
        )
        .unwrap();
        let secondary = SampleBuffer::new(
            1000,
            vec![(0..500).map(|i| ((i as f32) * 0.11).cos() * 2.0).collect()],
        )
        .unwrap();

        let mixed = mix(&primary, &secondary, 3.0).unwrap();
        assert!(mixed
            .channel(0)
            .unwrap()
            .iter()
            .all(|&s| (-1.0..=1.0).contains(&s)));
    }

    #[test]
    fn test_empty_inputs() {
        let primary = SampleBuffer::new(44100, vec![vec![]]).unwrap();
        let secondary = SampleBuffer::new(44100, vec![vec![], vec![]]).unwrap();

        let mixed = mix(&primary, &secondary, 0.5).unwrap();
        assert!(mixed.is_empty());
        assert_eq!(mixed.channel_count(), 2);
    }
}
