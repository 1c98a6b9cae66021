//! Time-window extraction
//!
//! Converts a `(start, duration)` window in seconds to frame offsets with
//! `floor(t × sample_rate)` and copies that slice of every channel.
//! A window running past the end of the buffer is an error; the trimmer never
//! pads with silence and never shortens the window.

use crate::audio::types::SampleBuffer;
use crate::error::{Error, Result};
use bgmix_common::timing::seconds_to_frames;
use tracing::debug;

/// Extract `[start_seconds, start_seconds + duration_seconds)` from `buffer`.
///
/// # Errors
/// - `InvalidTiming`: `start_seconds` negative or not finite, `duration_seconds`
///   not positive or not finite
/// - `Range`: window end lies beyond the last frame
pub fn trim(buffer: &SampleBuffer, start_seconds: f64, duration_seconds: f64) -> Result<SampleBuffer> {
    if !start_seconds.is_finite() || start_seconds < 0.0 {
        return Err(Error::InvalidTiming(format!(
            "trim start must be a non-negative number of seconds, got {}",
            start_seconds
        )));
    }
    if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return Err(Error::InvalidTiming(format!(
            "trim duration must be positive, got {}",
            duration_seconds
        )));
    }

    let sample_rate = buffer.sample_rate();
    let start_frame = seconds_to_frames(start_seconds, sample_rate);
    let end_frame = seconds_to_frames(start_seconds + duration_seconds, sample_rate);

    if end_frame > buffer.frame_count() {
        return Err(Error::Range {
            start_frame,
            end_frame,
            available: buffer.frame_count(),
        });
    }

    debug!(
        "Trimming {} frames [{}, {}) at {} Hz",
        end_frame - start_frame,
        start_frame,
        end_frame,
        sample_rate
    );

    let channels = buffer
        .channels()
        .iter()
        .map(|ch| ch[start_frame..end_frame].to_vec())
        .collect();

    SampleBuffer::new(sample_rate, channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Buffer whose samples encode their own frame index
    fn ramp(sample_rate: u32, channel_count: u16, frame_count: usize) -> SampleBuffer {
        let channels = (0..channel_count)
            .map(|ch| {
                (0..frame_count)
                    .map(|i| (i as f32 + ch as f32 * 0.5) / frame_count as f32)
                    .collect()
            })
            .collect();
        SampleBuffer::new(sample_rate, channels).unwrap()
    }

    #[test]
    fn test_trim_middle_window() {
        // 4 s @ 44.1kHz, keep [1 s, 3 s)
        let source = ramp(44100, 2, 176_400);
        let trimmed = trim(&source, 1.0, 2.0).unwrap();

        assert_eq!(trimmed.frame_count(), 88_200);
        assert_eq!(trimmed.sample_rate(), 44100);
        assert_eq!(trimmed.channel_count(), 2);
        for ch in 0..2 {
            assert_eq!(trimmed.sample(ch, 0), source.sample(ch, 44_100));
            assert_eq!(trimmed.sample(ch, 88_199), source.sample(ch, 132_299));
        }
    }

    #[test]
    fn test_trim_from_start() {
        let source = ramp(8000, 1, 8000);
        let trimmed = trim(&source, 0.0, 0.5).unwrap();

        assert_eq!(trimmed.frame_count(), 4000);
        assert_eq!(trimmed.channel(0).unwrap(), &source.channel(0).unwrap()[..4000]);
    }

    #[test]
    fn test_trim_whole_buffer() {
        let source = ramp(100, 1, 100);
        let trimmed = trim(&source, 0.0, 1.0).unwrap();
        assert_eq!(trimmed, source);
    }

    #[test]
    fn test_trim_past_end_is_range_error() {
        let source = ramp(100, 2, 100);
        let err = trim(&source, 0.5, 1.0).unwrap_err();

        match err {
            Error::Range {
                start_frame,
                end_frame,
                available,
            } => {
                assert_eq!(start_frame, 50);
                assert_eq!(end_frame, 150);
                assert_eq!(available, 100);
            }
            other => panic!("Expected Range error, got {:?}", other),
        }
    }

    #[test]
    fn test_trim_rejects_bad_timing() {
        let source = ramp(100, 1, 100);
        assert!(matches!(trim(&source, -0.1, 0.5), Err(Error::InvalidTiming(_))));
        assert!(matches!(trim(&source, 0.0, 0.0), Err(Error::InvalidTiming(_))));
        assert!(matches!(trim(&source, 0.0, -1.0), Err(Error::InvalidTiming(_))));
        assert!(matches!(trim(&source, f64::NAN, 0.5), Err(Error::InvalidTiming(_))));
        assert!(matches!(trim(&source, 0.0, f64::INFINITY), Err(Error::InvalidTiming(_))));
    }

    #[test]
    fn test_trim_floors_fractional_frames() {
        // 0.015 s @ 100 Hz = 1.5 frames → floor → 1
        let source = ramp(100, 1, 100);
        let trimmed = trim(&source, 0.0, 0.015).unwrap();
        assert_eq!(trimmed.frame_count(), 1);
    }

    #[test]
    fn test_trim_leaves_source_untouched() {
        let source = ramp(100, 1, 100);
        let before = source.clone();
        let _ = trim(&source, 0.2, 0.3).unwrap();
        assert_eq!(source, before);
    }
}
