//! Seconds ↔ frame conversions
//!
//! Frame offsets are always computed with `floor(seconds × sample_rate)` so
//! the same time value maps to the same frame everywhere in the pipeline.
//!
//! ```rust
//! use bgmix_common::timing::*;
//!
//! assert_eq!(seconds_to_frames(1.0, 44100), 44_100);
//! assert_eq!(seconds_to_frames(0.5, 48000), 24_000);
//! assert_eq!(frames_to_seconds(88_200, 44100), 2.0);
//! ```

/// Convert seconds to a frame offset (floor)
///
/// Negative or NaN inputs map to frame 0.
pub fn seconds_to_frames(seconds: f64, sample_rate: u32) -> usize {
    let frames = (seconds * sample_rate as f64).floor();
    if frames.is_nan() || frames <= 0.0 {
        0
    } else {
        frames as usize
    }
}

/// Convert a frame count to seconds
///
/// Returns 0.0 for a zero sample rate.
pub fn frames_to_seconds(frames: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    frames as f64 / sample_rate as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_to_frames_common_rates() {
        assert_eq!(seconds_to_frames(1.0, 44100), 44_100);
        assert_eq!(seconds_to_frames(4.0, 44100), 176_400);
        assert_eq!(seconds_to_frames(1.0, 48000), 48_000);
        assert_eq!(seconds_to_frames(0.0, 44100), 0);
    }

    #[test]
    fn test_seconds_to_frames_floors() {
        // 0.1s @ 44.1kHz = 4410 exactly; a hair less floors down
        assert_eq!(seconds_to_frames(0.1, 44100), 4410);
        assert_eq!(seconds_to_frames(1.0 / 44100.0 * 0.5, 44100), 0);
        assert_eq!(seconds_to_frames(2.9999, 10), 29);
    }

    #[test]
    fn test_seconds_to_frames_degenerate() {
        assert_eq!(seconds_to_frames(-1.0, 44100), 0);
        assert_eq!(seconds_to_frames(f64::NAN, 44100), 0);
    }

    #[test]
    fn test_frames_to_seconds() {
        assert_eq!(frames_to_seconds(44_100, 44100), 1.0);
        assert_eq!(frames_to_seconds(88_200, 44100), 2.0);
        assert_eq!(frames_to_seconds(0, 44100), 0.0);
        assert_eq!(frames_to_seconds(100, 0), 0.0);
    }
}
