//! Audio Test File Generation Utilities
//!
//! Generates simple WAV payloads with known characteristics (silence, sine
//! waves) entirely in memory, for feeding the decoders and the pipeline.

use hound::{WavSpec, WavWriter};
use std::f32::consts::PI;
use std::io::Cursor;

/// Standard test sample rate (44.1 kHz)
pub const TEST_SAMPLE_RATE: u32 = 44100;

fn spec(sample_rate: u32, channels: u16) -> WavSpec {
    WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

/// 16-bit WAV bytes from interleaved samples
pub fn wav_from_i16(sample_rate: u32, channels: u16, interleaved: &[i16]) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec(sample_rate, channels)).unwrap();
        for &sample in interleaved {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Silent 16-bit WAV of `frames` frames
pub fn silent_wav(sample_rate: u32, channels: u16, frames: usize) -> Vec<u8> {
    wav_from_i16(sample_rate, channels, &vec![0i16; frames * channels as usize])
}

/// Interleaved 16-bit sine samples, same signal on every channel
///
/// # Arguments
/// * `duration_ms` - Duration in milliseconds
/// * `frequency_hz` - Sine wave frequency in Hz (e.g., 440.0 for A4)
/// * `amplitude` - Amplitude 0.0-1.0
pub fn sine_samples(
    sample_rate: u32,
    channels: u16,
    duration_ms: u64,
    frequency_hz: f32,
    amplitude: f32,
) -> Vec<i16> {
    let total_frames = (sample_rate as u64 * duration_ms) / 1000;
    let amplitude_i16 = (amplitude * i16::MAX as f32) as i16;

    let mut interleaved = Vec::with_capacity(total_frames as usize * channels as usize);
    for frame_idx in 0..total_frames {
        let t = frame_idx as f32 / sample_rate as f32;
        let sample_i16 = ((2.0 * PI * frequency_hz * t).sin() * amplitude_i16 as f32) as i16;
        for _ in 0..channels {
            interleaved.push(sample_i16);
        }
    }
    interleaved
}

/// Sine wave 16-bit WAV (see `sine_samples`)
pub fn sine_wav(
    sample_rate: u32,
    channels: u16,
    duration_ms: u64,
    frequency_hz: f32,
    amplitude: f32,
) -> Vec<u8> {
    let samples = sine_samples(sample_rate, channels, duration_ms, frequency_hz, amplitude);
    wav_from_i16(sample_rate, channels, &samples)
}
