//! Core audio data types
//!
//! `SampleBuffer` is the in-memory representation passed between every
//! pipeline stage (decoder → trimmer → mixer → encoder).

use crate::error::{Error, Result};
use bgmix_common::timing::frames_to_seconds;

/// SampleBuffer holds decoded multi-channel audio.
///
/// **Format:**
/// - Samples are f32, nominally -1.0 to 1.0 (may exceed before clipping)
/// - Planar: one `Vec<f32>` per channel, all the same length
/// - `sample_rate` applies to every channel
///
/// Buffers are immutable once built. Each stage returns a freshly allocated
/// buffer instead of modifying its input.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
    frame_count: usize,
}

/// Largest channel count whose 16-bit block align still fits a `u16`
pub const MAX_CHANNELS: u16 = u16::MAX / 2;

impl SampleBuffer {
    /// Create a buffer from planar channel data
    ///
    /// # Errors
    /// - `sample_rate` is 0
    /// - no channels, or more than `MAX_CHANNELS` channels
    /// - channels of differing length
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::InvalidBuffer("sample rate must be positive".to_string()));
        }
        if channels.is_empty() {
            return Err(Error::InvalidBuffer("at least one channel is required".to_string()));
        }
        if channels.len() > MAX_CHANNELS as usize {
            return Err(Error::InvalidBuffer(format!(
                "{} channels exceeds the maximum of {}",
                channels.len(),
                MAX_CHANNELS
            )));
        }

        let frame_count = channels[0].len();
        if let Some((idx, ch)) = channels
            .iter()
            .enumerate()
            .find(|(_, ch)| ch.len() != frame_count)
        {
            return Err(Error::InvalidBuffer(format!(
                "channel {} has {} frames, expected {}",
                idx,
                ch.len(),
                frame_count
            )));
        }

        Ok(Self {
            sample_rate,
            channels,
            frame_count,
        })
    }

    /// Create a buffer of silence
    pub fn silent(sample_rate: u32, channel_count: u16, frame_count: usize) -> Result<Self> {
        Self::new(sample_rate, vec![vec![0.0; frame_count]; channel_count as usize])
    }

    /// Create a buffer from interleaved samples ([L, R, L, R, ...])
    ///
    /// # Errors
    /// - `channel_count` is 0
    /// - `samples.len()` is not a whole number of frames
    pub fn from_interleaved(samples: &[f32], sample_rate: u32, channel_count: u16) -> Result<Self> {
        if channel_count == 0 {
            return Err(Error::InvalidBuffer("at least one channel is required".to_string()));
        }
        let num_channels = channel_count as usize;
        if samples.len() % num_channels != 0 {
            return Err(Error::InvalidBuffer(format!(
                "{} interleaved samples is not a multiple of {} channels",
                samples.len(),
                num_channels
            )));
        }

        let frame_count = samples.len() / num_channels;
        let mut channels = vec![Vec::with_capacity(frame_count); num_channels];
        for frame in samples.chunks_exact(num_channels) {
            for (ch, &sample) in channels.iter_mut().zip(frame) {
                ch.push(sample);
            }
        }

        Self::new(sample_rate, channels)
    }

    /// Samples per second
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels (always >= 1)
    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    /// Samples per channel
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Get duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        frames_to_seconds(self.frame_count, self.sample_rate)
    }

    /// Samples of one channel, or `None` past the last channel
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// All channels in order
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Single sample, or `None` if out of range
    pub fn sample(&self, channel: usize, frame: usize) -> Option<f32> {
        self.channels.get(channel).and_then(|ch| ch.get(frame)).copied()
    }

    /// True when the buffer holds no frames
    pub fn is_empty(&self) -> bool {
        self.frame_count == 0
    }
}
