//! 16-bit PCM WAV encoder
//!
//! Writes the canonical 44-byte RIFF/WAVE header followed by interleaved
//! little-endian `i16` samples:
//!
//! ```text
//! Offset  Size  Field                Value
//! 0       4     ChunkID              "RIFF"
//! 4       4     ChunkSize (u32 LE)   36 + dataSize
//! 8       4     Format               "WAVE"
//! 12      4     Subchunk1ID          "fmt "
//! 16      4     Subchunk1Size (u32)  16
//! 20      2     AudioFormat (u16)    1
//! 22      2     NumChannels (u16)    channelCount
//! 24      4     SampleRate (u32)     sampleRate
//! 28      4     ByteRate (u32)       sampleRate*channelCount*2
//! 32      2     BlockAlign (u16)     channelCount*2
//! 34      2     BitsPerSample (u16)  16
//! 36      4     Subchunk2ID          "data"
//! 40      4     Subchunk2Size (u32)  dataSize
//! 44      N     Data                 interleaved s16 LE samples
//! ```

use crate::audio::types::SampleBuffer;
use crate::error::{Error, Result};
use std::io::Write;

/// Size of the canonical header in bytes
pub const HEADER_LEN: usize = 44;

/// MIME type of the encoded output
pub const MIME_TYPE: &str = "audio/wav";

const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: u16 = BITS_PER_SAMPLE / 8;
const FORMAT_PCM: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

/// Fields of a canonical PCM WAV header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub chunk_size: u32,
    pub audio_format: u16,
    pub num_channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

impl WavHeader {
    /// Header describing `buffer` encoded as 16-bit PCM
    ///
    /// Sizes that do not fit the 32-bit RIFF fields saturate at `u32::MAX`.
    pub fn for_buffer(buffer: &SampleBuffer) -> Self {
        let num_channels = buffer.channel_count();
        // SampleBuffer caps channels at MAX_CHANNELS, so this cannot overflow
        let block_align = num_channels * BYTES_PER_SAMPLE;
        let data_size = u32::try_from(buffer.frame_count() as u64 * block_align as u64)
            .unwrap_or(u32::MAX);

        Self {
            chunk_size: data_size.saturating_add(36),
            audio_format: FORMAT_PCM,
            num_channels,
            sample_rate: buffer.sample_rate(),
            byte_rate: buffer.sample_rate().saturating_mul(block_align as u32),
            block_align,
            bits_per_sample: BITS_PER_SAMPLE,
            data_size,
        }
    }

    /// Serialize to the 44-byte on-disk layout
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(b"RIFF");
        out[4..8].copy_from_slice(&self.chunk_size.to_le_bytes());
        out[8..12].copy_from_slice(b"WAVE");
        out[12..16].copy_from_slice(b"fmt ");
        out[16..20].copy_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
        out[20..22].copy_from_slice(&self.audio_format.to_le_bytes());
        out[22..24].copy_from_slice(&self.num_channels.to_le_bytes());
        out[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        out[28..32].copy_from_slice(&self.byte_rate.to_le_bytes());
        out[32..34].copy_from_slice(&self.block_align.to_le_bytes());
        out[34..36].copy_from_slice(&self.bits_per_sample.to_le_bytes());
        out[36..40].copy_from_slice(b"data");
        out[40..44].copy_from_slice(&self.data_size.to_le_bytes());
        out
    }

    /// Parse the canonical 44-byte header at the start of `bytes`
    ///
    /// Only the canonical layout written by `encode` is accepted: `fmt `
    /// immediately after `WAVE`, 16-byte format chunk, `data` at offset 36.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::InvalidWav(format!(
                "{} bytes is shorter than the {}-byte header",
                bytes.len(),
                HEADER_LEN
            )));
        }

        let tag = |offset: usize, expected: &[u8; 4]| -> Result<()> {
            if &bytes[offset..offset + 4] == expected {
                Ok(())
            } else {
                Err(Error::InvalidWav(format!(
                    "expected {:?} at offset {}",
                    String::from_utf8_lossy(expected),
                    offset
                )))
            }
        };
        let u16_at = |offset: usize| u16::from_le_bytes([bytes[offset], bytes[offset + 1]]);
        let u32_at = |offset: usize| {
            u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
        };

        tag(0, b"RIFF")?;
        tag(8, b"WAVE")?;
        tag(12, b"fmt ")?;
        if u32_at(16) != FMT_CHUNK_LEN {
            return Err(Error::InvalidWav(format!(
                "fmt chunk size {} (expected {})",
                u32_at(16),
                FMT_CHUNK_LEN
            )));
        }
        tag(36, b"data")?;

        Ok(Self {
            chunk_size: u32_at(4),
            audio_format: u16_at(20),
            num_channels: u16_at(22),
            sample_rate: u32_at(24),
            byte_rate: u32_at(28),
            block_align: u16_at(32),
            bits_per_sample: u16_at(34),
            data_size: u32_at(40),
        })
    }

    /// Frames described by `data_size`
    pub fn frame_count(&self) -> usize {
        if self.block_align == 0 {
            return 0;
        }
        self.data_size as usize / self.block_align as usize
    }
}

/// Convert one float sample to signed 16-bit PCM
///
/// Negative samples scale by 32768, non-negative by 32767, after clamping to
/// [-1.0, 1.0]; the result is rounded. NaN maps to silence.
///
/// The product is taken in `f64`, where it is exact; an `f32` product would
/// round values just below a half step up to it.
pub fn sample_to_i16(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    if sample < 0.0 {
        (f64::from(sample.max(-1.0)) * 32768.0).round() as i16
    } else {
        (f64::from(sample.min(1.0)) * 32767.0).round() as i16
    }
}

/// Encode `buffer` as a complete WAV file in memory
pub fn encode(buffer: &SampleBuffer) -> Vec<u8> {
    let header = WavHeader::for_buffer(buffer);
    let mut out = Vec::with_capacity(HEADER_LEN + header.data_size as usize);
    out.extend_from_slice(&header.to_bytes());
    append_samples(buffer, &mut out);
    out
}

/// Stream `buffer` as a WAV file into `writer`
///
/// Produces exactly the same bytes as `encode`.
pub fn encode_into<W: Write>(buffer: &SampleBuffer, writer: &mut W) -> std::io::Result<()> {
    writer.write_all(&WavHeader::for_buffer(buffer).to_bytes())?;

    // Convert in bounded chunks so large buffers never double in memory
    const FRAMES_PER_CHUNK: usize = 4096;
    let block_align = buffer.channel_count() as usize * BYTES_PER_SAMPLE as usize;
    let mut scratch = Vec::with_capacity(FRAMES_PER_CHUNK * block_align);

    let mut frame = 0;
    while frame < buffer.frame_count() {
        let end = (frame + FRAMES_PER_CHUNK).min(buffer.frame_count());
        scratch.clear();
        append_frames(buffer, frame..end, &mut scratch);
        writer.write_all(&scratch)?;
        frame = end;
    }

    writer.flush()
}

fn append_samples(buffer: &SampleBuffer, out: &mut Vec<u8>) {
    append_frames(buffer, 0..buffer.frame_count(), out);
}

/// Interleave frames `range`: channel 0, channel 1, … then the next frame
fn append_frames(buffer: &SampleBuffer, range: std::ops::Range<usize>, out: &mut Vec<u8>) {
    let channels = buffer.channels();
    for frame in range {
        for ch in channels {
            out.extend_from_slice(&sample_to_i16(ch[frame]).to_le_bytes());
        }
    }
}
