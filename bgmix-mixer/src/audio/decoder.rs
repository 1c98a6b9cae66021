//! Audio decoding backends
//!
//! Turns an encoded byte payload into a planar `SampleBuffer` at the source's
//! native sample rate and channel layout. Nothing is resampled or remixed here.
//!
//! Two backends implement `Decoder`:
//! - `SymphoniaDecoder`: any container/codec registered in a `DecodeContext`
//!   (WAV, MP3, AAC/MP4, FLAC, Ogg Vorbis)
//! - `PcmWavDecoder`: uncompressed WAV only, via hound
//!
//! The backend is picked once (`build_decoder`) and shared by every job.

use crate::audio::types::SampleBuffer;
use crate::error::DecodeError;
use bgmix_common::config::DecoderBackend;
use std::io::Cursor;
use std::sync::Arc;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{CodecRegistry, Decoder as _, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::IntoSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::{Hint, Probe};
use symphonia::core::sample::Sample;
use tracing::{debug, warn};

/// Decodes an encoded payload into a `SampleBuffer`
///
/// `format_hint` is a file-extension-like string ("wav", "mp3", …) that
/// backends may use to speed up or disambiguate probing.
pub trait Decoder: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Decode a complete payload
    fn decode(&self, bytes: &[u8], format_hint: Option<&str>) -> Result<SampleBuffer, DecodeError>;
}

/// Codec and container registries used by `SymphoniaDecoder`
///
/// Built once at startup and shared through an `Arc`; there is no global
/// registry.
pub struct DecodeContext {
    codecs: CodecRegistry,
    probe: Probe,
}

impl DecodeContext {
    /// Registries populated with every codec and format enabled at build time
    pub fn new() -> Self {
        let mut codecs = CodecRegistry::new();
        symphonia::default::register_enabled_codecs(&mut codecs);

        let mut probe = Probe::default();
        symphonia::default::register_enabled_formats(&mut probe);

        Self { codecs, probe }
    }

    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    pub fn probe(&self) -> &Probe {
        &self.probe
    }
}

impl Default for DecodeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DecodeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeContext").finish_non_exhaustive()
    }
}

/// Build the decoder for the configured backend
pub fn build_decoder(backend: DecoderBackend, ctx: Arc<DecodeContext>) -> Arc<dyn Decoder> {
    match backend {
        DecoderBackend::Symphonia => Arc::new(SymphoniaDecoder::new(ctx)),
        DecoderBackend::PcmWav => Arc::new(PcmWavDecoder),
    }
}

/// General-purpose decoder backed by symphonia
#[derive(Debug, Clone)]
pub struct SymphoniaDecoder {
    ctx: Arc<DecodeContext>,
}

impl SymphoniaDecoder {
    pub fn new(ctx: Arc<DecodeContext>) -> Self {
        Self { ctx }
    }
}

impl Decoder for SymphoniaDecoder {
    fn name(&self) -> &'static str {
        "symphonia"
    }

    fn decode(&self, bytes: &[u8], format_hint: Option<&str>) -> Result<SampleBuffer, DecodeError> {
        debug!("Decoding {} bytes (hint: {:?})", bytes.len(), format_hint);

        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = format_hint {
            hint.with_extension(ext);
        }

        let probed = self
            .ctx
            .probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| DecodeError::Probe(e.to_string()))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(DecodeError::NoAudioTrack)?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let mut decoder = self
            .ctx
            .codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| DecodeError::UnsupportedCodec(e.to_string()))?;

        let mut sample_rate = codec_params.sample_rate;
        let mut channels: Vec<Vec<f32>> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(e) => {
                    let decoded_frames = channels.first().map(Vec::len).unwrap_or(0);
                    end_of_packets(e, decoded_frames)?;
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    if sample_rate.is_none() {
                        sample_rate = Some(decoded.spec().rate);
                    }
                    append_decoded(decoded, &mut channels);
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    // Corrupt packet; skip it and keep going
                    warn!("Decode error: {}", e);
                    continue;
                }
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => return Err(DecodeError::Malformed(e.to_string())),
            }
        }

        let sample_rate = sample_rate.filter(|&r| r > 0).ok_or(DecodeError::MissingSampleRate)?;

        if channels.is_empty() {
            // Nothing decoded; fall back to the declared layout for an empty buffer
            let declared = codec_params.channels.map(|c| c.count()).unwrap_or(0);
            if declared == 0 {
                return Err(DecodeError::Malformed("no audio frames decoded".to_string()));
            }
            channels = vec![Vec::new(); declared];
        }

        let buffer = SampleBuffer::new(sample_rate, channels)
            .map_err(|e| DecodeError::Malformed(e.to_string()))?;

        debug!(
            "Decoded {} frames, {} channels @ {} Hz",
            buffer.frame_count(),
            buffer.channel_count(),
            buffer.sample_rate()
        );

        Ok(buffer)
    }
}

/// Decide how a failed `next_packet` ends the read loop
///
/// End of stream is a clean finish. Any other error before the first frame
/// means the stream is unreadable; after it, the frames decoded so far are
/// kept and the rest is dropped.
fn end_of_packets(err: SymphoniaError, decoded_frames: usize) -> Result<(), DecodeError> {
    match err {
        SymphoniaError::IoError(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(()),
        e if decoded_frames == 0 => Err(DecodeError::Malformed(format!(
            "reading first packet: {}",
            e
        ))),
        e => {
            warn!("Error reading packet after {} frames, truncating: {}", decoded_frames, e);
            Ok(())
        }
    }
}

/// Append one decoded packet to the planar output, converting to f32
fn append_decoded(decoded: AudioBufferRef<'_>, channels: &mut Vec<Vec<f32>>) {
    match decoded {
        AudioBufferRef::U8(buf) => append_planar::<u8>(&buf, channels),
        AudioBufferRef::U16(buf) => append_planar::<u16>(&buf, channels),
        AudioBufferRef::U24(buf) => append_planar::<symphonia::core::sample::u24>(&buf, channels),
        AudioBufferRef::U32(buf) => append_planar::<u32>(&buf, channels),
        AudioBufferRef::S8(buf) => append_planar::<i8>(&buf, channels),
        AudioBufferRef::S16(buf) => append_planar::<i16>(&buf, channels),
        AudioBufferRef::S24(buf) => append_planar::<symphonia::core::sample::i24>(&buf, channels),
        AudioBufferRef::S32(buf) => append_planar::<i32>(&buf, channels),
        AudioBufferRef::F32(buf) => append_planar::<f32>(&buf, channels),
        AudioBufferRef::F64(buf) => append_planar::<f64>(&buf, channels),
    }
}

/// Channels that appear mid-stream are back-filled with silence; channels
/// missing from a packet are padded with silence so lengths stay equal.
fn append_planar<S>(buf: &AudioBuffer<S>, channels: &mut Vec<Vec<f32>>)
where
    S: Sample + IntoSample<f32>,
{
    let packet_channels = buf.spec().channels.count();
    let frames = buf.frames();
    let existing = channels.first().map(Vec::len).unwrap_or(0);

    while channels.len() < packet_channels {
        channels.push(vec![0.0; existing]);
    }

    for (idx, out) in channels.iter_mut().enumerate() {
        if idx < packet_channels {
            out.extend(buf.chan(idx).iter().map(|&s| <S as IntoSample<f32>>::into_sample(s)));
        } else {
            out.resize(existing + frames, 0.0);
        }
    }
}

/// Uncompressed WAV decoder backed by hound
///
/// Accepts integer PCM (8/16/24/32-bit) and 32-bit float. Ignores the format
/// hint: anything hound cannot parse is a probe failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct PcmWavDecoder;

impl Decoder for PcmWavDecoder {
    fn name(&self) -> &'static str {
        "pcm-wav"
    }

    fn decode(&self, bytes: &[u8], _format_hint: Option<&str>) -> Result<SampleBuffer, DecodeError> {
        let reader = hound::WavReader::new(Cursor::new(bytes))
            .map_err(|e| DecodeError::Probe(e.to_string()))?;
        let spec = reader.spec();

        debug!(
            "WAV: {} ch, {} Hz, {} bit {:?}",
            spec.channels, spec.sample_rate, spec.bits_per_sample, spec.sample_format
        );

        if spec.sample_rate == 0 {
            return Err(DecodeError::MissingSampleRate);
        }

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Int => {
                if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                    return Err(DecodeError::UnsupportedCodec(format!(
                        "{}-bit integer PCM",
                        spec.bits_per_sample
                    )));
                }
                let scale = (1u64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()
                    .map_err(|e| DecodeError::Malformed(e.to_string()))?
            }
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| DecodeError::Malformed(e.to_string()))?,
        };

        SampleBuffer::from_interleaved(&samples, spec.sample_rate, spec.channels)
            .map_err(|e| DecodeError::Malformed(e.to_string()))
    }
}
