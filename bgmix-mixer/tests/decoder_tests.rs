//! Decoder backend tests against generated WAV payloads

mod helpers;

use bgmix_mixer::audio::{DecodeContext, Decoder, PcmWavDecoder, SymphoniaDecoder};
use bgmix_mixer::DecodeError;
use helpers::{silent_wav, sine_samples, wav_from_i16, TEST_SAMPLE_RATE};
use std::io::Cursor;
use std::sync::Arc;

fn symphonia() -> SymphoniaDecoder {
    SymphoniaDecoder::new(Arc::new(DecodeContext::new()))
}

fn wav_with_bits(sample_rate: u32, bits_per_sample: u16, samples: &[i32]) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

#[test]
fn test_sine_decodes_to_expected_values() {
    let samples = sine_samples(TEST_SAMPLE_RATE, 1, 50, 440.0, 0.5);
    let bytes = wav_from_i16(TEST_SAMPLE_RATE, 1, &samples);

    for decoder in [&symphonia() as &dyn Decoder, &PcmWavDecoder] {
        let buffer = decoder.decode(&bytes, Some("wav")).unwrap();
        assert_eq!(buffer.frame_count(), samples.len(), "{}", decoder.name());

        for (i, &expected) in samples.iter().enumerate() {
            let got = buffer.sample(0, i).unwrap();
            assert!(
                (got - expected as f32 / 32768.0).abs() < 1e-4,
                "{}: frame {} decoded {} expected {}",
                decoder.name(),
                i,
                got,
                expected
            );
        }
    }
}

#[test]
fn test_pcm_wav_bit_depths_normalize_to_unit_range() {
    // Half of full scale at each depth
    let cases = [(8u16, 64i32), (16, 16_384), (24, 4_194_304)];
    for (bits, half) in cases {
        let bytes = wav_with_bits(8000, bits, &[half, -half, 0]);
        let buffer = PcmWavDecoder.decode(&bytes, None).unwrap();

        assert_eq!(buffer.channel(0), Some(&[0.5, -0.5, 0.0][..]), "{} bit", bits);
    }
}

#[test]
fn test_symphonia_24_bit() {
    let bytes = wav_with_bits(48000, 24, &[4_194_304, -4_194_304]);
    let buffer = symphonia().decode(&bytes, Some("wav")).unwrap();

    assert_eq!(buffer.sample_rate(), 48000);
    assert!((buffer.sample(0, 0).unwrap() - 0.5).abs() < 1e-4);
    assert!((buffer.sample(0, 1).unwrap() + 0.5).abs() < 1e-4);
}

#[test]
fn test_multichannel_layout_preserved() {
    let frames = 100;
    let interleaved: Vec<i16> = (0..frames)
        .flat_map(|_| [1000i16, 2000, 3000, 4000, 5000, 6000])
        .collect();
    let bytes = wav_from_i16(TEST_SAMPLE_RATE, 6, &interleaved);

    let buffer = PcmWavDecoder.decode(&bytes, None).unwrap();
    assert_eq!(buffer.channel_count(), 6);
    assert_eq!(buffer.frame_count(), frames);
    for ch in 0..6 {
        let expected = (ch as f32 + 1.0) * 1000.0 / 32768.0;
        assert!(buffer.channel(ch).unwrap().iter().all(|&s| s == expected));
    }
}

#[test]
fn test_empty_wav_decodes_to_empty_buffer() {
    let bytes = silent_wav(TEST_SAMPLE_RATE, 2, 0);

    let buffer = PcmWavDecoder.decode(&bytes, None).unwrap();
    assert!(buffer.is_empty());
    assert_eq!(buffer.channel_count(), 2);
}

#[test]
fn test_truncated_header_is_probe_error() {
    let bytes = silent_wav(TEST_SAMPLE_RATE, 1, 100);

    assert!(matches!(
        PcmWavDecoder.decode(&bytes[..20], None),
        Err(DecodeError::Probe(_))
    ));
    assert!(symphonia().decode(&bytes[..20], Some("wav")).is_err());
}

#[test]
fn test_context_shared_between_decoders() {
    let ctx = Arc::new(DecodeContext::new());
    let a = SymphoniaDecoder::new(Arc::clone(&ctx));
    let b = SymphoniaDecoder::new(Arc::clone(&ctx));
    let bytes = silent_wav(22050, 1, 2205);

    assert_eq!(a.decode(&bytes, None).unwrap(), b.decode(&bytes, None).unwrap());
    assert_eq!(Arc::strong_count(&ctx), 3);
}
