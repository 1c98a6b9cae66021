//! Mix pipeline
//!
//! Orchestrates one mix job end to end:
//!
//! 1. Decode main and background (`run_async` decodes both concurrently)
//! 2. Trim main to the requested duration when it is shorter than main
//! 3. Mix background under main at the requested gain
//! 4. Encode the result as 16-bit PCM WAV
//!
//! Cancellation is checked at every stage boundary. Progress is published on
//! an optional `EventBus`; no subscriber is required.

use crate::audio::decoder::{build_decoder, DecodeContext, Decoder};
use crate::audio::{mixer, trim, wav, SampleBuffer};
use crate::error::{Error, InputRole, Result};
use crate::source::EncodedAudio;
use bgmix_common::config::TomlConfig;
use bgmix_common::events::{EventBus, MixEvent, MixStage};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One mix job
#[derive(Debug, Clone)]
pub struct MixRequest {
    /// Correlates events for this job
    pub job_id: Uuid,
    pub main: EncodedAudio,
    pub background: EncodedAudio,
    /// Background gain; not clamped
    pub gain: f32,
    /// Target length in seconds; `None` or non-positive keeps the full main track
    pub duration_secs: Option<f64>,
}

impl MixRequest {
    pub fn new(main: EncodedAudio, background: EncodedAudio, gain: f32) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            main,
            background,
            gain,
            duration_secs: None,
        }
    }

    pub fn with_duration(mut self, duration_secs: Option<f64>) -> Self {
        self.duration_secs = duration_secs;
        self
    }
}

/// Encoded result of a successful job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixOutput {
    pub job_id: Uuid,
    /// Complete WAV file
    pub wav: Vec<u8>,
    pub sample_rate: u32,
    pub channel_count: u16,
    pub frame_count: usize,
}

impl MixOutput {
    pub fn mime_type(&self) -> &'static str {
        wav::MIME_TYPE
    }

    pub fn duration_seconds(&self) -> f64 {
        bgmix_common::timing::frames_to_seconds(self.frame_count, self.sample_rate)
    }
}

/// Decode → trim → mix → encode
///
/// Cheap to clone; clones share the decoder and event bus.
#[derive(Clone)]
pub struct MixPipeline {
    decoder: Arc<dyn Decoder>,
    events: Option<EventBus>,
}

impl std::fmt::Debug for MixPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixPipeline")
            .field("decoder", &self.decoder.name())
            .field("events", &self.events)
            .finish()
    }
}

impl MixPipeline {
    pub fn new(decoder: Arc<dyn Decoder>) -> Self {
        Self {
            decoder,
            events: None,
        }
    }

    /// Pipeline with the configured decoder backend and an event bus of the
    /// configured capacity
    pub fn from_config(config: &TomlConfig, ctx: Arc<DecodeContext>) -> Result<Self> {
        config.validate()?;
        let decoder = build_decoder(config.mix.decoder, ctx);
        Ok(Self::new(decoder).with_events(EventBus::new(config.events.capacity)))
    }

    /// Publish progress events on `events`
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn decoder_name(&self) -> &'static str {
        self.decoder.name()
    }

    pub fn events(&self) -> Option<&EventBus> {
        self.events.as_ref()
    }

    /// Run a job to completion and return the WAV bytes
    pub fn process(&self, request: &MixRequest) -> Result<Vec<u8>> {
        self.run(request, &CancellationToken::new()).map(|output| output.wav)
    }

    /// Run a job on the current thread
    ///
    /// # Errors
    /// - `Decode` naming the input that failed
    /// - `Range`, `SampleRateMismatch` from the trim and mix stages
    /// - `Cancelled` if `cancel` fires before a stage boundary
    pub fn run(&self, request: &MixRequest, cancel: &CancellationToken) -> Result<MixOutput> {
        self.announce(request);

        let mut progress = Progress::new(self, request.job_id, cancel);
        let result = progress.check_cancelled().and_then(|_| {
            let main = decode_input(self.decoder.as_ref(), &request.main, InputRole::Main)?;
            let background =
                decode_input(self.decoder.as_ref(), &request.background, InputRole::Background)?;
            progress.complete(MixStage::Decode);
            progress.finish(main, background, request.gain, request.duration_secs)
        });

        self.report(request.job_id, &result, progress.last_stage);
        result
    }

    /// Run a job on the blocking pool, decoding both inputs concurrently
    pub async fn run_async(&self, request: MixRequest, cancel: CancellationToken) -> Result<MixOutput> {
        self.announce(&request);

        let job_id = request.job_id;
        let (result, last_stage) = self.run_blocking_stages(request, cancel).await;

        self.report(job_id, &result, last_stage);
        result
    }

    async fn run_blocking_stages(
        &self,
        request: MixRequest,
        cancel: CancellationToken,
    ) -> (Result<MixOutput>, Option<MixStage>) {
        if cancel.is_cancelled() {
            return (Err(Error::Cancelled), None);
        }

        let MixRequest {
            job_id,
            main,
            background,
            gain,
            duration_secs,
        } = request;

        let main_task = {
            let decoder = Arc::clone(&self.decoder);
            tokio::task::spawn_blocking(move || decode_input(decoder.as_ref(), &main, InputRole::Main))
        };
        let background_task = {
            let decoder = Arc::clone(&self.decoder);
            tokio::task::spawn_blocking(move || {
                decode_input(decoder.as_ref(), &background, InputRole::Background)
            })
        };

        let decoded = match tokio::try_join!(main_task, background_task) {
            Ok((Ok(main), Ok(background))) => (main, background),
            Ok((Err(e), _)) | Ok((_, Err(e))) => return (Err(e), None),
            Err(e) => return (Err(Error::Internal(format!("decode task failed: {}", e))), None),
        };

        let pipeline = self.clone();
        let remaining = tokio::task::spawn_blocking(move || {
            let mut progress = Progress::new(&pipeline, job_id, &cancel);
            progress.complete(MixStage::Decode);
            let result = progress.finish(decoded.0, decoded.1, gain, duration_secs);
            (result, progress.last_stage)
        })
        .await;

        match remaining {
            Ok(outcome) => outcome,
            Err(e) => (
                Err(Error::Internal(format!("mix task failed: {}", e))),
                Some(MixStage::Decode),
            ),
        }
    }

    fn announce(&self, request: &MixRequest) {
        info!(
            "Mix {} started: decoder={}, gain={}, duration={:?}",
            request.job_id,
            self.decoder.name(),
            request.gain,
            request.duration_secs
        );
        self.emit(MixEvent::MixStarted {
            job_id: request.job_id,
            gain: request.gain,
            duration_secs: request.duration_secs,
            timestamp: chrono::Utc::now(),
        });
    }

    fn report(&self, job_id: Uuid, result: &Result<MixOutput>, last_stage: Option<MixStage>) {
        let timestamp = chrono::Utc::now();
        match result {
            Ok(output) => {
                info!(
                    "Mix {} completed: {} bytes, {:.3}s @ {} Hz, {} ch",
                    job_id,
                    output.wav.len(),
                    output.duration_seconds(),
                    output.sample_rate,
                    output.channel_count
                );
                self.emit(MixEvent::MixCompleted {
                    job_id,
                    output_bytes: output.wav.len(),
                    duration_secs: output.duration_seconds(),
                    timestamp,
                });
            }
            Err(Error::Cancelled) => {
                info!("Mix {} cancelled after {:?}", job_id, last_stage);
                self.emit(MixEvent::MixCancelled {
                    job_id,
                    last_stage,
                    timestamp,
                });
            }
            Err(e) => {
                warn!("Mix {} failed: {}", job_id, e);
                self.emit(MixEvent::MixFailed {
                    job_id,
                    error: e.to_string(),
                    timestamp,
                });
            }
        }
    }

    fn emit(&self, event: MixEvent) {
        if let Some(events) = &self.events {
            events.emit_lossy(event);
        }
    }
}

fn decode_input(decoder: &dyn Decoder, input: &EncodedAudio, role: InputRole) -> Result<SampleBuffer> {
    debug!(
        "Decoding {} input: {} bytes, hint {:?}",
        role,
        input.len(),
        input.format_hint()
    );
    decoder
        .decode(&input.bytes, input.format_hint())
        .map_err(|source| Error::Decode { input: role, source })
}

/// Stage bookkeeping for one job
struct Progress<'a> {
    pipeline: &'a MixPipeline,
    job_id: Uuid,
    cancel: &'a CancellationToken,
    last_stage: Option<MixStage>,
}

impl<'a> Progress<'a> {
    fn new(pipeline: &'a MixPipeline, job_id: Uuid, cancel: &'a CancellationToken) -> Self {
        Self {
            pipeline,
            job_id,
            cancel,
            last_stage: None,
        }
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    fn complete(&mut self, stage: MixStage) {
        debug!("Mix {}: {} complete", self.job_id, stage);
        self.last_stage = Some(stage);
        self.pipeline.emit(MixEvent::StageCompleted {
            job_id: self.job_id,
            stage,
            progress_percent: stage.progress_percent(),
            timestamp: chrono::Utc::now(),
        });
    }

    /// Trim, mix and encode already-decoded inputs
    ///
    /// The trim stage is reported even when no trimming was needed.
    fn finish(
        &mut self,
        main: SampleBuffer,
        background: SampleBuffer,
        gain: f32,
        duration_secs: Option<f64>,
    ) -> Result<MixOutput> {
        self.check_cancelled()?;
        let main = match duration_secs {
            Some(target) if target > 0.0 && target < main.duration_seconds() => {
                trim::trim(&main, 0.0, target)?
            }
            _ => main,
        };
        self.complete(MixStage::Trim);

        self.check_cancelled()?;
        let mixed = mixer::mix(&main, &background, gain)?;
        self.complete(MixStage::Mix);

        self.check_cancelled()?;
        let wav = wav::encode(&mixed);
        self.complete(MixStage::Encode);

        Ok(MixOutput {
            job_id: self.job_id,
            wav,
            sample_rate: mixed.sample_rate(),
            channel_count: mixed.channel_count(),
            frame_count: mixed.frame_count(),
        })
    }
}
