//! bgmix-mixer - command-line entry point
//!
//! Mixes a background track under a main track and writes a 16-bit PCM WAV:
//!
//! ```text
//! bgmix-mixer voice.mp3 music.ogg -o out.wav --gain 0.3 --duration 30
//! ```
//!
//! Inputs are file paths or `data:<mime>;base64,...` URLs. Values not given on
//! the command line come from the TOML config (see `bgmix_common::config`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use bgmix_common::config::{DecoderBackend, DurationSetting, TomlConfig};
use bgmix_common::events::{EventBus, MixEvent};
use bgmix_mixer::audio::{DecodeContext, WavHeader};
use bgmix_mixer::{EncodedAudio, MixPipeline, MixRequest};
use clap::Parser;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for bgmix-mixer
#[derive(Parser, Debug)]
#[command(name = "bgmix-mixer")]
#[command(about = "Mix background music under a main audio track")]
#[command(version)]
struct Args {
    /// Main track: file path or data: URL
    main: String,

    /// Background track: file path or data: URL
    background: String,

    /// Output WAV file
    #[arg(short, long)]
    output: PathBuf,

    /// Background gain (default from config, 0.5)
    #[arg(short, long, allow_negative_numbers = true)]
    gain: Option<f32>,

    /// Output duration in seconds, or "auto" for the full main track
    #[arg(short, long)]
    duration: Option<DurationSetting>,

    /// Decoder backend: symphonia or pcm-wav
    #[arg(long)]
    decoder: Option<DecoderBackend>,

    /// Config file (overrides BGMIX_CONFIG and the user config)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print progress events to stdout as JSON lines
    #[arg(long)]
    json_events: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, source) =
        TomlConfig::resolve(args.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing
    let level = config.logging.level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("bgmix_mixer={0},bgmix_common={0}", level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    debug!("Configuration source: {:?}", source);

    let gain = args.gain.unwrap_or(config.mix.gain);
    let duration = args.duration.unwrap_or(config.mix.duration);
    let backend = args.decoder.unwrap_or(config.mix.decoder);

    info!(
        "Mixing {} under {} (gain {}, duration {}, decoder {})",
        describe_input(&args.background),
        describe_input(&args.main),
        gain,
        duration,
        backend
    );

    let main_input = load_input(&args.main).await?;
    let background_input = load_input(&args.background).await?;

    config.mix.decoder = backend;
    let pipeline = MixPipeline::from_config(&config, Arc::new(DecodeContext::new()))
        .context("Failed to build mix pipeline")?;
    let events = pipeline
        .events()
        .cloned()
        .context("Pipeline has no event bus")?;

    let logger = spawn_event_logger(&events, args.json_events);

    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    let request = MixRequest::new(main_input, background_input, gain)
        .with_duration(duration.as_seconds());
    let result = pipeline.run_async(request, cancel).await;

    // The terminal event has been emitted; let the logger drain it
    if let Err(e) = logger.await {
        warn!("Event logger stopped unexpectedly: {}", e);
    }

    let output = result.context("Mix failed")?;

    tokio::fs::write(&args.output, &output.wav)
        .await
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    let header = WavHeader::parse(&output.wav).context("Encoder produced an invalid WAV header")?;
    info!(
        "Wrote {} ({} bytes, {} Hz, {} ch, {} frames)",
        args.output.display(),
        output.wav.len(),
        header.sample_rate,
        header.num_channels,
        header.frame_count()
    );

    Ok(())
}

/// Read a path or decode a data: URL
async fn load_input(arg: &str) -> Result<EncodedAudio> {
    if arg.starts_with("data:") {
        return EncodedAudio::from_data_url(arg).context("Invalid data URL input");
    }

    let path = Path::new(arg);
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(EncodedAudio::from_path_bytes(path, bytes))
}

/// Short label for logs; data URLs can be megabytes long
fn describe_input(arg: &str) -> String {
    if arg.starts_with("data:") {
        let mime = arg
            .trim_start_matches("data:")
            .split(|c: char| c == ';' || c == ',')
            .next()
            .unwrap_or_default();
        format!("<data URL {}>", mime)
    } else {
        arg.to_string()
    }
}

/// Log progress events until the job's terminal event arrives
fn spawn_event_logger(events: &EventBus, json: bool) -> tokio::task::JoinHandle<()> {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if json {
                        match serde_json::to_string(&event) {
                            Ok(line) => println!("{}", line),
                            Err(e) => warn!("Failed to serialize {}: {}", event.event_type(), e),
                        }
                    }
                    match &event {
                        MixEvent::StageCompleted {
                            stage,
                            progress_percent,
                            ..
                        } => info!("[{:>3}%] {} done", progress_percent, stage),
                        other => debug!("Event: {}", other.event_type()),
                    }
                    if event.is_terminal() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event logger lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Cancel the running mix on Ctrl+C
fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, cancelling mix");
                cancel.cancel();
            }
            Err(e) => warn!("Failed to install Ctrl+C handler: {}", e),
        }
    });
}
