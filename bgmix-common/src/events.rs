//! Event types for the bgmix event system
//!
//! The mix pipeline reports progress as a stream of `MixEvent`s broadcast over
//! an `EventBus`. Observing events is optional: the pipeline produces the same
//! output whether or not anyone subscribes.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Pipeline stage that just finished
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum MixStage {
    /// Both inputs decoded to sample buffers
    Decode,
    /// Main track trimmed to the target duration
    Trim,
    /// Main and background buffers mixed
    Mix,
    /// Mixed buffer serialized to WAV
    Encode,
}

impl MixStage {
    /// Overall progress reached when this stage completes
    pub fn progress_percent(&self) -> u8 {
        match self {
            MixStage::Decode => 40,
            MixStage::Trim => 50,
            MixStage::Mix => 80,
            MixStage::Encode => 100,
        }
    }
}

impl std::fmt::Display for MixStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MixStage::Decode => write!(f, "Decode"),
            MixStage::Trim => write!(f, "Trim"),
            MixStage::Mix => write!(f, "Mix"),
            MixStage::Encode => write!(f, "Encode"),
        }
    }
}

/// bgmix event types
///
/// Events can be serialized (e.g. to JSON lines) for an external UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MixEvent {
    /// A mix job started
    MixStarted {
        job_id: Uuid,
        /// Background gain requested
        gain: f32,
        /// Target duration requested, if any
        duration_secs: Option<f64>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A pipeline stage completed
    StageCompleted {
        job_id: Uuid,
        stage: MixStage,
        /// Overall progress (0-100)
        progress_percent: u8,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A mix job produced its WAV output
    MixCompleted {
        job_id: Uuid,
        /// Size of the WAV payload in bytes
        output_bytes: usize,
        /// Duration of the mixed audio in seconds
        duration_secs: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A mix job failed; no output was produced
    MixFailed {
        job_id: Uuid,
        error: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A mix job was cancelled between stages
    MixCancelled {
        job_id: Uuid,
        /// Last stage that completed before cancellation
        last_stage: Option<MixStage>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl MixEvent {
    /// Job this event belongs to
    pub fn job_id(&self) -> Uuid {
        match self {
            MixEvent::MixStarted { job_id, .. }
            | MixEvent::StageCompleted { job_id, .. }
            | MixEvent::MixCompleted { job_id, .. }
            | MixEvent::MixFailed { job_id, .. }
            | MixEvent::MixCancelled { job_id, .. } => *job_id,
        }
    }

    /// Get event type as string (for logging and filtering)
    pub fn event_type(&self) -> &'static str {
        match self {
            MixEvent::MixStarted { .. } => "MixStarted",
            MixEvent::StageCompleted { .. } => "StageCompleted",
            MixEvent::MixCompleted { .. } => "MixCompleted",
            MixEvent::MixFailed { .. } => "MixFailed",
            MixEvent::MixCancelled { .. } => "MixCancelled",
        }
    }

    /// True for the event that ends a job
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MixEvent::MixCompleted { .. } | MixEvent::MixFailed { .. } | MixEvent::MixCancelled { .. }
        )
    }
}

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the pipeline)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use bgmix_common::events::{EventBus, MixEvent, MixStage};
///
/// let event_bus = EventBus::new(16);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(MixEvent::StageCompleted {
///     job_id: uuid::Uuid::new_v4(),
///     stage: MixStage::Decode,
///     progress_percent: MixStage::Decode.progress_percent(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(MixEvent::StageCompleted { .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MixEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0 (tokio::broadcast requirement).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<MixEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: MixEvent) -> Result<usize, broadcast::error::SendError<MixEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: MixEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("capacity", &self.capacity)
            .field("subscribers", &self.tx.receiver_count())
            .finish()
    }
}
