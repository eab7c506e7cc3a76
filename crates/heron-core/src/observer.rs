//! Diagnostic events emitted while applying headers.
//!
//! The applicator reports what it does to an injected [`ApplyObserver`]
//! instead of writing to a process-wide logger, so hosts choose where the
//! events go and tests can assert on them.

use std::fmt;

use parking_lot::Mutex;

/// When a merge pass runs relative to the downstream chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Before the downstream continuation runs.
    BeforeDownstream,
    /// After the downstream continuation returned successfully.
    AfterDownstream,
}

impl Phase {
    /// Returns the phase name used in logs and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeDownstream => "before_downstream",
            Self::AfterDownstream => "after_downstream",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyEvent {
    /// A merge pass is starting.
    PhaseStarted {
        /// The phase being run.
        phase: Phase,
        /// Number of configured headers.
        headers: usize,
    },
    /// A value was appended as a new header instance.
    HeaderAdded {
        /// Header name.
        name: String,
        /// The appended value.
        value: String,
    },
    /// Configured values were merged into an existing header.
    HeaderMerged {
        /// Header name.
        name: String,
        /// The value found on the response.
        existing: String,
        /// The single value written back.
        merged: String,
    },
}

/// Receives [`ApplyEvent`]s from the applicator.
pub trait ApplyObserver: Send + Sync {
    /// Called once per event, in order.
    fn on_event(&self, event: &ApplyEvent);
}

/// Emits events as `tracing` debug records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ApplyObserver for TracingObserver {
    fn on_event(&self, event: &ApplyEvent) {
        match event {
            ApplyEvent::PhaseStarted { phase, headers } => {
                tracing::debug!(phase = %phase, headers = headers, "Applying configured headers");
            }
            ApplyEvent::HeaderAdded { name, value } => {
                tracing::debug!(header = %name, value = %value, "Header added");
            }
            ApplyEvent::HeaderMerged {
                name,
                existing,
                merged,
            } => {
                tracing::debug!(
                    header = %name,
                    existing = %existing,
                    merged = %merged,
                    "Header merged"
                );
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ApplyObserver for NoopObserver {
    fn on_event(&self, _event: &ApplyEvent) {}
}

/// Stores events in memory for later inspection.
///
/// # Example
///
/// ```
/// use heron_core::observer::{ApplyEvent, ApplyObserver, Phase, RecordingObserver};
///
/// let observer = RecordingObserver::new();
/// observer.on_event(&ApplyEvent::PhaseStarted { phase: Phase::AfterDownstream, headers: 2 });
/// assert_eq!(observer.events().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ApplyEvent>>,
}

impl RecordingObserver {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<ApplyEvent> {
        self.events.lock().clone()
    }

    /// Removes and returns the recorded events.
    pub fn take(&self) -> Vec<ApplyEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl ApplyObserver for RecordingObserver {
    fn on_event(&self, event: &ApplyEvent) {
        self.events.lock().push(event.clone());
    }
}
