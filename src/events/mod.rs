//! Tool lifecycle events and the swappable sink they are reported to.
//!
//! A request handler installs a sink on an [`EventBus`] before running the
//! pipeline; tools emit [`ToolEvent`]s into the bus while they work. Delivery
//! is best-effort: a failing or panicking sink never disturbs the tool that
//! emitted the event.
//!
//! The bus holds a single slot, so it assumes one request at a time. Callers
//! that need isolation create their own bus and hand it to the tools instead
//! of using [`EventBus::global`].

mod log;

pub use log::EventLog;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, OnceLock, RwLock};
use tracing::debug;

/// A lifecycle event reported by a tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolEvent {
    /// The tool was invoked with (redacted) arguments.
    Call { tool: String, args: Value },
    /// The tool produced output; `preview` is redacted and length-capped.
    Result { tool: String, preview: Value },
    /// The tool hit a non-fatal error.
    Error { tool: String, error: String },
    /// The tool finished. Always the last event of an invocation.
    End { tool: String },
}

impl ToolEvent {
    /// Name of the tool that emitted this event.
    pub fn tool(&self) -> &str {
        match self {
            ToolEvent::Call { tool, .. }
            | ToolEvent::Result { tool, .. }
            | ToolEvent::Error { tool, .. }
            | ToolEvent::End { tool } => tool,
        }
    }

    /// Event type tag as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolEvent::Call { .. } => "call",
            ToolEvent::Result { .. } => "result",
            ToolEvent::Error { .. } => "error",
            ToolEvent::End { .. } => "end",
        }
    }
}

impl std::fmt::Display for ToolEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolEvent::Call { tool, args } => write!(f, "{} called with {}", tool, args),
            ToolEvent::Result { tool, preview } => match preview.as_str() {
                Some(text) => write!(f, "{} result preview: {}", tool, text),
                None => write!(f, "{} result preview: {}", tool, preview),
            },
            ToolEvent::Error { tool, error } => write!(f, "{} error: {}", tool, error),
            ToolEvent::End { tool } => write!(f, "{} finished", tool),
        }
    }
}

/// Receiver for tool events.
///
/// Errors returned here are discarded by the bus.
pub trait EventSink: Send + Sync {
    fn on_event(&self, event: &ToolEvent) -> anyhow::Result<()>;
}

impl<F> EventSink for F
where
    F: Fn(&ToolEvent) -> anyhow::Result<()> + Send + Sync,
{
    fn on_event(&self, event: &ToolEvent) -> anyhow::Result<()> {
        self(event)
    }
}

/// A single optional sink slot.
#[derive(Default)]
pub struct EventBus {
    slot: RwLock<Option<Arc<dyn EventSink>>>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide bus.
    pub fn global() -> Arc<EventBus> {
        static GLOBAL: OnceLock<Arc<EventBus>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(EventBus::new())).clone()
    }

    /// Install `sink`, replacing any previous one.
    pub fn install(&self, sink: Arc<dyn EventSink>) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(sink);
    }

    /// Remove the active sink, if any.
    pub fn uninstall(&self) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }

    /// Whether a sink is currently installed.
    pub fn is_installed(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Install `sink` until the returned guard is dropped.
    pub fn scoped(self: &Arc<Self>, sink: Arc<dyn EventSink>) -> SinkGuard {
        self.install(sink);
        SinkGuard { bus: self.clone() }
    }

    /// Deliver `event` to the installed sink. Never fails.
    pub fn emit(&self, event: ToolEvent) {
        // Release the lock before calling out so a sink may touch the bus.
        let sink = self
            .slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        let Some(sink) = sink else {
            return;
        };

        match catch_unwind(AssertUnwindSafe(|| sink.on_event(&event))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("Event sink rejected {} event: {}", event.kind(), e),
            Err(_) => debug!("Event sink panicked on {} event", event.kind()),
        }
    }
}

/// Uninstalls the bus's sink when dropped.
#[must_use = "the sink is removed as soon as the guard is dropped"]
pub struct SinkGuard {
    bus: Arc<EventBus>,
}

impl Drop for SinkGuard {
    fn drop(&mut self) {
        self.bus.uninstall();
    }
}

/// Install a sink on the process-wide bus.
pub fn install(sink: Arc<dyn EventSink>) {
    EventBus::global().install(sink);
}

/// Clear the process-wide bus.
pub fn uninstall() {
    EventBus::global().uninstall();
}

/// Emit an event on the process-wide bus.
pub fn emit(event: ToolEvent) {
    EventBus::global().emit(event);
}
