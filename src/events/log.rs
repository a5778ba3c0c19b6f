//! Per-request in-memory event log.

use super::{EventSink, ToolEvent};
use std::sync::{Arc, Mutex};

type Renderer = Arc<dyn Fn(&ToolEvent) + Send + Sync>;

/// Collects the tool events of one request.
///
/// Clones share the same underlying list, so a handler can install one clone
/// as the sink and read the events back from another.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<ToolEvent>>>,
    renderer: Option<Renderer>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `render` for every event as it is recorded.
    pub fn with_renderer(mut self, render: impl Fn(&ToolEvent) + Send + Sync + 'static) -> Self {
        self.renderer = Some(Arc::new(render));
        self
    }

    /// Snapshot of every recorded event, oldest first.
    pub fn events(&self) -> Vec<ToolEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// The last `n` recorded events.
    pub fn recent(&self, n: usize) -> Vec<ToolEvent> {
        let events = self.events();
        let start = events.len().saturating_sub(n);
        events[start..].to_vec()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for EventLog {
    fn on_event(&self, event: &ToolEvent) -> anyhow::Result<()> {
        self.events
            .lock()
            .map_err(|_| anyhow::anyhow!("event log poisoned"))?
            .push(event.clone());

        if let Some(render) = &self.renderer {
            render(event);
        }
        Ok(())
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("events", &self.len())
            .field("renderer", &self.renderer.is_some())
            .finish()
    }
}
