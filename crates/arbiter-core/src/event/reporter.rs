use std::sync::Mutex;

use log::log;

use crate::event::types::EngineEvent;

/// Sink for engine events.
///
/// Components hold an `Arc<dyn Reporter>` and report every state change
/// through it; the engine itself never prints.
pub trait Reporter: Send + Sync {
    fn report(&self, event: &EngineEvent);
}

/// Forwards events to the `log` facade at the event's severity
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, event: &EngineEvent) {
        log!(target: "arbiter", event.severity(), "[{}] {}", event.name(), event);
    }
}

/// Keeps every reported event in memory
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<EngineEvent>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events reported so far
    pub fn events(&self) -> Vec<EngineEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Names of the events reported so far, in order
    pub fn event_names(&self) -> Vec<&'static str> {
        self.events().iter().map(EngineEvent::name).collect()
    }

    pub fn clear(&self) {
        match self.events.lock() {
            Ok(mut events) => events.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, event: &EngineEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _event: &EngineEvent) {}
}
