//! Flow lifecycle audit hooks.
//!
//! Controllers report their major transitions here so callers can buffer,
//! log or assert on how a flow tree evolved without reaching into it.

use std::cell::RefCell;
use std::time::SystemTime;

use serde_json::Value;

use super::FlowId;

/// Distinct lifecycle checkpoints reported by flow controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowAuditStage {
    /// A flow's `start` returned successfully.
    FlowStarted,
    /// A child was stored in its parent's registry.
    ChildRegistered,
    /// A child left its parent's registry after completing.
    ChildReleased,
    /// A parent dropped all of its children at once.
    ChildrenCleared,
    /// A flow reported its result.
    FlowCompleted,
    /// A scope was created for a starting child.
    ScopeCreated,
    /// A scope released its cached instances.
    ScopeTornDown,
    /// A surface was shown through a transition.
    SurfacePresented,
    /// A tab finished configuring.
    TabAttached,
    /// A tab failed to configure and was skipped.
    TabSkipped,
    /// The visible tab changed or was reselected.
    TabSelected,
}

#[derive(Debug, Clone)]
pub struct FlowAuditEvent {
    pub timestamp: SystemTime,
    pub stage: FlowAuditStage,
    pub flow: Option<FlowId>,
    pub details: Vec<(String, Value)>,
}

impl FlowAuditEvent {
    pub fn builder(stage: FlowAuditStage) -> FlowAuditEventBuilder {
        FlowAuditEventBuilder::new(stage)
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

pub struct FlowAuditEventBuilder {
    event: FlowAuditEvent,
}

impl FlowAuditEventBuilder {
    pub fn new(stage: FlowAuditStage) -> Self {
        Self {
            event: FlowAuditEvent {
                timestamp: SystemTime::now(),
                stage,
                flow: None,
                details: Vec::new(),
            },
        }
    }

    pub fn flow(mut self, id: FlowId) -> Self {
        self.event.flow = Some(id);
        self
    }

    pub fn detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.event.details.push((key.into(), value.into()));
        self
    }

    pub fn finish(self) -> FlowAuditEvent {
        self.event
    }
}

pub trait FlowAudit {
    fn record(&self, event: FlowAuditEvent);
}

#[derive(Debug, Default)]
pub struct NullFlowAudit;

impl FlowAudit for NullFlowAudit {
    fn record(&self, _event: FlowAuditEvent) {}
}

/// Buffers every event in order.
#[derive(Debug, Default)]
pub struct RecordingFlowAudit {
    events: RefCell<Vec<FlowAuditEvent>>,
}

impl RecordingFlowAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<FlowAuditEvent> {
        self.events.borrow().clone()
    }

    pub fn stages(&self) -> Vec<FlowAuditStage> {
        self.events.borrow().iter().map(|event| event.stage).collect()
    }

    pub fn count(&self, stage: FlowAuditStage) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| event.stage == stage)
            .count()
    }
}

impl FlowAudit for RecordingFlowAudit {
    fn record(&self, event: FlowAuditEvent) {
        self.events.borrow_mut().push(event);
    }
}
