use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use serde_json::Value;

use crate::logging::{LogLevel, Logger, event_with_fields};
use crate::metrics::{FlowMetrics, MetricSnapshot};

use super::audit::{FlowAudit, FlowAuditEvent};

/// Logger, audit sink and metrics shared by every flow in a tree.
///
/// Children receive a clone of their parent's diagnostics when they are
/// started, so configuring the root is enough.
#[derive(Clone)]
pub struct Diagnostics {
    logger: Option<Logger>,
    audit: Option<Rc<dyn FlowAudit>>,
    metrics: Option<Rc<RefCell<FlowMetrics>>>,
    started_at: Instant,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            logger: None,
            audit: None,
            metrics: None,
            started_at: Instant::now(),
        }
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_audit<A>(mut self, audit: Rc<A>) -> Self
    where
        A: FlowAudit + 'static,
    {
        self.audit = Some(audit);
        self
    }

    /// Enable metrics collection if it has not already been configured.
    pub fn with_metrics(mut self) -> Self {
        if self.metrics.is_none() {
            self.metrics = Some(Rc::new(RefCell::new(FlowMetrics::new())));
        }
        self
    }

    pub fn logger(&self) -> Option<&Logger> {
        self.logger.as_ref()
    }

    pub fn metrics_handle(&self) -> Option<Rc<RefCell<FlowMetrics>>> {
        self.metrics.as_ref().map(Rc::clone)
    }

    pub fn snapshot(&self) -> Option<MetricSnapshot> {
        self.metrics
            .as_ref()
            .map(|metrics| metrics.borrow().snapshot(self.started_at.elapsed()))
    }

    /// Writes the current metrics snapshot through the logger, if both exist.
    pub fn emit_metrics(&self, target: &str) {
        if let (Some(logger), Some(snapshot)) = (self.logger.as_ref(), self.snapshot()) {
            let _ = logger.log_event(snapshot.to_log_event(target));
        }
    }

    pub(crate) fn log<I>(&self, level: LogLevel, target: &str, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        if let Some(logger) = self.logger.as_ref() {
            if logger.enabled(level) {
                let _ = logger.log_event(event_with_fields(level, target, message, fields));
            }
        }
    }

    pub(crate) fn audit(&self, build: impl FnOnce() -> FlowAuditEvent) {
        if let Some(audit) = self.audit.as_ref() {
            audit.record(build());
        }
    }

    pub(crate) fn record(&self, update: impl FnOnce(&mut FlowMetrics)) {
        if let Some(metrics) = self.metrics.as_ref() {
            update(&mut metrics.borrow_mut());
        }
    }
}
