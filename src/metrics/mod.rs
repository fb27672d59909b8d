use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::time::Duration;

/// Counters accumulated across one flow tree.
#[derive(Debug, Default, Clone)]
pub struct FlowMetrics {
    flows_started: u64,
    flows_completed: u64,
    children_released: u64,
    surfaces_presented: u64,
    resolutions: u64,
    resolution_misses: u64,
}

impl FlowMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_start(&mut self) {
        self.flows_started = self.flows_started.saturating_add(1);
    }

    pub fn record_completion(&mut self) {
        self.flows_completed = self.flows_completed.saturating_add(1);
    }

    pub fn record_released(&mut self, count: usize) {
        self.children_released = self.children_released.saturating_add(count as u64);
    }

    pub fn record_presentation(&mut self) {
        self.surfaces_presented = self.surfaces_presented.saturating_add(1);
    }

    pub fn record_resolution(&mut self, found: bool) {
        self.resolutions = self.resolutions.saturating_add(1);
        if !found {
            self.resolution_misses = self.resolution_misses.saturating_add(1);
        }
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            flows_started: self.flows_started,
            flows_completed: self.flows_completed,
            children_released: self.children_released,
            surfaces_presented: self.surfaces_presented,
            resolutions: self.resolutions,
            resolution_misses: self.resolution_misses,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub flows_started: u64,
    pub flows_completed: u64,
    pub children_released: u64,
    pub surfaces_presented: u64,
    pub resolutions: u64,
    pub resolution_misses: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "flow_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("flows_started".to_string(), json!(self.flows_started));
        map.insert("flows_completed".to_string(), json!(self.flows_completed));
        map.insert("children_released".to_string(), json!(self.children_released));
        map.insert("surfaces_presented".to_string(), json!(self.surfaces_presented));
        map.insert("resolutions".to_string(), json!(self.resolutions));
        map.insert("resolution_misses".to_string(), json!(self.resolution_misses));
        map
    }

    /// Children that were started but have neither completed nor been released.
    pub fn outstanding(&self) -> u64 {
        self.flows_started
            .saturating_sub(self.flows_completed)
            .saturating_sub(self.children_released)
    }
}
