//! Observability sinks for coordinator outcomes.
//!
//! Every failed fetch or mutation, every local not-found, and every
//! successful mutation is described by an [`OperationReport`] and handed to
//! an [`ObservabilitySink`]. The UI-facing error is returned separately; the
//! sink is for diagnostics and notifications.

use std::sync::Arc;

use outreach_core::project::ProjectId;
use outreach_events::{EventBus, PlatformEvent};
use serde_json::json;

use crate::error::{CoordinatorError, Operation};

/// Severity of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLevel {
    Info,
    Warn,
    Error,
}

impl ReportLevel {
    fn outcome(self) -> &'static str {
        match self {
            ReportLevel::Info => "succeeded",
            ReportLevel::Warn => "warning",
            ReportLevel::Error => "failed",
        }
    }
}

/// Structured description of something the coordinator did or failed to do.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationReport {
    pub level: ReportLevel,
    pub operation: Operation,
    pub project_id: Option<ProjectId>,
    /// Human-readable summary, suitable for a toast.
    pub message: String,
    /// Underlying cause, when the report is about a failure.
    pub cause: Option<String>,
}

impl OperationReport {
    pub fn info(operation: Operation, project_id: Option<ProjectId>, message: impl Into<String>) -> Self {
        Self {
            level: ReportLevel::Info,
            operation,
            project_id,
            message: message.into(),
            cause: None,
        }
    }

    /// Describe a coordinator error. Local not-found is a warning; the rest are errors.
    pub fn from_error(operation: Operation, err: &CoordinatorError) -> Self {
        let level = match err {
            CoordinatorError::NotFoundLocally { .. } | CoordinatorError::Validation(_) => {
                ReportLevel::Warn
            }
            _ => ReportLevel::Error,
        };
        Self {
            level,
            operation: err.operation().unwrap_or(operation),
            project_id: err.project_id().cloned(),
            message: err.to_string(),
            cause: err.store_error().map(ToString::to_string),
        }
    }

    /// Dot-separated event name, e.g. `project.update.failed`.
    pub fn event_type(&self) -> String {
        format!("project.{}.{}", self.operation, self.level.outcome())
    }
}

/// Destination for [`OperationReport`]s.
pub trait ObservabilitySink: Send + Sync {
    fn report(&self, report: &OperationReport);
}

/// Emits reports as structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ObservabilitySink for TracingSink {
    fn report(&self, report: &OperationReport) {
        let project_id = report.project_id.as_ref().map(ProjectId::as_str);
        let cause = report.cause.as_deref();
        match report.level {
            ReportLevel::Info => tracing::info!(
                operation = %report.operation,
                project_id,
                "{}",
                report.message
            ),
            ReportLevel::Warn => tracing::warn!(
                operation = %report.operation,
                project_id,
                cause,
                "{}",
                report.message
            ),
            ReportLevel::Error => tracing::error!(
                operation = %report.operation,
                project_id,
                cause,
                "{}",
                report.message
            ),
        }
    }
}

/// Publishes reports on the [`EventBus`], where
/// [`EventPersistence`](outreach_events::EventPersistence) can record them.
#[derive(Clone)]
pub struct EventBusSink {
    bus: Arc<EventBus>,
}

impl EventBusSink {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }
}

impl ObservabilitySink for EventBusSink {
    fn report(&self, report: &OperationReport) {
        let mut event = PlatformEvent::new(report.event_type()).with_payload(json!({
            "operation": report.operation.as_str(),
            "message": report.message,
            "cause": report.cause,
        }));
        if let Some(id) = &report.project_id {
            event = event.with_source("project", id.as_str());
        }
        self.bus.publish(event);
    }
}

/// Forwards every report to each of its sinks in order.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn ObservabilitySink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn ObservabilitySink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl ObservabilitySink for FanoutSink {
    fn report(&self, report: &OperationReport) {
        for sink in &self.sinks {
            sink.report(report);
        }
    }
}
