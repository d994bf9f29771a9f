//! Pretty/plain rendering of events and errors for terminal sinks (spec
//! §6.2's diagnostics discipline, carried over from the event-stream
//! formatting convention rather than introduced fresh).
//!
//! This is presentation only: nothing here feeds back into scheduling or
//! state. A caller wires a [`TelemetryFormatter`] into whatever sink prints
//! to a terminal or log aggregator.

use crate::errors::NodeFailure;
use crate::events::StateEvent;
use crate::trace::ErrorRecord;

pub const CONTEXT_COLOR: &str = "\x1b[32m"; // green
pub const LINE_COLOR: &str = "\x1b[35m"; // magenta / dark pink
pub const ERROR_COLOR: &str = "\x1b[31m"; // red
pub const RESET_COLOR: &str = "\x1b[0m";

/// Rendered output for a telemetry item that can be consumed by sinks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventRender {
    pub context: Option<String>,
    pub lines: Vec<String>,
}

impl EventRender {
    #[must_use]
    pub fn join_lines(&self) -> String {
        self.lines.join("")
    }
}

pub trait TelemetryFormatter: Send + Sync {
    fn render_event(&self, event: &StateEvent) -> EventRender;
    fn render_errors(&self, errors: &[ErrorRecord]) -> Vec<EventRender>;
}

/// ANSI-colored rendering for an interactive terminal.
pub struct PlainFormatter;

fn event_line(event: &StateEvent) -> String {
    match event {
        StateEvent::NodeEntered { node_id, .. } => format!("-> entered '{node_id}'"),
        StateEvent::NodeExited { node_id, .. } => format!("<- exited '{node_id}'"),
        StateEvent::NodeError { node_id, error, .. } => format!("!! '{node_id}' failed: {error}"),
        StateEvent::WorkflowCompleted { .. } => "== workflow completed".to_string(),
        StateEvent::WorkflowFailed { error, .. } => format!("== workflow failed: {error}"),
    }
}

impl TelemetryFormatter for PlainFormatter {
    fn render_event(&self, event: &StateEvent) -> EventRender {
        let line = format!("{LINE_COLOR}{}{RESET_COLOR}\n", event_line(event));
        EventRender {
            context: event.node_id().map(str::to_string),
            lines: vec![line],
        }
    }

    fn render_errors(&self, errors: &[ErrorRecord]) -> Vec<EventRender> {
        errors
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let mut lines = Vec::new();
                let scope_str = format!("{CONTEXT_COLOR}{}{RESET_COLOR}", e.node_id);
                lines.push(format!("[{}] {} | {}\n", i, e.timestamp, scope_str));
                lines.push(format!("{ERROR_COLOR}  error: {}{RESET_COLOR}\n", e.error));
                EventRender {
                    context: Some(e.node_id.clone()),
                    lines,
                }
            })
            .collect()
    }
}

/// Un-colored rendering for log aggregators that strip or choke on ANSI
/// escapes (CI logs, `tracing-subscriber`'s non-ANSI writer).
pub struct BareFormatter;

impl TelemetryFormatter for BareFormatter {
    fn render_event(&self, event: &StateEvent) -> EventRender {
        EventRender {
            context: event.node_id().map(str::to_string),
            lines: vec![format!("{}\n", event_line(event))],
        }
    }

    fn render_errors(&self, errors: &[ErrorRecord]) -> Vec<EventRender> {
        errors
            .iter()
            .map(|e| EventRender {
                context: Some(e.node_id.clone()),
                lines: vec![format!("[{}] {}: {}\n", e.timestamp, e.node_id, e.error)],
            })
            .collect()
    }
}

/// Renders a [`NodeFailure`] the way `miette`'s `Diagnostic` would, minus
/// the terminal-width source-span machinery: a one-line summary plus the
/// diagnostic code, for sinks that don't have a `miette::GraphicalReportHandler`.
#[must_use]
pub fn render_node_failure(failure: &NodeFailure) -> String {
    format!("{ERROR_COLOR}{failure}{RESET_COLOR}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::WorkflowState;

    fn state() -> WorkflowState {
        WorkflowState::new("w1", "t1")
    }

    #[test]
    fn plain_formatter_colors_a_node_entered_event() {
        let event = StateEvent::node_entered("exec-1", "a", state(), None);
        let render = PlainFormatter.render_event(&event);
        assert_eq!(render.context.as_deref(), Some("a"));
        assert!(render.join_lines().contains("entered 'a'"));
        assert!(render.join_lines().starts_with(LINE_COLOR));
    }

    #[test]
    fn bare_formatter_emits_no_ansi_escapes() {
        let event = StateEvent::node_error("exec-1", "a", state(), None, "boom", None);
        let render = BareFormatter.render_event(&event);
        assert!(!render.join_lines().contains('\x1b'));
        assert!(render.join_lines().contains("boom"));
    }

    #[test]
    fn render_errors_includes_node_id_and_message() {
        let errors = vec![ErrorRecord {
            node_id: "a".into(),
            error: "boom".into(),
            timestamp: chrono::Utc::now(),
        }];
        let rendered = PlainFormatter.render_errors(&errors);
        assert_eq!(rendered.len(), 1);
        assert!(rendered[0].join_lines().contains("boom"));
    }

    #[test]
    fn node_failure_renders_with_diagnostic_message() {
        let failure = NodeFailure::Timeout { node_id: "a".into(), duration_ms: 30_000 };
        let rendered = render_node_failure(&failure);
        assert!(rendered.contains("timed out"));
    }
}
