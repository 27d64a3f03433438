//! # Swarm Events
//!
//! Push events streamed to connected clients while a run is in progress.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::board::AgentStatusBoard;

/// Severity of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A line in the run log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Seconds since the Unix epoch, fractional
    pub timestamp: f64,
    #[serde(rename = "type")]
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().timestamp_micros() as f64 / 1_000_000.0,
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Navigation,
}

/// Something the simulated browser did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserActivity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub url: String,
}

impl BrowserActivity {
    pub fn navigation(url: impl Into<String>) -> Self {
        Self {
            kind: ActivityKind::Navigation,
            url: url.into(),
        }
    }
}

/// An event pushed to clients, serialized as `{"event": ..., "data": ...}`
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum AssistantEvent {
    /// Full status board snapshot
    AgentStatus(AgentStatusBoard),
    AgentLog(LogEntry),
    BrowserActivity(BrowserActivity),
    /// Human-readable current task
    CurrentTask(String),
}

impl AssistantEvent {
    /// Channel name used by push transports
    pub fn name(&self) -> &'static str {
        match self {
            AssistantEvent::AgentStatus(_) => "agent_status",
            AssistantEvent::AgentLog(_) => "agent_log",
            AssistantEvent::BrowserActivity(_) => "browser_activity",
            AssistantEvent::CurrentTask(_) => "current_task",
        }
    }

    /// Payload without the envelope
    pub fn data(&self) -> serde_json::Value {
        let value = match self {
            AssistantEvent::AgentStatus(board) => serde_json::to_value(board),
            AssistantEvent::AgentLog(entry) => serde_json::to_value(entry),
            AssistantEvent::BrowserActivity(activity) => serde_json::to_value(activity),
            AssistantEvent::CurrentTask(task) => serde_json::to_value(task),
        };
        value.unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swarm::board::AgentState;

    #[test]
    fn test_log_entry_wire_shape() {
        let entry = LogEntry::success("done");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "success");
        assert_eq!(json["message"], "done");
        assert!(json["timestamp"].as_f64().unwrap() > 1_600_000_000.0);
    }

    #[test]
    fn test_event_envelope() {
        let event = AssistantEvent::BrowserActivity(BrowserActivity::navigation(
            "https://www.kayak.com/search?q=rome",
        ));
        assert_eq!(event.name(), "browser_activity");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "browser_activity");
        assert_eq!(json["data"]["type"], "navigation");
        assert_eq!(json["data"], event.data());
    }

    #[test]
    fn test_status_event_carries_board() {
        let event = AssistantEvent::AgentStatus(AgentStatusBoard::filled(AgentState::Idle));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "agent_status");
        assert_eq!(json["data"]["price_comparison"], "idle");
    }
}
