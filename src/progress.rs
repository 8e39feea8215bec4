use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// One entry of the run event log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub timestamp: DateTime<Utc>,
    pub run_id: String,
    pub event_type: EventType,
    pub message: String,
    pub progress_percentage: f32,
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventType {
    RunStarted,
    TargetsCollected { count: usize },
    TargetRejected { input: String },
    RoutingSelected { mode: String },
    TorVerified,
    ProxyAccepted { proxy: String },
    ProxyRejected { proxy: String, reason: String },
    ToolStarted { tool_name: String, target: String },
    ToolCompleted { tool_name: String, target: String, exit_code: Option<i32> },
    ToolFailed { tool_name: String, target: String, error: String },
    RunCompleted { invocations: usize, failures: usize },
    RunFailed { error: String },
}

/// Records run events in memory and, when a path is set, appends them as JSONL
#[derive(Clone)]
pub struct ProgressTracker {
    run_id: String,
    log_file: Option<PathBuf>,
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl ProgressTracker {
    pub fn new(run_id: String, log_file: Option<PathBuf>) -> Self {
        if let Some(parent) = log_file.as_ref().and_then(|p| p.parent()) {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).ok();
            }
        }

        Self {
            run_id,
            log_file,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// In-memory tracker with a fresh run id
    pub fn in_memory() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), None)
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn add_event(&self, event_type: EventType, message: String, progress: f32, details: Option<serde_json::Value>) {
        let event = ProgressEvent {
            timestamp: Utc::now(),
            run_id: self.run_id.clone(),
            event_type,
            message,
            progress_percentage: progress,
            details,
        };

        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }

        self.save_to_file(&event);
    }

    fn save_to_file(&self, event: &ProgressEvent) {
        let Some(ref log_file) = self.log_file else {
            return;
        };

        if let Ok(json) = serde_json::to_string(event) {
            if let Ok(mut file) = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)
            {
                use std::io::Write;
                writeln!(file, "{}", json).ok();
            }
        }
    }

    pub fn run_started(&self) {
        self.add_event(EventType::RunStarted, "Run started".to_string(), 0.0, None);
    }

    pub fn targets_collected(&self, count: usize) {
        self.add_event(
            EventType::TargetsCollected { count },
            format!("{} target(s) collected", count),
            0.0,
            None,
        );
    }

    pub fn target_rejected(&self, input: &str) {
        self.add_event(
            EventType::TargetRejected { input: input.to_string() },
            format!("Rejected target input: {}", input),
            0.0,
            None,
        );
    }

    pub fn routing_selected(&self, mode: &str) {
        self.add_event(
            EventType::RoutingSelected { mode: mode.to_string() },
            format!("Routing mode: {}", mode),
            0.0,
            None,
        );
    }

    pub fn tor_verified(&self, exit_info: &str) {
        self.add_event(
            EventType::TorVerified,
            "TOR connectivity verified".to_string(),
            0.0,
            Some(serde_json::json!({ "probe_response": exit_info.trim() })),
        );
    }

    pub fn proxy_accepted(&self, proxy: &str) {
        self.add_event(
            EventType::ProxyAccepted { proxy: proxy.to_string() },
            format!("Proxy {} is valid", proxy),
            0.0,
            None,
        );
    }

    pub fn proxy_rejected(&self, proxy: &str, reason: &str) {
        self.add_event(
            EventType::ProxyRejected {
                proxy: proxy.to_string(),
                reason: reason.to_string(),
            },
            format!("Proxy {} dropped: {}", proxy, reason),
            0.0,
            None,
        );
    }

    pub fn tool_started(&self, tool_name: &str, target: &str, command: &str, progress: f32) {
        self.add_event(
            EventType::ToolStarted {
                tool_name: tool_name.to_string(),
                target: target.to_string(),
            },
            format!("Running {} against {}", tool_name, target),
            progress,
            Some(serde_json::json!({ "command": command })),
        );
    }

    pub fn tool_completed(&self, tool_name: &str, target: &str, exit_code: Option<i32>, duration_ms: u128, progress: f32) {
        self.add_event(
            EventType::ToolCompleted {
                tool_name: tool_name.to_string(),
                target: target.to_string(),
                exit_code,
            },
            format!("{} finished against {}", tool_name, target),
            progress,
            Some(serde_json::json!({ "duration_ms": duration_ms as u64 })),
        );
    }

    pub fn tool_failed(&self, tool_name: &str, target: &str, error: &str, progress: f32) {
        self.add_event(
            EventType::ToolFailed {
                tool_name: tool_name.to_string(),
                target: target.to_string(),
                error: error.to_string(),
            },
            format!("{} failed against {}: {}", tool_name, target, error),
            progress,
            None,
        );
    }

    pub fn run_completed(&self, invocations: usize, failures: usize) {
        self.add_event(
            EventType::RunCompleted { invocations, failures },
            format!("Run completed: {} invocation(s), {} failure(s)", invocations, failures),
            100.0,
            None,
        );
    }

    pub fn run_failed(&self, error: &str) {
        self.add_event(
            EventType::RunFailed { error: error.to_string() },
            format!("Run failed: {}", error),
            0.0,
            None,
        );
    }

    pub fn get_events(&self) -> Vec<ProgressEvent> {
        if let Ok(events) = self.events.lock() {
            events.clone()
        } else {
            Vec::new()
        }
    }

    /// Read back a JSONL event log, skipping lines that do not parse
    pub fn read_events_from_file(log_file: &Path) -> Vec<ProgressEvent> {
        let mut events = Vec::new();

        if let Ok(content) = fs::read_to_string(log_file) {
            for line in content.lines() {
                if let Ok(event) = serde_json::from_str::<ProgressEvent>(line) {
                    events.push(event);
                }
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_kept_in_memory() {
        let tracker = ProgressTracker::in_memory();
        tracker.run_started();
        tracker.tool_failed("nmap", "example.com", "exit status 1", 12.5);

        let events = tracker.get_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, EventType::RunStarted);
        assert!(matches!(events[1].event_type, EventType::ToolFailed { .. }));
        assert_eq!(events[1].run_id, tracker.run_id());
    }

    #[test]
    fn test_jsonl_log_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("logs").join("events.jsonl");
        let tracker = ProgressTracker::new("run-1".to_string(), Some(log.clone()));

        tracker.routing_selected("tor");
        tracker.run_completed(16, 2);

        let events = ProgressTracker::read_events_from_file(&log);
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1].event_type,
            EventType::RunCompleted { invocations: 16, failures: 2 }
        );
        assert_eq!(events[1].progress_percentage, 100.0);
    }
}
