// ==============================================================================
// report.rs - Deletion Failure Reporting
// ==============================================================================
// Description: Pushes system warnings to a room when a file could not be
//              securely deleted
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DeletionError;
use crate::models::file_name_of;

/// Chat message shown to every client in a room, flagged as a system warning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemWarning {
    pub id: String,
    pub username: String,
    pub user_id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub room: String,
    pub is_system: bool,
    pub is_warning: bool,
}

impl SystemWarning {
    pub fn new(room: &str, text: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: "system".to_string(),
            user_id: "system".to_string(),
            text,
            timestamp: Utc::now(),
            room: room.to_string(),
            is_system: true,
            is_warning: true,
        }
    }
}

/// Delivery of a warning to all connections joined to a room
pub trait Broadcaster: Send + Sync {
    fn broadcast(&self, room: &str, warning: SystemWarning);
}

/// In-process fan-out; the transport subscribes and forwards by room
#[derive(Clone)]
pub struct ChannelBroadcaster {
    sender: broadcast::Sender<SystemWarning>,
}

impl ChannelBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SystemWarning> {
        self.sender.subscribe()
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn broadcast(&self, room: &str, warning: SystemWarning) {
        // No connected clients is not an error
        if self.sender.send(warning).is_err() {
            debug!("No subscribers for warnings in room {}", room);
        }
    }
}

/// Writes warnings to the log as JSON (used when no transport is attached)
#[derive(Debug, Default, Clone, Copy)]
pub struct LogBroadcaster;

impl Broadcaster for LogBroadcaster {
    fn broadcast(&self, room: &str, warning: SystemWarning) {
        match serde_json::to_string(&warning) {
            Ok(json) => info!(target: "room_warning", room = %room, "{}", json),
            Err(e) => warn!("Failed to serialize warning for room {}: {}", room, e),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullBroadcaster;

impl Broadcaster for NullBroadcaster {
    fn broadcast(&self, _room: &str, _warning: SystemWarning) {}
}

/// Turns deletion failures into log lines and room warnings
#[derive(Clone)]
pub struct FailureReporter {
    broadcaster: Arc<dyn Broadcaster>,
    enabled: bool,
}

impl FailureReporter {
    pub fn new(broadcaster: Arc<dyn Broadcaster>, enabled: bool) -> Self {
        Self {
            broadcaster,
            enabled,
        }
    }

    /// Log the failure and, when a room is known, warn its clients
    pub fn report(&self, room: Option<&str>, path: &Path, error: &DeletionError) {
        let text = failure_text(path, error);
        warn!(
            room = room.unwrap_or("-"),
            stage = ?error.stage(),
            "{}",
            text
        );

        if !self.enabled {
            return;
        }
        if let Some(room) = room {
            self.broadcaster.broadcast(room, SystemWarning::new(room, text));
        }
    }
}

fn failure_text(path: &Path, error: &DeletionError) -> String {
    format!(
        "File {} could not be securely deleted ({}): {}",
        file_name_of(path),
        path.display(),
        error
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_error() -> DeletionError {
        DeletionError::Unlink {
            path: PathBuf::from("/srv/uploads/lobby/alice/a.png"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        }
    }

    #[test]
    fn test_warning_serializes_like_chat_message() {
        let warning = SystemWarning::new("lobby", "careful".to_string());
        let json = serde_json::to_value(&warning).unwrap();

        assert_eq!(json["username"], "system");
        assert_eq!(json["userId"], "system");
        assert_eq!(json["isSystem"], true);
        assert_eq!(json["isWarning"], true);
        assert_eq!(json["room"], "lobby");
    }

    #[tokio::test]
    async fn test_report_reaches_room_subscribers() {
        let channel = ChannelBroadcaster::new(8);
        let mut rx = channel.subscribe();
        let reporter = FailureReporter::new(Arc::new(channel), true);

        let path = Path::new("/srv/uploads/lobby/alice/a.png");
        reporter.report(Some("lobby"), path, &sample_error());

        let warning = rx.recv().await.unwrap();
        assert_eq!(warning.room, "lobby");
        assert!(warning.text.contains("a.png"));
        assert!(warning.text.contains("/srv/uploads/lobby/alice/a.png"));
        assert!(warning.is_warning);
    }

    #[test]
    fn test_no_broadcast_without_room_or_when_disabled() {
        let channel = ChannelBroadcaster::new(8);
        let mut rx = channel.subscribe();
        let path = Path::new("/srv/uploads/a.png");

        FailureReporter::new(Arc::new(channel.clone()), true).report(None, path, &sample_error());
        FailureReporter::new(Arc::new(channel), false).report(Some("lobby"), path, &sample_error());

        assert!(rx.try_recv().is_err());
    }
}
