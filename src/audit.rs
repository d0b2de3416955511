// ==============================================================================
// audit.rs - Audit Logging for Secure Deletion
// ==============================================================================
// Description: Audit trail for every terminal outcome of a deletion request
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    // Single files
    FileDeleted,
    SymlinkRemoved,
    FileDeleteFailed,

    // Batches
    MessageFilesDeleted,
    RoomDeleted,
    StorageWiped,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogSeverity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    pub room: Option<String>,
    pub user_id: Option<String>,
    pub resource: Option<String>,
    pub result: String,
    pub details: serde_json::Value,
    pub severity: LogSeverity,
}

impl AuditEvent {
    pub fn new(
        event_type: AuditEventType,
        room: Option<String>,
        user_id: Option<String>,
        resource: Option<String>,
        details: serde_json::Value,
    ) -> Self {
        let (severity, result) = match event_type {
            AuditEventType::FileDeleteFailed => (LogSeverity::Error, "failure"),
            AuditEventType::StorageWiped => (LogSeverity::Warning, "success"),
            _ => (LogSeverity::Info, "success"),
        };

        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event_type,
            room,
            user_id,
            resource,
            result: result.to_string(),
            details,
            severity,
        }
    }

    /// Emit on the `audit` target so it can be routed separately
    pub fn log(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!(target: "audit", "Failed to serialize audit event {}: {}", self.id, e);
                return;
            }
        };

        match self.severity {
            LogSeverity::Info => info!(target: "audit", "{}", json),
            LogSeverity::Warning => warn!(target: "audit", "{}", json),
            LogSeverity::Error => error!(target: "audit", "{}", json),
        }
    }
}

/// Convenience function to log an audit event
pub fn log_event(
    event_type: AuditEventType,
    room: Option<&str>,
    user_id: Option<&str>,
    resource: Option<String>,
    details: serde_json::Value,
) {
    AuditEvent::new(
        event_type,
        room.map(str::to_string),
        user_id.map(str::to_string),
        resource,
        details,
    )
    .log();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_event_creation() {
        let event = AuditEvent::new(
            AuditEventType::FileDeleted,
            Some("lobby".to_string()),
            Some("alice".to_string()),
            Some("/uploads/lobby/alice/a.png".to_string()),
            serde_json::json!({ "size": 1024, "medium": "SSD" }),
        );

        assert_eq!(event.room.as_deref(), Some("lobby"));
        assert_eq!(event.result, "success");
        assert_eq!(event.severity, LogSeverity::Info);
    }

    #[test]
    fn test_failure_event_severity() {
        let event = AuditEvent::new(
            AuditEventType::FileDeleteFailed,
            None,
            None,
            None,
            serde_json::json!({}),
        );

        assert_eq!(event.severity, LogSeverity::Error);
        assert_eq!(event.result, "failure");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "file_delete_failed");
    }
}
