//! Audit trail entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::enums::AuditSeverity;

pub const DEFAULT_AUDIT_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AuditLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub user_email: Option<String>,
    /// Dotted action name, e.g. `asset.issue`
    pub action: String,
    pub resource: String,
    pub resource_id: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    pub severity: AuditSeverity,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Caller address and agent, recorded with audit entries
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Entry to append to the audit trail
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub user_id: Option<Uuid>,
    pub user_email: Option<String>,
    pub action: String,
    pub resource: String,
    pub resource_id: Option<String>,
    pub details: Option<serde_json::Value>,
    pub severity: AuditSeverity,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl NewAuditEntry {
    pub fn new(action: &str, resource: &str, severity: AuditSeverity) -> Self {
        Self {
            user_id: None,
            user_email: None,
            action: action.to_string(),
            resource: resource.to_string(),
            resource_id: None,
            details: None,
            severity,
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn actor(mut self, user_id: Uuid, email: &str) -> Self {
        self.user_id = Some(user_id);
        self.user_email = Some(email.to_string());
        self
    }

    pub fn resource_id(mut self, id: impl ToString) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn client(mut self, client: &ClientInfo) -> Self {
        self.ip_address = client.ip_address.clone();
        self.user_agent = client.user_agent.clone();
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct AuditQuery {
    /// Look-back window in days (default 7)
    pub days: Option<i64>,
    pub action: Option<String>,
    pub severity: Option<AuditSeverity>,
    /// Search in user email, resource and action
    pub search: Option<String>,
    /// Export format (export endpoint only)
    pub format: Option<ExportFormat>,
}

impl AuditQuery {
    pub fn days(&self) -> i64 {
        self.days.filter(|d| *d > 0).unwrap_or(DEFAULT_AUDIT_DAYS)
    }
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct AuditSummary {
    pub total: i64,
    pub unique_users: i64,
    /// High and critical entries
    pub high_severity: i64,
    pub today: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_defaults_to_a_week() {
        assert_eq!(AuditQuery::default().days(), 7);
        let q = AuditQuery {
            days: Some(0),
            ..Default::default()
        };
        assert_eq!(q.days(), 7);
        let q = AuditQuery {
            days: Some(30),
            ..Default::default()
        };
        assert_eq!(q.days(), 30);
    }

    #[test]
    fn test_entry_builder() {
        let id = Uuid::new_v4();
        let entry = NewAuditEntry::new("asset.issue", "asset", AuditSeverity::Medium)
            .actor(id, "tech@cut.ac.zw")
            .resource_id(42);
        assert_eq!(entry.user_id, Some(id));
        assert_eq!(entry.resource_id.as_deref(), Some("42"));
        assert_eq!(entry.severity, AuditSeverity::Medium);
    }
}
