//! Audit trail service

use chrono::{DateTime, Duration, Utc};

use crate::{
    error::{AppError, AppResult},
    models::audit::{AuditLog, AuditQuery, AuditSummary, ExportFormat, NewAuditEntry},
    repository::Repository,
};

const CSV_HEADER: [&str; 10] = [
    "timestamp",
    "user_email",
    "action",
    "resource",
    "resource_id",
    "severity",
    "ip_address",
    "user_agent",
    "details",
    "id",
];

/// Exported audit log body with its content type
pub struct AuditExport {
    pub content_type: &'static str,
    pub filename: String,
    pub body: Vec<u8>,
}

#[derive(Clone)]
pub struct AuditService {
    repository: Repository,
}

impl AuditService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Append an entry. Failures are logged, never propagated: the audited
    /// operation has already happened.
    pub async fn record(&self, entry: NewAuditEntry) {
        if let Err(e) = self.repository.audit_insert(&entry).await {
            tracing::error!(action = %entry.action, "Failed to write audit entry: {}", e);
        }
    }

    fn since(query: &AuditQuery, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(query.days())
    }

    pub async fn list(&self, query: &AuditQuery, now: DateTime<Utc>) -> AppResult<Vec<AuditLog>> {
        self.repository.audit_search(query, Self::since(query, now)).await
    }

    pub async fn summary(&self, query: &AuditQuery, now: DateTime<Utc>) -> AppResult<AuditSummary> {
        let day_start = crate::models::issue::start_of_day(now.date_naive());
        self.repository
            .audit_summary(Self::since(query, now), day_start)
            .await
    }

    pub async fn export(&self, query: &AuditQuery, now: DateTime<Utc>) -> AppResult<AuditExport> {
        let logs = self.list(query, now).await?;
        let stamp = now.format("%Y-%m-%d");
        match query.format.unwrap_or_default() {
            ExportFormat::Csv => Ok(AuditExport {
                content_type: "text/csv; charset=utf-8",
                filename: format!("audit-logs-{}.csv", stamp),
                body: to_csv(&logs)?,
            }),
            ExportFormat::Json => Ok(AuditExport {
                content_type: "application/json",
                filename: format!("audit-logs-{}.json", stamp),
                body: serde_json::to_vec_pretty(&logs)
                    .map_err(|e| AppError::Internal(format!("Failed to encode audit export: {}", e)))?,
            }),
        }
    }
}

fn to_csv(logs: &[AuditLog]) -> AppResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let internal = |e: csv::Error| AppError::Internal(format!("Failed to write CSV: {}", e));

    writer.write_record(CSV_HEADER).map_err(internal)?;
    for log in logs {
        let details = log
            .details
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_default();
        writer
            .write_record([
                log.created_at.to_rfc3339(),
                log.user_email.clone().unwrap_or_default(),
                log.action.clone(),
                log.resource.clone(),
                log.resource_id.clone().unwrap_or_default(),
                log.severity.to_string(),
                log.ip_address.clone().unwrap_or_default(),
                log.user_agent.clone().unwrap_or_default(),
                details,
                log.id.to_string(),
            ])
            .map_err(internal)?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to flush CSV: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::AuditSeverity;
    use uuid::Uuid;

    #[test]
    fn test_csv_export_quotes_fields() {
        let log = AuditLog {
            id: Uuid::nil(),
            user_id: None,
            user_email: Some("admin@cut.ac.zw".into()),
            action: "asset.register".into(),
            resource: "asset".into(),
            resource_id: Some("CUT-PROJ-001".into()),
            details: Some(serde_json::json!({ "name": "Epson, EB-X41" })),
            severity: AuditSeverity::Low,
            ip_address: None,
            user_agent: None,
            created_at: Utc::now(),
        };
        let body = String::from_utf8(to_csv(&[log]).unwrap()).unwrap();
        let mut lines = body.lines();
        assert_eq!(
            lines.next().unwrap(),
            "timestamp,user_email,action,resource,resource_id,severity,ip_address,user_agent,details,id"
        );
        let row = lines.next().unwrap();
        assert!(row.contains(",admin@cut.ac.zw,asset.register,asset,CUT-PROJ-001,low,"));
        // The comma inside the JSON forces quoting
        assert!(row.contains("\"{\"\"name\"\":\"\"Epson, EB-X41\"\"}\""));
    }

    #[test]
    fn test_empty_export_has_header_only() {
        let body = String::from_utf8(to_csv(&[]).unwrap()).unwrap();
        assert_eq!(body.lines().count(), 1);
    }
}
