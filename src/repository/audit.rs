//! Audit trail methods on Repository

use chrono::{DateTime, Utc};

use super::{Filters, Repository};
use crate::{
    error::AppResult,
    models::audit::{AuditLog, AuditQuery, AuditSummary, NewAuditEntry},
};

impl Repository {
    /// Append an entry to the audit trail
    pub async fn audit_insert(&self, entry: &NewAuditEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                user_id, user_email, action, resource, resource_id,
                details, severity, ip_address, user_agent
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(entry.user_id)
        .bind(&entry.user_email)
        .bind(&entry.action)
        .bind(&entry.resource)
        .bind(&entry.resource_id)
        .bind(&entry.details)
        .bind(entry.severity)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Entries created at or after `since`, newest first
    pub async fn audit_search(&self, query: &AuditQuery, since: DateTime<Utc>) -> AppResult<Vec<AuditLog>> {
        let mut filters = Filters::default();
        let p = filters.param(since.to_rfc3339());
        filters.raw(format!("created_at >= {}::timestamptz", p));
        if let Some(ref action) = query.action {
            filters.eq("action", action.trim());
        }
        if let Some(severity) = query.severity {
            filters.eq("severity", severity);
        }
        if let Some(ref search) = query.search {
            filters.search(&["user_email", "resource", "action"], search);
        }

        let sql = format!(
            "SELECT * FROM audit_logs WHERE {} ORDER BY created_at DESC",
            filters.where_clause()
        );
        let rows = filters
            .bind_as(sqlx::query_as::<_, AuditLog>(&sql))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Totals since `since`; `today` is counted from `day_start`
    pub async fn audit_summary(
        &self,
        since: DateTime<Utc>,
        day_start: DateTime<Utc>,
    ) -> AppResult<AuditSummary> {
        let (total, unique_users, high_severity, today) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(
                r#"
                SELECT COUNT(*),
                       COUNT(DISTINCT user_id),
                       COUNT(*) FILTER (WHERE severity IN ('high', 'critical')),
                       COUNT(*) FILTER (WHERE created_at >= $2)
                FROM audit_logs
                WHERE created_at >= $1
                "#,
            )
            .bind(since)
            .bind(day_start)
            .fetch_one(&self.pool)
            .await?;

        Ok(AuditSummary {
            total,
            unique_users,
            high_severity,
            today,
        })
    }
}
