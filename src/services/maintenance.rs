//! Maintenance scheduling

use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        audit::{ClientInfo, NewAuditEntry},
        enums::{AuditSeverity, MaintenanceType},
        maintenance::{
            CompleteMaintenance, CreateMaintenance, MaintenanceDetails, MaintenanceQuery, MaintenanceRecord,
            MaintenanceSummary,
        },
        profile::UserClaims,
    },
    repository::Repository,
    services::audit::AuditService,
};

#[derive(Clone)]
pub struct MaintenanceService {
    repository: Repository,
    audit: AuditService,
}

impl MaintenanceService {
    pub fn new(repository: Repository, audit: AuditService) -> Self {
        Self { repository, audit }
    }

    pub async fn list(&self, query: &MaintenanceQuery, now: DateTime<Utc>) -> AppResult<Vec<MaintenanceDetails>> {
        self.repository.maintenance_search(query, now.date_naive()).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<MaintenanceRecord> {
        self.repository.maintenance_get_by_id(id).await
    }

    pub async fn summary(&self, now: DateTime<Utc>) -> AppResult<MaintenanceSummary> {
        self.repository.maintenance_summary(now.date_naive()).await
    }

    /// Schedule work on an asset
    pub async fn schedule(
        &self,
        data: &CreateMaintenance,
        claims: &UserClaims,
        client: &ClientInfo,
    ) -> AppResult<MaintenanceRecord> {
        claims.require_issue_desk()?;
        data.validate()?;

        let record = self.repository.maintenance_create(data).await?;
        tracing::info!(
            maintenance_id = %record.id,
            asset_id = %record.asset_id,
            scheduled = %record.scheduled_date,
            "Maintenance scheduled"
        );
        let severity = match data.maintenance_type {
            MaintenanceType::Emergency => AuditSeverity::Medium,
            _ => AuditSeverity::Low,
        };
        self.audit
            .record(
                NewAuditEntry::new("maintenance.schedule", "maintenance", severity)
                    .actor(claims.sub, &claims.email)
                    .resource_id(record.id)
                    .details(json!({
                        "asset_id": record.asset_id,
                        "type": record.maintenance_type,
                        "scheduled_date": record.scheduled_date,
                    }))
                    .client(client),
            )
            .await;
        Ok(record)
    }

    /// Begin scheduled work; the asset is taken out of circulation
    pub async fn start(
        &self,
        id: Uuid,
        claims: &UserClaims,
        client: &ClientInfo,
        now: DateTime<Utc>,
    ) -> AppResult<MaintenanceRecord> {
        claims.require_issue_desk()?;

        let record = self.repository.maintenance_start(id, now).await?;
        tracing::info!(maintenance_id = %record.id, asset_id = %record.asset_id, "Maintenance started");
        self.audit
            .record(
                NewAuditEntry::new("maintenance.start", "maintenance", AuditSeverity::Low)
                    .actor(claims.sub, &claims.email)
                    .resource_id(record.id)
                    .client(client),
            )
            .await;
        Ok(record)
    }

    pub async fn complete(
        &self,
        id: Uuid,
        data: &CompleteMaintenance,
        claims: &UserClaims,
        client: &ClientInfo,
        now: DateTime<Utc>,
    ) -> AppResult<MaintenanceRecord> {
        claims.require_issue_desk()?;

        let record = self.repository.maintenance_complete(id, data, now).await?;
        tracing::info!(maintenance_id = %record.id, asset_id = %record.asset_id, "Maintenance completed");
        self.audit
            .record(
                NewAuditEntry::new("maintenance.complete", "maintenance", AuditSeverity::Low)
                    .actor(claims.sub, &claims.email)
                    .resource_id(record.id)
                    .details(json!({
                        "completed_date": record.completed_date,
                        "cost": record.cost,
                    }))
                    .client(client),
            )
            .await;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AppError, models::enums::Role};

    fn staff() -> UserClaims {
        let now = Utc::now().timestamp();
        UserClaims {
            sub: Uuid::new_v4(),
            sid: "s".into(),
            email: "staff@cut.ac.zw".into(),
            role: Role::Staff,
            exp: now + 60,
            iat: now,
        }
    }

    #[tokio::test]
    async fn test_staff_cannot_start_or_complete_work() {
        let repository = Repository::offline();
        let service = MaintenanceService::new(repository.clone(), AuditService::new(repository));
        let client = ClientInfo::default();

        let started = service.start(Uuid::new_v4(), &staff(), &client, Utc::now()).await;
        assert!(matches!(started, Err(AppError::Authorization(_))));

        let completed = service
            .complete(Uuid::new_v4(), &CompleteMaintenance::default(), &staff(), &client, Utc::now())
            .await;
        assert!(matches!(completed, Err(AppError::Authorization(_))));
    }
}
