//! Asset requests raised by staff and reviewed by the issue desk

use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        audit::{ClientInfo, NewAuditEntry},
        enums::AuditSeverity,
        profile::UserClaims,
        request::{AssetRequest, AssetRequestDetails, CreateAssetRequest, RequestQuery, ReviewRequest},
    },
    repository::Repository,
    services::audit::AuditService,
};

#[derive(Clone)]
pub struct RequestsService {
    repository: Repository,
    audit: AuditService,
}

impl RequestsService {
    pub fn new(repository: Repository, audit: AuditService) -> Self {
        Self { repository, audit }
    }

    pub async fn create(
        &self,
        data: &CreateAssetRequest,
        claims: &UserClaims,
        client: &ClientInfo,
        now: DateTime<Utc>,
    ) -> AppResult<AssetRequest> {
        data.validate()?;
        if data.requested_date < now.date_naive() {
            return Err(AppError::Validation("Requested date cannot be in the past".to_string()));
        }
        if matches!(data.expected_return_date, Some(r) if r < data.requested_date) {
            return Err(AppError::Validation(
                "Expected return date must not precede the requested date".to_string(),
            ));
        }

        let request = self.repository.requests_create(claims.sub, data).await?;
        tracing::info!(request_id = %request.id, category = %request.asset_category, "Asset requested");
        self.audit
            .record(
                NewAuditEntry::new("request.create", "asset_request", AuditSeverity::Low)
                    .actor(claims.sub, &claims.email)
                    .resource_id(request.id)
                    .details(json!({
                        "category": request.asset_category,
                        "priority": request.priority,
                    }))
                    .client(client),
            )
            .await;
        Ok(request)
    }

    /// Requests raised by the caller
    pub async fn mine(&self, claims: &UserClaims, query: &RequestQuery) -> AppResult<Vec<AssetRequestDetails>> {
        self.repository.requests_search(Some(claims.sub), query).await
    }

    /// Every request (issue desk)
    pub async fn list(&self, claims: &UserClaims, query: &RequestQuery) -> AppResult<Vec<AssetRequestDetails>> {
        claims.require_issue_desk()?;
        self.repository.requests_search(None, query).await
    }

    /// Approve, reject or mark fulfilled
    pub async fn review(
        &self,
        id: Uuid,
        review: &ReviewRequest,
        claims: &UserClaims,
        client: &ClientInfo,
        now: DateTime<Utc>,
    ) -> AppResult<AssetRequest> {
        claims.require_issue_desk()?;

        let current = self.repository.requests_get_by_id(id).await?;
        if !current.status.can_move_to(review.status) {
            return Err(AppError::BusinessRule(format!(
                "Request cannot move from {} to {}",
                current.status, review.status
            )));
        }

        let request = self
            .repository
            .requests_set_status(id, review.status, claims.sub, now)
            .await?;
        self.audit
            .record(
                NewAuditEntry::new("request.review", "asset_request", AuditSeverity::Low)
                    .actor(claims.sub, &claims.email)
                    .resource_id(request.id)
                    .details(json!({ "from": current.status, "to": request.status }))
                    .client(client),
            )
            .await;
        Ok(request)
    }
}
