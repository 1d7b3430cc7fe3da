//! Issue/return workflow and quick scan

use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        asset::normalize_asset_code,
        audit::{ClientInfo, NewAuditEntry},
        enums::{AssetCondition, AuditSeverity},
        issue::{IssueDetails, IssueQuery, IssueRequest, ReturnRequest, ScanResult},
        profile::UserClaims,
    },
    repository::Repository,
    services::audit::AuditService,
};

#[derive(Clone)]
pub struct IssuesService {
    repository: Repository,
    audit: AuditService,
}

impl IssuesService {
    pub fn new(repository: Repository, audit: AuditService) -> Self {
        Self { repository, audit }
    }

    /// Issue an available asset to a profile
    pub async fn issue(
        &self,
        request: &IssueRequest,
        claims: &UserClaims,
        client: &ClientInfo,
        now: DateTime<Utc>,
    ) -> AppResult<IssueDetails> {
        claims.require_issue_desk()?;

        let expected = request.resolve_expected_return(now.date_naive())?;
        let notes = request
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let issue = self
            .repository
            .issues_create(request.asset_id, request.issued_to, claims.sub, expected, notes, now)
            .await?;
        let details = self.repository.issues_get_details(issue.id, now).await?;

        tracing::info!(
            issue_id = %issue.id,
            asset_code = %details.asset.asset_code,
            issued_to = %details.issued_to.email,
            expected = %expected,
            "Asset issued"
        );
        self.audit
            .record(
                NewAuditEntry::new("asset.issue", "asset_issue", AuditSeverity::Medium)
                    .actor(claims.sub, &claims.email)
                    .resource_id(issue.id)
                    .details(json!({
                        "asset_code": details.asset.asset_code,
                        "issued_to": details.issued_to.email,
                        "expected_return_date": expected,
                    }))
                    .client(client),
            )
            .await;

        Ok(details)
    }

    /// Return an active issue. The desk can return anything; staff only what they hold.
    pub async fn return_issue(
        &self,
        issue_id: Uuid,
        request: &ReturnRequest,
        claims: &UserClaims,
        client: &ClientInfo,
        now: DateTime<Utc>,
    ) -> AppResult<IssueDetails> {
        let issue = self.repository.issues_get_by_id(issue_id).await?;
        if !claims.role.can_manage_issues() && issue.issued_to != claims.sub {
            return Err(AppError::Authorization(
                "Only the holder or the issue desk can return this asset".to_string(),
            ));
        }

        let condition = request.return_condition.unwrap_or(AssetCondition::Good);
        let notes = request
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let returned = self
            .repository
            .issues_return(issue_id, condition, notes, now)
            .await?;
        let details = self.repository.issues_get_details(returned.id, now).await?;

        tracing::info!(
            issue_id = %returned.id,
            asset_code = %details.asset.asset_code,
            condition = %condition,
            "Asset returned"
        );
        self.audit
            .record(
                NewAuditEntry::new("asset.return", "asset_issue", AuditSeverity::Low)
                    .actor(claims.sub, &claims.email)
                    .resource_id(returned.id)
                    .details(json!({
                        "asset_code": details.asset.asset_code,
                        "return_condition": condition,
                    }))
                    .client(client),
            )
            .await;

        Ok(details)
    }

    /// Active issues with the overdue filter applied at `now`
    pub async fn list_active(&self, query: &IssueQuery, now: DateTime<Utc>) -> AppResult<Vec<IssueDetails>> {
        let issues = self.repository.issues_list_active(query, now).await?;
        Ok(issues
            .into_iter()
            .filter(|i| query.overdue.matches(i.is_overdue))
            .collect())
    }

    /// Issues held by the caller
    pub async fn my_issues(
        &self,
        claims: &UserClaims,
        include_returned: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<IssueDetails>> {
        self.repository
            .issues_for_profile(claims.sub, include_returned, now)
            .await
    }

    /// Active issues past their expected return, most overdue first
    pub async fn overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<IssueDetails>> {
        let mut issues = self
            .repository
            .issues_list_active(&IssueQuery::default(), now)
            .await?;
        issues.retain(|i| i.is_overdue);
        issues.sort_by(|a, b| b.days_overdue.cmp(&a.days_overdue));
        Ok(issues)
    }

    pub async fn get(&self, id: Uuid, claims: &UserClaims, now: DateTime<Utc>) -> AppResult<IssueDetails> {
        let details = self.repository.issues_get_details(id, now).await?;
        if !claims.role.can_manage_issues() && details.issued_to.id != claims.sub {
            return Err(AppError::Authorization("Not your issue".to_string()));
        }
        Ok(details)
    }

    /// Look up a scanned or typed code
    pub async fn scan(&self, code: &str, now: DateTime<Utc>) -> AppResult<ScanResult> {
        let code = normalize_asset_code(code);
        if code.is_empty() {
            return Err(AppError::Validation("Asset code is required".to_string()));
        }
        let asset = self
            .repository
            .assets_find_by_code(&code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Asset {} not found", code)))?;
        let current_issue = self.repository.issues_active_for_asset(asset.id, now).await?;
        Ok(ScanResult {
            asset,
            current_issue,
        })
    }

    /// Return whatever active issue a scanned asset has
    pub async fn quick_return(
        &self,
        code: &str,
        request: &ReturnRequest,
        claims: &UserClaims,
        client: &ClientInfo,
        now: DateTime<Utc>,
    ) -> AppResult<IssueDetails> {
        let scan = self.scan(code, now).await?;
        let issue = scan.current_issue.ok_or_else(|| {
            AppError::BusinessRule(format!("Asset {} is not currently issued", scan.asset.asset_code))
        })?;
        self.return_issue(issue.id, request, claims, client, now).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::Role;

    fn service() -> IssuesService {
        let repository = Repository::offline();
        IssuesService::new(repository.clone(), AuditService::new(repository))
    }

    fn claims(role: Role) -> UserClaims {
        let now = Utc::now().timestamp();
        UserClaims {
            sub: Uuid::new_v4(),
            sid: "s".into(),
            email: "user@cut.ac.zw".into(),
            role,
            exp: now + 60,
            iat: now,
        }
    }

    #[tokio::test]
    async fn test_staff_cannot_issue() {
        let request = IssueRequest {
            asset_id: Uuid::new_v4(),
            issued_to: Uuid::new_v4(),
            expected_return_date: None,
            preset: None,
            notes: None,
        };
        let result = service()
            .issue(&request, &claims(Role::Staff), &ClientInfo::default(), Utc::now())
            .await;
        assert!(matches!(result, Err(AppError::Authorization(_))));
    }

    #[tokio::test]
    async fn test_past_return_date_is_rejected_before_touching_the_database() {
        let now = Utc::now();
        let request = IssueRequest {
            asset_id: Uuid::new_v4(),
            issued_to: Uuid::new_v4(),
            expected_return_date: Some(now.date_naive() - chrono::Duration::days(1)),
            preset: None,
            notes: None,
        };
        let result = service()
            .issue(&request, &claims(Role::Technician), &ClientInfo::default(), now)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_blank_scan_is_a_validation_error() {
        let result = service().scan("   ", Utc::now()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
