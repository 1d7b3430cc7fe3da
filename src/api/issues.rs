//! Issue/return and quick scan endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::issue::{IssueDetails, IssueQuery, IssueRequest, QuickReturnRequest, ReturnRequest, ScanResult},
};

use super::{AuthenticatedUser, Client};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct MyIssuesParams {
    /// Include returned issues (default: active only)
    #[serde(default)]
    pub include_returned: bool,
}

/// Issue an available asset
#[utoipa::path(
    post,
    path = "/issues",
    tag = "issues",
    security(("bearer_auth" = [])),
    request_body = IssueRequest,
    responses(
        (status = 201, description = "Asset issued", body = IssueDetails),
        (status = 400, description = "Return date in the past"),
        (status = 403, description = "Issue desk only"),
        (status = 404, description = "Asset or recipient not found"),
        (status = 422, description = "Asset is not available")
    )
)]
pub async fn create_issue(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Client(client): Client,
    Json(request): Json<IssueRequest>,
) -> AppResult<(StatusCode, Json<IssueDetails>)> {
    let issue = state
        .services
        .issues
        .issue(&request, &claims, &client, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(issue)))
}

/// Active issues
#[utoipa::path(
    get,
    path = "/issues/active",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(IssueQuery),
    responses(
        (status = 200, description = "Active issues with overdue state", body = Vec<IssueDetails>),
        (status = 403, description = "Issue desk only")
    )
)]
pub async fn list_active_issues(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<IssueQuery>,
) -> AppResult<Json<Vec<IssueDetails>>> {
    claims.require_issue_desk()?;

    let issues = state.services.issues.list_active(&query, Utc::now()).await?;
    Ok(Json(issues))
}

/// Overdue issues, most overdue first
#[utoipa::path(
    get,
    path = "/issues/overdue",
    tag = "issues",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Overdue issues", body = Vec<IssueDetails>),
        (status = 403, description = "Issue desk only")
    )
)]
pub async fn list_overdue_issues(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<IssueDetails>>> {
    claims.require_issue_desk()?;

    let issues = state.services.issues.overdue(Utc::now()).await?;
    Ok(Json(issues))
}

/// Assets held by the caller
#[utoipa::path(
    get,
    path = "/issues/mine",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(MyIssuesParams),
    responses(
        (status = 200, description = "Caller's issues", body = Vec<IssueDetails>)
    )
)]
pub async fn my_issues(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(params): Query<MyIssuesParams>,
) -> AppResult<Json<Vec<IssueDetails>>> {
    let issues = state
        .services
        .issues
        .my_issues(&claims, params.include_returned, Utc::now())
        .await?;
    Ok(Json(issues))
}

/// Get one issue
#[utoipa::path(
    get,
    path = "/issues/{id}",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Issue ID")
    ),
    responses(
        (status = 200, description = "Issue", body = IssueDetails),
        (status = 403, description = "Not the holder"),
        (status = 404, description = "Issue not found")
    )
)]
pub async fn get_issue(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<IssueDetails>> {
    let issue = state.services.issues.get(id, &claims, Utc::now()).await?;
    Ok(Json(issue))
}

/// Return an issued asset
#[utoipa::path(
    post,
    path = "/issues/{id}/return",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Issue ID")
    ),
    request_body = ReturnRequest,
    responses(
        (status = 200, description = "Asset returned", body = IssueDetails),
        (status = 403, description = "Not the holder nor the issue desk"),
        (status = 404, description = "Issue not found"),
        (status = 422, description = "Issue is not active")
    )
)]
pub async fn return_issue(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Client(client): Client,
    Path(id): Path<Uuid>,
    Json(request): Json<ReturnRequest>,
) -> AppResult<Json<IssueDetails>> {
    let issue = state
        .services
        .issues
        .return_issue(id, &request, &claims, &client, Utc::now())
        .await?;
    Ok(Json(issue))
}

/// Look up a scanned code
#[utoipa::path(
    get,
    path = "/scan/{code}",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(
        ("code" = String, Path, description = "Scanned or typed asset code")
    ),
    responses(
        (status = 200, description = "Asset and its active issue", body = ScanResult),
        (status = 404, description = "Asset not found")
    )
)]
pub async fn scan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(code): Path<String>,
) -> AppResult<Json<ScanResult>> {
    claims.require_issue_desk()?;

    let result = state.services.issues.scan(&code, Utc::now()).await?;
    Ok(Json(result))
}

/// Return whatever active issue a scanned asset has
#[utoipa::path(
    post,
    path = "/scan/return",
    tag = "issues",
    security(("bearer_auth" = [])),
    request_body = QuickReturnRequest,
    responses(
        (status = 200, description = "Asset returned", body = IssueDetails),
        (status = 404, description = "Asset not found"),
        (status = 422, description = "Asset is not issued")
    )
)]
pub async fn quick_return(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Client(client): Client,
    Json(request): Json<QuickReturnRequest>,
) -> AppResult<Json<IssueDetails>> {
    claims.require_issue_desk()?;

    let return_request = ReturnRequest {
        return_condition: request.return_condition,
        notes: request.notes,
    };
    let issue = state
        .services
        .issues
        .quick_return(&request.asset_code, &return_request, &claims, &client, Utc::now())
        .await?;
    Ok(Json(issue))
}
