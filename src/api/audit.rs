//! Audit log endpoints (admin)

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use crate::{
    error::AppResult,
    models::audit::{AuditLog, AuditQuery, AuditSummary},
};

use super::AuthenticatedUser;

/// Audit entries within the look-back window
#[utoipa::path(
    get,
    path = "/audit",
    tag = "audit",
    security(("bearer_auth" = [])),
    params(AuditQuery),
    responses(
        (status = 200, description = "Audit entries, newest first", body = Vec<AuditLog>),
        (status = 403, description = "Administrators only")
    )
)]
pub async fn list_audit_logs(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<Vec<AuditLog>>> {
    claims.require_admin()?;

    let logs = state.services.audit.list(&query, Utc::now()).await?;
    Ok(Json(logs))
}

/// Totals for the look-back window
#[utoipa::path(
    get,
    path = "/audit/summary",
    tag = "audit",
    security(("bearer_auth" = [])),
    params(AuditQuery),
    responses(
        (status = 200, description = "Summary", body = AuditSummary),
        (status = 403, description = "Administrators only")
    )
)]
pub async fn audit_summary(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<AuditSummary>> {
    claims.require_admin()?;

    let summary = state.services.audit.summary(&query, Utc::now()).await?;
    Ok(Json(summary))
}

/// Download audit entries as CSV (default) or JSON
#[utoipa::path(
    get,
    path = "/audit/export",
    tag = "audit",
    security(("bearer_auth" = [])),
    params(AuditQuery),
    responses(
        (status = 200, description = "Attachment", body = String, content_type = "text/csv"),
        (status = 403, description = "Administrators only")
    )
)]
pub async fn export_audit_logs(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<AuditQuery>,
) -> AppResult<impl IntoResponse> {
    claims.require_admin()?;

    let export = state.services.audit.export(&query, Utc::now()).await?;
    tracing::info!(by = %claims.email, file = %export.filename, "Audit log exported");

    Ok((
        [
            (header::CONTENT_TYPE, export.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.filename),
            ),
        ],
        export.body,
    ))
}
