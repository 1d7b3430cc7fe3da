//! Reports endpoint (admin)

use axum::{extract::State, Json};
use chrono::Utc;

use crate::{error::AppResult, models::report::Report};

use super::AuthenticatedUser;

/// Overview, department and category breakdowns, last six months of activity
#[utoipa::path(
    get,
    path = "/reports",
    tag = "reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Report", body = Report),
        (status = 403, description = "Administrators only")
    )
)]
pub async fn get_report(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Report>> {
    let report = state.services.reports.report(&claims, Utc::now()).await?;
    Ok(Json(report))
}
