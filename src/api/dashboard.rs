//! Role-specific dashboard and navigation

use axum::{extract::State, Json};
use chrono::Utc;

use crate::{
    error::AppResult,
    models::dashboard::{DashboardView, Navigation},
};

use super::AuthenticatedUser;

/// Dashboard for the caller's role, tagged by `kind`
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard", body = DashboardView),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_dashboard(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<DashboardView>> {
    let view = state.services.dashboard.dashboard(&claims, Utc::now()).await?;
    Ok(Json(view))
}

/// Navigation menu for the caller's role
#[utoipa::path(
    get,
    path = "/navigation",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Menu", body = Navigation)
    )
)]
pub async fn get_navigation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Json<Navigation> {
    Json(state.services.dashboard.navigation(&claims))
}
