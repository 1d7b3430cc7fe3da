//! Calendar endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;

use crate::{
    error::AppResult,
    models::report::{CalendarEvent, CalendarQuery},
};

use super::AuthenticatedUser;

/// Issue, due-date and maintenance events for a month
#[utoipa::path(
    get,
    path = "/calendar",
    tag = "calendar",
    security(("bearer_auth" = [])),
    params(CalendarQuery),
    responses(
        (status = 200, description = "Events ordered by date", body = Vec<CalendarEvent>),
        (status = 400, description = "Invalid month")
    )
)]
pub async fn get_calendar(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<CalendarQuery>,
) -> AppResult<Json<Vec<CalendarEvent>>> {
    let events = state.services.calendar.month(&query, &claims, Utc::now()).await?;
    Ok(Json(events))
}
