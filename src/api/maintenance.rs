//! Maintenance endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::maintenance::{
        CompleteMaintenance, CreateMaintenance, MaintenanceDetails, MaintenanceQuery, MaintenanceRecord,
        MaintenanceSummary,
    },
};

use super::{AuthenticatedUser, Client};

/// List maintenance records
#[utoipa::path(
    get,
    path = "/maintenance",
    tag = "maintenance",
    security(("bearer_auth" = [])),
    params(MaintenanceQuery),
    responses(
        (status = 200, description = "Maintenance records", body = Vec<MaintenanceDetails>),
        (status = 403, description = "Issue desk only")
    )
)]
pub async fn list_maintenance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<MaintenanceQuery>,
) -> AppResult<Json<Vec<MaintenanceDetails>>> {
    claims.require_issue_desk()?;

    let records = state.services.maintenance.list(&query, Utc::now()).await?;
    Ok(Json(records))
}

/// Counts per status
#[utoipa::path(
    get,
    path = "/maintenance/summary",
    tag = "maintenance",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Summary", body = MaintenanceSummary)
    )
)]
pub async fn maintenance_summary(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<MaintenanceSummary>> {
    claims.require_issue_desk()?;

    let summary = state.services.maintenance.summary(Utc::now()).await?;
    Ok(Json(summary))
}

/// Get a maintenance record
#[utoipa::path(
    get,
    path = "/maintenance/{id}",
    tag = "maintenance",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Maintenance record ID")
    ),
    responses(
        (status = 200, description = "Record", body = MaintenanceRecord),
        (status = 404, description = "Record not found")
    )
)]
pub async fn get_maintenance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MaintenanceRecord>> {
    claims.require_issue_desk()?;

    let record = state.services.maintenance.get(id).await?;
    Ok(Json(record))
}

/// Schedule maintenance
#[utoipa::path(
    post,
    path = "/maintenance",
    tag = "maintenance",
    security(("bearer_auth" = [])),
    request_body = CreateMaintenance,
    responses(
        (status = 201, description = "Scheduled", body = MaintenanceRecord),
        (status = 404, description = "Asset not found")
    )
)]
pub async fn create_maintenance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Client(client): Client,
    Json(data): Json<CreateMaintenance>,
) -> AppResult<(StatusCode, Json<MaintenanceRecord>)> {
    let record = state.services.maintenance.schedule(&data, &claims, &client).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Start scheduled work
#[utoipa::path(
    post,
    path = "/maintenance/{id}/start",
    tag = "maintenance",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Maintenance record ID")
    ),
    responses(
        (status = 200, description = "Started", body = MaintenanceRecord),
        (status = 422, description = "Not scheduled, or the asset is issued or retired")
    )
)]
pub async fn start_maintenance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Client(client): Client,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MaintenanceRecord>> {
    let record = state
        .services
        .maintenance
        .start(id, &claims, &client, Utc::now())
        .await?;
    Ok(Json(record))
}

/// Complete work
#[utoipa::path(
    post,
    path = "/maintenance/{id}/complete",
    tag = "maintenance",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Maintenance record ID")
    ),
    request_body = CompleteMaintenance,
    responses(
        (status = 200, description = "Completed", body = MaintenanceRecord),
        (status = 422, description = "Already completed")
    )
)]
pub async fn complete_maintenance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Client(client): Client,
    Path(id): Path<Uuid>,
    Json(data): Json<CompleteMaintenance>,
) -> AppResult<Json<MaintenanceRecord>> {
    let record = state
        .services
        .maintenance
        .complete(id, &data, &claims, &client, Utc::now())
        .await?;
    Ok(Json(record))
}
