//! Asset registry endpoints

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
    models::asset::{
        Asset, AssetHistory, AssetPage, AssetQuery, AvailabilityCheck, CreateAsset, GeneratedCode,
        UpdateAsset, UpdateAssetStatus,
    },
};

use super::{AuthenticatedUser, Client};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct CodeParams {
    pub code: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct SerialParams {
    pub serial: String,
    /// Asset being edited, ignored by the check
    pub exclude_id: Option<Uuid>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct CategoryParams {
    pub category: String,
}

/// List assets with filters
#[utoipa::path(
    get,
    path = "/assets",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(AssetQuery),
    responses(
        (status = 200, description = "Page of assets", body = AssetPage),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_assets(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<AssetQuery>,
) -> AppResult<Json<AssetPage>> {
    let page = state.services.assets.list(&query).await?;
    Ok(Json(page))
}

/// Register a new asset
#[utoipa::path(
    post,
    path = "/assets",
    tag = "assets",
    security(("bearer_auth" = [])),
    request_body = CreateAsset,
    responses(
        (status = 201, description = "Asset registered", body = Asset),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Administrators only"),
        (status = 409, description = "Asset code or serial number already exists")
    )
)]
pub async fn create_asset(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Client(client): Client,
    Json(data): Json<CreateAsset>,
) -> AppResult<(StatusCode, Json<Asset>)> {
    claims.require_admin()?;

    let asset = state.services.assets.register(data, &claims, &client).await?;
    Ok((StatusCode::CREATED, Json(asset)))
}

/// Is an asset code still free?
#[utoipa::path(
    get,
    path = "/assets/check-code",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(CodeParams),
    responses(
        (status = 200, description = "Availability", body = AvailabilityCheck)
    )
)]
pub async fn check_code(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(params): Query<CodeParams>,
) -> AppResult<Json<AvailabilityCheck>> {
    let check = state.services.assets.check_code(&params.code).await?;
    Ok(Json(check))
}

/// Is a serial number still free?
#[utoipa::path(
    get,
    path = "/assets/check-serial",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(SerialParams),
    responses(
        (status = 200, description = "Availability", body = AvailabilityCheck)
    )
)]
pub async fn check_serial(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(params): Query<SerialParams>,
) -> AppResult<Json<AvailabilityCheck>> {
    let check = state
        .services
        .assets
        .check_serial(&params.serial, params.exclude_id)
        .await?;
    Ok(Json(check))
}

/// Propose an unused asset code for a category
#[utoipa::path(
    get,
    path = "/assets/generate-code",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(CategoryParams),
    responses(
        (status = 200, description = "Generated code", body = GeneratedCode),
        (status = 422, description = "No free code found")
    )
)]
pub async fn generate_code(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(params): Query<CategoryParams>,
) -> AppResult<Json<GeneratedCode>> {
    claims.require_admin()?;

    let generated = state.services.assets.generate_code(&params.category).await?;
    Ok(Json(generated))
}

/// Get an asset by its code
#[utoipa::path(
    get,
    path = "/assets/by-code/{code}",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(
        ("code" = String, Path, description = "Asset code, case-insensitive")
    ),
    responses(
        (status = 200, description = "Asset", body = Asset),
        (status = 404, description = "Asset not found")
    )
)]
pub async fn get_asset_by_code(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(code): Path<String>,
) -> AppResult<Json<Asset>> {
    let asset = state.services.assets.get_by_code(&code).await?;
    Ok(Json(asset))
}

/// Get an asset
#[utoipa::path(
    get,
    path = "/assets/{id}",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Asset ID")
    ),
    responses(
        (status = 200, description = "Asset", body = Asset),
        (status = 404, description = "Asset not found")
    )
)]
pub async fn get_asset(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Asset>> {
    let asset = state.services.assets.get(id).await?;
    Ok(Json(asset))
}

/// Update descriptive asset fields
#[utoipa::path(
    put,
    path = "/assets/{id}",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Asset ID")
    ),
    request_body = UpdateAsset,
    responses(
        (status = 200, description = "Asset updated", body = Asset),
        (status = 404, description = "Asset not found"),
        (status = 409, description = "Serial number already exists")
    )
)]
pub async fn update_asset(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Client(client): Client,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateAsset>,
) -> AppResult<Json<Asset>> {
    claims.require_admin()?;

    let asset = state.services.assets.update(id, data, &claims, &client).await?;
    Ok(Json(asset))
}

/// Move an asset between available, maintenance and retired
#[utoipa::path(
    put,
    path = "/assets/{id}/status",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Asset ID")
    ),
    request_body = UpdateAssetStatus,
    responses(
        (status = 200, description = "Status changed", body = Asset),
        (status = 422, description = "Asset is issued, or target is `issued`")
    )
)]
pub async fn update_asset_status(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Client(client): Client,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateAssetStatus>,
) -> AppResult<Json<Asset>> {
    claims.require_issue_desk()?;

    let asset = state
        .services
        .assets
        .set_status(id, data.status, &claims, &client)
        .await?;
    Ok(Json(asset))
}

/// Issue and maintenance history of an asset
#[utoipa::path(
    get,
    path = "/assets/{id}/history",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Asset ID")
    ),
    responses(
        (status = 200, description = "History", body = AssetHistory),
        (status = 404, description = "Asset not found")
    )
)]
pub async fn asset_history(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AssetHistory>> {
    claims.require_issue_desk()?;

    let history = state.services.assets.history(id, Utc::now()).await?;
    Ok(Json(history))
}
