//! Asset request endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::request::{AssetRequest, AssetRequestDetails, CreateAssetRequest, RequestQuery, ReviewRequest},
};

use super::{AuthenticatedUser, Client};

/// Request an asset
#[utoipa::path(
    post,
    path = "/requests",
    tag = "requests",
    security(("bearer_auth" = [])),
    request_body = CreateAssetRequest,
    responses(
        (status = 201, description = "Request created", body = AssetRequest),
        (status = 400, description = "Invalid dates or missing fields")
    )
)]
pub async fn create_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Client(client): Client,
    Json(data): Json<CreateAssetRequest>,
) -> AppResult<(StatusCode, Json<AssetRequest>)> {
    let request = state
        .services
        .requests
        .create(&data, &claims, &client, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// Requests raised by the caller
#[utoipa::path(
    get,
    path = "/requests/mine",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(RequestQuery),
    responses(
        (status = 200, description = "Caller's requests", body = Vec<AssetRequestDetails>)
    )
)]
pub async fn my_requests(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<RequestQuery>,
) -> AppResult<Json<Vec<AssetRequestDetails>>> {
    let requests = state.services.requests.mine(&claims, &query).await?;
    Ok(Json(requests))
}

/// All requests
#[utoipa::path(
    get,
    path = "/requests",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(RequestQuery),
    responses(
        (status = 200, description = "Requests", body = Vec<AssetRequestDetails>),
        (status = 403, description = "Issue desk only")
    )
)]
pub async fn list_requests(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<RequestQuery>,
) -> AppResult<Json<Vec<AssetRequestDetails>>> {
    let requests = state.services.requests.list(&claims, &query).await?;
    Ok(Json(requests))
}

/// Approve, reject or fulfil a request
#[utoipa::path(
    put,
    path = "/requests/{id}/status",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Request ID")
    ),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Request reviewed", body = AssetRequest),
        (status = 404, description = "Request not found"),
        (status = 422, description = "Transition not allowed")
    )
)]
pub async fn review_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Client(client): Client,
    Path(id): Path<Uuid>,
    Json(review): Json<ReviewRequest>,
) -> AppResult<Json<AssetRequest>> {
    let request = state
        .services
        .requests
        .review(id, &review, &claims, &client, Utc::now())
        .await?;
    Ok(Json(request))
}
