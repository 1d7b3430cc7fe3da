//! Profile management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::profile::{CreateProfile, Profile, ProfileQuery, UpdateProfile},
};

use super::{AuthenticatedUser, Client};

/// List profiles
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    params(ProfileQuery),
    responses(
        (status = 200, description = "Profiles", body = Vec<Profile>),
        (status = 403, description = "Issue desk only")
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ProfileQuery>,
) -> AppResult<Json<Vec<Profile>>> {
    let users = state.services.users.list(&query, &claims).await?;
    Ok(Json(users))
}

/// Get a profile
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Profile ID")
    ),
    responses(
        (status = 200, description = "Profile", body = Profile),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn get_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Profile>> {
    let user = state.services.users.get(id, &claims).await?;
    Ok(Json(user))
}

/// Create a profile
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateProfile,
    responses(
        (status = 201, description = "Profile created", body = Profile),
        (status = 400, description = "Invalid input or outside email"),
        (status = 409, description = "Email already exists")
    )
)]
pub async fn create_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Client(client): Client,
    Json(data): Json<CreateProfile>,
) -> AppResult<(StatusCode, Json<Profile>)> {
    let user = state.services.users.create(&data, &claims, &client).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Update a profile
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Profile ID")
    ),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = Profile),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn update_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Client(client): Client,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateProfile>,
) -> AppResult<Json<Profile>> {
    let user = state.services.users.update(id, &data, &claims, &client).await?;
    Ok(Json(user))
}

/// Delete a profile
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Profile ID")
    ),
    responses(
        (status = 204, description = "Profile deleted"),
        (status = 404, description = "Profile not found"),
        (status = 409, description = "Profile still holds assets or has history")
    )
)]
pub async fn delete_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Client(client): Client,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.users.delete(id, &claims, &client).await?;
    Ok(StatusCode::NO_CONTENT)
}
