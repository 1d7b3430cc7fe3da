//! Authentication endpoints

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::profile::Profile,
    services::auth::SignIn,
};

use super::{AuthenticatedUser, Client};

/// Password sign-in request
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Issued access token with the signed-in profile
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    /// JWT access token
    pub token: String,
    /// Always "Bearer"
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub profile: Profile,
}

impl From<SignIn> for LoginResponse {
    fn from(sign_in: SignIn) -> Self {
        LoginResponse {
            token: sign_in.token,
            token_type: "Bearer".to_string(),
            expires_at: sign_in.expires_at,
            profile: sign_in.profile,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AuthorizeResponse {
    /// Provider consent URL, restricted to the institution's domain
    pub url: String,
    /// Value the provider echoes back; compare before posting the callback
    pub state: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CallbackRequest {
    /// Authorization code returned by the provider
    pub code: String,
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 401, description = "Invalid email or password"),
        (status = 403, description = "Account outside the institution")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Client(client): Client,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let sign_in = state
        .services
        .auth
        .sign_in_password(&request.email, &request.password, &client)
        .await?;
    Ok(Json(sign_in.into()))
}

/// Start the OAuth flow
#[utoipa::path(
    get,
    path = "/auth/oauth/authorize",
    tag = "auth",
    responses(
        (status = 200, description = "Provider URL", body = AuthorizeResponse)
    )
)]
pub async fn oauth_authorize(State(state): State<crate::AppState>) -> Json<AuthorizeResponse> {
    let (url, oauth_state) = state.services.auth.oauth_authorize();
    Json(AuthorizeResponse {
        url,
        state: oauth_state,
    })
}

/// Complete the OAuth flow with the provider's code
#[utoipa::path(
    post,
    path = "/auth/oauth/callback",
    tag = "auth",
    request_body = CallbackRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 401, description = "Code rejected by the provider"),
        (status = 403, description = "Account outside the institution; all its sessions were revoked"),
        (status = 502, description = "Provider unavailable")
    )
)]
pub async fn oauth_callback(
    State(state): State<crate::AppState>,
    Client(client): Client,
    Json(request): Json<CallbackRequest>,
) -> AppResult<Json<LoginResponse>> {
    let sign_in = state.services.auth.oauth_callback(&request.code, &client).await?;
    Ok(Json(sign_in.into()))
}

/// End the current session
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Client(client): Client,
) -> AppResult<StatusCode> {
    state.services.auth.sign_out(&claims, &client).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Current profile
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current profile", body = Profile),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Profile>> {
    let profile = state.services.auth.me(&claims).await?;
    Ok(Json(profile))
}
