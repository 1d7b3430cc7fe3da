//! API handlers for the asset tracker REST endpoints

pub mod assets;
pub mod audit;
pub mod auth;
pub mod calendar;
pub mod categories;
pub mod dashboard;
pub mod departments;
pub mod health;
pub mod issues;
pub mod maintenance;
pub mod openapi;
pub mod reports;
pub mod requests;
pub mod users;

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, header::USER_AGENT, request::Parts, HeaderMap},
};

use crate::{
    error::AppError,
    models::{audit::ClientInfo, profile::UserClaims},
    AppState,
};

/// Extractor for an authenticated user: valid JWT backed by a live session
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = state.services.auth.verify_token(token).await?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Caller address and user agent for the audit trail
pub struct Client(pub ClientInfo);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Client {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Client(client_info(&parts.headers)))
    }
}

/// First forwarded address if behind a proxy, else X-Real-IP
fn client_info(headers: &HeaderMap) -> ClientInfo {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let ip_address = header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header("x-real-ip"))
        .map(str::to_string);

    ClientInfo {
        ip_address,
        user_agent: headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        models::enums::Role,
        repository::Repository,
        services::{
            oauth::MockIdentityProvider,
            sessions::{MemorySessionStore, SessionStore},
            Services,
        },
    };
    use axum::{
        body::Body,
        http::{HeaderValue, Request, StatusCode},
        routing::get,
        Router,
    };
    use std::{sync::Arc, time::Duration};
    use tower::ServiceExt;
    use uuid::Uuid;

    async fn whoami(AuthenticatedUser(claims): AuthenticatedUser) -> String {
        claims.email
    }

    fn app(sessions: Arc<MemorySessionStore>) -> (Router, AppConfig) {
        let config = AppConfig::default();
        let services = Services::new(
            Repository::offline(),
            &config,
            sessions,
            Arc::new(MockIdentityProvider::new()),
        );
        let state = AppState {
            config: Arc::new(config.clone()),
            services: Arc::new(services),
        };
        (Router::new().route("/whoami", get(whoami)).with_state(state), config)
    }

    async fn status_for(router: Router, authorization: Option<String>) -> StatusCode {
        let mut request = Request::builder().uri("/whoami");
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }
        router
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_missing_or_malformed_header_is_unauthorized() {
        let (router, _) = app(Arc::new(MemorySessionStore::new()));
        assert_eq!(status_for(router.clone(), None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_for(router.clone(), Some("Basic abc".into())).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(router, Some("Bearer not-a-jwt".into())).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_token_only_works_while_session_lives() {
        let sessions = Arc::new(MemorySessionStore::new());
        let (router, config) = app(sessions.clone());

        let user_id = Uuid::new_v4();
        let session = sessions
            .create(user_id, "tech@cut.ac.zw", Role::Technician, Duration::from_secs(600))
            .await
            .unwrap();
        let token = UserClaims {
            sub: user_id,
            sid: session.id.clone(),
            email: "tech@cut.ac.zw".into(),
            role: Role::Technician,
            exp: session.expires_at.timestamp(),
            iat: session.created_at.timestamp(),
        }
        .create_token(&config.auth.jwt_secret)
        .unwrap();

        assert_eq!(
            status_for(router.clone(), Some(format!("Bearer {}", token))).await,
            StatusCode::OK
        );

        sessions.revoke(&session.id).await.unwrap();
        assert_eq!(
            status_for(router, Some(format!("Bearer {}", token))).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_client_info_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.7, 172.16.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("172.16.0.1"));
        headers.insert(USER_AGENT, HeaderValue::from_static("scanner/1.0"));

        let info = client_info(&headers);
        assert_eq!(info.ip_address.as_deref(), Some("10.0.0.7"));
        assert_eq!(info.user_agent.as_deref(), Some("scanner/1.0"));
    }

    #[test]
    fn test_client_info_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.20"));
        assert_eq!(client_info(&headers).ip_address.as_deref(), Some("192.168.1.20"));
        assert!(client_info(&HeaderMap::new()).ip_address.is_none());
    }
}
