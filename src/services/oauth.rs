//! OAuth identity provider client (authorization-code flow)

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    config::OAuthConfig,
    error::{AppError, AppResult},
};

/// Identity confirmed by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Provider subject id
    pub subject: String,
    pub email: String,
    /// Display name from provider metadata, when present
    pub name: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provider URL the browser is sent to
    fn authorize_url(&self, state: &str) -> String;

    /// Trade an authorization code for the identity behind it
    async fn exchange_code(&self, code: &str) -> AppResult<VerifiedIdentity>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
}

/// HTTP client for an OpenID-style provider
#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    config: OAuthConfig,
    /// Hosted-domain hint passed to the provider's account chooser
    hosted_domain: String,
}

impl OAuthClient {
    pub fn new(config: OAuthConfig, hosted_domain: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            hosted_domain: hosted_domain.to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for OAuthClient {
    fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&hd={}&prompt=select_account",
            self.config.authorize_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_url),
            urlencoding::encode("openid email profile"),
            urlencoding::encode(state),
            urlencoding::encode(&self.hosted_domain),
        )
    }

    async fn exchange_code(&self, code: &str) -> AppResult<VerifiedIdentity> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Token endpoint unreachable: {}", e)))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(AppError::Authentication(
                "Authorization code was rejected by the provider".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(AppError::Upstream(format!("Token endpoint returned {}", status)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid token response: {}", e)))?;

        let response = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Userinfo endpoint unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Userinfo endpoint returned {}",
                response.status()
            )));
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid userinfo response: {}", e)))?;

        if info.email_verified == Some(false) {
            return Err(AppError::Authentication("Email address is not verified".to_string()));
        }

        let email = info
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| AppError::Authentication("Provider did not return an email".to_string()))?;

        Ok(VerifiedIdentity {
            subject: info.sub,
            email: email.trim().to_lowercase(),
            name: info.name.filter(|n| !n.trim().is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OAuthClient {
        OAuthClient::new(
            OAuthConfig {
                client_id: "client-1".into(),
                client_secret: "secret".into(),
                authorize_url: format!("{}/authorize", server.uri()),
                token_url: format!("{}/token", server.uri()),
                userinfo_url: format!("{}/userinfo", server.uri()),
                redirect_url: "http://localhost:3000/auth/callback".into(),
            },
            "cut.ac.zw",
        )
    }

    #[tokio::test]
    async fn test_authorize_url_carries_domain_hint_and_state() {
        let server = MockServer::start().await;
        let url = client_for(&server).authorize_url("abc+/=");
        assert!(url.starts_with(&format!("{}/authorize?", server.uri())));
        assert!(url.contains("hd=cut.ac.zw"));
        assert!(url.contains("state=abc%2B%2F%3D"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fcallback"));
    }

    #[tokio::test]
    async fn test_exchange_code_returns_identity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("code=good-code"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "access_token": "at-1" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .and(header("authorization", "Bearer at-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sub": "1234",
                "email": "T.Moyo@CUT.ac.zw",
                "email_verified": true,
                "name": "Tendai Moyo"
            })))
            .mount(&server)
            .await;

        let identity = client_for(&server).exchange_code("good-code").await.unwrap();
        assert_eq!(identity.subject, "1234");
        assert_eq!(identity.email, "t.moyo@cut.ac.zw");
        assert_eq!(identity.name.as_deref(), Some("Tendai Moyo"));
    }

    #[tokio::test]
    async fn test_rejected_code_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let err = client_for(&server).exchange_code("bad").await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_provider_outage_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).exchange_code("any").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_unverified_email_is_refused() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "access_token": "at" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sub": "1",
                "email": "a@cut.ac.zw",
                "email_verified": false
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).exchange_code("code").await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }
}
