//! Authentication: institution domain gate, profile bootstrap and sessions

use std::{sync::Arc, time::Duration};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use rand::RngCore;
use serde_json::json;

use crate::{
    config::{AuthConfig, InstitutionConfig},
    error::{AppError, AppResult},
    models::{
        audit::{ClientInfo, NewAuditEntry},
        enums::{AuditSeverity, Role},
        profile::{Profile, UserClaims},
    },
    repository::Repository,
    services::{
        audit::AuditService,
        oauth::{IdentityProvider, VerifiedIdentity},
        sessions::SessionStore,
    },
};

/// Successful sign-in
#[derive(Debug)]
pub struct SignIn {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub profile: Profile,
}

/// Whether `email` belongs to the institution's mail domain (case-insensitive)
pub fn is_institution_email(email: &str, domain: &str) -> bool {
    let email = email.trim().to_lowercase();
    let suffix = format!("@{}", domain.trim().trim_start_matches('@').to_lowercase());
    email.len() > suffix.len() && email.ends_with(&suffix)
}

/// Name for a new profile: provider metadata, else the email's local part
pub fn display_name(identity: &VerifiedIdentity) -> String {
    match identity.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => identity
            .email
            .split('@')
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(profile: &Profile, password: &str) -> AppResult<bool> {
    if let Some(ref hash) = profile.password_hash {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        return Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok());
    }

    Ok(false)
}

/// Random value round-tripped through the provider to tie callback to request
fn new_oauth_state() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    audit: AuditService,
    sessions: Arc<dyn SessionStore>,
    provider: Arc<dyn IdentityProvider>,
    config: AuthConfig,
    institution: InstitutionConfig,
}

impl AuthService {
    pub fn new(
        repository: Repository,
        audit: AuditService,
        sessions: Arc<dyn SessionStore>,
        provider: Arc<dyn IdentityProvider>,
        config: AuthConfig,
        institution: InstitutionConfig,
    ) -> Self {
        Self {
            repository,
            audit,
            sessions,
            provider,
            config,
            institution,
        }
    }

    /// Sign in with an email and password set by an administrator
    pub async fn sign_in_password(&self, email: &str, password: &str, client: &ClientInfo) -> AppResult<SignIn> {
        let invalid = || AppError::Authentication("Invalid email or password".to_string());

        let profile = self
            .repository
            .profiles_get_by_email(email.trim())
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&profile, password)? {
            return Err(invalid());
        }

        self.ensure_institution_account(&profile.email, client).await?;
        self.issue_session(profile, client).await
    }

    /// Provider URL and the state value the client must echo back
    pub fn oauth_authorize(&self) -> (String, String) {
        let state = new_oauth_state();
        (self.provider.authorize_url(&state), state)
    }

    /// Finish the provider round trip
    pub async fn oauth_callback(&self, code: &str, client: &ClientInfo) -> AppResult<SignIn> {
        let identity = self.provider.exchange_code(code).await?;
        self.complete_sign_in(identity, client).await
    }

    /// Gate a provider-confirmed identity, bootstrap its profile and open a session
    pub async fn complete_sign_in(&self, identity: VerifiedIdentity, client: &ClientInfo) -> AppResult<SignIn> {
        self.ensure_institution_account(&identity.email, client).await?;

        let default_role: Role = self
            .institution
            .default_role
            .parse()
            .map_err(|e: String| AppError::Internal(format!("Bad default role in configuration: {}", e)))?;

        let (profile, created) = self
            .repository
            .profiles_bootstrap(&identity.email, &display_name(&identity), default_role)
            .await?;

        if created {
            tracing::info!(profile_id = %profile.id, email = %profile.email, role = %profile.role, "Profile bootstrapped");
            self.audit
                .record(
                    NewAuditEntry::new("profile.bootstrap", "profile", AuditSeverity::Low)
                        .actor(profile.id, &profile.email)
                        .resource_id(profile.id)
                        .client(client),
                )
                .await;
        }

        self.issue_session(profile, client).await
    }

    /// Reject accounts outside the institution and force them out everywhere
    async fn ensure_institution_account(&self, email: &str, client: &ClientInfo) -> AppResult<()> {
        if is_institution_email(email, &self.institution.email_domain) {
            return Ok(());
        }

        let revoked = self.sessions.revoke_all_for_user(email).await?;
        tracing::warn!(email = %email, revoked, "Sign-in rejected: outside institution domain");

        self.audit
            .record(
                NewAuditEntry::new("auth.rejected", "auth", AuditSeverity::High)
                    .details(json!({
                        "email": email,
                        "reason": "domain",
                        "domain": self.institution.email_domain,
                    }))
                    .client(client),
            )
            .await;

        Err(AppError::DomainRejected(format!(
            "Only {} accounts can access this system",
            self.institution.name
        )))
    }

    async fn issue_session(&self, profile: Profile, client: &ClientInfo) -> AppResult<SignIn> {
        let ttl = Duration::from_secs(self.config.jwt_expiration_hours.max(1) * 3600);
        let session = self
            .sessions
            .create(profile.id, &profile.email, profile.role, ttl)
            .await?;

        let claims = UserClaims {
            sub: profile.id,
            sid: session.id.clone(),
            email: profile.email.clone(),
            role: profile.role,
            exp: session.expires_at.timestamp(),
            iat: session.created_at.timestamp(),
        };
        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        tracing::info!(profile_id = %profile.id, role = %profile.role, "Signed in");
        self.audit
            .record(
                NewAuditEntry::new("auth.sign_in", "auth", AuditSeverity::Low)
                    .actor(profile.id, &profile.email)
                    .client(client),
            )
            .await;

        Ok(SignIn {
            token,
            expires_at: Utc
                .timestamp_opt(claims.exp, 0)
                .single()
                .unwrap_or(session.expires_at),
            profile,
        })
    }

    /// Validate a bearer token against the secret and the live session
    pub async fn verify_token(&self, token: &str) -> AppResult<UserClaims> {
        let claims = UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        let session = self
            .sessions
            .get(&claims.sid)
            .await?
            .ok_or_else(|| AppError::Authentication("Session expired or revoked".to_string()))?;

        if session.user_id != claims.sub {
            return Err(AppError::Authentication("Session does not match token".to_string()));
        }

        Ok(claims)
    }

    pub async fn sign_out(&self, claims: &UserClaims, client: &ClientInfo) -> AppResult<()> {
        self.sessions.revoke(&claims.sid).await?;
        self.audit
            .record(
                NewAuditEntry::new("auth.sign_out", "auth", AuditSeverity::Low)
                    .actor(claims.sub, &claims.email)
                    .client(client),
            )
            .await;
        Ok(())
    }

    /// Current profile
    pub async fn me(&self, claims: &UserClaims) -> AppResult<Profile> {
        self.repository.profiles_get_by_id(claims.sub).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        services::{oauth::MockIdentityProvider, sessions::MemorySessionStore},
    };
    use uuid::Uuid;

    fn service(sessions: Arc<MemorySessionStore>, provider: MockIdentityProvider) -> AuthService {
        let config = AppConfig::default();
        let repository = Repository::offline();
        AuthService::new(
            repository.clone(),
            AuditService::new(repository),
            sessions,
            Arc::new(provider),
            AuthConfig {
                jwt_secret: "test-secret".into(),
                jwt_expiration_hours: 1,
            },
            config.institution,
        )
    }

    #[test]
    fn test_institution_email_check() {
        assert!(is_institution_email("t.moyo@cut.ac.zw", "cut.ac.zw"));
        assert!(is_institution_email("  T.Moyo@CUT.AC.ZW ", "cut.ac.zw"));
        assert!(is_institution_email("a@cut.ac.zw", "@cut.ac.zw"));
        assert!(!is_institution_email("someone@gmail.com", "cut.ac.zw"));
        assert!(!is_institution_email("a@notcut.ac.zw", "cut.ac.zw"));
        assert!(!is_institution_email("a@cut.ac.zw.evil.com", "cut.ac.zw"));
        assert!(!is_institution_email("@cut.ac.zw", "cut.ac.zw"));
    }

    #[test]
    fn test_display_name_falls_back_to_local_part() {
        let mut identity = VerifiedIdentity {
            subject: "1".into(),
            email: "t.moyo@cut.ac.zw".into(),
            name: Some("Tendai Moyo".into()),
        };
        assert_eq!(display_name(&identity), "Tendai Moyo");
        identity.name = Some("  ".into());
        assert_eq!(display_name(&identity), "t.moyo");
        identity.name = None;
        assert_eq!(display_name(&identity), "t.moyo");
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        let now = Utc::now();
        let profile = Profile {
            id: Uuid::new_v4(),
            email: "a@cut.ac.zw".into(),
            full_name: "A".into(),
            role: Role::Staff,
            department: None,
            password_hash: Some(hash),
            created_at: now,
            updated_at: now,
        };
        assert!(verify_password(&profile, "correct horse").unwrap());
        assert!(!verify_password(&profile, "wrong").unwrap());
    }

    #[tokio::test]
    async fn test_outside_domain_is_rejected_and_signed_out() {
        let sessions = Arc::new(MemorySessionStore::new());
        let stale = sessions
            .create(Uuid::new_v4(), "intruder@gmail.com", Role::Staff, Duration::from_secs(600))
            .await
            .unwrap();

        let mut provider = MockIdentityProvider::new();
        provider.expect_exchange_code().times(1).returning(|_| {
            Ok(VerifiedIdentity {
                subject: "g-1".into(),
                email: "intruder@gmail.com".into(),
                name: None,
            })
        });

        let auth = service(sessions.clone(), provider);
        let err = auth
            .oauth_callback("code", &ClientInfo::default())
            .await
            .unwrap_err();

        match err {
            AppError::DomainRejected(msg) => {
                assert_eq!(msg, "Only Chinhoyi University of Technology accounts can access this system")
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(sessions.get(&stale.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_exchange_code()
            .returning(|_| Err(AppError::Upstream("down".into())));

        let auth = service(Arc::new(MemorySessionStore::new()), provider);
        let err = auth.oauth_callback("code", &ClientInfo::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_authorize_returns_state_in_url() {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_authorize_url()
            .returning(|state| format!("https://idp.example/auth?state={}&hd=cut.ac.zw", state));

        let auth = service(Arc::new(MemorySessionStore::new()), provider);
        let (url, state) = auth.oauth_authorize();
        assert!(!state.is_empty());
        assert!(url.contains(&format!("state={}", state)));
    }

    #[tokio::test]
    async fn test_token_needs_live_session() {
        let sessions = Arc::new(MemorySessionStore::new());
        let auth = service(sessions.clone(), MockIdentityProvider::new());
        let user = Uuid::new_v4();
        let session = sessions
            .create(user, "tech@cut.ac.zw", Role::Technician, Duration::from_secs(600))
            .await
            .unwrap();

        let claims = UserClaims {
            sub: user,
            sid: session.id.clone(),
            email: "tech@cut.ac.zw".into(),
            role: Role::Technician,
            exp: session.expires_at.timestamp(),
            iat: session.created_at.timestamp(),
        };
        let token = claims.create_token("test-secret").unwrap();

        assert_eq!(auth.verify_token(&token).await.unwrap().sub, user);

        sessions.revoke(&session.id).await.unwrap();
        assert!(matches!(
            auth.verify_token(&token).await,
            Err(AppError::Authentication(_))
        ));
    }
}
