//! Profile management (admin)

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::InstitutionConfig,
    error::{AppError, AppResult},
    models::{
        audit::{ClientInfo, NewAuditEntry},
        enums::{AuditSeverity, Role},
        profile::{CreateProfile, Profile, ProfileQuery, UpdateProfile, UserClaims},
    },
    repository::Repository,
    services::{
        audit::AuditService,
        auth::{hash_password, is_institution_email},
        sessions::SessionStore,
    },
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    audit: AuditService,
    sessions: Arc<dyn SessionStore>,
    institution: InstitutionConfig,
}

impl UsersService {
    pub fn new(
        repository: Repository,
        audit: AuditService,
        sessions: Arc<dyn SessionStore>,
        institution: InstitutionConfig,
    ) -> Self {
        Self {
            repository,
            audit,
            sessions,
            institution,
        }
    }

    /// Tokens carry the role they were issued with, so every live session of
    /// the profile has to go when its role changes or it is deleted.
    async fn sign_out_everywhere(&self, email: &str) -> AppResult<()> {
        let revoked = self.sessions.revoke_all_for_user(email).await?;
        if revoked > 0 {
            tracing::info!(email = %email, revoked, "Sessions revoked after profile change");
        }
        Ok(())
    }

    /// Search profiles. The issue desk needs this to pick recipients.
    pub async fn list(&self, query: &ProfileQuery, claims: &UserClaims) -> AppResult<Vec<Profile>> {
        claims.require_issue_desk()?;
        self.repository.profiles_search(query).await
    }

    pub async fn get(&self, id: Uuid, claims: &UserClaims) -> AppResult<Profile> {
        if id != claims.sub {
            claims.require_issue_desk()?;
        }
        self.repository.profiles_get_by_id(id).await
    }

    pub async fn create(&self, data: &CreateProfile, claims: &UserClaims, client: &ClientInfo) -> AppResult<Profile> {
        claims.require_admin()?;
        data.validate()?;

        if !is_institution_email(&data.email, &self.institution.email_domain) {
            return Err(AppError::Validation(format!(
                "Only {} accounts can access this system",
                self.institution.name
            )));
        }

        let role = data.role.unwrap_or(Role::Staff);
        let password_hash = data.password.as_deref().map(hash_password).transpose()?;
        let profile = self.repository.profiles_create(data, role, password_hash).await?;

        tracing::info!(profile_id = %profile.id, email = %profile.email, role = %profile.role, "Profile created");
        self.audit
            .record(
                NewAuditEntry::new("user.create", "profile", AuditSeverity::Medium)
                    .actor(claims.sub, &claims.email)
                    .resource_id(profile.id)
                    .details(json!({ "email": profile.email, "role": profile.role }))
                    .client(client),
            )
            .await;
        Ok(profile)
    }

    pub async fn update(
        &self,
        id: Uuid,
        data: &UpdateProfile,
        claims: &UserClaims,
        client: &ClientInfo,
    ) -> AppResult<Profile> {
        claims.require_admin()?;
        data.validate()?;

        if id == claims.sub && matches!(data.role, Some(role) if role != Role::Admin) {
            return Err(AppError::BusinessRule(
                "Administrators cannot demote themselves".to_string(),
            ));
        }

        let previous_role = self.repository.profiles_get_by_id(id).await?.role;
        let password_hash = data.password.as_deref().map(hash_password).transpose()?;
        let profile = self.repository.profiles_update(id, data, password_hash).await?;

        if profile.role != previous_role {
            self.sign_out_everywhere(&profile.email).await?;
        }

        let severity = if data.role.is_some() {
            AuditSeverity::High
        } else {
            AuditSeverity::Low
        };
        self.audit
            .record(
                NewAuditEntry::new("user.update", "profile", severity)
                    .actor(claims.sub, &claims.email)
                    .resource_id(profile.id)
                    .details(json!({ "role": data.role, "department": data.department }))
                    .client(client),
            )
            .await;
        Ok(profile)
    }

    /// Delete a profile that holds nothing
    pub async fn delete(&self, id: Uuid, claims: &UserClaims, client: &ClientInfo) -> AppResult<()> {
        claims.require_admin()?;
        if id == claims.sub {
            return Err(AppError::BusinessRule("You cannot delete your own profile".to_string()));
        }

        let profile = self.repository.profiles_get_by_id(id).await?;
        let active = self.repository.issues_count_active_for_profile(id).await?;
        if active > 0 {
            return Err(AppError::Conflict(format!(
                "Profile still holds {} issued asset(s)",
                active
            )));
        }

        self.repository.profiles_delete(id).await?;
        self.sign_out_everywhere(&profile.email).await?;
        tracing::warn!(profile_id = %id, deleted_by = %claims.email, "Profile deleted");
        self.audit
            .record(
                NewAuditEntry::new("user.delete", "profile", AuditSeverity::High)
                    .actor(claims.sub, &claims.email)
                    .resource_id(id)
                    .client(client),
            )
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AuthConfig,
        services::{auth::AuthService, oauth::MockIdentityProvider, sessions::MemorySessionStore},
    };
    use chrono::Utc;
    use std::time::Duration;

    fn claims(role: Role) -> UserClaims {
        let now = Utc::now().timestamp();
        UserClaims {
            sub: Uuid::new_v4(),
            sid: "s".into(),
            email: "admin@cut.ac.zw".into(),
            role,
            exp: now + 60,
            iat: now,
        }
    }

    fn service_with(sessions: Arc<MemorySessionStore>) -> UsersService {
        let repository = Repository::offline();
        UsersService::new(
            repository.clone(),
            AuditService::new(repository),
            sessions,
            InstitutionConfig::default(),
        )
    }

    fn service() -> UsersService {
        service_with(Arc::new(MemorySessionStore::new()))
    }

    #[tokio::test]
    async fn test_outside_email_cannot_be_created() {
        let data = CreateProfile {
            email: "someone@gmail.com".into(),
            full_name: "Someone".into(),
            role: None,
            department: None,
            password: None,
        };
        let result = service()
            .create(&data, &claims(Role::Admin), &ClientInfo::default())
            .await;
        assert!(matches!(result, Err(AppError::Validation(msg)) if msg.contains("Chinhoyi")));
    }

    #[tokio::test]
    async fn test_admin_cannot_delete_self() {
        let admin = claims(Role::Admin);
        let result = service().delete(admin.sub, &admin, &ClientInfo::default()).await;
        assert!(matches!(result, Err(AppError::BusinessRule(_))));
    }

    #[tokio::test]
    async fn test_admin_cannot_demote_self() {
        let admin = claims(Role::Admin);
        let data = UpdateProfile {
            full_name: None,
            role: Some(Role::Staff),
            department: None,
            password: None,
        };
        let result = service()
            .update(admin.sub, &data, &admin, &ClientInfo::default())
            .await;
        assert!(matches!(result, Err(AppError::BusinessRule(_))));
    }

    #[tokio::test]
    async fn test_technician_cannot_manage_profiles() {
        let result = service()
            .delete(Uuid::new_v4(), &claims(Role::Technician), &ClientInfo::default())
            .await;
        assert!(matches!(result, Err(AppError::Authorization(_))));
    }

    #[tokio::test]
    async fn test_old_tokens_stop_working_after_sign_out_everywhere() {
        let sessions = Arc::new(MemorySessionStore::new());
        let repository = Repository::offline();
        let auth = AuthService::new(
            repository.clone(),
            AuditService::new(repository),
            sessions.clone(),
            Arc::new(MockIdentityProvider::new()),
            AuthConfig {
                jwt_secret: "test-secret".into(),
                jwt_expiration_hours: 1,
            },
            InstitutionConfig::default(),
        );
        let users = service_with(sessions.clone());

        let user = Uuid::new_v4();
        let mut tokens = Vec::new();
        for _ in 0..2 {
            let session = sessions
                .create(user, "Former.Admin@cut.ac.zw", Role::Admin, Duration::from_secs(600))
                .await
                .unwrap();
            let token = UserClaims {
                sub: user,
                sid: session.id.clone(),
                email: "former.admin@cut.ac.zw".into(),
                role: Role::Admin,
                exp: session.expires_at.timestamp(),
                iat: session.created_at.timestamp(),
            }
            .create_token("test-secret")
            .unwrap();
            assert!(auth.verify_token(&token).await.is_ok());
            tokens.push(token);
        }

        users.sign_out_everywhere("former.admin@cut.ac.zw").await.unwrap();

        for token in &tokens {
            assert!(matches!(
                auth.verify_token(token).await,
                Err(AppError::Authentication(_))
            ));
        }
    }
}
