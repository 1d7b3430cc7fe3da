//! Profile model, JWT claims and role guards

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::enums::Role;
use crate::error::AppError;

/// Application-level user record linked to an authenticated identity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub department: Option<String>,
    /// Hashed password (argon2); absent for accounts that only use OAuth
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short profile representation embedded in issues and lists
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProfileShort {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub department: Option<String>,
}

impl From<&Profile> for ProfileShort {
    fn from(p: &Profile) -> Self {
        ProfileShort {
            id: p.id,
            full_name: p.full_name.clone(),
            email: p.email.clone(),
            department: p.department.clone(),
        }
    }
}

/// Profile list query
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ProfileQuery {
    /// Search in name and email
    pub search: Option<String>,
    pub role: Option<Role>,
    pub department: Option<String>,
}

/// Create profile request (admin)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProfile {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, max = 200, message = "Full name is required"))]
    pub full_name: String,
    pub role: Option<Role>,
    pub department: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

/// Update profile request (admin)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfile {
    #[validate(length(min = 1, max = 200))]
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub department: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

/// JWT claims for an authenticated session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// Profile id
    pub sub: Uuid,
    /// Server-side session id; the token is only valid while it exists
    pub sid: String,
    pub email: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Require one of the given roles
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "Role {} may not access this resource",
                self.role
            )))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        self.require_role(&[Role::Admin])
    }

    /// Admins and technicians
    pub fn require_issue_desk(&self) -> Result<(), AppError> {
        if self.role.can_manage_issues() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Administrator or technician privileges required".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Role) -> UserClaims {
        let now = Utc::now().timestamp();
        UserClaims {
            sub: Uuid::new_v4(),
            sid: "s1".to_string(),
            email: "someone@cut.ac.zw".to_string(),
            role,
            exp: now + 3600,
            iat: now,
        }
    }

    #[test]
    fn test_token_round_trip_keeps_session_and_role() {
        let c = claims(Role::Technician);
        let token = c.create_token("secret").unwrap();
        let parsed = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(parsed.sub, c.sub);
        assert_eq!(parsed.sid, "s1");
        assert_eq!(parsed.role, Role::Technician);
    }

    #[test]
    fn test_token_with_wrong_secret_is_rejected() {
        let token = claims(Role::Admin).create_token("secret").unwrap();
        assert!(UserClaims::from_token(&token, "other").is_err());
    }

    #[test]
    fn test_role_guards() {
        assert!(claims(Role::Admin).require_admin().is_ok());
        assert!(claims(Role::Technician).require_admin().is_err());
        assert!(claims(Role::Technician).require_issue_desk().is_ok());
        assert!(matches!(
            claims(Role::Staff).require_issue_desk(),
            Err(AppError::Authorization(_))
        ));
        assert!(claims(Role::Staff).require_role(&[Role::Staff, Role::Admin]).is_ok());
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let now = Utc::now();
        let profile = Profile {
            id: Uuid::new_v4(),
            email: "a@cut.ac.zw".into(),
            full_name: "A".into(),
            role: Role::Staff,
            department: None,
            password_hash: Some("$argon2id$...".into()),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "staff");
    }
}
