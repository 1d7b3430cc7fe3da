//! Profile domain methods on Repository

use chrono::Utc;
use uuid::Uuid;

use super::{Filters, Repository};
use crate::{
    error::{AppError, AppResult},
    models::{
        enums::Role,
        profile::{CreateProfile, Profile, ProfileQuery, UpdateProfile},
    },
};

const PROFILE_UNIQUE_FIELDS: &[(&str, &str, &str)] =
    &[("profiles_email_key", "email", "Email already exists")];

impl Repository {
    /// Get profile by ID
    pub async fn profiles_get_by_id(&self, id: Uuid) -> AppResult<Profile> {
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", id)))
    }

    /// Get profile by email (case-insensitive)
    pub async fn profiles_get_by_email(&self, email: &str) -> AppResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT * FROM profiles WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    /// Ensure a profile exists for a verified identity and return it.
    ///
    /// Concurrent first sign-ins for the same email converge on one row.
    pub async fn profiles_bootstrap(
        &self,
        email: &str,
        full_name: &str,
        role: Role,
    ) -> AppResult<(Profile, bool)> {
        let inserted = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (email, full_name, role)
            VALUES (LOWER($1), $2, $3)
            ON CONFLICT (email) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(full_name)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(profile) = inserted {
            return Ok((profile, true));
        }

        let existing = self
            .profiles_get_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile for {} not found", email)))?;
        Ok((existing, false))
    }

    /// List profiles, ordered by name
    pub async fn profiles_search(&self, query: &ProfileQuery) -> AppResult<Vec<Profile>> {
        let mut filters = Filters::default();
        if let Some(ref search) = query.search {
            filters.search(&["full_name", "email"], search);
        }
        if let Some(role) = query.role {
            filters.eq("role", role);
        }
        if let Some(ref department) = query.department {
            filters.ieq("department", department);
        }

        let sql = format!(
            "SELECT * FROM profiles WHERE {} ORDER BY full_name",
            filters.where_clause()
        );
        let rows = filters
            .bind_as(sqlx::query_as::<_, Profile>(&sql))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Create a profile (admin)
    pub async fn profiles_create(
        &self,
        data: &CreateProfile,
        role: Role,
        password_hash: Option<String>,
    ) -> AppResult<Profile> {
        sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (email, full_name, role, department, password_hash)
            VALUES (LOWER($1), $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(data.email.trim())
        .bind(data.full_name.trim())
        .bind(role)
        .bind(&data.department)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, PROFILE_UNIQUE_FIELDS))
    }

    /// Update a profile
    pub async fn profiles_update(
        &self,
        id: Uuid,
        data: &UpdateProfile,
        password_hash: Option<String>,
    ) -> AppResult<Profile> {
        let now = Utc::now();
        let mut sets = vec!["updated_at = $1".to_string()];
        let mut idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(data.full_name, "full_name");
        add_field!(data.role, "role");
        add_field!(data.department, "department");
        add_field!(password_hash, "password_hash");

        let query = format!(
            "UPDATE profiles SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            idx
        );

        let mut builder = sqlx::query_as::<_, Profile>(&query).bind(now);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.full_name);
        bind_field!(data.role);
        bind_field!(data.department);
        bind_field!(password_hash);

        builder
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", id)))
    }

    /// Delete a profile
    pub async fn profiles_delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::from_reference_violation(e, "Profile has issue or asset history and cannot be deleted")
            })?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Profile {} not found", id)));
        }
        Ok(())
    }

    /// Count all profiles
    pub async fn profiles_count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
