//! Asset categories

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        audit::{ClientInfo, NewAuditEntry},
        category::{Category, CategoryWithStats, CreateCategory, UpdateCategory},
        enums::AuditSeverity,
        profile::UserClaims,
    },
    repository::Repository,
    services::audit::AuditService,
};

#[derive(Clone)]
pub struct CategoriesService {
    repository: Repository,
    audit: AuditService,
}

impl CategoriesService {
    pub fn new(repository: Repository, audit: AuditService) -> Self {
        Self { repository, audit }
    }

    pub async fn list(&self) -> AppResult<Vec<CategoryWithStats>> {
        self.repository.categories_list().await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Category> {
        self.repository.categories_get_by_id(id).await
    }

    pub async fn create(&self, data: &CreateCategory, claims: &UserClaims, client: &ClientInfo) -> AppResult<Category> {
        claims.require_admin()?;
        data.validate()?;

        let category = self.repository.categories_create(data).await?;
        self.audit
            .record(
                NewAuditEntry::new("category.create", "category", AuditSeverity::Low)
                    .actor(claims.sub, &claims.email)
                    .resource_id(&category.name)
                    .client(client),
            )
            .await;
        Ok(category)
    }

    pub async fn update(
        &self,
        id: Uuid,
        data: &UpdateCategory,
        claims: &UserClaims,
        client: &ClientInfo,
    ) -> AppResult<Category> {
        claims.require_admin()?;
        data.validate()?;

        let category = self.repository.categories_update(id, data).await?;
        self.audit
            .record(
                NewAuditEntry::new("category.update", "category", AuditSeverity::Low)
                    .actor(claims.sub, &claims.email)
                    .resource_id(&category.name)
                    .client(client),
            )
            .await;
        Ok(category)
    }

    /// Delete a category nobody files assets under
    pub async fn delete(&self, id: Uuid, claims: &UserClaims, client: &ClientInfo) -> AppResult<()> {
        claims.require_admin()?;

        let category = self.repository.categories_get_by_id(id).await?;
        let in_use = self.repository.categories_count_assets(&category.name).await?;
        if in_use > 0 {
            return Err(AppError::Conflict(format!(
                "Category {} is used by {} asset(s)",
                category.name, in_use
            )));
        }

        self.repository.categories_delete(id).await?;
        self.audit
            .record(
                NewAuditEntry::new("category.delete", "category", AuditSeverity::Medium)
                    .actor(claims.sub, &claims.email)
                    .resource_id(&category.name)
                    .client(client),
            )
            .await;
        Ok(())
    }
}
