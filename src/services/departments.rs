//! Departments

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        audit::{ClientInfo, NewAuditEntry},
        department::{CreateDepartment, Department, DepartmentWithStats, UpdateDepartment},
        enums::AuditSeverity,
        profile::UserClaims,
    },
    repository::Repository,
    services::audit::AuditService,
};

#[derive(Clone)]
pub struct DepartmentsService {
    repository: Repository,
    audit: AuditService,
}

impl DepartmentsService {
    pub fn new(repository: Repository, audit: AuditService) -> Self {
        Self { repository, audit }
    }

    pub async fn list(&self) -> AppResult<Vec<DepartmentWithStats>> {
        self.repository.departments_list().await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Department> {
        self.repository.departments_get_by_id(id).await
    }

    pub async fn create(
        &self,
        data: &CreateDepartment,
        claims: &UserClaims,
        client: &ClientInfo,
    ) -> AppResult<Department> {
        claims.require_admin()?;
        data.validate()?;

        let department = self.repository.departments_create(data).await?;
        self.audit
            .record(
                NewAuditEntry::new("department.create", "department", AuditSeverity::Low)
                    .actor(claims.sub, &claims.email)
                    .resource_id(&department.code)
                    .client(client),
            )
            .await;
        Ok(department)
    }

    pub async fn update(
        &self,
        id: Uuid,
        data: &UpdateDepartment,
        claims: &UserClaims,
        client: &ClientInfo,
    ) -> AppResult<Department> {
        claims.require_admin()?;
        data.validate()?;

        let department = self.repository.departments_update(id, data).await?;
        self.audit
            .record(
                NewAuditEntry::new("department.update", "department", AuditSeverity::Low)
                    .actor(claims.sub, &claims.email)
                    .resource_id(&department.code)
                    .client(client),
            )
            .await;
        Ok(department)
    }

    pub async fn delete(&self, id: Uuid, claims: &UserClaims, client: &ClientInfo) -> AppResult<()> {
        claims.require_admin()?;

        let department = self.repository.departments_get_by_id(id).await?;
        self.repository.departments_delete(id).await?;
        self.audit
            .record(
                NewAuditEntry::new("department.delete", "department", AuditSeverity::Medium)
                    .actor(claims.sub, &claims.email)
                    .resource_id(&department.code)
                    .client(client),
            )
            .await;
        Ok(())
    }
}
