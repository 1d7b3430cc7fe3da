//! Department domain methods on Repository

use chrono::Utc;
use uuid::Uuid;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::department::{CreateDepartment, Department, DepartmentWithStats, UpdateDepartment},
};

const DEPARTMENT_UNIQUE_FIELDS: &[(&str, &str, &str)] = &[
    ("departments_name_key", "name", "Department name already exists"),
    ("departments_code_key", "code", "Department code already exists"),
];

impl Repository {
    /// List departments with member and active-issue counts
    pub async fn departments_list(&self) -> AppResult<Vec<DepartmentWithStats>> {
        let rows = sqlx::query_as::<_, DepartmentWithStats>(
            r#"
            SELECT d.*,
                   (SELECT COUNT(*) FROM profiles p
                    WHERE LOWER(p.department) = LOWER(d.name)) AS user_count,
                   (SELECT COUNT(*) FROM asset_issues ai
                    JOIN profiles p ON p.id = ai.issued_to
                    WHERE ai.status = 'active' AND LOWER(p.department) = LOWER(d.name)) AS active_issues
            FROM departments d
            ORDER BY d.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Get department by ID
    pub async fn departments_get_by_id(&self, id: Uuid) -> AppResult<Department> {
        sqlx::query_as::<_, Department>("SELECT * FROM departments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Department {} not found", id)))
    }

    /// Create a department
    pub async fn departments_create(&self, data: &CreateDepartment) -> AppResult<Department> {
        sqlx::query_as::<_, Department>(
            r#"
            INSERT INTO departments (
                name, code, description, head_of_department,
                contact_email, contact_phone, location
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(data.name.trim())
        .bind(data.code.trim().to_uppercase())
        .bind(&data.description)
        .bind(&data.head_of_department)
        .bind(&data.contact_email)
        .bind(&data.contact_phone)
        .bind(&data.location)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DEPARTMENT_UNIQUE_FIELDS))
    }

    /// Update a department
    pub async fn departments_update(&self, id: Uuid, data: &UpdateDepartment) -> AppResult<Department> {
        sqlx::query_as::<_, Department>(
            r#"
            UPDATE departments
            SET name = COALESCE($2, name),
                code = COALESCE($3, code),
                description = COALESCE($4, description),
                head_of_department = COALESCE($5, head_of_department),
                contact_email = COALESCE($6, contact_email),
                contact_phone = COALESCE($7, contact_phone),
                location = COALESCE($8, location),
                updated_at = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.name.as_ref().map(|n| n.trim().to_string()))
        .bind(data.code.as_ref().map(|c| c.trim().to_uppercase()))
        .bind(&data.description)
        .bind(&data.head_of_department)
        .bind(&data.contact_email)
        .bind(&data.contact_phone)
        .bind(&data.location)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DEPARTMENT_UNIQUE_FIELDS))?
        .ok_or_else(|| AppError::NotFound(format!("Department {} not found", id)))
    }

    /// Delete a department
    pub async fn departments_delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Department {} not found", id)));
        }
        Ok(())
    }
}
