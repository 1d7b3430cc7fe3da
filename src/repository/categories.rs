//! Category domain methods on Repository

use chrono::Utc;
use uuid::Uuid;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::category::{Category, CategoryWithStats, CreateCategory, UpdateCategory},
};

const CATEGORY_UNIQUE_FIELDS: &[(&str, &str, &str)] = &[
    ("categories_name_key", "name", "Category name already exists"),
    ("categories_code_key", "code", "Category code already exists"),
];

impl Repository {
    /// List categories with asset count and total purchase value
    pub async fn categories_list(&self) -> AppResult<Vec<CategoryWithStats>> {
        let rows = sqlx::query_as::<_, CategoryWithStats>(
            r#"
            SELECT c.*,
                   COUNT(a.id) AS asset_count,
                   COALESCE(SUM(a.purchase_price), 0) AS total_value
            FROM categories c
            LEFT JOIN assets a ON LOWER(a.category) = LOWER(c.name)
            GROUP BY c.id
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Get category by ID
    pub async fn categories_get_by_id(&self, id: Uuid) -> AppResult<Category> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    /// Find category by name (case-insensitive)
    pub async fn categories_find_by_name(&self, name: &str) -> AppResult<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE LOWER(name) = LOWER($1)",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Create a category
    pub async fn categories_create(&self, data: &CreateCategory) -> AppResult<Category> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, code, description, depreciation_rate, maintenance_interval_days)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(data.name.trim().to_lowercase())
        .bind(data.code.trim().to_uppercase())
        .bind(&data.description)
        .bind(data.depreciation_rate)
        .bind(data.maintenance_interval_days)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, CATEGORY_UNIQUE_FIELDS))
    }

    /// Update a category
    pub async fn categories_update(&self, id: Uuid, data: &UpdateCategory) -> AppResult<Category> {
        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = COALESCE($2, name),
                code = COALESCE($3, code),
                description = COALESCE($4, description),
                depreciation_rate = COALESCE($5, depreciation_rate),
                maintenance_interval_days = COALESCE($6, maintenance_interval_days),
                updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.name.as_ref().map(|n| n.trim().to_lowercase()))
        .bind(data.code.as_ref().map(|c| c.trim().to_uppercase()))
        .bind(&data.description)
        .bind(data.depreciation_rate)
        .bind(data.maintenance_interval_days)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, CATEGORY_UNIQUE_FIELDS))?
        .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    /// Count assets filed under a category name
    pub async fn categories_count_assets(&self, name: &str) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM assets WHERE LOWER(category) = LOWER($1)",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Delete a category
    pub async fn categories_delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }
        Ok(())
    }
}
