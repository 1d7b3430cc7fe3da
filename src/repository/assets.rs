//! Asset domain methods on Repository

use chrono::Utc;
use uuid::Uuid;

use super::{Filters, Repository};
use crate::{
    error::{AppError, AppResult},
    models::{
        asset::{Asset, AssetQuery, AssetShort, CreateAsset, UpdateAsset},
        dashboard::CategoryCounts,
        enums::{AssetCondition, AssetStatus},
    },
};

/// Unique constraints on `assets` and the field each one reports
pub(crate) const ASSET_UNIQUE_FIELDS: &[(&str, &str, &str)] = &[
    ("assets_asset_code_key", "asset_code", "Asset code already exists"),
    ("assets_serial_number_key", "serial_number", "Serial number already exists"),
];

const DEFAULT_PER_PAGE: i64 = 20;
const MAX_PER_PAGE: i64 = 200;

/// Clamped page, page size and row offset; the offset cannot overflow
fn page_window(page: Option<i64>, per_page: Option<i64>) -> (i64, i64, i64) {
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    let page = page.unwrap_or(1).clamp(1, i64::MAX / per_page);
    (page, per_page, (page - 1) * per_page)
}

impl Repository {
    /// Get asset by ID
    pub async fn assets_get_by_id(&self, id: Uuid) -> AppResult<Asset> {
        sqlx::query_as::<_, Asset>("SELECT * FROM assets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Asset {} not found", id)))
    }

    /// Find asset by its (already normalized) code
    pub async fn assets_find_by_code(&self, code: &str) -> AppResult<Option<Asset>> {
        let asset = sqlx::query_as::<_, Asset>("SELECT * FROM assets WHERE asset_code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(asset)
    }

    /// Check if an asset code is already taken
    pub async fn assets_code_exists(&self, code: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM assets WHERE asset_code = $1)")
                .bind(code)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Check if a serial number is already taken, optionally ignoring one asset
    pub async fn assets_serial_exists(&self, serial: &str, exclude_id: Option<Uuid>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM assets WHERE serial_number = $1 AND id != $2)",
            )
            .bind(serial)
            .bind(id)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM assets WHERE serial_number = $1)")
                .bind(serial)
                .fetch_one(&self.pool)
                .await?
        };
        Ok(exists)
    }

    /// Insert a new asset with status `available`.
    ///
    /// `data.asset_code` must already be normalized. A unique violation is
    /// reported against the field whose constraint fired.
    pub async fn assets_create(
        &self,
        data: &CreateAsset,
        qr_code_url: &str,
        created_by: Uuid,
    ) -> AppResult<Asset> {
        sqlx::query_as::<_, Asset>(
            r#"
            INSERT INTO assets (
                asset_code, name, category, brand, model, serial_number,
                purchase_date, purchase_price, warranty_expiry, condition, status,
                location, description, qr_code_url, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(&data.asset_code)
        .bind(data.name.trim())
        .bind(data.category.trim().to_lowercase())
        .bind(&data.brand)
        .bind(&data.model)
        .bind(&data.serial_number)
        .bind(data.purchase_date)
        .bind(data.purchase_price)
        .bind(data.warranty_expiry)
        .bind(data.condition.unwrap_or(AssetCondition::Excellent))
        .bind(AssetStatus::Available)
        .bind(&data.location)
        .bind(&data.description)
        .bind(qr_code_url)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, ASSET_UNIQUE_FIELDS))
    }

    /// Search assets, newest first
    pub async fn assets_search(&self, query: &AssetQuery) -> AppResult<(Vec<Asset>, i64, i64, i64)> {
        let (page, per_page, offset) = page_window(query.page, query.per_page);

        let mut filters = Filters::default();
        if let Some(ref search) = query.search {
            filters.search(
                &["name", "asset_code", "brand", "model", "serial_number"],
                search,
            );
        }
        if let Some(ref category) = query.category {
            filters.ieq("category", category);
        }
        if let Some(status) = query.status {
            filters.eq("status", status);
        }
        if let Some(condition) = query.condition {
            filters.eq("condition", condition);
        }
        if let Some(ref location) = query.location {
            filters.search(&["location"], location);
        }
        let where_clause = filters.where_clause();

        let count_query = format!("SELECT COUNT(*) FROM assets WHERE {}", where_clause);
        let total: i64 = filters
            .bind_scalar(sqlx::query_scalar(&count_query))
            .fetch_one(&self.pool)
            .await?;

        let select_query = format!(
            "SELECT * FROM assets WHERE {} ORDER BY created_at DESC LIMIT {} OFFSET {}",
            where_clause, per_page, offset
        );
        let assets = filters
            .bind_as(sqlx::query_as::<_, Asset>(&select_query))
            .fetch_all(&self.pool)
            .await?;

        Ok((assets, total, page, per_page))
    }

    /// Update descriptive fields
    pub async fn assets_update(&self, id: Uuid, data: &UpdateAsset) -> AppResult<Asset> {
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

        add_field!(data.name, "name");
        add_field!(data.category, "category");
        add_field!(data.brand, "brand");
        add_field!(data.model, "model");
        add_field!(data.serial_number, "serial_number");
        add_field!(data.purchase_date, "purchase_date");
        add_field!(data.purchase_price, "purchase_price");
        add_field!(data.warranty_expiry, "warranty_expiry");
        add_field!(data.condition, "condition");
        add_field!(data.location, "location");
        add_field!(data.description, "description");

        let query = format!(
            "UPDATE assets SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            idx
        );

        let mut builder = sqlx::query_as::<_, Asset>(&query).bind(now);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        let category = data.category.as_ref().map(|c| c.trim().to_lowercase());

        bind_field!(data.name);
        bind_field!(category);
        bind_field!(data.brand);
        bind_field!(data.model);
        bind_field!(data.serial_number);
        bind_field!(data.purchase_date);
        bind_field!(data.purchase_price);
        bind_field!(data.warranty_expiry);
        bind_field!(data.condition);
        bind_field!(data.location);
        bind_field!(data.description);

        builder
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::from_unique_violation(e, ASSET_UNIQUE_FIELDS))?
            .ok_or_else(|| AppError::NotFound(format!("Asset {} not found", id)))
    }

    /// Manual status change; refuses to touch assets that are currently issued
    pub async fn assets_set_status(&self, id: Uuid, status: AssetStatus) -> AppResult<Asset> {
        let updated = sqlx::query_as::<_, Asset>(
            r#"
            UPDATE assets SET status = $2, updated_at = $3
            WHERE id = $1 AND status != 'issued'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(asset) => Ok(asset),
            None => {
                let asset = self.assets_get_by_id(id).await?;
                Err(AppError::BusinessRule(format!(
                    "Asset {} is issued; it becomes available through a return",
                    asset.asset_code
                )))
            }
        }
    }

    /// Most recently registered assets
    pub async fn assets_recent(&self, limit: i64) -> AppResult<Vec<AssetShort>> {
        let rows = sqlx::query_as::<_, AssetShort>(
            r#"
            SELECT id, asset_code, name, category, brand, model, location, status, condition
            FROM assets
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Asset counts grouped by status
    pub async fn assets_count_by_status(&self) -> AppResult<Vec<(AssetStatus, i64)>> {
        let rows = sqlx::query_as::<_, (AssetStatus, i64)>(
            "SELECT status, COUNT(*) FROM assets GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Per-category totals with available and issued counts
    pub async fn assets_category_counts(&self) -> AppResult<Vec<CategoryCounts>> {
        let rows = sqlx::query_as::<_, CategoryCounts>(
            r#"
            SELECT category,
                   COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'available') AS available,
                   COUNT(*) FILTER (WHERE status = 'issued') AS issued
            FROM assets
            GROUP BY category
            ORDER BY category
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Available assets in one category
    pub async fn assets_count_available_in(&self, category: &str) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM assets WHERE LOWER(category) = LOWER($1) AND status = 'available'",
        )
        .bind(category)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window_defaults() {
        assert_eq!(page_window(None, None), (1, 20, 0));
        assert_eq!(page_window(Some(3), Some(50)), (3, 50, 100));
        assert_eq!(page_window(Some(0), Some(0)), (1, 1, 0));
        assert_eq!(page_window(Some(2), Some(10_000)), (2, 200, 200));
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let (page, per_page, offset) = page_window(Some(i64::MAX), Some(200));
        assert_eq!(per_page, 200);
        assert_eq!(page, i64::MAX / 200);
        assert!(offset >= 0);
        assert!(page_window(Some(i64::MAX), None).2 >= 0);
    }
}
