//! Asset categories

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    /// Segment used in generated asset codes
    pub code: String,
    pub description: Option<String>,
    /// Yearly depreciation, in percent
    #[schema(value_type = Option<String>)]
    pub depreciation_rate: Option<Decimal>,
    pub maintenance_interval_days: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category with computed usage figures
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct CategoryWithStats {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub category: Category,
    pub asset_count: i64,
    #[schema(value_type = String)]
    pub total_value: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 100, message = "Category name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 16, message = "Category code is required"))]
    pub code: String,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub depreciation_rate: Option<Decimal>,
    #[validate(range(min = 1))]
    pub maintenance_interval_days: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCategory {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 16))]
    pub code: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub depreciation_rate: Option<Decimal>,
    #[validate(range(min = 1))]
    pub maintenance_interval_days: Option<i32>,
}
