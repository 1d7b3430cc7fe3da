//! Asset model and related types

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use unicode_normalization::UnicodeNormalization;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{
    enums::{AssetCondition, AssetStatus},
    issue::IssueDetails,
    maintenance::MaintenanceRecord,
};

/// Asset codes are upper-case segments joined by dashes, e.g. CUT-PROJ-001
static ASSET_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]+(-[A-Z0-9]+)*$").expect("valid asset code regex"));

/// Normalize a typed or scanned asset code: trim, NFKC fold, upper-case.
pub fn normalize_asset_code(code: &str) -> String {
    code.trim().nfkc().collect::<String>().to_uppercase()
}

/// Whether a normalized code has the expected shape
pub fn is_valid_asset_code(code: &str) -> bool {
    code.len() <= 64 && ASSET_CODE_RE.is_match(code)
}

/// Asset record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Asset {
    pub id: Uuid,
    /// Human-readable unique code (e.g. CUT-PROJ-001)
    pub asset_code: String,
    pub name: String,
    /// Category name (projector, laptop, ...)
    pub category: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub purchase_price: Option<Decimal>,
    pub warranty_expiry: Option<NaiveDate>,
    pub condition: AssetCondition,
    pub status: AssetStatus,
    pub location: Option<String>,
    pub description: Option<String>,
    /// URL of the QR image rendered by the third-party QR service
    pub qr_code_url: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short asset representation for lists and joins
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AssetShort {
    pub id: Uuid,
    pub asset_code: String,
    pub name: String,
    pub category: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub location: Option<String>,
    pub status: AssetStatus,
    pub condition: AssetCondition,
}

impl From<&Asset> for AssetShort {
    fn from(a: &Asset) -> Self {
        AssetShort {
            id: a.id,
            asset_code: a.asset_code.clone(),
            name: a.name.clone(),
            category: a.category.clone(),
            brand: a.brand.clone(),
            model: a.model.clone(),
            location: a.location.clone(),
            status: a.status,
            condition: a.condition,
        }
    }
}

/// Asset registration request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAsset {
    #[validate(length(min = 1, max = 64, message = "Asset code is required"))]
    pub asset_code: String,
    #[validate(length(min = 1, max = 200, message = "Asset name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "Category is required"))]
    pub category: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub purchase_price: Option<Decimal>,
    pub warranty_expiry: Option<NaiveDate>,
    /// Defaults to excellent
    pub condition: Option<AssetCondition>,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// Update descriptive asset fields (status changes go through dedicated operations)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateAsset {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub purchase_price: Option<Decimal>,
    pub warranty_expiry: Option<NaiveDate>,
    pub condition: Option<AssetCondition>,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// Manual status change request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateAssetStatus {
    pub status: AssetStatus,
}

/// Asset list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct AssetQuery {
    /// Free text over name, code, brand, model and serial number
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<AssetStatus>,
    pub condition: Option<AssetCondition>,
    pub location: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Paginated asset list
#[derive(Debug, Serialize, ToSchema)]
pub struct AssetPage {
    pub items: Vec<Asset>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// Result of an advisory uniqueness check
#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityCheck {
    pub value: String,
    pub available: bool,
    /// Field-level message when the value is taken
    pub message: Option<String>,
}

/// Generated asset code
#[derive(Debug, Serialize, ToSchema)]
pub struct GeneratedCode {
    pub asset_code: String,
    pub qr_code_url: String,
    pub attempts: u32,
}

/// Everything that ever happened to an asset
#[derive(Debug, Serialize, ToSchema)]
pub struct AssetHistory {
    pub asset: Asset,
    pub issues: Vec<IssueDetails>,
    pub maintenance: Vec<MaintenanceRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_asset_code() {
        assert_eq!(normalize_asset_code("  cut-proj-001 "), "CUT-PROJ-001");
        // Full-width characters fold to ASCII
        assert_eq!(normalize_asset_code("ＣＵＴ-LAP-7"), "CUT-LAP-7");
    }

    #[test]
    fn test_asset_code_shape() {
        assert!(is_valid_asset_code("CUT-PROJ-001"));
        assert!(is_valid_asset_code("A1"));
        assert!(!is_valid_asset_code("CUT--PROJ"));
        assert!(!is_valid_asset_code("cut-proj"));
        assert!(!is_valid_asset_code("CUT PROJ"));
        assert!(!is_valid_asset_code(""));
    }
}
