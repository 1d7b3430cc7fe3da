//! Maintenance records

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::enums::{MaintenanceStatus, MaintenanceType};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MaintenanceRecord {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub maintenance_type: MaintenanceType,
    pub description: String,
    pub scheduled_date: NaiveDate,
    pub completed_date: Option<NaiveDate>,
    pub technician: Option<String>,
    #[schema(value_type = Option<String>)]
    pub cost: Option<Decimal>,
    pub notes: Option<String>,
    pub status: MaintenanceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MaintenanceRecord {
    /// Scheduled work whose date has passed
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == MaintenanceStatus::Scheduled && self.scheduled_date < today
    }
}

/// Maintenance record joined with its asset
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct MaintenanceDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub record: MaintenanceRecord,
    pub asset_code: String,
    pub asset_name: String,
    pub asset_category: String,
    #[sqlx(default)]
    pub is_overdue: bool,
}

/// Status filter; `overdue` selects scheduled records past their date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum MaintenanceFilter {
    Scheduled,
    InProgress,
    Completed,
    Overdue,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct MaintenanceQuery {
    pub status: Option<MaintenanceFilter>,
    /// Search in asset name, asset code and description
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMaintenance {
    pub asset_id: Uuid,
    pub maintenance_type: MaintenanceType,
    #[validate(length(min = 1, max = 2000, message = "Description is required"))]
    pub description: String,
    pub scheduled_date: NaiveDate,
    pub technician: Option<String>,
    #[schema(value_type = Option<String>)]
    pub cost: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CompleteMaintenance {
    /// Defaults to today
    pub completed_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub cost: Option<Decimal>,
    pub notes: Option<String>,
}

/// Counts per (derived) status
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct MaintenanceSummary {
    pub total: i64,
    pub scheduled: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub overdue: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: MaintenanceStatus, day: u32) -> MaintenanceRecord {
        let now = Utc::now();
        MaintenanceRecord {
            id: Uuid::new_v4(),
            asset_id: Uuid::new_v4(),
            maintenance_type: MaintenanceType::Preventive,
            description: "Lamp replacement".into(),
            scheduled_date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            completed_date: None,
            technician: None,
            cost: None,
            notes: None,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_only_scheduled_work_goes_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert!(record(MaintenanceStatus::Scheduled, 9).is_overdue(today));
        assert!(!record(MaintenanceStatus::Scheduled, 10).is_overdue(today));
        assert!(!record(MaintenanceStatus::InProgress, 1).is_overdue(today));
        assert!(!record(MaintenanceStatus::Completed, 1).is_overdue(today));
    }
}
