//! Reports and calendar payloads

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportOverview {
    pub total_assets: i64,
    pub total_users: i64,
    pub active_issues: i64,
    pub overdue_issues: i64,
    #[schema(value_type = String)]
    pub total_asset_value: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct DepartmentStats {
    pub department: String,
    pub user_count: i64,
    pub active_issues: i64,
    pub total_issues: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct CategoryDistribution {
    pub category: String,
    pub count: i64,
    #[schema(value_type = String)]
    pub total_value: Decimal,
}

/// Issues started in one calendar month
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct MonthlyIssues {
    /// `YYYY-MM`
    pub month: String,
    pub issues: i64,
    pub returns: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Report {
    pub overview: ReportOverview,
    pub departments: Vec<DepartmentStats>,
    pub categories: Vec<CategoryDistribution>,
    pub monthly_issues: Vec<MonthlyIssues>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct CalendarQuery {
    pub year: i32,
    /// 1..=12
    pub month: u32,
}

impl CalendarQuery {
    /// First day of the month and first day of the following month
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = NaiveDate::from_ymd_opt(self.year, self.month, 1)?;
        let end = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)?
        };
        Some((start, end))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CalendarEventKind {
    Issue,
    ExpectedReturn,
    Maintenance,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CalendarEvent {
    pub kind: CalendarEventKind,
    pub date: NaiveDate,
    pub title: String,
    pub asset_id: Uuid,
    pub asset_code: String,
    /// Issue or maintenance record id
    pub reference_id: Uuid,
    pub overdue: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_bounds() {
        let q = CalendarQuery { year: 2024, month: 12 };
        let (start, end) = q.bounds().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert!(CalendarQuery { year: 2024, month: 13 }.bounds().is_none());
    }
}
