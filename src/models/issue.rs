//! Asset issue model, overdue arithmetic and issue/return requests

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{
    asset::{Asset, AssetShort},
    enums::{AssetCondition, IssueStatus},
    profile::ProfileShort,
};
use crate::error::{AppError, AppResult};

const SECONDS_PER_DAY: i64 = 86_400;

/// Issue record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AssetIssue {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub issued_to: Uuid,
    pub issued_by: Uuid,
    pub issue_date: DateTime<Utc>,
    pub expected_return_date: DateTime<Utc>,
    pub actual_return_date: Option<DateTime<Utc>>,
    pub status: IssueStatus,
    pub return_condition: Option<AssetCondition>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Overdue state of an issue at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Overdue {
    pub is_overdue: bool,
    /// Whole days past the expected return date, rounded up; 0 when not overdue
    pub days_overdue: i64,
}

impl Overdue {
    /// `expected < now`, with the elapsed time rounded up to whole days
    pub fn at(expected_return_date: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if expected_return_date < now {
            let elapsed = (now - expected_return_date).num_seconds();
            Overdue {
                is_overdue: true,
                days_overdue: (elapsed + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY,
            }
        } else {
            Overdue {
                is_overdue: false,
                days_overdue: 0,
            }
        }
    }

    pub fn none() -> Self {
        Overdue {
            is_overdue: false,
            days_overdue: 0,
        }
    }
}

/// Issue joined with its asset and both profiles, with overdue computed on read
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IssueDetails {
    pub id: Uuid,
    pub status: IssueStatus,
    pub issue_date: DateTime<Utc>,
    pub expected_return_date: DateTime<Utc>,
    pub actual_return_date: Option<DateTime<Utc>>,
    pub return_condition: Option<AssetCondition>,
    pub notes: Option<String>,
    pub asset: AssetShort,
    pub issued_to: ProfileShort,
    pub issued_by: Option<ProfileShort>,
    pub is_overdue: bool,
    pub days_overdue: i64,
}

impl IssueDetails {
    /// Recompute the derived overdue fields against `now`.
    /// Only active issues can be overdue.
    pub fn refresh_overdue(mut self, now: DateTime<Utc>) -> Self {
        let overdue = match self.status {
            IssueStatus::Active => Overdue::at(self.expected_return_date, now),
            IssueStatus::Returned => Overdue::none(),
        };
        self.is_overdue = overdue.is_overdue;
        self.days_overdue = overdue.days_overdue;
        self
    }
}

/// Quick return-date presets offered by the issue form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ReturnPreset {
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "14d")]
    FourteenDays,
    #[serde(rename = "1m")]
    OneMonth,
}

impl ReturnPreset {
    pub fn from_today(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            ReturnPreset::SevenDays => today.checked_add_signed(Duration::days(7)),
            ReturnPreset::FourteenDays => today.checked_add_signed(Duration::days(14)),
            ReturnPreset::OneMonth => today.checked_add_months(Months::new(1)),
        }
    }
}

/// Start of the given day in UTC
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Issue request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IssueRequest {
    pub asset_id: Uuid,
    /// Profile receiving the asset
    pub issued_to: Uuid,
    /// Explicit return date (YYYY-MM-DD); takes precedence over `preset`
    pub expected_return_date: Option<NaiveDate>,
    pub preset: Option<ReturnPreset>,
    pub notes: Option<String>,
}

impl IssueRequest {
    /// Resolve the expected return instant. Dates in the past are refused.
    pub fn resolve_expected_return(&self, today: NaiveDate) -> AppResult<DateTime<Utc>> {
        let date = match (self.expected_return_date, self.preset) {
            (Some(date), _) => date,
            (None, Some(preset)) => preset
                .from_today(today)
                .ok_or_else(|| AppError::Validation("Return date out of range".to_string()))?,
            (None, None) => {
                return Err(AppError::Validation(
                    "expected_return_date or preset is required".to_string(),
                ))
            }
        };

        if date < today {
            return Err(AppError::Validation(
                "Expected return date cannot be in the past".to_string(),
            ));
        }

        Ok(start_of_day(date))
    }
}

/// Return request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReturnRequest {
    /// Condition reported at return; defaults to good
    pub return_condition: Option<AssetCondition>,
    pub notes: Option<String>,
}

/// Active-issue filter on overdue state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum OverdueFilter {
    #[default]
    All,
    Overdue,
    NotOverdue,
}

impl OverdueFilter {
    pub fn matches(&self, is_overdue: bool) -> bool {
        match self {
            OverdueFilter::All => true,
            OverdueFilter::Overdue => is_overdue,
            OverdueFilter::NotOverdue => !is_overdue,
        }
    }
}

/// Active issue list query
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct IssueQuery {
    /// Search in asset name, asset code and holder name
    pub search: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub overdue: OverdueFilter,
}

/// Result of scanning an asset code
#[derive(Debug, Serialize, ToSchema)]
pub struct ScanResult {
    pub asset: Asset,
    /// The asset's active issue, if it is currently issued
    pub current_issue: Option<IssueDetails>,
}

/// Quick return by scanned code
#[derive(Debug, Deserialize, ToSchema)]
pub struct QuickReturnRequest {
    pub asset_code: String,
    pub return_condition: Option<AssetCondition>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_not_overdue_before_expected() {
        let o = Overdue::at(at(2024, 3, 10, 0), at(2024, 3, 9, 23));
        assert_eq!(o, Overdue::none());
    }

    #[test]
    fn test_not_overdue_at_exact_instant() {
        let o = Overdue::at(at(2024, 3, 10, 0), at(2024, 3, 10, 0));
        assert!(!o.is_overdue);
    }

    #[test]
    fn test_overdue_days_round_up() {
        let expected = at(2024, 3, 10, 0);
        assert_eq!(Overdue::at(expected, at(2024, 3, 10, 1)).days_overdue, 1);
        assert_eq!(Overdue::at(expected, at(2024, 3, 12, 0)).days_overdue, 2);
        assert_eq!(Overdue::at(expected, at(2024, 3, 12, 6)).days_overdue, 3);
    }

    #[test]
    fn test_seven_day_issue_scanned_two_days_late() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let request = IssueRequest {
            asset_id: Uuid::new_v4(),
            issued_to: Uuid::new_v4(),
            expected_return_date: None,
            preset: Some(ReturnPreset::SevenDays),
            notes: None,
        };
        let expected = request.resolve_expected_return(today).unwrap();
        assert_eq!(expected, at(2024, 5, 8, 0));

        let scanned = expected + Duration::days(2);
        let o = Overdue::at(expected, scanned);
        assert!(o.is_overdue);
        assert_eq!(o.days_overdue, 2);
    }

    #[test]
    fn test_presets() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            ReturnPreset::FourteenDays.from_today(today),
            NaiveDate::from_ymd_opt(2024, 2, 14)
        );
        // Month arithmetic clamps to the last day of February
        assert_eq!(
            ReturnPreset::OneMonth.from_today(today),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }

    #[test]
    fn test_explicit_date_wins_and_past_is_rejected() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut request = IssueRequest {
            asset_id: Uuid::new_v4(),
            issued_to: Uuid::new_v4(),
            expected_return_date: NaiveDate::from_ymd_opt(2024, 5, 3),
            preset: Some(ReturnPreset::OneMonth),
            notes: None,
        };
        assert_eq!(request.resolve_expected_return(today).unwrap(), at(2024, 5, 3, 0));

        request.expected_return_date = NaiveDate::from_ymd_opt(2024, 4, 30);
        assert!(matches!(
            request.resolve_expected_return(today),
            Err(AppError::Validation(_))
        ));

        request.expected_return_date = None;
        request.preset = None;
        assert!(request.resolve_expected_return(today).is_err());
    }

    #[test]
    fn test_overdue_filter() {
        assert!(OverdueFilter::All.matches(true));
        assert!(OverdueFilter::Overdue.matches(true));
        assert!(!OverdueFilter::Overdue.matches(false));
        assert!(OverdueFilter::NotOverdue.matches(false));
        let parsed: OverdueFilter = serde_json::from_str("\"not-overdue\"").unwrap();
        assert_eq!(parsed, OverdueFilter::NotOverdue);
    }
}
