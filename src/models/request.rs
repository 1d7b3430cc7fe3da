//! Asset requests raised by staff

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::enums::{RequestPriority, RequestStatus};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AssetRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub asset_category: String,
    pub asset_name: Option<String>,
    pub purpose: String,
    pub requested_date: NaiveDate,
    pub expected_return_date: Option<NaiveDate>,
    pub priority: RequestPriority,
    pub additional_notes: Option<String>,
    pub status: RequestStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Request joined with the requester's name and department
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AssetRequestDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub request: AssetRequest,
    pub requester_name: String,
    pub requester_email: String,
    pub requester_department: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAssetRequest {
    #[validate(length(min = 1, max = 100, message = "Category is required"))]
    pub asset_category: String,
    pub asset_name: Option<String>,
    #[validate(length(min = 1, max = 2000, message = "Purpose is required"))]
    pub purpose: String,
    pub requested_date: NaiveDate,
    pub expected_return_date: Option<NaiveDate>,
    pub priority: Option<RequestPriority>,
    pub additional_notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct RequestQuery {
    pub status: Option<RequestStatus>,
}

/// Review decision on a pending or approved request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewRequest {
    pub status: RequestStatus,
}

impl RequestStatus {
    /// Allowed review transitions
    pub fn can_move_to(&self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Pending, RequestStatus::Approved)
                | (RequestStatus::Pending, RequestStatus::Rejected)
                | (RequestStatus::Approved, RequestStatus::Fulfilled)
                | (RequestStatus::Approved, RequestStatus::Rejected)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_transitions() {
        assert!(RequestStatus::Pending.can_move_to(RequestStatus::Approved));
        assert!(RequestStatus::Approved.can_move_to(RequestStatus::Fulfilled));
        assert!(!RequestStatus::Pending.can_move_to(RequestStatus::Fulfilled));
        assert!(!RequestStatus::Rejected.can_move_to(RequestStatus::Approved));
        assert!(!RequestStatus::Fulfilled.can_move_to(RequestStatus::Pending));
    }
}
