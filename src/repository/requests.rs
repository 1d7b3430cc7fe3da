//! Asset request methods on Repository

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Filters, Repository};
use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{RequestPriority, RequestStatus},
        request::{AssetRequest, AssetRequestDetails, CreateAssetRequest, RequestQuery},
    },
};

const REQUEST_DETAILS_SELECT: &str = r#"
    SELECT r.*, p.full_name AS requester_name, p.email AS requester_email,
           p.department AS requester_department
    FROM asset_requests r
    JOIN profiles p ON p.id = r.requester_id
"#;

impl Repository {
    /// Get request by ID
    pub async fn requests_get_by_id(&self, id: Uuid) -> AppResult<AssetRequest> {
        sqlx::query_as::<_, AssetRequest>("SELECT * FROM asset_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))
    }

    /// Create a request for a profile
    pub async fn requests_create(&self, requester_id: Uuid, data: &CreateAssetRequest) -> AppResult<AssetRequest> {
        let row = sqlx::query_as::<_, AssetRequest>(
            r#"
            INSERT INTO asset_requests (
                requester_id, asset_category, asset_name, purpose, requested_date,
                expected_return_date, priority, additional_notes, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(requester_id)
        .bind(data.asset_category.trim().to_lowercase())
        .bind(&data.asset_name)
        .bind(data.purpose.trim())
        .bind(data.requested_date)
        .bind(data.expected_return_date)
        .bind(data.priority.unwrap_or(RequestPriority::Medium))
        .bind(&data.additional_notes)
        .bind(RequestStatus::Pending)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// List requests, newest first, optionally for a single requester
    pub async fn requests_search(
        &self,
        requester_id: Option<Uuid>,
        query: &RequestQuery,
    ) -> AppResult<Vec<AssetRequestDetails>> {
        let mut filters = Filters::default();
        if let Some(id) = requester_id {
            let p = filters.param(id);
            filters.raw(format!("r.requester_id = {}::uuid", p));
        }
        if let Some(status) = query.status {
            filters.eq("r.status", status);
        }

        let sql = format!(
            "{} WHERE {} ORDER BY r.created_at DESC",
            REQUEST_DETAILS_SELECT,
            filters.where_clause()
        );
        let rows = filters
            .bind_as(sqlx::query_as::<_, AssetRequestDetails>(&sql))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Record a review decision
    pub async fn requests_set_status(
        &self,
        id: Uuid,
        status: RequestStatus,
        reviewed_by: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<AssetRequest> {
        sqlx::query_as::<_, AssetRequest>(
            r#"
            UPDATE asset_requests
            SET status = $2, reviewed_by = $3, reviewed_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(reviewed_by)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))
    }

    /// Pending requests raised by a profile
    pub async fn requests_count_pending_for(&self, requester_id: Uuid) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM asset_requests WHERE requester_id = $1 AND status = 'pending'",
        )
        .bind(requester_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
