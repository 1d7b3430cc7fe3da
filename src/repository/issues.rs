//! Issue/return domain methods on Repository

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{postgres::PgRow, Row};
use uuid::Uuid;

use super::{Filters, Repository};
use crate::{
    error::{AppError, AppResult},
    models::{
        asset::AssetShort,
        enums::{AssetCondition, AssetStatus, IssueStatus},
        issue::{AssetIssue, IssueDetails, IssueQuery},
        profile::ProfileShort,
    },
};

const ISSUE_UNIQUE_FIELDS: &[(&str, &str, &str)] = &[(
    "asset_issues_one_active_idx",
    "asset_id",
    "Asset already has an active issue",
)];

const ISSUE_DETAILS_SELECT: &str = r#"
    SELECT ai.id, ai.status, ai.issue_date, ai.expected_return_date,
           ai.actual_return_date, ai.return_condition, ai.notes,
           a.id AS asset_id, a.asset_code, a.name AS asset_name, a.category AS asset_category,
           a.brand AS asset_brand, a.model AS asset_model, a.location AS asset_location,
           a.status AS asset_status, a.condition AS asset_condition,
           t.id AS to_id, t.full_name AS to_name, t.email AS to_email, t.department AS to_department,
           b.id AS by_id, b.full_name AS by_name, b.email AS by_email, b.department AS by_department
    FROM asset_issues ai
    JOIN assets a ON a.id = ai.asset_id
    JOIN profiles t ON t.id = ai.issued_to
    LEFT JOIN profiles b ON b.id = ai.issued_by
"#;

/// Build issue details from a row of `ISSUE_DETAILS_SELECT`
fn issue_details_from_row(row: &PgRow, now: DateTime<Utc>) -> Result<IssueDetails, sqlx::Error> {
    let issued_by = match row.try_get::<Option<Uuid>, _>("by_id")? {
        Some(id) => Some(ProfileShort {
            id,
            full_name: row.try_get("by_name")?,
            email: row.try_get("by_email")?,
            department: row.try_get("by_department")?,
        }),
        None => None,
    };

    let details = IssueDetails {
        id: row.try_get("id")?,
        status: row.try_get("status")?,
        issue_date: row.try_get("issue_date")?,
        expected_return_date: row.try_get("expected_return_date")?,
        actual_return_date: row.try_get("actual_return_date")?,
        return_condition: row.try_get("return_condition")?,
        notes: row.try_get("notes")?,
        asset: AssetShort {
            id: row.try_get("asset_id")?,
            asset_code: row.try_get("asset_code")?,
            name: row.try_get("asset_name")?,
            category: row.try_get("asset_category")?,
            brand: row.try_get("asset_brand")?,
            model: row.try_get("asset_model")?,
            location: row.try_get("asset_location")?,
            status: row.try_get("asset_status")?,
            condition: row.try_get("asset_condition")?,
        },
        issued_to: ProfileShort {
            id: row.try_get("to_id")?,
            full_name: row.try_get("to_name")?,
            email: row.try_get("to_email")?,
            department: row.try_get("to_department")?,
        },
        issued_by,
        is_overdue: false,
        days_overdue: 0,
    };

    Ok(details.refresh_overdue(now))
}

impl Repository {
    /// Get issue by ID
    pub async fn issues_get_by_id(&self, id: Uuid) -> AppResult<AssetIssue> {
        sqlx::query_as::<_, AssetIssue>("SELECT * FROM asset_issues WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Issue {} not found", id)))
    }

    /// Get issue with asset and profiles
    pub async fn issues_get_details(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<IssueDetails> {
        let query = format!("{} WHERE ai.id = $1", ISSUE_DETAILS_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Issue {} not found", id)))?;
        Ok(issue_details_from_row(&row, now)?)
    }

    /// Active issue of an asset, if any
    pub async fn issues_active_for_asset(
        &self,
        asset_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<IssueDetails>> {
        let query = format!(
            "{} WHERE ai.asset_id = $1 AND ai.status = 'active'",
            ISSUE_DETAILS_SELECT
        );
        let row = sqlx::query(&query)
            .bind(asset_id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(issue_details_from_row(&row, now)?)),
            None => Ok(None),
        }
    }

    /// Issue an available asset.
    ///
    /// The asset row is locked for the duration of the transaction; the issue
    /// insert and the status change commit together or not at all.
    pub async fn issues_create(
        &self,
        asset_id: Uuid,
        issued_to: Uuid,
        issued_by: Uuid,
        expected_return_date: DateTime<Utc>,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<AssetIssue> {
        let mut tx = self.pool.begin().await?;

        let (status, asset_code) = sqlx::query_as::<_, (AssetStatus, String)>(
            "SELECT status, asset_code FROM assets WHERE id = $1 FOR UPDATE",
        )
        .bind(asset_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Asset {} not found", asset_id)))?;

        if status != AssetStatus::Available {
            return Err(AppError::BusinessRule(format!(
                "Asset {} is not available ({})",
                asset_code, status
            )));
        }

        let recipient_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM profiles WHERE id = $1)")
                .bind(issued_to)
                .fetch_one(&mut *tx)
                .await?;
        if !recipient_exists {
            return Err(AppError::NotFound(format!("Profile {} not found", issued_to)));
        }

        let issue = sqlx::query_as::<_, AssetIssue>(
            r#"
            INSERT INTO asset_issues (
                asset_id, issued_to, issued_by, issue_date, expected_return_date, status, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(asset_id)
        .bind(issued_to)
        .bind(issued_by)
        .bind(now)
        .bind(expected_return_date)
        .bind(IssueStatus::Active)
        .bind(notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_unique_violation(e, ISSUE_UNIQUE_FIELDS))?;

        sqlx::query("UPDATE assets SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(asset_id)
            .bind(AssetStatus::Issued)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(issue)
    }

    /// Close an active issue and make its asset available again with the
    /// reported condition.
    pub async fn issues_return(
        &self,
        issue_id: Uuid,
        return_condition: AssetCondition,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<AssetIssue> {
        let mut tx = self.pool.begin().await?;

        let issue = sqlx::query_as::<_, AssetIssue>(
            "SELECT * FROM asset_issues WHERE id = $1 FOR UPDATE",
        )
        .bind(issue_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Issue {} not found", issue_id)))?;

        if issue.status != IssueStatus::Active {
            return Err(AppError::BusinessRule(format!(
                "Issue {} is not active",
                issue_id
            )));
        }

        // Clock skew must never put the return before the issue
        let returned_at = now.max(issue.issue_date);

        let returned = sqlx::query_as::<_, AssetIssue>(
            r#"
            UPDATE asset_issues
            SET status = $2, actual_return_date = $3, return_condition = $4,
                notes = COALESCE($5, notes)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(issue_id)
        .bind(IssueStatus::Returned)
        .bind(returned_at)
        .bind(return_condition)
        .bind(notes)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE assets SET status = $2, condition = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(issue.asset_id)
        .bind(AssetStatus::Available)
        .bind(return_condition)
        .bind(returned_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(returned)
    }

    /// Active issues, newest first, with text and category filters.
    /// The overdue filter is applied by the caller once `now` is known.
    pub async fn issues_list_active(
        &self,
        query: &IssueQuery,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<IssueDetails>> {
        let mut filters = Filters::default();
        filters.raw("ai.status = 'active'");
        if let Some(ref search) = query.search {
            filters.search(&["a.name", "a.asset_code", "t.full_name"], search);
        }
        if let Some(ref category) = query.category {
            filters.ieq("a.category", category);
        }

        let sql = format!(
            "{} WHERE {} ORDER BY ai.issue_date DESC",
            ISSUE_DETAILS_SELECT,
            filters.where_clause()
        );
        let rows = filters
            .bind_query(sqlx::query(&sql))
            .fetch_all(&self.pool)
            .await?;

        let issues = rows
            .iter()
            .map(|row| issue_details_from_row(row, now))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(issues)
    }

    /// Issues held by a profile
    pub async fn issues_for_profile(
        &self,
        profile_id: Uuid,
        include_returned: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<IssueDetails>> {
        let status_clause = if include_returned { "" } else { " AND ai.status = 'active'" };
        let sql = format!(
            "{} WHERE ai.issued_to = $1{} ORDER BY ai.issue_date DESC",
            ISSUE_DETAILS_SELECT, status_clause
        );
        let rows = sqlx::query(&sql).bind(profile_id).fetch_all(&self.pool).await?;
        let issues = rows
            .iter()
            .map(|row| issue_details_from_row(row, now))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(issues)
    }

    /// Full issue history of an asset
    pub async fn issues_for_asset(&self, asset_id: Uuid, now: DateTime<Utc>) -> AppResult<Vec<IssueDetails>> {
        let sql = format!(
            "{} WHERE ai.asset_id = $1 ORDER BY ai.issue_date DESC",
            ISSUE_DETAILS_SELECT
        );
        let rows = sqlx::query(&sql).bind(asset_id).fetch_all(&self.pool).await?;
        let issues = rows
            .iter()
            .map(|row| issue_details_from_row(row, now))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(issues)
    }

    /// Most recent issues of any status
    pub async fn issues_recent(&self, limit: i64, now: DateTime<Utc>) -> AppResult<Vec<IssueDetails>> {
        let sql = format!("{} ORDER BY ai.issue_date DESC LIMIT $1", ISSUE_DETAILS_SELECT);
        let rows = sqlx::query(&sql).bind(limit).fetch_all(&self.pool).await?;
        let issues = rows
            .iter()
            .map(|row| issue_details_from_row(row, now))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(issues)
    }

    /// Issues starting or due within `[start, end)`
    pub async fn issues_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<IssueDetails>> {
        let sql = format!(
            r#"{} WHERE (ai.issue_date::date >= $1 AND ai.issue_date::date < $2)
                  OR (ai.expected_return_date::date >= $1 AND ai.expected_return_date::date < $2)
               ORDER BY ai.issue_date"#,
            ISSUE_DETAILS_SELECT
        );
        let rows = sqlx::query(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;
        let issues = rows
            .iter()
            .map(|row| issue_details_from_row(row, now))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(issues)
    }

    /// Count active issues
    pub async fn issues_count_active(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM asset_issues WHERE status = 'active'")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Count active issues past their expected return at `now`
    pub async fn issues_count_overdue(&self, now: DateTime<Utc>) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM asset_issues WHERE status = 'active' AND expected_return_date < $1",
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Count active issues held by a profile
    pub async fn issues_count_active_for_profile(&self, profile_id: Uuid) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM asset_issues WHERE issued_to = $1 AND status = 'active'",
        )
        .bind(profile_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
