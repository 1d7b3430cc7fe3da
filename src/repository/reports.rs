//! Reporting queries on Repository

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::Repository;
use crate::{
    error::AppResult,
    models::report::{CategoryDistribution, DepartmentStats, MonthlyIssues},
};

impl Repository {
    /// Total purchase value of every asset
    pub async fn reports_total_asset_value(&self) -> AppResult<Decimal> {
        let value: Decimal =
            sqlx::query_scalar("SELECT COALESCE(SUM(purchase_price), 0) FROM assets")
                .fetch_one(&self.pool)
                .await?;
        Ok(value)
    }

    /// Count all assets
    pub async fn reports_count_assets(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM assets")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Issue activity per department (profiles without a department are grouped as "Unassigned")
    pub async fn reports_department_stats(&self) -> AppResult<Vec<DepartmentStats>> {
        let rows = sqlx::query_as::<_, DepartmentStats>(
            r#"
            SELECT COALESCE(p.department, 'Unassigned') AS department,
                   COUNT(DISTINCT p.id) AS user_count,
                   COUNT(ai.id) FILTER (WHERE ai.status = 'active') AS active_issues,
                   COUNT(ai.id) AS total_issues
            FROM profiles p
            LEFT JOIN asset_issues ai ON ai.issued_to = p.id
            GROUP BY COALESCE(p.department, 'Unassigned')
            ORDER BY total_issues DESC, department
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Asset count and value per category
    pub async fn reports_category_distribution(&self) -> AppResult<Vec<CategoryDistribution>> {
        let rows = sqlx::query_as::<_, CategoryDistribution>(
            r#"
            SELECT category, COUNT(*) AS count,
                   COALESCE(SUM(purchase_price), 0) AS total_value
            FROM assets
            GROUP BY category
            ORDER BY count DESC, category
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Issues and returns per month for the six months ending with `now`'s month
    pub async fn reports_monthly_issues(&self, now: DateTime<Utc>) -> AppResult<Vec<MonthlyIssues>> {
        let rows = sqlx::query_as::<_, MonthlyIssues>(
            r#"
            WITH months AS (
                SELECT generate_series(
                    date_trunc('month', $1::timestamptz) - INTERVAL '5 months',
                    date_trunc('month', $1::timestamptz),
                    INTERVAL '1 month'
                ) AS month
            )
            SELECT to_char(m.month, 'YYYY-MM') AS month,
                   (SELECT COUNT(*) FROM asset_issues ai
                    WHERE date_trunc('month', ai.issue_date) = m.month) AS issues,
                   (SELECT COUNT(*) FROM asset_issues ai
                    WHERE date_trunc('month', ai.actual_return_date) = m.month) AS returns
            FROM months m
            ORDER BY m.month
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
