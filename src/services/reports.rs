//! Reports and analytics (admin)

use chrono::{DateTime, Utc};

use crate::{
    error::AppResult,
    models::{
        profile::UserClaims,
        report::{Report, ReportOverview},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ReportsService {
    repository: Repository,
}

impl ReportsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn overview(&self, now: DateTime<Utc>) -> AppResult<ReportOverview> {
        Ok(ReportOverview {
            total_assets: self.repository.reports_count_assets().await?,
            total_users: self.repository.profiles_count().await?,
            active_issues: self.repository.issues_count_active().await?,
            overdue_issues: self.repository.issues_count_overdue(now).await?,
            total_asset_value: self.repository.reports_total_asset_value().await?,
        })
    }

    /// Full report: overview, departments, categories and the last six months
    pub async fn report(&self, claims: &UserClaims, now: DateTime<Utc>) -> AppResult<Report> {
        claims.require_admin()?;

        Ok(Report {
            overview: self.overview(now).await?,
            departments: self.repository.reports_department_stats().await?,
            categories: self.repository.reports_category_distribution().await?,
            monthly_issues: self.repository.reports_monthly_issues(now).await?,
        })
    }
}
