//! Role-specific dashboards and navigation

use chrono::{DateTime, Utc};

use crate::{
    error::AppResult,
    models::{
        dashboard::{
            AdminDashboard, DashboardKind, DashboardView, Navigation, StaffDashboard, StatusCounts,
            TechnicianDashboard,
        },
        issue::IssueQuery,
        profile::UserClaims,
    },
    repository::Repository,
};

const RECENT_LIMIT: i64 = 5;
const WORKBENCH_ISSUES: usize = 10;

#[derive(Clone)]
pub struct DashboardService {
    repository: Repository,
}

impl DashboardService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Menu for the caller's role
    pub fn navigation(&self, claims: &UserClaims) -> Navigation {
        Navigation {
            role: claims.role,
            dashboard: claims.role.dashboard_kind(),
            items: claims.role.navigation(),
        }
    }

    /// Dashboard payload for the caller's role
    pub async fn dashboard(&self, claims: &UserClaims, now: DateTime<Utc>) -> AppResult<DashboardView> {
        let view = match claims.role.dashboard_kind() {
            DashboardKind::AdminOverview => DashboardView::AdminOverview(self.admin(now).await?),
            DashboardKind::TechnicianWorkbench => {
                DashboardView::TechnicianWorkbench(self.technician(now).await?)
            }
            DashboardKind::StaffPortal => DashboardView::StaffPortal(self.staff(claims, now).await?),
        };
        Ok(view)
    }

    async fn status_counts(&self) -> AppResult<StatusCounts> {
        let mut counts = StatusCounts::default();
        for (status, count) in self.repository.assets_count_by_status().await? {
            counts.add(status, count);
        }
        Ok(counts)
    }

    async fn admin(&self, now: DateTime<Utc>) -> AppResult<AdminDashboard> {
        Ok(AdminDashboard {
            assets: self.status_counts().await?,
            total_users: self.repository.profiles_count().await?,
            active_issues: self.repository.issues_count_active().await?,
            overdue_issues: self.repository.issues_count_overdue(now).await?,
            categories: self.repository.assets_category_counts().await?,
            recent_issues: self.repository.issues_recent(RECENT_LIMIT, now).await?,
            recent_assets: self.repository.assets_recent(RECENT_LIMIT).await?,
        })
    }

    async fn technician(&self, now: DateTime<Utc>) -> AppResult<TechnicianDashboard> {
        let mut active = self
            .repository
            .issues_list_active(&IssueQuery::default(), now)
            .await?;
        let overdue_issues = active.iter().filter(|i| i.is_overdue).count() as i64;
        active.truncate(WORKBENCH_ISSUES);

        let maintenance = self.repository.maintenance_summary(now.date_naive()).await?;
        Ok(TechnicianDashboard {
            assets: self.status_counts().await?,
            active_issues: active,
            overdue_issues,
            scheduled_maintenance: maintenance.scheduled,
        })
    }

    async fn staff(&self, claims: &UserClaims, now: DateTime<Utc>) -> AppResult<StaffDashboard> {
        let my_issues = self.repository.issues_for_profile(claims.sub, false, now).await?;
        let overdue_issues = my_issues.iter().filter(|i| i.is_overdue).count() as i64;
        Ok(StaffDashboard {
            my_issues,
            overdue_issues,
            available_projectors: self.repository.assets_count_available_in("projector").await?,
            pending_requests: self.repository.requests_count_pending_for(claims.sub).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::Role;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_navigation_follows_role() {
        let service = DashboardService::new(Repository::offline());
        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: Uuid::new_v4(),
            sid: "s".into(),
            email: "tech@cut.ac.zw".into(),
            role: Role::Technician,
            exp: now + 60,
            iat: now,
        };
        let nav = service.navigation(&claims);
        assert_eq!(nav.dashboard, DashboardKind::TechnicianWorkbench);
        assert!(nav.items.iter().any(|i| i.title == "Quick Scan"));
        assert!(!nav.items.iter().any(|i| i.title == "User Management"));
    }
}
