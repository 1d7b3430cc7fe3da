//! Role-based dashboards and navigation

use serde::Serialize;
use utoipa::ToSchema;

use super::{
    asset::AssetShort,
    enums::{AssetStatus, Role},
    issue::IssueDetails,
};

/// Which dashboard a role lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DashboardKind {
    AdminOverview,
    TechnicianWorkbench,
    StaffPortal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct NavItem {
    pub title: &'static str,
    pub href: &'static str,
    pub description: &'static str,
}

const fn nav(title: &'static str, href: &'static str, description: &'static str) -> NavItem {
    NavItem {
        title,
        href,
        description,
    }
}

const COMMON_NAV: &[NavItem] = &[
    nav("Dashboard", "/dashboard", "Overview and quick actions"),
    nav("Calendar", "/dashboard/calendar", "Issue and maintenance schedule"),
];

const ADMIN_NAV: &[NavItem] = &[
    nav("Asset Management", "/dashboard/assets", "Register and manage assets"),
    nav("User Management", "/dashboard/users", "Manage staff and technicians"),
    nav("Reports & Analytics", "/dashboard/reports", "Usage reports and statistics"),
    nav("Categories", "/dashboard/categories", "Asset categories"),
    nav("Departments", "/dashboard/departments", "University departments"),
    nav("Audit Log", "/dashboard/audit", "System activity trail"),
];

const TECHNICIAN_NAV: &[NavItem] = &[
    nav("Quick Scan", "/dashboard/scan", "Scan an asset code"),
    nav("Issue Assets", "/dashboard/issue", "Issue assets to staff"),
    nav("Active Issues", "/dashboard/issue/active", "Assets currently out"),
    nav("Maintenance", "/dashboard/maintenance", "Scheduled and ongoing work"),
];

const STAFF_NAV: &[NavItem] = &[
    nav("Request Asset", "/dashboard/request", "Ask for equipment"),
    nav("My Assets", "/dashboard/my-assets", "Assets issued to you"),
    nav("Browse Assets", "/dashboard/assets", "Available equipment"),
    nav("My Requests", "/dashboard/my-requests", "Track your requests"),
];

impl Role {
    pub fn dashboard_kind(&self) -> DashboardKind {
        match self {
            Role::Admin => DashboardKind::AdminOverview,
            Role::Technician => DashboardKind::TechnicianWorkbench,
            Role::Staff => DashboardKind::StaffPortal,
        }
    }

    /// Common items followed by the role's own items
    pub fn navigation(&self) -> Vec<NavItem> {
        let own = match self {
            Role::Admin => ADMIN_NAV,
            Role::Technician => TECHNICIAN_NAV,
            Role::Staff => STAFF_NAV,
        };
        COMMON_NAV.iter().chain(own.iter()).cloned().collect()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Navigation {
    pub role: Role,
    pub dashboard: DashboardKind,
    pub items: Vec<NavItem>,
}

#[derive(Debug, Default, Clone, Serialize, ToSchema)]
pub struct StatusCounts {
    pub total: i64,
    pub available: i64,
    pub issued: i64,
    pub maintenance: i64,
    pub retired: i64,
}

impl StatusCounts {
    pub fn add(&mut self, status: AssetStatus, count: i64) {
        self.total += count;
        match status {
            AssetStatus::Available => self.available += count,
            AssetStatus::Issued => self.issued += count,
            AssetStatus::Maintenance => self.maintenance += count,
            AssetStatus::Retired => self.retired += count,
        }
    }
}

/// Per-category availability
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct CategoryCounts {
    pub category: String,
    pub total: i64,
    pub available: i64,
    pub issued: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminDashboard {
    pub assets: StatusCounts,
    pub total_users: i64,
    pub active_issues: i64,
    pub overdue_issues: i64,
    pub categories: Vec<CategoryCounts>,
    pub recent_issues: Vec<IssueDetails>,
    pub recent_assets: Vec<AssetShort>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TechnicianDashboard {
    pub assets: StatusCounts,
    pub active_issues: Vec<IssueDetails>,
    pub overdue_issues: i64,
    pub scheduled_maintenance: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StaffDashboard {
    pub my_issues: Vec<IssueDetails>,
    pub overdue_issues: i64,
    pub available_projectors: i64,
    pub pending_requests: i64,
}

/// Dashboard payload, tagged by `kind`
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DashboardView {
    AdminOverview(AdminDashboard),
    TechnicianWorkbench(TechnicianDashboard),
    StaffPortal(StaffDashboard),
}

impl DashboardView {
    pub fn kind(&self) -> DashboardKind {
        match self {
            DashboardView::AdminOverview(_) => DashboardKind::AdminOverview,
            DashboardView::TechnicianWorkbench(_) => DashboardKind::TechnicianWorkbench,
            DashboardView::StaffPortal(_) => DashboardKind::StaffPortal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(role: Role) -> Vec<&'static str> {
        role.navigation().iter().map(|i| i.title).collect()
    }

    #[test]
    fn test_dashboard_per_role() {
        assert_eq!(Role::Admin.dashboard_kind(), DashboardKind::AdminOverview);
        assert_eq!(Role::Technician.dashboard_kind(), DashboardKind::TechnicianWorkbench);
        assert_eq!(Role::Staff.dashboard_kind(), DashboardKind::StaffPortal);
    }

    #[test]
    fn test_navigation_tables() {
        assert_eq!(
            titles(Role::Admin),
            vec![
                "Dashboard",
                "Calendar",
                "Asset Management",
                "User Management",
                "Reports & Analytics",
                "Categories",
                "Departments",
                "Audit Log"
            ]
        );
        assert_eq!(
            titles(Role::Technician),
            vec!["Dashboard", "Calendar", "Quick Scan", "Issue Assets", "Active Issues", "Maintenance"]
        );
        assert_eq!(
            titles(Role::Staff),
            vec!["Dashboard", "Calendar", "Request Asset", "My Assets", "Browse Assets", "My Requests"]
        );
    }

    fn hrefs(role: Role) -> Vec<&'static str> {
        role.navigation().iter().map(|i| i.href).collect()
    }

    #[test]
    fn test_navigation_links() {
        assert_eq!(
            hrefs(Role::Admin),
            vec![
                "/dashboard",
                "/dashboard/calendar",
                "/dashboard/assets",
                "/dashboard/users",
                "/dashboard/reports",
                "/dashboard/categories",
                "/dashboard/departments",
                "/dashboard/audit"
            ]
        );
        assert_eq!(
            hrefs(Role::Technician),
            vec![
                "/dashboard",
                "/dashboard/calendar",
                "/dashboard/scan",
                "/dashboard/issue",
                "/dashboard/issue/active",
                "/dashboard/maintenance"
            ]
        );
        assert_eq!(
            hrefs(Role::Staff),
            vec![
                "/dashboard",
                "/dashboard/calendar",
                "/dashboard/request",
                "/dashboard/my-assets",
                "/dashboard/assets",
                "/dashboard/my-requests"
            ]
        );
    }

    #[test]
    fn test_status_counts() {
        let mut counts = StatusCounts::default();
        counts.add(AssetStatus::Available, 3);
        counts.add(AssetStatus::Issued, 2);
        counts.add(AssetStatus::Retired, 1);
        assert_eq!(counts.total, 6);
        assert_eq!(counts.issued, 2);
        assert_eq!(counts.maintenance, 0);
    }

    #[test]
    fn test_view_is_tagged_by_kind() {
        let view = DashboardView::StaffPortal(StaffDashboard {
            my_issues: vec![],
            overdue_issues: 0,
            available_projectors: 4,
            pending_requests: 1,
        });
        assert_eq!(view.kind(), DashboardKind::StaffPortal);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["kind"], "staff_portal");
        assert_eq!(json["available_projectors"], 4);
    }
}
