//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{
    assets, audit, auth, calendar, categories, dashboard, departments, health, issues, maintenance, reports,
    requests, users,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Asset Tracker API",
        version = "1.0.0",
        description = "University asset tracking REST API: registry, issue desk, maintenance and audit"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    modifiers(&BearerAuth),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::oauth_authorize,
        auth::oauth_callback,
        auth::logout,
        auth::me,
        // Dashboard
        dashboard::get_dashboard,
        dashboard::get_navigation,
        // Assets
        assets::list_assets,
        assets::create_asset,
        assets::check_code,
        assets::check_serial,
        assets::generate_code,
        assets::get_asset_by_code,
        assets::get_asset,
        assets::update_asset,
        assets::update_asset_status,
        assets::asset_history,
        // Issues
        issues::create_issue,
        issues::list_active_issues,
        issues::list_overdue_issues,
        issues::my_issues,
        issues::get_issue,
        issues::return_issue,
        issues::scan,
        issues::quick_return,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        // Maintenance
        maintenance::list_maintenance,
        maintenance::maintenance_summary,
        maintenance::get_maintenance,
        maintenance::create_maintenance,
        maintenance::start_maintenance,
        maintenance::complete_maintenance,
        // Categories
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        // Departments
        departments::list_departments,
        departments::get_department,
        departments::create_department,
        departments::update_department,
        departments::delete_department,
        // Requests
        requests::create_request,
        requests::my_requests,
        requests::list_requests,
        requests::review_request,
        // Audit
        audit::list_audit_logs,
        audit::audit_summary,
        audit::export_audit_logs,
        // Calendar and reports
        calendar::get_calendar,
        reports::get_report,
    ),
    components(
        schemas(
            // Enums
            crate::models::enums::AssetCondition,
            crate::models::enums::AssetStatus,
            crate::models::enums::IssueStatus,
            crate::models::enums::Role,
            crate::models::enums::MaintenanceType,
            crate::models::enums::MaintenanceStatus,
            crate::models::enums::AuditSeverity,
            crate::models::enums::RequestPriority,
            crate::models::enums::RequestStatus,
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::AuthorizeResponse,
            auth::CallbackRequest,
            crate::models::profile::Profile,
            crate::models::profile::ProfileShort,
            crate::models::profile::ProfileQuery,
            crate::models::profile::CreateProfile,
            crate::models::profile::UpdateProfile,
            // Dashboard
            crate::models::dashboard::DashboardKind,
            crate::models::dashboard::DashboardView,
            crate::models::dashboard::AdminDashboard,
            crate::models::dashboard::TechnicianDashboard,
            crate::models::dashboard::StaffDashboard,
            crate::models::dashboard::StatusCounts,
            crate::models::dashboard::CategoryCounts,
            crate::models::dashboard::Navigation,
            crate::models::dashboard::NavItem,
            // Assets
            crate::models::asset::Asset,
            crate::models::asset::AssetShort,
            crate::models::asset::AssetQuery,
            crate::models::asset::AssetPage,
            crate::models::asset::CreateAsset,
            crate::models::asset::UpdateAsset,
            crate::models::asset::UpdateAssetStatus,
            crate::models::asset::AvailabilityCheck,
            crate::models::asset::GeneratedCode,
            crate::models::asset::AssetHistory,
            assets::CodeParams,
            assets::SerialParams,
            assets::CategoryParams,
            // Issues
            crate::models::issue::AssetIssue,
            crate::models::issue::IssueDetails,
            crate::models::issue::IssueRequest,
            crate::models::issue::ReturnPreset,
            crate::models::issue::ReturnRequest,
            crate::models::issue::OverdueFilter,
            crate::models::issue::IssueQuery,
            crate::models::issue::ScanResult,
            crate::models::issue::QuickReturnRequest,
            issues::MyIssuesParams,
            // Maintenance
            crate::models::maintenance::MaintenanceRecord,
            crate::models::maintenance::MaintenanceDetails,
            crate::models::maintenance::MaintenanceFilter,
            crate::models::maintenance::MaintenanceQuery,
            crate::models::maintenance::CreateMaintenance,
            crate::models::maintenance::CompleteMaintenance,
            crate::models::maintenance::MaintenanceSummary,
            // Categories and departments
            crate::models::category::Category,
            crate::models::category::CategoryWithStats,
            crate::models::category::CreateCategory,
            crate::models::category::UpdateCategory,
            crate::models::department::Department,
            crate::models::department::DepartmentWithStats,
            crate::models::department::CreateDepartment,
            crate::models::department::UpdateDepartment,
            // Requests
            crate::models::request::AssetRequest,
            crate::models::request::AssetRequestDetails,
            crate::models::request::CreateAssetRequest,
            crate::models::request::RequestQuery,
            crate::models::request::ReviewRequest,
            // Audit
            crate::models::audit::AuditLog,
            crate::models::audit::AuditQuery,
            crate::models::audit::AuditSummary,
            crate::models::audit::ExportFormat,
            // Calendar and reports
            crate::models::report::CalendarQuery,
            crate::models::report::CalendarEvent,
            crate::models::report::CalendarEventKind,
            crate::models::report::Report,
            crate::models::report::ReportOverview,
            crate::models::report::DepartmentStats,
            crate::models::report::CategoryDistribution,
            crate::models::report::MonthlyIssues,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication and the institution domain gate"),
        (name = "dashboard", description = "Role-specific dashboard and navigation"),
        (name = "assets", description = "Asset registry"),
        (name = "issues", description = "Issue/return workflow and quick scan"),
        (name = "users", description = "Profile management"),
        (name = "maintenance", description = "Maintenance scheduling"),
        (name = "categories", description = "Asset categories"),
        (name = "departments", description = "Departments"),
        (name = "requests", description = "Asset requests"),
        (name = "audit", description = "Audit log"),
        (name = "calendar", description = "Monthly calendar"),
        (name = "reports", description = "Reports and analytics")
    )
)]
pub struct ApiDoc;

/// Declares the `bearer_auth` scheme referenced by secured paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_declares_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json["components"]["securitySchemes"]["bearer_auth"].is_object());
        assert!(json["paths"]["/issues/{id}/return"]["post"].is_object());
    }
}
