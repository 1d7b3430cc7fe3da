//! Business logic services

pub mod assets;
pub mod audit;
pub mod auth;
pub mod calendar;
pub mod categories;
pub mod dashboard;
pub mod departments;
pub mod issues;
pub mod maintenance;
pub mod oauth;
pub mod reports;
pub mod requests;
pub mod sessions;
pub mod users;

use std::sync::Arc;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

use self::{oauth::IdentityProvider, sessions::SessionStore};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub assets: assets::AssetsService,
    pub issues: issues::IssuesService,
    pub dashboard: dashboard::DashboardService,
    pub users: users::UsersService,
    pub maintenance: maintenance::MaintenanceService,
    pub categories: categories::CategoriesService,
    pub departments: departments::DepartmentsService,
    pub requests: requests::RequestsService,
    pub calendar: calendar::CalendarService,
    pub reports: reports::ReportsService,
    pub audit: audit::AuditService,
    /// Shared session store, closed at shutdown
    pub sessions: Arc<dyn SessionStore>,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository and session store
    pub fn new(
        repository: Repository,
        config: &AppConfig,
        sessions: Arc<dyn SessionStore>,
        provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        let audit = audit::AuditService::new(repository.clone());

        Self {
            auth: auth::AuthService::new(
                repository.clone(),
                audit.clone(),
                sessions.clone(),
                provider,
                config.auth.clone(),
                config.institution.clone(),
            ),
            assets: assets::AssetsService::new(
                repository.clone(),
                audit.clone(),
                config.institution.clone(),
                config.qr.clone(),
            ),
            issues: issues::IssuesService::new(repository.clone(), audit.clone()),
            dashboard: dashboard::DashboardService::new(repository.clone()),
            users: users::UsersService::new(
                repository.clone(),
                audit.clone(),
                sessions.clone(),
                config.institution.clone(),
            ),
            maintenance: maintenance::MaintenanceService::new(repository.clone(), audit.clone()),
            categories: categories::CategoriesService::new(repository.clone(), audit.clone()),
            departments: departments::DepartmentsService::new(repository.clone(), audit.clone()),
            requests: requests::RequestsService::new(repository.clone(), audit.clone()),
            calendar: calendar::CalendarService::new(repository.clone()),
            reports: reports::ReportsService::new(repository.clone()),
            audit,
            sessions,
            repository,
        }
    }

    /// Database round trip for the readiness probe
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
