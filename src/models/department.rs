//! University departments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub head_of_department: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Department with member and active-issue counts
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct DepartmentWithStats {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub department: Department,
    pub user_count: i64,
    pub active_issues: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDepartment {
    #[validate(length(min = 1, max = 200, message = "Department name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 16, message = "Department code is required"))]
    pub code: String,
    pub description: Option<String>,
    pub head_of_department: Option<String>,
    #[validate(email(message = "Invalid contact email"))]
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateDepartment {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 16))]
    pub code: Option<String>,
    pub description: Option<String>,
    pub head_of_department: Option<String>,
    #[validate(email(message = "Invalid contact email"))]
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub location: Option<String>,
}
