//! Department endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::department::{CreateDepartment, Department, DepartmentWithStats, UpdateDepartment},
};

use super::{AuthenticatedUser, Client};

/// List departments with user and issue counts
#[utoipa::path(
    get,
    path = "/departments",
    tag = "departments",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Departments", body = Vec<DepartmentWithStats>)
    )
)]
pub async fn list_departments(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<DepartmentWithStats>>> {
    let departments = state.services.departments.list().await?;
    Ok(Json(departments))
}

/// Get a department
#[utoipa::path(
    get,
    path = "/departments/{id}",
    tag = "departments",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Department ID")
    ),
    responses(
        (status = 200, description = "Department", body = Department),
        (status = 404, description = "Department not found")
    )
)]
pub async fn get_department(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Department>> {
    let department = state.services.departments.get(id).await?;
    Ok(Json(department))
}

/// Create a department
#[utoipa::path(
    post,
    path = "/departments",
    tag = "departments",
    security(("bearer_auth" = [])),
    request_body = CreateDepartment,
    responses(
        (status = 201, description = "Department created", body = Department),
        (status = 409, description = "Name or code already exists")
    )
)]
pub async fn create_department(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Client(client): Client,
    Json(data): Json<CreateDepartment>,
) -> AppResult<(StatusCode, Json<Department>)> {
    let department = state.services.departments.create(&data, &claims, &client).await?;
    Ok((StatusCode::CREATED, Json(department)))
}

/// Update a department
#[utoipa::path(
    put,
    path = "/departments/{id}",
    tag = "departments",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Department ID")
    ),
    request_body = UpdateDepartment,
    responses(
        (status = 200, description = "Department updated", body = Department),
        (status = 404, description = "Department not found"),
        (status = 409, description = "Name or code already exists")
    )
)]
pub async fn update_department(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Client(client): Client,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateDepartment>,
) -> AppResult<Json<Department>> {
    let department = state.services.departments.update(id, &data, &claims, &client).await?;
    Ok(Json(department))
}

/// Delete a department
#[utoipa::path(
    delete,
    path = "/departments/{id}",
    tag = "departments",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Department ID")
    ),
    responses(
        (status = 204, description = "Department deleted"),
        (status = 404, description = "Department not found")
    )
)]
pub async fn delete_department(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Client(client): Client,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.departments.delete(id, &claims, &client).await?;
    Ok(StatusCode::NO_CONTENT)
}
