use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use super::{
    check_lengths, User, UserResponse, DEPARTMENT_MAX_LEN, EMAIL_MAX_LEN, NAME_MAX_LEN,
    PHONE_MAX_LEN, ROLE_MAX_LEN, STATUS_MAX_LEN,
};
use crate::core::error::{parse_id, ApiError, ApiJson, ApiResult};
use crate::core::shared::state::AppState;
use crate::core::shared::utils::{deserialize_some, mask_email, parse_int_param};
use crate::security::{AdminUser, CurrentUser};
use crate::storage::PageRequest;

#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_admin: Option<bool>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
}

/// Partial update. `phone` and `department` accept `null` to clear them.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub is_admin: Option<bool>,
    pub role: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub department: Option<Option<String>>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub total: u64,
    pub pages: u64,
    pub current_page: u32,
}

pub(crate) fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::required(field))
}

fn non_empty_update(value: Option<String>, field: &str) -> ApiResult<Option<String>> {
    match value {
        Some(v) if v.is_empty() => Err(ApiError::validation(format!("{field} cannot be empty"))),
        other => Ok(other),
    }
}

async fn load_user(state: &AppState, raw_id: &str) -> ApiResult<User> {
    let id = parse_id(raw_id, "User")?;
    state
        .store
        .find_user(id)
        .await?
        .ok_or(ApiError::NotFound("User"))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<UserListResponse>> {
    let request = PageRequest::new(
        parse_int_param(query.page.as_deref()),
        parse_int_param(query.per_page.as_deref()),
        &state.config.pagination,
    );
    let page = state.store.list_users(request).await?;

    Ok(Json(UserListResponse {
        users: page.items.iter().map(UserResponse::from).collect(),
        total: page.total,
        pages: page.pages(),
        current_page: page.page,
    }))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user): CurrentUser,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let user = load_user(&state, &user_id).await?;
    Ok(Json(UserResponse::from(&user)))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let name = required(req.name, "name")?;
    let email = required(req.email, "email")?;
    let password = required(req.password, "password")?;
    check_lengths(&[
        (Some(name.as_str()), "name", NAME_MAX_LEN),
        (Some(email.as_str()), "email", EMAIL_MAX_LEN),
        (req.role.as_deref(), "role", ROLE_MAX_LEN),
        (req.status.as_deref(), "status", STATUS_MAX_LEN),
        (req.phone.as_deref(), "phone", PHONE_MAX_LEN),
        (req.department.as_deref(), "department", DEPARTMENT_MAX_LEN),
    ])?;

    let mut user = User::new(name, email, Utc::now());
    user.is_admin = req.is_admin.unwrap_or(false);
    if let Some(role) = req.role {
        user.role = role;
    }
    if let Some(status) = req.status {
        user.status = status;
    }
    user.phone = req.phone;
    user.department = req.department;
    state
        .credentials
        .set_password(&mut user, &password)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let user = state.store.insert_user(user).await?;
    info!("User {} created by {}", mask_email(&user.email), admin.id);

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

impl UpdateUserRequest {
    fn validate(&self) -> ApiResult<()> {
        check_lengths(&[
            (self.name.as_deref(), "name", NAME_MAX_LEN),
            (self.email.as_deref(), "email", EMAIL_MAX_LEN),
            (self.role.as_deref(), "role", ROLE_MAX_LEN),
            (self.status.as_deref(), "status", STATUS_MAX_LEN),
            (self.phone.as_ref().and_then(Option::as_deref), "phone", PHONE_MAX_LEN),
            (
                self.department.as_ref().and_then(Option::as_deref),
                "department",
                DEPARTMENT_MAX_LEN,
            ),
        ])
    }
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<String>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let id = parse_id(&user_id, "User")?;
    req.validate()?;
    let name = non_empty_update(req.name, "name")?;
    let email = non_empty_update(req.email, "email")?;
    let password_hash = match non_empty_update(req.password, "password")? {
        Some(password) => Some(
            state
                .credentials
                .hash_password(&password)
                .await
                .map_err(|e| ApiError::Internal(e.to_string()))?,
        ),
        None => None,
    };
    let (is_admin, role, status) = (req.is_admin, req.role, req.status);
    let (phone, department) = (req.phone, req.department);
    let now = Utc::now();

    let user = state
        .store
        .update_user(
            id,
            Box::new(move |user: &mut User| {
                if let Some(name) = name {
                    user.name = name;
                }
                if let Some(email) = email {
                    user.email = email;
                }
                if let Some(is_admin) = is_admin {
                    user.is_admin = is_admin;
                }
                if let Some(role) = role {
                    user.role = role;
                }
                if let Some(status) = status {
                    user.status = status;
                }
                if let Some(phone) = phone {
                    user.phone = phone;
                }
                if let Some(department) = department {
                    user.department = department;
                }
                if let Some(hash) = password_hash {
                    user.password_hash = hash;
                }
                user.updated_at = now;
            }),
        )
        .await?;
    info!("User {} updated by {}", user.id, admin.id);

    Ok(Json(UserResponse::from(&user)))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&user_id, "User")?;
    state.store.delete_user(id).await?;
    info!("User {} deleted by {}", id, admin.id);

    Ok(Json(json!({ "message": "User deleted successfully" })))
}
