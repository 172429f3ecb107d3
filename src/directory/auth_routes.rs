use axum::{extract::State, response::Json};
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{check_lengths, User, UserResponse, DEPARTMENT_MAX_LEN, NAME_MAX_LEN, PHONE_MAX_LEN};
use crate::core::error::{ApiError, ApiJson, ApiResult};
use crate::core::shared::state::AppState;
use crate::core::shared::utils::{deserialize_some, mask_email};
use crate::security::CurrentUser;

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub department: Option<Option<String>>,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let (Some(email), Some(password)) = (
        req.email.filter(|e| !e.is_empty()),
        req.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::validation("Email and password are required"));
    };

    let user = state
        .credentials
        .verify(&email, &password)
        .await?
        .ok_or_else(|| ApiError::Unauthenticated("Invalid email or password".to_string()))?;

    let token = state
        .tokens
        .issue(&user)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    info!("User {} logged in", mask_email(&user.email));

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(&user),
    }))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<UserResponse>> {
    if req.name.as_deref() == Some("") {
        return Err(ApiError::validation("name cannot be empty"));
    }
    check_lengths(&[
        (req.name.as_deref(), "name", NAME_MAX_LEN),
        (req.phone.as_ref().and_then(Option::as_deref), "phone", PHONE_MAX_LEN),
        (
            req.department.as_ref().and_then(Option::as_deref),
            "department",
            DEPARTMENT_MAX_LEN,
        ),
    ])?;

    let now = Utc::now();
    let user = state
        .store
        .update_user(
            user.id,
            Box::new(move |user: &mut User| {
                if let Some(name) = req.name {
                    user.name = name;
                }
                if let Some(phone) = req.phone {
                    user.phone = phone;
                }
                if let Some(department) = req.department {
                    user.department = department;
                }
                user.updated_at = now;
            }),
        )
        .await?;
    Ok(Json(UserResponse::from(&user)))
}
