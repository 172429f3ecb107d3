//! Request guards.
//!
//! `CurrentUser` resolves the bearer token, re-reads the user from storage
//! and stamps `last_login`. `AdminUser` additionally requires `is_admin`.
//! Both reject with the same JSON error body as every handler.

use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use chrono::Utc;
use log::debug;
use std::sync::Arc;

use super::jwt::{extract_bearer_token, TokenError};
use crate::core::error::ApiError;
use crate::core::shared::state::AppState;
use crate::directory::User;

#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or_else(ApiError::unauthenticated)?;

        let claims = state.tokens.resolve(token).map_err(|e| match e {
            TokenError::Expired => ApiError::Unauthenticated("Token has expired".to_string()),
            TokenError::Invalid => ApiError::Unauthenticated("Invalid token".to_string()),
        })?;
        let user_id = claims
            .user_id()
            .map_err(|_| ApiError::Unauthenticated("Invalid token".to_string()))?;

        match state.store.touch_last_login(user_id, Utc::now()).await? {
            Some(user) => Ok(Self(user)),
            None => {
                debug!("Token subject {user_id} no longer exists");
                Err(ApiError::unauthenticated())
            }
        }
    }
}

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if user.is_admin {
            Ok(Self(user))
        } else {
            Err(ApiError::forbidden())
        }
    }
}
