//! Users and clients: the people and organisations the helpdesk knows about.

pub mod auth_routes;
pub mod clients;
pub mod router;
pub mod users;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::core::error::{ApiError, ApiResult};
use crate::core::shared::schema::{clients as clients_table, users as users_table};

pub const DEFAULT_ROLE: &str = "user";
pub const DEFAULT_STATUS: &str = "active";

pub const NAME_MAX_LEN: usize = 100;
pub const EMAIL_MAX_LEN: usize = 120;
pub const ROLE_MAX_LEN: usize = 50;
pub const STATUS_MAX_LEN: usize = 20;
pub const PHONE_MAX_LEN: usize = 20;
pub const DEPARTMENT_MAX_LEN: usize = 100;

/// `(value, field, max)` triples; absent values are skipped.
pub(crate) fn check_lengths(fields: &[(Option<&str>, &str, usize)]) -> ApiResult<()> {
    for &(value, field, max) in fields {
        if let Some(value) = value {
            ApiError::check_length(value, field, max)?;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = users_table)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub role: String,
    pub status: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Builds an active user with no credential yet; callers set the hash
    /// through the credential store before persisting.
    pub fn new(name: impl Into<String>, email: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            password_hash: String::new(),
            is_admin: false,
            role: DEFAULT_ROLE.to_string(),
            status: DEFAULT_STATUS.to_string(),
            phone: None,
            department: None,
            created_at: now,
            updated_at: now,
            last_login: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub role: String,
    pub status: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            role: user.role.clone(),
            status: user.status.clone(),
            phone: user.phone.clone(),
            department: user.department.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
            last_login: user.last_login,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = clients_table)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Client> for ClientResponse {
    fn from(client: &Client) -> Self {
        Self {
            id: client.id,
            name: client.name.clone(),
            email: client.email.clone(),
            contact_name: client.contact_name.clone(),
            phone: client.phone.clone(),
            notes: client.notes.clone(),
            active: client.active,
            created_at: client.created_at,
            updated_at: client.updated_at,
        }
    }
}
