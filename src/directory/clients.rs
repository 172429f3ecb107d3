use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use log::info;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::users::required;
use super::{check_lengths, Client, ClientResponse, EMAIL_MAX_LEN, NAME_MAX_LEN, PHONE_MAX_LEN};
use crate::core::error::{ApiJson, ApiResult};
use crate::core::shared::state::AppState;
use crate::security::{AdminUser, CurrentUser};

#[derive(Debug, Default, Deserialize)]
pub struct CreateClientRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

impl Client {
    pub fn from_request(req: CreateClientRequest) -> ApiResult<Self> {
        let name = required(req.name, "name")?;
        let email = required(req.email, "email")?;
        check_lengths(&[
            (Some(name.as_str()), "name", NAME_MAX_LEN),
            (Some(email.as_str()), "email", EMAIL_MAX_LEN),
            (req.contact_name.as_deref(), "contact_name", NAME_MAX_LEN),
            (req.phone.as_deref(), "phone", PHONE_MAX_LEN),
        ])?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            email,
            contact_name: req.contact_name,
            phone: req.phone,
            notes: req.notes,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }
}

pub async fn list_clients(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user): CurrentUser,
) -> ApiResult<Json<Vec<ClientResponse>>> {
    let clients = state.store.list_active_clients().await?;
    Ok(Json(clients.iter().map(ClientResponse::from).collect()))
}

pub async fn create_client(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    ApiJson(req): ApiJson<CreateClientRequest>,
) -> ApiResult<(StatusCode, Json<ClientResponse>)> {
    let client = state.store.insert_client(Client::from_request(req)?).await?;
    info!("Client {} created by {}", client.name, admin.id);

    Ok((StatusCode::CREATED, Json(ClientResponse::from(&client))))
}
