pub mod handlers;
pub mod ledger;
pub mod lifecycle;

use axum::{
    routing::{get, patch, post},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::shared::schema::{comments, tickets, time_entries};
use crate::core::shared::state::AppState;
use crate::core::shared::utils::deserialize_some;
use crate::directory::UserResponse;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, AsChangeset)]
#[diesel(table_name = tickets)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Ticket {
    pub id: Uuid,
    pub number: i64,
    pub title: String,
    pub detail: String,
    pub status: String,
    pub priority: String,
    pub ticket_type: String,
    pub is_complete: bool,
    pub hidden: bool,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub assigned_to: Option<Uuid>,
}

/// A ticket before storage has assigned its number.
#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = tickets)]
pub struct NewTicket {
    pub id: Uuid,
    pub title: String,
    pub detail: String,
    pub status: String,
    pub priority: String,
    pub ticket_type: String,
    pub is_complete: bool,
    pub hidden: bool,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub assigned_to: Option<Uuid>,
}

impl NewTicket {
    pub fn into_ticket(self, number: i64) -> Ticket {
        Ticket {
            id: self.id,
            number,
            title: self.title,
            detail: self.detail,
            status: self.status,
            priority: self.priority,
            ticket_type: self.ticket_type,
            is_complete: self.is_complete,
            hidden: self.hidden,
            locked: self.locked,
            created_at: self.created_at,
            updated_at: self.updated_at,
            created_by: self.created_by,
            assigned_to: self.assigned_to,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub is_internal: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub ticket_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = time_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TimeEntry {
    pub id: Uuid,
    pub description: String,
    pub hours: f64,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub ticket_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateTicketRequest {
    pub title: Option<String>,
    pub detail: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(rename = "type")]
    pub ticket_type: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub hidden: Option<bool>,
    pub locked: Option<bool>,
}

/// Partial update: absent fields are left untouched, `assigned_to: null` unassigns.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTicketRequest {
    pub title: Option<String>,
    pub detail: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(rename = "type")]
    pub ticket_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub assigned_to: Option<Option<Uuid>>,
    pub hidden: Option<bool>,
    pub locked: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateCommentRequest {
    pub content: Option<String>,
    pub is_internal: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateTimeEntryRequest {
    pub description: Option<String>,
    pub hours: Option<f64>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    pub id: Uuid,
    pub number: i64,
    pub title: String,
    pub detail: String,
    pub status: String,
    pub priority: String,
    #[serde(rename = "type")]
    pub ticket_type: String,
    pub is_complete: bool,
    pub hidden: bool,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<UserResponse>,
    pub assigned_to: Option<UserResponse>,
}

#[derive(Debug, Serialize)]
pub struct TicketListResponse {
    pub tickets: Vec<TicketResponse>,
    pub total: u64,
    pub pages: u64,
    pub current_page: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub content: String,
    pub is_internal: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub ticket_id: Uuid,
    pub author: Option<UserResponse>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryResponse {
    pub id: Uuid,
    pub description: String,
    pub hours: f64,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub ticket_id: Uuid,
    pub user: Option<UserResponse>,
}

pub fn configure_tickets_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ticket", get(handlers::list_tickets))
        .route("/ticket/create", post(handlers::create_ticket))
        .route(
            "/ticket/{id}",
            get(handlers::get_ticket)
                .put(handlers::update_ticket)
                .delete(handlers::delete_ticket),
        )
        .route("/ticket/{id}/close", patch(handlers::close_ticket))
        .route("/ticket/{id}/reopen", patch(handlers::reopen_ticket))
        .route(
            "/ticket/{id}/comments",
            get(ledger::list_comments).post(ledger::add_comment),
        )
        .route(
            "/ticket/{id}/time",
            get(ledger::list_time_entries).post(ledger::add_time_entry),
        )
}
