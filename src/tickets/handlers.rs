use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use log::info;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::lifecycle::draft_ticket;
use super::{
    CreateTicketRequest, ListQuery, Ticket, TicketListResponse, TicketResponse,
    UpdateTicketRequest,
};
use crate::core::error::{parse_id, ApiError, ApiJson, ApiResult};
use crate::core::shared::state::AppState;
use crate::core::shared::utils::parse_int_param;
use crate::directory::{User, UserResponse};
use crate::security::{AdminUser, CurrentUser};
use crate::storage::{PageRequest, Store, TicketFilter};

/// Loads the users referenced by `ids` keyed by id, one storage call.
pub(crate) async fn users_by_id(
    store: &dyn Store,
    ids: impl IntoIterator<Item = Uuid>,
) -> ApiResult<HashMap<Uuid, User>> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    Ok(store
        .find_users(&ids)
        .await?
        .into_iter()
        .map(|user| (user.id, user))
        .collect())
}

fn ticket_response(ticket: Ticket, users: &HashMap<Uuid, User>) -> TicketResponse {
    let embed = |id: Option<Uuid>| id.and_then(|id| users.get(&id)).map(UserResponse::from);
    TicketResponse {
        created_by: embed(Some(ticket.created_by)),
        assigned_to: embed(ticket.assigned_to),
        id: ticket.id,
        number: ticket.number,
        title: ticket.title,
        detail: ticket.detail,
        status: ticket.status,
        priority: ticket.priority,
        ticket_type: ticket.ticket_type,
        is_complete: ticket.is_complete,
        hidden: ticket.hidden,
        locked: ticket.locked,
        created_at: ticket.created_at,
        updated_at: ticket.updated_at,
    }
}

async fn render_tickets(store: &dyn Store, tickets: Vec<Ticket>) -> ApiResult<Vec<TicketResponse>> {
    let referenced = tickets
        .iter()
        .flat_map(|t| std::iter::once(t.created_by).chain(t.assigned_to));
    let users = users_by_id(store, referenced).await?;
    Ok(tickets
        .into_iter()
        .map(|ticket| ticket_response(ticket, &users))
        .collect())
}

async fn render_ticket(store: &dyn Store, ticket: Ticket) -> ApiResult<TicketResponse> {
    let mut rendered = render_tickets(store, vec![ticket]).await?;
    rendered
        .pop()
        .ok_or_else(|| ApiError::Internal("ticket rendering produced no output".to_string()))
}

pub(crate) async fn load_ticket(state: &AppState, raw_id: &str) -> ApiResult<Ticket> {
    let id = parse_id(raw_id, "Ticket")?;
    state
        .store
        .find_ticket(id)
        .await?
        .ok_or(ApiError::NotFound("Ticket"))
}

async fn ensure_assignee(state: &AppState, assignee: Option<Uuid>) -> ApiResult<()> {
    match assignee {
        Some(id) if state.store.find_user(id).await?.is_none() => {
            Err(ApiError::validation("Assigned user does not exist"))
        }
        _ => Ok(()),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<TicketListResponse>> {
    let page = PageRequest::new(
        parse_int_param(query.page.as_deref()),
        parse_int_param(query.per_page.as_deref()),
        &state.config.pagination,
    );
    let filter = TicketFilter {
        status: non_blank(query.status),
        priority: non_blank(query.priority),
    };

    let page = state.store.list_tickets(&filter, page).await?;
    let pages = page.pages();
    let current_page = page.page;
    let total = page.total;
    let tickets = render_tickets(state.store.as_ref(), page.items).await?;

    Ok(Json(TicketListResponse {
        tickets,
        total,
        pages,
        current_page,
    }))
}

pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<TicketResponse>> {
    let ticket = load_ticket(&state, &id).await?;
    Ok(Json(render_ticket(state.store.as_ref(), ticket).await?))
}

pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<CreateTicketRequest>,
) -> ApiResult<(StatusCode, Json<TicketResponse>)> {
    let draft = draft_ticket(req, user.id, Utc::now())?;
    ensure_assignee(&state, draft.assigned_to).await?;

    let ticket = state.store.insert_ticket(draft).await?;
    info!("Ticket #{} created by {}", ticket.number, user.id);

    let body = render_ticket(state.store.as_ref(), ticket).await?;
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn update_ticket(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<UpdateTicketRequest>,
) -> ApiResult<Json<TicketResponse>> {
    let id = parse_id(&id, "Ticket")?;
    patch.validate()?;
    if let Some(assignee) = patch.assigned_to {
        ensure_assignee(&state, assignee).await?;
    }

    let now = Utc::now();
    let ticket = state
        .store
        .update_ticket(id, Box::new(move |ticket: &mut Ticket| ticket.apply_update(patch, now)))
        .await?;
    info!("Ticket #{} updated by {}", ticket.number, user.id);

    Ok(Json(render_ticket(state.store.as_ref(), ticket).await?))
}

pub async fn close_ticket(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<TicketResponse>> {
    let id = parse_id(&id, "Ticket")?;
    let now = Utc::now();
    let ticket = state
        .store
        .update_ticket(id, Box::new(move |ticket: &mut Ticket| ticket.close(now)))
        .await?;
    info!("Ticket #{} closed by {}", ticket.number, user.id);

    Ok(Json(render_ticket(state.store.as_ref(), ticket).await?))
}

pub async fn reopen_ticket(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<TicketResponse>> {
    let id = parse_id(&id, "Ticket")?;
    let now = Utc::now();
    let ticket = state
        .store
        .update_ticket(id, Box::new(move |ticket: &mut Ticket| ticket.reopen(now)))
        .await?;
    info!("Ticket #{} reopened by {}", ticket.number, user.id);

    Ok(Json(render_ticket(state.store.as_ref(), ticket).await?))
}

pub async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let ticket = load_ticket(&state, &id).await?;
    state.store.delete_ticket(ticket.id).await?;
    info!("Ticket #{} deleted by {}", ticket.number, admin.id);

    Ok(Json(json!({ "message": "Ticket deleted successfully" })))
}
