//! Comments and time entries attached to a ticket. Both are append-only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use log::info;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::handlers::{load_ticket, users_by_id};
use super::{
    Comment, CommentResponse, CreateCommentRequest, CreateTimeEntryRequest, TimeEntry,
    TimeEntryResponse,
};
use crate::core::error::{ApiError, ApiJson, ApiResult};
use crate::core::shared::state::AppState;
use crate::directory::{User, UserResponse};
use crate::security::CurrentUser;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

fn comment_response(comment: Comment, users: &HashMap<Uuid, User>) -> CommentResponse {
    CommentResponse {
        author: users.get(&comment.user_id).map(UserResponse::from),
        id: comment.id,
        content: comment.content,
        is_internal: comment.is_internal,
        created_at: comment.created_at,
        updated_at: comment.updated_at,
        ticket_id: comment.ticket_id,
    }
}

fn time_entry_response(entry: TimeEntry, users: &HashMap<Uuid, User>) -> TimeEntryResponse {
    TimeEntryResponse {
        user: users.get(&entry.user_id).map(UserResponse::from),
        id: entry.id,
        description: entry.description,
        hours: entry.hours,
        date: entry.date,
        created_at: entry.created_at,
        ticket_id: entry.ticket_id,
    }
}

pub fn draft_comment(
    req: CreateCommentRequest,
    ticket_id: Uuid,
    author: Uuid,
) -> ApiResult<Comment> {
    let content = req
        .content
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::validation("Comment content is required"))?;
    let now = Utc::now();

    Ok(Comment {
        id: Uuid::new_v4(),
        content,
        is_internal: req.is_internal.unwrap_or(false),
        created_at: now,
        updated_at: now,
        ticket_id,
        user_id: author,
    })
}

pub fn draft_time_entry(
    req: CreateTimeEntryRequest,
    ticket_id: Uuid,
    author: Uuid,
) -> ApiResult<TimeEntry> {
    let description = req
        .description
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::required("description"))?;
    let hours = req
        .hours
        .filter(|h| *h != 0.0 && h.is_finite())
        .ok_or_else(|| ApiError::required("hours"))?;
    let raw_date = req
        .date
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::required("date"))?;
    let date = NaiveDate::parse_from_str(&raw_date, DATE_FORMAT)
        .map_err(|_| ApiError::validation("date must be in YYYY-MM-DD format"))?;

    Ok(TimeEntry {
        id: Uuid::new_v4(),
        description,
        hours,
        date,
        created_at: Utc::now(),
        ticket_id,
        user_id: author,
    })
}

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<CommentResponse>>> {
    let ticket = load_ticket(&state, &id).await?;
    let comments = state.store.list_comments(ticket.id).await?;
    let users = users_by_id(state.store.as_ref(), comments.iter().map(|c| c.user_id)).await?;

    Ok(Json(
        comments
            .into_iter()
            .map(|comment| comment_response(comment, &users))
            .collect(),
    ))
}

pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentResponse>)> {
    let ticket = load_ticket(&state, &id).await?;
    let comment = state
        .store
        .insert_comment(draft_comment(req, ticket.id, user.id)?)
        .await?;
    info!("Comment added to ticket #{} by {}", ticket.number, user.id);

    let users = HashMap::from([(user.id, user)]);
    Ok((StatusCode::CREATED, Json(comment_response(comment, &users))))
}

pub async fn list_time_entries(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<TimeEntryResponse>>> {
    let ticket = load_ticket(&state, &id).await?;
    let entries = state.store.list_time_entries(ticket.id).await?;
    let users = users_by_id(state.store.as_ref(), entries.iter().map(|e| e.user_id)).await?;

    Ok(Json(
        entries
            .into_iter()
            .map(|entry| time_entry_response(entry, &users))
            .collect(),
    ))
}

pub async fn add_time_entry(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<CreateTimeEntryRequest>,
) -> ApiResult<(StatusCode, Json<TimeEntryResponse>)> {
    let ticket = load_ticket(&state, &id).await?;
    let entry = state
        .store
        .insert_time_entry(draft_time_entry(req, ticket.id, user.id)?)
        .await?;
    info!(
        "Logged {}h on ticket #{} by {}",
        entry.hours, ticket.number, user.id
    );

    let users = HashMap::from([(user.id, user)]);
    Ok((StatusCode::CREATED, Json(time_entry_response(entry, &users))))
}
