//! Ticket state machine.
//!
//! `needs_support` is the initial status, `resolved` is what `close` sets and
//! `closed` is also treated as terminal. Status is otherwise an open string:
//! updates may set any value, and `is_complete` always mirrors whether the
//! current status is terminal.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{CreateTicketRequest, NewTicket, Ticket, UpdateTicketRequest};
use crate::core::error::ApiError;

pub const STATUS_NEEDS_SUPPORT: &str = "needs_support";
pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_RESOLVED: &str = "resolved";
pub const STATUS_CLOSED: &str = "closed";

pub const DEFAULT_PRIORITY: &str = "medium";
pub const DEFAULT_TYPE: &str = "support";

pub const FIRST_TICKET_NUMBER: i64 = 1001;

pub fn is_terminal(status: &str) -> bool {
    matches!(status, STATUS_RESOLVED | STATUS_CLOSED)
}

/// The number after the last one issued, or the first number when none has
/// been issued yet. Numbers of deleted tickets are never handed out again.
/// Callers must hold whatever lock makes the read and the insert one step.
pub fn next_number(last_issued: Option<i64>) -> i64 {
    last_issued.map_or(FIRST_TICKET_NUMBER, |last| last + 1)
}

pub const TITLE_MAX_LEN: usize = 200;
pub const STATUS_MAX_LEN: usize = 50;
pub const PRIORITY_MAX_LEN: usize = 20;
pub const TYPE_MAX_LEN: usize = 50;

fn check_lengths(
    title: Option<&str>,
    status: Option<&str>,
    priority: Option<&str>,
    ticket_type: Option<&str>,
) -> Result<(), ApiError> {
    let fields = [
        (title, "title", TITLE_MAX_LEN),
        (status, "status", STATUS_MAX_LEN),
        (priority, "priority", PRIORITY_MAX_LEN),
        (ticket_type, "type", TYPE_MAX_LEN),
    ];
    for (value, field, max) in fields {
        if let Some(value) = value {
            ApiError::check_length(value, field, max)?;
        }
    }
    Ok(())
}

fn non_empty(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::required(field)),
    }
}

pub fn draft_ticket(
    req: CreateTicketRequest,
    creator: Uuid,
    now: DateTime<Utc>,
) -> Result<NewTicket, ApiError> {
    let title = non_empty(req.title, "title")?;
    let detail = non_empty(req.detail, "detail")?;
    check_lengths(
        Some(title.as_str()),
        req.status.as_deref(),
        req.priority.as_deref(),
        req.ticket_type.as_deref(),
    )?;
    let status = req
        .status
        .unwrap_or_else(|| STATUS_NEEDS_SUPPORT.to_string());

    Ok(NewTicket {
        id: Uuid::new_v4(),
        title,
        detail,
        is_complete: is_terminal(&status),
        status,
        priority: req
            .priority
            .unwrap_or_else(|| DEFAULT_PRIORITY.to_string()),
        ticket_type: req.ticket_type.unwrap_or_else(|| DEFAULT_TYPE.to_string()),
        hidden: req.hidden.unwrap_or(false),
        locked: req.locked.unwrap_or(false),
        created_at: now,
        updated_at: now,
        created_by: creator,
        assigned_to: req.assigned_to,
    })
}

impl UpdateTicketRequest {
    /// Checked before the patch is handed to storage, which applies it
    /// infallibly.
    pub fn validate(&self) -> Result<(), ApiError> {
        check_lengths(
            self.title.as_deref(),
            self.status.as_deref(),
            self.priority.as_deref(),
            self.ticket_type.as_deref(),
        )
    }
}

impl Ticket {
    pub fn close(&mut self, now: DateTime<Utc>) {
        self.set_status(STATUS_RESOLVED);
        self.updated_at = now;
    }

    pub fn reopen(&mut self, now: DateTime<Utc>) {
        self.set_status(STATUS_NEEDS_SUPPORT);
        self.updated_at = now;
    }

    pub fn apply_update(&mut self, patch: UpdateTicketRequest, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(detail) = patch.detail {
            self.detail = detail;
        }
        if let Some(status) = patch.status {
            self.set_status(&status);
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(ticket_type) = patch.ticket_type {
            self.ticket_type = ticket_type;
        }
        if let Some(assigned_to) = patch.assigned_to {
            self.assigned_to = assigned_to;
        }
        if let Some(hidden) = patch.hidden {
            self.hidden = hidden;
        }
        if let Some(locked) = patch.locked {
            self.locked = locked;
        }
        self.updated_at = now;
    }

    fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
        self.is_complete = is_terminal(status);
    }
}
