use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    ClientStore, LedgerStore, Page, PageRequest, Store, StoreError, StoreResult, TicketEdit,
    TicketFilter, TicketStore, UserEdit, UserStore, DUPLICATE_EMAIL, USER_HAS_AUTHORED_RECORDS,
};
use crate::directory::{Client, User};
use crate::tickets::lifecycle::next_number;
use crate::tickets::{Comment, NewTicket, Ticket, TimeEntry};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    tickets: HashMap<Uuid, Ticket>,
    comments: Vec<Comment>,
    time_entries: Vec<TimeEntry>,
    clients: Vec<Client>,
    last_ticket_number: Option<i64>,
}

impl MemoryState {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn has_authored(&self, user_id: Uuid) -> bool {
        self.tickets.values().any(|t| t.created_by == user_id)
            || self.comments.iter().any(|c| c.user_id == user_id)
            || self.time_entries.iter().any(|e| e.user_id == user_id)
    }
}

/// Process-local backend. Every operation takes the lock once, so each call
/// is atomic with respect to the others.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect())
    }

    async fn list_users(&self, page: PageRequest) -> StoreResult<Page<User>> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.email.cmp(&b.email))
        });
        let total = users.len() as u64;
        Ok(Page::new(page.slice(&users), total, page))
    }

    async fn count_users(&self) -> StoreResult<u64> {
        Ok(self.state.read().await.users.len() as u64)
    }

    async fn insert_user(&self, user: User) -> StoreResult<User> {
        let mut state = self.state.write().await;
        if state.email_taken(&user.email, None) {
            return Err(StoreError::Conflict(DUPLICATE_EMAIL.to_string()));
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, edit: UserEdit) -> StoreResult<User> {
        let mut state = self.state.write().await;
        let mut user = state
            .users
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("User"))?;
        edit(&mut user);
        if state.email_taken(&user.email, Some(id)) {
            return Err(StoreError::Conflict(DUPLICATE_EMAIL.to_string()));
        }
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<Option<User>> {
        let mut state = self.state.write().await;
        Ok(state.users.get_mut(&id).map(|user| {
            user.last_login = Some(at);
            user.clone()
        }))
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&id) {
            return Err(StoreError::NotFound("User"));
        }
        if state.has_authored(id) {
            return Err(StoreError::Conflict(USER_HAS_AUTHORED_RECORDS.to_string()));
        }
        for ticket in state.tickets.values_mut() {
            if ticket.assigned_to == Some(id) {
                ticket.assigned_to = None;
            }
        }
        state.users.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn insert_ticket(&self, ticket: NewTicket) -> StoreResult<Ticket> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&ticket.created_by) {
            return Err(StoreError::NotFound("User"));
        }
        let number = next_number(state.last_ticket_number);
        state.last_ticket_number = Some(number);
        let ticket = ticket.into_ticket(number);
        state.tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    async fn find_ticket(&self, id: Uuid) -> StoreResult<Option<Ticket>> {
        Ok(self.state.read().await.tickets.get(&id).cloned())
    }

    async fn list_tickets(
        &self,
        filter: &TicketFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Ticket>> {
        let state = self.state.read().await;
        let mut tickets: Vec<Ticket> = state
            .tickets
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        tickets.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.number.cmp(&a.number))
        });
        let total = tickets.len() as u64;
        Ok(Page::new(page.slice(&tickets), total, page))
    }

    async fn update_ticket(&self, id: Uuid, edit: TicketEdit) -> StoreResult<Ticket> {
        let mut state = self.state.write().await;
        let ticket = state
            .tickets
            .get_mut(&id)
            .ok_or(StoreError::NotFound("Ticket"))?;
        edit(ticket);
        Ok(ticket.clone())
    }

    async fn delete_ticket(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.tickets.remove(&id).is_none() {
            return Err(StoreError::NotFound("Ticket"));
        }
        state.comments.retain(|c| c.ticket_id != id);
        state.time_entries.retain(|e| e.ticket_id != id);
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn insert_comment(&self, comment: Comment) -> StoreResult<Comment> {
        let mut state = self.state.write().await;
        if !state.tickets.contains_key(&comment.ticket_id) {
            return Err(StoreError::NotFound("Ticket"));
        }
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, ticket_id: Uuid) -> StoreResult<Vec<Comment>> {
        let state = self.state.read().await;
        let mut comments: Vec<Comment> = state
            .comments
            .iter()
            .filter(|c| c.ticket_id == ticket_id)
            .cloned()
            .collect();
        // Stable sort keeps later inserts first among equal timestamps.
        comments.reverse();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments)
    }

    async fn insert_time_entry(&self, entry: TimeEntry) -> StoreResult<TimeEntry> {
        let mut state = self.state.write().await;
        if !state.tickets.contains_key(&entry.ticket_id) {
            return Err(StoreError::NotFound("Ticket"));
        }
        state.time_entries.push(entry.clone());
        Ok(entry)
    }

    async fn list_time_entries(&self, ticket_id: Uuid) -> StoreResult<Vec<TimeEntry>> {
        let state = self.state.read().await;
        let mut entries: Vec<TimeEntry> = state
            .time_entries
            .iter()
            .filter(|e| e.ticket_id == ticket_id)
            .cloned()
            .collect();
        entries.reverse();
        entries.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(entries)
    }
}

#[async_trait]
impl ClientStore for MemoryStore {
    async fn insert_client(&self, client: Client) -> StoreResult<Client> {
        self.state.write().await.clients.push(client.clone());
        Ok(client)
    }

    async fn list_active_clients(&self) -> StoreResult<Vec<Client>> {
        let state = self.state.read().await;
        let mut clients: Vec<Client> = state.clients.iter().filter(|c| c.active).cloned().collect();
        clients.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(clients)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
