//! Storage abstraction shared by the PostgreSQL and in-memory backends.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::config::PaginationConfig;
use crate::directory::{Client, User};
use crate::tickets::{Comment, NewTicket, Ticket, TimeEntry};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("connection pool error: {0}")]
    Pool(String),
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("migration failed: {0}")]
    Migration(String),
    #[error("storage task failed: {0}")]
    Task(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub const DUPLICATE_EMAIL: &str = "User with this email already exists";
pub const USER_HAS_AUTHORED_RECORDS: &str =
    "User has created tickets, comments or time entries and cannot be deleted";

/// One-based page request, already clamped to the configured bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: Option<i64>, per_page: Option<i64>, config: &PaginationConfig) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(1);
        let per_page = per_page
            .filter(|p| *p >= 1)
            .unwrap_or(i64::from(config.default_per_page))
            .min(i64::from(config.max_per_page));
        Self {
            page: u32::try_from(page).unwrap_or(u32::MAX),
            per_page: u32::try_from(per_page).unwrap_or(config.max_per_page),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }

    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        items
            .iter()
            .skip(start)
            .take(self.per_page as usize)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            per_page: request.per_page,
        }
    }

    pub fn pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.per_page.max(1)))
    }
}

/// Changes applied to the current row while the store holds it locked, so
/// concurrent partial updates never overwrite each other's columns.
pub type TicketEdit = Box<dyn FnOnce(&mut Ticket) + Send>;
pub type UserEdit = Box<dyn FnOnce(&mut User) + Send>;

#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
}

impl TicketFilter {
    pub fn matches(&self, ticket: &Ticket) -> bool {
        self.status.as_deref().is_none_or(|s| ticket.status == s)
            && self.priority.as_deref().is_none_or(|p| ticket.priority == p)
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;
    async fn list_users(&self, page: PageRequest) -> StoreResult<Page<User>>;
    async fn count_users(&self) -> StoreResult<u64>;
    /// Fails with `Conflict` when the email is already taken.
    async fn insert_user(&self, user: User) -> StoreResult<User>;
    /// `NotFound` for an unknown id, `Conflict` when the edit takes an email
    /// already in use.
    async fn update_user(&self, id: Uuid, edit: UserEdit) -> StoreResult<User>;
    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<Option<User>>;
    /// Refuses users that authored tickets, comments or time entries and
    /// clears ticket assignments pointing at the deleted user.
    async fn delete_user(&self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Assigns the ticket number atomically with the insert.
    async fn insert_ticket(&self, ticket: NewTicket) -> StoreResult<Ticket>;
    async fn find_ticket(&self, id: Uuid) -> StoreResult<Option<Ticket>>;
    /// Newest first.
    async fn list_tickets(&self, filter: &TicketFilter, page: PageRequest)
        -> StoreResult<Page<Ticket>>;
    async fn update_ticket(&self, id: Uuid, edit: TicketEdit) -> StoreResult<Ticket>;
    /// Removes the ticket together with its comments and time entries.
    async fn delete_ticket(&self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn insert_comment(&self, comment: Comment) -> StoreResult<Comment>;
    /// Newest first by creation time.
    async fn list_comments(&self, ticket_id: Uuid) -> StoreResult<Vec<Comment>>;
    async fn insert_time_entry(&self, entry: TimeEntry) -> StoreResult<TimeEntry>;
    /// Newest first by entry date, then creation time.
    async fn list_time_entries(&self, ticket_id: Uuid) -> StoreResult<Vec<TimeEntry>>;
}

#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn insert_client(&self, client: Client) -> StoreResult<Client>;
    async fn list_active_clients(&self) -> StoreResult<Vec<Client>>;
}

#[async_trait]
pub trait Store: UserStore + TicketStore + LedgerStore + ClientStore {
    async fn ping(&self) -> StoreResult<()>;
    fn backend_name(&self) -> &'static str;
}
