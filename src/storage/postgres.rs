use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::exists;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::info;
use uuid::Uuid;

use super::{
    ClientStore, LedgerStore, Page, PageRequest, Store, StoreError, StoreResult, TicketEdit,
    TicketFilter, TicketStore, UserEdit, UserStore, DUPLICATE_EMAIL, USER_HAS_AUTHORED_RECORDS,
};
use crate::core::shared::schema::{clients, comments, tickets, time_entries, users};
use crate::core::shared::utils::{create_conn, DbPool};
use crate::directory::{Client, User};
use crate::tickets::{Comment, NewTicket, Ticket, TimeEntry};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// PostgreSQL backend. Diesel is synchronous, so every call borrows a pooled
/// connection on the blocking thread pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn connect(database_url: &str, pool_size: u32) -> StoreResult<Self> {
        let pool =
            create_conn(database_url, pool_size).map_err(|e| StoreError::Pool(e.to_string()))?;
        Ok(Self::new(pool))
    }

    pub async fn run_migrations(&self) -> StoreResult<()> {
        let applied = self
            .interact(|conn| {
                conn.run_pending_migrations(MIGRATIONS)
                    .map(|versions| versions.len())
                    .map_err(|e| StoreError::Migration(e.to_string()))
            })
            .await?;
        info!("Applied {} pending migration(s)", applied);
        Ok(())
    }

    async fn interact<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| StoreError::Pool(e.to_string()))?;
            f(&mut *conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn email_conflict(err: DieselError) -> StoreError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            StoreError::Conflict(DUPLICATE_EMAIL.to_string())
        }
        other => StoreError::Database(other),
    }
}

fn missing_reference(entity: &'static str) -> impl Fn(DieselError) -> StoreError {
    move |err| match err {
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            StoreError::NotFound(entity)
        }
        other => StoreError::Database(other),
    }
}

fn filtered_tickets(filter: &TicketFilter) -> tickets::BoxedQuery<'static, Pg> {
    let mut query = tickets::table.into_boxed();
    if let Some(status) = &filter.status {
        query = query.filter(tickets::status.eq(status.clone()));
    }
    if let Some(priority) = &filter.priority {
        query = query.filter(tickets::priority.eq(priority.clone()));
    }
    query
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.interact(move |conn| {
            Ok(users::table
                .find(id)
                .select(User::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = email.to_string();
        self.interact(move |conn| {
            Ok(users::table
                .filter(users::email.eq(email))
                .select(User::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = ids.to_vec();
        self.interact(move |conn| {
            Ok(users::table
                .filter(users::id.eq_any(ids))
                .select(User::as_select())
                .load(conn)?)
        })
        .await
    }

    async fn list_users(&self, page: PageRequest) -> StoreResult<Page<User>> {
        self.interact(move |conn| {
            let total: i64 = users::table.count().get_result(conn)?;
            let items = users::table
                .order((users::created_at.asc(), users::email.asc()))
                .limit(i64::from(page.per_page))
                .offset(to_i64(page.offset()))
                .select(User::as_select())
                .load(conn)?;
            Ok(Page::new(items, to_u64(total), page))
        })
        .await
    }

    async fn count_users(&self) -> StoreResult<u64> {
        self.interact(|conn| {
            let total: i64 = users::table.count().get_result(conn)?;
            Ok(to_u64(total))
        })
        .await
    }

    async fn insert_user(&self, user: User) -> StoreResult<User> {
        self.interact(move |conn| {
            diesel::insert_into(users::table)
                .values(&user)
                .returning(User::as_returning())
                .get_result(conn)
                .map_err(email_conflict)
        })
        .await
    }

    async fn update_user(&self, id: Uuid, edit: UserEdit) -> StoreResult<User> {
        self.interact(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let mut user = users::table
                    .find(id)
                    .for_update()
                    .select(User::as_select())
                    .first(conn)
                    .optional()?
                    .ok_or(StoreError::NotFound("User"))?;
                edit(&mut user);

                diesel::update(users::table.find(id))
                    .set(&user)
                    .returning(User::as_returning())
                    .get_result(conn)
                    .map_err(email_conflict)
            })
        })
        .await
    }

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<Option<User>> {
        self.interact(move |conn| {
            Ok(diesel::update(users::table.find(id))
                .set(users::last_login.eq(Some(at)))
                .returning(User::as_returning())
                .get_result(conn)
                .optional()?)
        })
        .await
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        self.interact(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let found: i64 = users::table.find(id).count().get_result(conn)?;
                if found == 0 {
                    return Err(StoreError::NotFound("User"));
                }

                let authored: bool = diesel::select(
                    exists(tickets::table.filter(tickets::created_by.eq(id)))
                        .or(exists(comments::table.filter(comments::user_id.eq(id))))
                        .or(exists(
                            time_entries::table.filter(time_entries::user_id.eq(id)),
                        )),
                )
                .get_result(conn)?;
                if authored {
                    return Err(StoreError::Conflict(USER_HAS_AUTHORED_RECORDS.to_string()));
                }

                diesel::update(tickets::table.filter(tickets::assigned_to.eq(id)))
                    .set(tickets::assigned_to.eq(None::<Uuid>))
                    .execute(conn)?;
                diesel::delete(users::table.find(id)).execute(conn)?;
                Ok(())
            })
        })
        .await
    }
}

#[async_trait]
impl TicketStore for PgStore {
    async fn insert_ticket(&self, ticket: NewTicket) -> StoreResult<Ticket> {
        self.interact(move |conn| {
            diesel::insert_into(tickets::table)
                .values(&ticket)
                .returning(Ticket::as_returning())
                .get_result(conn)
                .map_err(missing_reference("User"))
        })
        .await
    }

    async fn find_ticket(&self, id: Uuid) -> StoreResult<Option<Ticket>> {
        self.interact(move |conn| {
            Ok(tickets::table
                .find(id)
                .select(Ticket::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn list_tickets(
        &self,
        filter: &TicketFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Ticket>> {
        let filter = filter.clone();
        self.interact(move |conn| {
            let total: i64 = filtered_tickets(&filter).count().get_result(conn)?;
            let items = filtered_tickets(&filter)
                .order((tickets::created_at.desc(), tickets::number.desc()))
                .limit(i64::from(page.per_page))
                .offset(to_i64(page.offset()))
                .select(Ticket::as_select())
                .load(conn)?;
            Ok(Page::new(items, to_u64(total), page))
        })
        .await
    }

    async fn update_ticket(&self, id: Uuid, edit: TicketEdit) -> StoreResult<Ticket> {
        self.interact(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let mut ticket = tickets::table
                    .find(id)
                    .for_update()
                    .select(Ticket::as_select())
                    .first(conn)
                    .optional()?
                    .ok_or(StoreError::NotFound("Ticket"))?;
                edit(&mut ticket);

                diesel::update(tickets::table.find(id))
                    .set(&ticket)
                    .returning(Ticket::as_returning())
                    .get_result(conn)
                    .map_err(missing_reference("User"))
            })
        })
        .await
    }

    async fn delete_ticket(&self, id: Uuid) -> StoreResult<()> {
        self.interact(move |conn| {
            match diesel::delete(tickets::table.find(id)).execute(conn)? {
                0 => Err(StoreError::NotFound("Ticket")),
                _ => Ok(()),
            }
        })
        .await
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn insert_comment(&self, comment: Comment) -> StoreResult<Comment> {
        self.interact(move |conn| {
            diesel::insert_into(comments::table)
                .values(&comment)
                .returning(Comment::as_returning())
                .get_result(conn)
                .map_err(missing_reference("Ticket"))
        })
        .await
    }

    async fn list_comments(&self, ticket_id: Uuid) -> StoreResult<Vec<Comment>> {
        self.interact(move |conn| {
            Ok(comments::table
                .filter(comments::ticket_id.eq(ticket_id))
                .order(comments::created_at.desc())
                .select(Comment::as_select())
                .load(conn)?)
        })
        .await
    }

    async fn insert_time_entry(&self, entry: TimeEntry) -> StoreResult<TimeEntry> {
        self.interact(move |conn| {
            diesel::insert_into(time_entries::table)
                .values(&entry)
                .returning(TimeEntry::as_returning())
                .get_result(conn)
                .map_err(missing_reference("Ticket"))
        })
        .await
    }

    async fn list_time_entries(&self, ticket_id: Uuid) -> StoreResult<Vec<TimeEntry>> {
        self.interact(move |conn| {
            Ok(time_entries::table
                .filter(time_entries::ticket_id.eq(ticket_id))
                .order((time_entries::date.desc(), time_entries::created_at.desc()))
                .select(TimeEntry::as_select())
                .load(conn)?)
        })
        .await
    }
}

#[async_trait]
impl ClientStore for PgStore {
    async fn insert_client(&self, client: Client) -> StoreResult<Client> {
        self.interact(move |conn| {
            Ok(diesel::insert_into(clients::table)
                .values(&client)
                .returning(Client::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    async fn list_active_clients(&self) -> StoreResult<Vec<Client>> {
        self.interact(|conn| {
            Ok(clients::table
                .filter(clients::active.eq(true))
                .order(clients::name.asc())
                .select(Client::as_select())
                .load(conn)?)
        })
        .await
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        self.interact(|conn| {
            diesel::sql_query("SELECT 1").execute(conn)?;
            Ok(())
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
