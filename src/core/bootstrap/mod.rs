//! Demo data for a fresh store: two admins, two agents, three tickets with
//! comments and time entries, and two clients.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use log::info;
use uuid::Uuid;

use crate::core::shared::state::AppState;
use crate::directory::{Client, User};
use crate::tickets::lifecycle::draft_ticket;
use crate::tickets::{Comment, CreateTicketRequest, TimeEntry};

struct SeedUser {
    name: &'static str,
    email: &'static str,
    password: &'static str,
    is_admin: bool,
    role: &'static str,
    department: &'static str,
    phone: &'static str,
}

const SEED_USERS: [SeedUser; 4] = [
    SeedUser {
        name: "Admin User",
        email: "admin@helpdesk.local",
        password: "admin123",
        is_admin: true,
        role: "admin",
        department: "IT",
        phone: "+1 (555) 123-4567",
    },
    SeedUser {
        name: "Demo User",
        email: "demo@example.com",
        password: "demo123",
        is_admin: true,
        role: "admin",
        department: "Support",
        phone: "+1 (555) 234-5678",
    },
    SeedUser {
        name: "John Doe",
        email: "john.doe@company.com",
        password: "password123",
        is_admin: false,
        role: "agent",
        department: "Technical Support",
        phone: "+1 (555) 345-6789",
    },
    SeedUser {
        name: "Sarah Wilson",
        email: "sarah.wilson@company.com",
        password: "password123",
        is_admin: false,
        role: "agent",
        department: "Customer Service",
        phone: "+1 (555) 456-7890",
    },
];

/// Returns `false` without touching anything when users already exist.
pub async fn seed_if_empty(state: &AppState) -> Result<bool> {
    if state.store.count_users().await? > 0 {
        info!("Store already has users, skipping seed data");
        return Ok(false);
    }
    info!("Seeding {} store with demo data", state.store.backend_name());

    let now = Utc::now();
    let mut users = Vec::with_capacity(SEED_USERS.len());
    for seed in &SEED_USERS {
        let mut user = User::new(seed.name, seed.email, now);
        user.is_admin = seed.is_admin;
        user.role = seed.role.to_string();
        user.department = Some(seed.department.to_string());
        user.phone = Some(seed.phone.to_string());
        state
            .credentials
            .set_password(&mut user, seed.password)
            .await?;
        users.push(state.store.insert_user(user).await?);
    }
    let (john, sarah) = (users[2].id, users[3].id);

    let tickets = [
        (
            "Login Issue",
            "Users cannot log in with their credentials. The login page shows an error message after entering valid credentials.",
            "needs_support",
            "high",
            "bug",
            john,
            sarah,
        ),
        (
            "Feature Request: Dark Mode",
            "Add dark mode support to the application. This would improve user experience and reduce eye strain.",
            "in_progress",
            "medium",
            "feature",
            sarah,
            john,
        ),
        (
            "Website Performance Issues",
            "The homepage is taking too long to load and some images are broken. Users are reporting 404 errors.",
            "resolved",
            "high",
            "bug",
            john,
            sarah,
        ),
    ];

    let mut ticket_ids: Vec<Uuid> = Vec::with_capacity(tickets.len());
    for (offset, (title, detail, status, priority, kind, creator, assignee)) in
        (0i64..).zip(tickets)
    {
        let req = CreateTicketRequest {
            title: Some(title.to_string()),
            detail: Some(detail.to_string()),
            status: Some(status.to_string()),
            priority: Some(priority.to_string()),
            ticket_type: Some(kind.to_string()),
            assigned_to: Some(assignee),
            ..Default::default()
        };
        let created_at = now + Duration::seconds(offset);
        let draft = draft_ticket(req, creator, created_at).context("seed ticket is invalid")?;
        ticket_ids.push(state.store.insert_ticket(draft).await?.id);
    }

    let comments = [
        (
            "I've identified the issue with the database connection. Should be resolved by tomorrow.",
            false,
            ticket_ids[0],
            sarah,
        ),
        (
            "The new dashboard design looks great! When can we expect it to go live?",
            false,
            ticket_ids[1],
            john,
        ),
        (
            "This is an internal note: Need to check server logs for more details.",
            true,
            ticket_ids[0],
            sarah,
        ),
    ];
    for (offset, (content, is_internal, ticket_id, author)) in (0i64..).zip(comments) {
        let created_at = now + Duration::seconds(offset);
        state
            .store
            .insert_comment(Comment {
                id: Uuid::new_v4(),
                content: content.to_string(),
                is_internal,
                created_at,
                updated_at: created_at,
                ticket_id,
                user_id: author,
            })
            .await?;
    }

    let entries = [
        ("Initial investigation of login issue", 2.5, ticket_ids[0], sarah),
        ("Dark mode UI design and implementation", 4.0, ticket_ids[1], john),
    ];
    for (description, hours, ticket_id, author) in entries {
        state
            .store
            .insert_time_entry(TimeEntry {
                id: Uuid::new_v4(),
                description: description.to_string(),
                hours,
                date: now.date_naive(),
                created_at: now,
                ticket_id,
                user_id: author,
            })
            .await?;
    }

    let clients = [
        (
            "Acme Corporation",
            "support@acme.com",
            "Jane Smith",
            "+1 (555) 123-4567",
            "Enterprise client with 500+ users",
        ),
        (
            "TechStart Inc",
            "help@techstart.com",
            "Mike Johnson",
            "+1 (555) 234-5678",
            "Startup with growing user base",
        ),
    ];
    for (name, email, contact_name, phone, notes) in clients {
        state
            .store
            .insert_client(Client {
                id: Uuid::new_v4(),
                name: name.to_string(),
                email: email.to_string(),
                contact_name: Some(contact_name.to_string()),
                phone: Some(phone.to_string()),
                notes: Some(notes.to_string()),
                active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }

    info!(
        "Seeded {} users, {} tickets and {} clients",
        SEED_USERS.len(),
        ticket_ids.len(),
        clients.len()
    );
    Ok(true)
}
