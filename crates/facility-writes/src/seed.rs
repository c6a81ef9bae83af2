//! One-shot population of an empty project.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use document_store::{CollectionRef, DocumentStore, WriteBatch, WriteData};
use facility_model::{
    Collection, DeepCleanStatus, NewDailyTask, NewInventoryItem, NewUser, TaskStatus, UserId,
    UserRole,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::SeedError;
use crate::ops::UserRecord;
use crate::writer::{CREATED_AT, UPDATED_AT};

/// Demo staff written when [`SeedPlan::seed_users`] is set:
/// `(name, email, role, avatar)`.
pub const SEED_USERS: [(&str, &str, UserRole, &str); 4] = [
    (
        "Sarah Johnson",
        "supervisor@example.com",
        UserRole::Supervisor,
        "https://i.pravatar.cc/150?u=supervisor@example.com",
    ),
    (
        "Audry Meadows",
        "housekeeper1@example.com",
        UserRole::Housekeeper,
        "https://i.pravatar.cc/150?u=housekeeper1@example.com",
    ),
    (
        "Hannah Steele",
        "housekeeper2@example.com",
        UserRole::Housekeeper,
        "https://i.pravatar.cc/150?u=housekeeper2@example.com",
    ),
    (
        "Admin User",
        "admin@example.com",
        UserRole::Admin,
        "https://i.pravatar.cc/150?u=admin@example.com",
    ),
];

/// What to seed and for whom.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedPlan {
    /// Emails of the two housekeepers tasks are split between.
    pub housekeepers: [String; 2],
    /// Also write [`SEED_USERS`] under `{local part}-id` ids.
    pub seed_users: bool,
    /// Task dates are relative to this day.
    pub today: NaiveDate,
}

impl SeedPlan {
    /// Assign to the two demo housekeepers, whose profiles must already
    /// exist from their first sign-in.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            housekeepers: [
                "housekeeper@example.com".to_string(),
                "housekeeper2@example.com".to_string(),
            ],
            seed_users: false,
            today,
        }
    }

    /// Seed the demo staff too and assign to its two housekeepers.
    pub fn with_seed_users(today: NaiveDate) -> Self {
        Self {
            housekeepers: [
                "housekeeper1@example.com".to_string(),
                "housekeeper2@example.com".to_string(),
            ],
            seed_users: true,
            today,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedReport {
    pub users: usize,
    pub daily_tasks: usize,
    pub deep_clean_tasks: usize,
    pub inventory_items: usize,
    /// Daily tasks per assignee.
    pub assignments: BTreeMap<UserId, usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SeedDeepClean<'a> {
    zone: &'a str,
    scheduled_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed_date: Option<NaiveDate>,
    assigned_to: &'a UserId,
    status: DeepCleanStatus,
}

fn seed_user_id(email: &str) -> UserId {
    let local = email.split('@').next().unwrap_or(email);
    UserId::from(format!("{local}-id"))
}

type TaskSeed = (&'static str, &'static str, TaskStatus, NaiveDate, Option<&'static str>);

fn daily_tasks(today: NaiveDate) -> Vec<TaskSeed> {
    let yesterday = today - Duration::days(1);
    vec![
        ("A1", "Daily Clean", TaskStatus::Completed, today, None),
        ("B1", "Daily Clean", TaskStatus::InProgress, today, None),
        ("C1", "Daily Clean", TaskStatus::Pending, today, None),
        ("D1", "Daily Clean", TaskStatus::Pending, today, None),
        (
            "A2",
            "Daily Clean",
            TaskStatus::Declined,
            today,
            Some("Resident requested no service today."),
        ),
        ("B2", "Deep Clean", TaskStatus::Overdue, yesterday, None),
        ("C2", "Deep Clean", TaskStatus::Pending, today, None),
    ]
}

type DeepCleanSeed = (&'static str, NaiveDate, DeepCleanStatus, Option<NaiveDate>);

fn deep_cleans(today: NaiveDate) -> Vec<DeepCleanSeed> {
    let five_days_ago = today - Duration::days(5);
    vec![
        (
            "Wing A, Floor 1",
            today + Duration::days(7),
            DeepCleanStatus::Scheduled,
            None,
        ),
        (
            "Wing B, Floor 1",
            today + Duration::days(14),
            DeepCleanStatus::Scheduled,
            None,
        ),
        ("Common Area - Lobby", today, DeepCleanStatus::InProgress, None),
        (
            "Dining Hall",
            five_days_ago,
            DeepCleanStatus::Completed,
            Some(five_days_ago),
        ),
    ]
}

const INVENTORY: [(&str, &str, u32, u32); 5] = [
    ("All-Purpose Cleaner", "Chemicals", 15, 10),
    ("Paper Towels (Case)", "Supplies", 30, 20),
    ("Trash Bags (Box)", "Supplies", 5, 15),
    ("Floor Buffer", "Equipment", 2, 1),
    ("Microfiber Cloths", "Supplies", 150, 100),
];

/// Rooms in wings B and C belong to the second housekeeper.
fn assignee<'a>(room: &str, first: &'a UserId, second: &'a UserId) -> &'a UserId {
    if room.starts_with('B') || room.starts_with('C') {
        second
    } else {
        first
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<WriteData, SeedError> {
    WriteData::from_serializable(value).map_err(SeedError::Encode)
}

async fn resolve_housekeeper(
    store: &dyn DocumentStore,
    plan: &SeedPlan,
    email: &str,
) -> Result<UserId, SeedError> {
    if plan.seed_users && SEED_USERS.iter().any(|(_, seeded, _, _)| *seeded == email) {
        return Ok(seed_user_id(email));
    }

    let query = CollectionRef::new(Collection::Users.as_str())
        .query()
        .where_eq("email", email);
    let snapshot = store.run_query(&query).await?;
    snapshot
        .documents()
        .first()
        .map(|doc| UserId::from(doc.id()))
        .ok_or_else(|| SeedError::MissingProfile {
            email: email.to_string(),
        })
}

/// Write the demo data set in one atomic batch.
///
/// Both housekeepers are resolved before anything is written; a missing
/// profile fails with [`SeedError::MissingProfile`] and leaves the store
/// untouched.
pub async fn seed_database(
    store: &dyn DocumentStore,
    plan: &SeedPlan,
) -> Result<SeedReport, SeedError> {
    let first = resolve_housekeeper(store, plan, &plan.housekeepers[0]).await?;
    let second = resolve_housekeeper(store, plan, &plan.housekeepers[1]).await?;
    debug!(%first, %second, "housekeepers resolved");

    let mut batch = WriteBatch::new();
    let mut report = SeedReport::default();

    if plan.seed_users {
        let users = CollectionRef::new(Collection::Users.as_str());
        for (name, email, role, avatar) in SEED_USERS {
            let id = seed_user_id(email);
            let user = NewUser {
                name: name.to_string(),
                email: email.to_string(),
                role,
                avatar_url: avatar.to_string(),
            };
            let data = encode(&UserRecord {
                user: &user,
                id: id.as_str(),
            })?
            .with_server_timestamp(CREATED_AT);
            batch.set(users.doc(id.as_str()), data);
            report.users += 1;
        }
    }

    let tasks = CollectionRef::new(Collection::DailyTasks.as_str());
    for (room, room_type, status, date, notes) in daily_tasks(plan.today) {
        let assigned_to = assignee(room, &first, &second).clone();
        *report.assignments.entry(assigned_to.clone()).or_default() += 1;
        let task = NewDailyTask {
            room_number: room.to_string(),
            room_type: room_type.to_string(),
            assigned_to,
            status,
            date,
            notes: notes.map(str::to_string),
        };
        let data = encode(&task)?
            .with_server_timestamp(CREATED_AT)
            .with_server_timestamp(UPDATED_AT);
        batch.set(store.new_document_ref(&tasks), data);
        report.daily_tasks += 1;
    }

    let deep = CollectionRef::new(Collection::DeepCleanTasks.as_str());
    for (index, (zone, scheduled_date, status, completed_date)) in
        deep_cleans(plan.today).into_iter().enumerate()
    {
        let assigned_to = if index % 2 == 0 { &first } else { &second };
        let data = encode(&SeedDeepClean {
            zone,
            scheduled_date,
            completed_date,
            assigned_to,
            status,
        })?
        .with_server_timestamp(CREATED_AT)
        .with_server_timestamp(UPDATED_AT);
        batch.set(store.new_document_ref(&deep), data);
        report.deep_clean_tasks += 1;
    }

    let inventory = CollectionRef::new(Collection::Inventory.as_str());
    for (name, category, quantity, reorder_level) in INVENTORY {
        let item = NewInventoryItem {
            name: name.to_string(),
            category: category.to_string(),
            quantity,
            reorder_level,
        };
        let data = encode(&item)?
            .with_server_timestamp(CREATED_AT)
            .with_server_timestamp(UPDATED_AT);
        batch.set(store.new_document_ref(&inventory), data);
        report.inventory_items += 1;
    }

    store.commit(batch).await?;
    info!(
        users = report.users,
        daily_tasks = report.daily_tasks,
        deep_clean_tasks = report.deep_clean_tasks,
        inventory_items = report.inventory_items,
        "database seeded"
    );
    Ok(report)
}
