//! Daily task listing and status changes.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use document_store::{CollectionRef, Direction, DocumentStore};
use facility_model::{
    Collection, DailyTask, DashboardSummary, InventoryItem, NewDailyTask, TaskStatus, User, UserId,
};
use facility_writes::CREATED_AT;
use serde_json::Value;
use session_binding::Route;

use crate::context::{AppContext, CommandResult, Connect};

#[derive(Subcommand)]
pub enum TaskAction {
    /// List tasks, newest first, with the landing-page summary
    List,
    /// Assign a room to a staff member
    Add {
        room: String,
        /// User id of the assignee
        #[arg(long)]
        assign: String,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        room_type: Option<String>,
    },
    /// Move a task along: "In Progress", "Completed", "Declined" or "Overdue"
    Status { id: String, status: String },
}

pub async fn tasks(connect: Connect<'_>, action: Option<TaskAction>) -> CommandResult {
    let ctx = AppContext::connect(connect).await?;
    let user = ctx.require(Route::Tasks).await?;
    let daily = CollectionRef::new(Collection::DailyTasks.as_str());

    match action.unwrap_or(TaskAction::List) {
        TaskAction::List => list(&ctx, &daily, &user).await?,
        TaskAction::Add {
            room,
            assign,
            date,
            room_type,
        } => {
            if !user.role.can_manage_operations() {
                return Err("only operations staff can assign tasks".into());
            }
            let mut task = NewDailyTask::new(
                room,
                UserId::from(assign),
                date.unwrap_or_else(|| Utc::now().date_naive()),
            );
            if let Some(room_type) = room_type {
                task.room_type = room_type;
            }
            let doc = ctx.writes().add_task(&task).await?;
            println!("Task Added: room {} ({})", task.room_number, doc.id());
        }
        TaskAction::Status { id, status } => {
            let next: TaskStatus = serde_json::from_value(Value::String(status.clone()))
                .map_err(|_| format!("unknown status {status:?}"))?;
            let task: DailyTask = ctx.fetch(&daily.doc(id)).await?;
            let writes = ctx.writes();
            let status = if next == TaskStatus::Overdue {
                writes.mark_task_overdue(&task).await?
            } else {
                writes.update_task_status(&task, next).await?
            };
            println!("Room {}: {}", task.room_number, status);
        }
    }
    Ok(())
}

async fn list(ctx: &AppContext, daily: &CollectionRef, user: &User) -> CommandResult {
    let query = daily.query().order_by(CREATED_AT, Direction::Descending);
    let tasks: Vec<DailyTask> = ctx.store.run_query(&query).await?.decode_all()?;

    let users = CollectionRef::new(Collection::Users.as_str()).query();
    let names: HashMap<UserId, String> = ctx
        .store
        .run_query(&users)
        .await?
        .decode_all::<User>()?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect();

    let inventory = CollectionRef::new(Collection::Inventory.as_str()).query();
    let items: Vec<InventoryItem> = ctx.store.run_query(&inventory).await?.decode_all()?;

    for task in &tasks {
        let assignee = names
            .get(&task.assigned_to)
            .map_or(task.assigned_to.as_str(), String::as_str);
        println!(
            "{:<22} {:<6} {:<14} {:<20} {:<12} {}",
            task.id, task.room_number, task.room_type, assignee, task.status, task.date
        );
    }

    let summary = DashboardSummary::compute(&tasks, &items, &user.id);
    println!();
    println!(
        "Completion: {}% ({}/{})  Overdue: {}  Low stock: {}",
        summary.completion_percent,
        summary.completed_tasks,
        summary.total_tasks,
        summary.overdue_tasks,
        summary.low_stock_items
    );
    if !summary.priority_tasks.is_empty() {
        println!("Your open tasks:");
        for task in &summary.priority_tasks {
            println!("  room {} ({})", task.room_number, task.status);
        }
    }
    Ok(())
}
