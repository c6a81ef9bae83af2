//! Session, seeding and raw collection watching.

use std::sync::Arc;

use chrono::Utc;
use document_store::{CollectionRef, Direction};
use facility_model::Collection;
use facility_writes::{seed_database, SeedPlan};
use live_bindings::{LiveQuery, LiveState};
use serde_json::Value;
use session_binding::{Route, SessionState};
use tracing::info;

use crate::context::{AppContext, CommandResult, Connect};

pub async fn whoami(connect: Connect<'_>) -> CommandResult {
    let ctx = AppContext::connect(connect).await?;
    let state = ctx.session().await;

    println!("Session: {}", state.label());
    match &state {
        SessionState::Authenticated { user, .. } => {
            println!("Name:  {}", user.name);
            println!("Email: {}", user.email);
            println!("Role:  {}", user.role);
            let routes: Vec<&str> = Route::visible_for(user.role)
                .iter()
                .map(Route::label)
                .collect();
            println!("Views: {}", routes.join(", "));
        }
        SessionState::ProfileMissing { identity } => {
            println!("Signed in as {} but no profile was found.", identity.uid);
        }
        _ => {}
    }
    Ok(())
}

/// Seed the demo data set for today.
pub async fn seed(connect: Connect<'_>, with_users: bool) -> CommandResult {
    let ctx = AppContext::connect(connect).await?;
    let user = ctx.require(Route::UserManagement).await?;

    let today = Utc::now().date_naive();
    let plan = if with_users {
        SeedPlan::with_seed_users(today)
    } else {
        SeedPlan::new(today)
    };
    info!(by = %user.id, seed_users = plan.seed_users, "seeding");

    let report = seed_database(ctx.store.as_ref(), &plan).await?;
    println!("Database seeded successfully!");
    println!(
        "  {} users, {} daily tasks, {} deep-clean tasks, {} inventory items",
        report.users, report.daily_tasks, report.deep_clean_tasks, report.inventory_items
    );
    for (assignee, count) in &report.assignments {
        println!("  {assignee}: {count} tasks");
    }
    Ok(())
}

/// Print every snapshot of a collection until interrupted.
pub async fn watch(
    connect: Connect<'_>,
    collection: &str,
    order_by: Option<String>,
    desc: bool,
) -> CommandResult {
    let Some(collection) = Collection::from_name(collection) else {
        let names: Vec<&str> = Collection::ALL.iter().map(Collection::as_str).collect();
        return Err(format!("unknown collection, expected one of: {}", names.join(", ")).into());
    };

    let ctx = AppContext::connect(connect).await?;
    ctx.require(Route::Dashboard).await?;

    let mut query = CollectionRef::new(collection.as_str()).query();
    if let Some(field) = order_by {
        let direction = if desc {
            Direction::Descending
        } else {
            Direction::Ascending
        };
        query = query.order_by(field, direction);
    }

    let live: LiveQuery<Value> = LiveQuery::new(ctx.store(), ctx.channel.clone());
    let mut updates = live.subscribe();
    live.bind(Some(Arc::new(query)));
    print_state(&updates.borrow_and_update());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                print_state(&updates.borrow_and_update());
            }
        }
    }
    live.unbind();
    Ok(())
}

fn print_state(state: &LiveState<Vec<Value>>) {
    if let Some(error) = &state.error {
        eprintln!("{error}");
    } else if state.loading {
        println!("loading...");
    } else {
        println!("{} documents", state.data.len());
        for record in &state.data {
            println!("  {record}");
        }
    }
}
