//! Stock listing and adjustments.

use clap::Subcommand;
use document_store::{CollectionRef, Direction, DocumentStore};
use facility_model::{Collection, InventoryItem, NewInventoryItem};
use session_binding::Route;

use crate::context::{AppContext, CommandResult, Connect};

#[derive(Subcommand)]
pub enum InventoryAction {
    /// List items with their stock status
    List,
    /// Add a new item
    Add {
        name: String,
        category: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
        #[arg(allow_negative_numbers = true)]
        reorder_level: i64,
    },
    /// Take units out of stock
    Use { id: String, amount: u32 },
    /// Put units back into stock
    Restock { id: String, amount: u32 },
}

pub async fn inventory(connect: Connect<'_>, action: Option<InventoryAction>) -> CommandResult {
    let ctx = AppContext::connect(connect).await?;
    let user = ctx.require(Route::Inventory).await?;
    let items = CollectionRef::new(Collection::Inventory.as_str());

    match action.unwrap_or(InventoryAction::List) {
        InventoryAction::List => {
            let query = items.query().order_by("name", Direction::Ascending);
            let listed: Vec<InventoryItem> = ctx.store.run_query(&query).await?.decode_all()?;
            if listed.is_empty() {
                println!("No inventory items.");
            }
            for item in &listed {
                println!(
                    "{:<22} {:<28} {:<16} {:>5} / {:<5} {}",
                    item.id,
                    item.name,
                    item.category,
                    item.quantity,
                    item.reorder_level,
                    item.status()
                );
            }
        }
        InventoryAction::Add {
            name,
            category,
            quantity,
            reorder_level,
        } => {
            if !user.role.can_manage_operations() {
                return Err("only operations staff can add inventory items".into());
            }
            let item = NewInventoryItem::from_form(name, category, quantity, reorder_level)?;
            let doc = ctx.writes().add_item(&item).await?;
            println!("Item Added: {} ({})", item.name, doc.id());
        }
        InventoryAction::Use { id, amount } => {
            let item: InventoryItem = ctx.fetch(&items.doc(id)).await?;
            let remaining = ctx.writes().use_item(&item, amount).await?;
            println!("{}: {} left", item.name, remaining);
        }
        InventoryAction::Restock { id, amount } => {
            let item: InventoryItem = ctx.fetch(&items.doc(id)).await?;
            let quantity = ctx.writes().restock_item(&item, amount).await?;
            println!("{}: {} in stock", item.name, quantity);
        }
    }
    Ok(())
}
