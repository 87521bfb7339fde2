use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::storage::{FileStorage, Storage};
use crate::store::TicketStore;
use crate::sync::SyncBroadcaster;

pub const DATA_DIR: &str = ".novaticket";

pub fn run(path: &Path) -> Result<()> {
    let data_dir = path.join(DATA_DIR);
    if data_dir.exists() {
        println!("Already initialized at {}", data_dir.display());
        return Ok(());
    }

    let storage = Arc::new(
        FileStorage::open(&data_dir).context("Failed to create storage partition")?,
    ) as Arc<dyn Storage>;
    let broadcaster = Arc::new(SyncBroadcaster::new(storage.clone()));
    let store = TicketStore::new(storage, broadcaster);

    // First load seeds the sample tickets
    let tickets = store.load()?;
    println!("Created {} with {} sample tickets", data_dir.display(), tickets.len());
    println!("\nNext steps:");
    println!("  novaticket signup <email> \"Full Name\" <password>");
    println!("  novaticket login <email> <password>");
    println!("  novaticket list");

    Ok(())
}
