use anyhow::Result;

use crate::commands::{list, session};
use crate::session::SessionGate;
use crate::store::{stats, TicketStore};

const RECENT_LIMIT: usize = 5;

pub fn run(store: &TicketStore, gate: &SessionGate) -> Result<()> {
    let session = session::require_login(gate)?;

    let tickets = store.load()?;
    let counts = stats(&tickets);

    println!("Welcome back, {}!", session.first_name());
    println!();
    println!("Open         {}", counts.open);
    println!("In Progress  {}", counts.in_progress);
    println!("Closed       {}", counts.closed);
    println!("Total        {}", counts.total);

    if !tickets.is_empty() {
        println!("\nRecent tickets:");
        for ticket in tickets.iter().take(RECENT_LIMIT) {
            list::print_row(ticket);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, Storage};
    use crate::sync::SyncBroadcaster;
    use std::sync::Arc;

    fn setup() -> (TicketStore, SessionGate) {
        let storage = Arc::new(MemoryStorage::new()) as Arc<dyn Storage>;
        let broadcaster = Arc::new(SyncBroadcaster::new(storage.clone()));
        let store = TicketStore::new(storage.clone(), broadcaster);
        let gate = SessionGate::new(storage);
        gate.sign_up("ada@example.com", "Ada Lovelace", "difference-engine").unwrap();
        gate.log_in("ada@example.com", "difference-engine").unwrap();
        (store, gate)
    }

    #[test]
    fn test_stats_requires_login() {
        let (store, gate) = setup();
        gate.clear().unwrap();
        assert!(run(&store, &gate).is_err());
    }

    #[test]
    fn test_stats_runs_over_seed() {
        let (store, gate) = setup();
        assert!(run(&store, &gate).is_ok());
    }
}
