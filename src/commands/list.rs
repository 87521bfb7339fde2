use anyhow::Result;

use crate::commands::session;
use crate::models::{Status, Ticket};
use crate::session::SessionGate;
use crate::store::{query, TicketStore};

pub fn run(store: &TicketStore, gate: &SessionGate, search: &str, status: Option<Status>) -> Result<()> {
    session::require_login(gate)?;

    let tickets = store.load()?;
    let filtered = query(&tickets, search, status);

    if filtered.is_empty() {
        println!("No tickets found");
        if !search.is_empty() || status.is_some() {
            println!("Try adjusting your filters");
        }
        return Ok(());
    }

    for ticket in &filtered {
        print_row(ticket);
    }
    println!("\n{} of {} tickets", filtered.len(), tickets.len());

    Ok(())
}

pub(crate) fn print_row(ticket: &Ticket) {
    let status_display = format!("[{}]", ticket.status);
    println!(
        "#{:<15} {:13} {:<40} {:8} {}",
        ticket.id,
        status_display,
        truncate(&ticket.title, 40),
        ticket.priority,
        ticket.created
    );
}

fn truncate(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars - 3).collect();
        format!("{}...", truncated)
    }
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
    fn test_list_requires_login() {
        let (store, gate) = setup();
        gate.clear().unwrap();
        assert!(run(&store, &gate, "", None).is_err());
    }

    #[test]
    fn test_list_all() {
        let (store, gate) = setup();
        assert!(run(&store, &gate, "", None).is_ok());
    }

    #[test]
    fn test_list_with_filters() {
        let (store, gate) = setup();
        assert!(run(&store, &gate, "timeout", Some(Status::InProgress)).is_ok());
        assert!(run(&store, &gate, "no such ticket anywhere", None).is_ok());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 40), "short");
        let long = "x".repeat(50);
        let cut = truncate(&long, 40);
        assert_eq!(cut.chars().count(), 40);
        assert!(cut.ends_with("..."));
    }
}
