use anyhow::{bail, Result};
use std::io::{self, Write};

use crate::commands::session;
use crate::session::SessionGate;
use crate::store::TicketStore;

pub fn run(store: &TicketStore, gate: &SessionGate, id: i64, force: bool) -> Result<()> {
    session::require_login(gate)?;

    // Look up the title for the confirmation prompt
    let tickets = store.load()?;
    let ticket = match tickets.iter().find(|t| t.id == id) {
        Some(t) => t,
        None => bail!("Ticket #{} not found", id),
    };

    if !force {
        print!(
            "Delete ticket #{} \"{}\"? This action cannot be undone. [y/N] ",
            id, ticket.title
        );
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    if store.delete(id)? {
        println!("Deleted ticket #{}", id);
    } else {
        // Another context removed it between the lookup and the delete;
        // the end state is what the user asked for.
        println!("Ticket #{} was already gone", id);
    }

    Ok(())
}

#[cfg(test)]
pub fn run_force(store: &TicketStore, gate: &SessionGate, id: i64) -> Result<()> {
    run(store, gate, id, true)
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
    fn test_delete_requires_login() {
        let (store, gate) = setup();
        let id = store.load().unwrap()[0].id;
        gate.clear().unwrap();

        assert!(run_force(&store, &gate, id).is_err());
        assert_eq!(store.load().unwrap().len(), 2);
    }

    #[test]
    fn test_delete_existing_ticket() {
        let (store, gate) = setup();
        let id = store.load().unwrap()[0].id;

        run_force(&store, &gate, id).unwrap();

        let tickets = store.load().unwrap();
        assert_eq!(tickets.len(), 1);
        assert!(tickets.iter().all(|t| t.id != id));
    }

    #[test]
    fn test_delete_missing_ticket() {
        let (store, gate) = setup();
        store.load().unwrap();

        let err = run_force(&store, &gate, 99999).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
