use anyhow::{bail, Result};

use crate::commands::{print_field_errors, session};
use crate::error::StoreError;
use crate::models::{Priority, Status};
use crate::session::SessionGate;
use crate::store::TicketStore;
use crate::validate::TicketDraft;

pub fn run(
    store: &TicketStore,
    gate: &SessionGate,
    title: &str,
    description: Option<&str>,
    status: Status,
    priority: Priority,
) -> Result<()> {
    session::require_login(gate)?;

    let draft = TicketDraft {
        title: title.to_string(),
        description: description.map(str::to_string),
        status,
        priority,
    };

    match store.create(&draft) {
        Ok(ticket) => {
            println!("Created ticket #{}", ticket.id);
            Ok(())
        }
        Err(StoreError::Validation(errors)) => {
            print_field_errors(&errors);
            bail!("Please fix the errors above");
        }
        Err(err) => Err(err.into()),
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
        (store, gate)
    }

    fn login(gate: &SessionGate) {
        gate.sign_up("ada@example.com", "Ada Lovelace", "difference-engine").unwrap();
        gate.log_in("ada@example.com", "difference-engine").unwrap();
    }

    #[test]
    fn test_create_requires_login() {
        let (store, gate) = setup();
        let err = run(&store, &gate, "Valid enough title", None, Status::Open, Priority::Low)
            .unwrap_err();
        assert!(err.to_string().contains("Not logged in"));
    }

    #[test]
    fn test_create_happy_path() {
        let (store, gate) = setup();
        login(&gate);

        run(&store, &gate, "Valid enough title", Some("details"), Status::Open, Priority::Low)
            .unwrap();

        let tickets = store.load().unwrap();
        assert_eq!(tickets[0].title, "Valid enough title");
        assert_eq!(tickets[0].priority, Priority::Low);
    }

    #[test]
    fn test_create_invalid_title_fails() {
        let (store, gate) = setup();
        login(&gate);

        let err = run(&store, &gate, "Shor", None, Status::Open, Priority::Medium).unwrap_err();
        assert!(err.to_string().contains("fix the errors"));
    }
}
