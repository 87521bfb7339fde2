use anyhow::{bail, Result};

use crate::commands::{print_field_errors, session};
use crate::error::StoreError;
use crate::models::{Priority, Status};
use crate::session::SessionGate;
use crate::store::TicketStore;
use crate::validate::TicketDraft;

/// CLI flags are partial, the store contract is a full draft: unspecified
/// fields are carried over from the current record before validation.
pub fn run(
    store: &TicketStore,
    gate: &SessionGate,
    id: i64,
    title: Option<&str>,
    description: Option<&str>,
    status: Option<Status>,
    priority: Option<Priority>,
) -> Result<()> {
    session::require_login(gate)?;

    if title.is_none() && description.is_none() && status.is_none() && priority.is_none() {
        bail!("Nothing to update. Use --title, --description, --status, or --priority");
    }

    let tickets = store.load()?;
    let existing = match tickets.iter().find(|t| t.id == id) {
        Some(t) => t,
        None => bail!("Ticket #{} not found", id),
    };

    let draft = TicketDraft {
        title: title.unwrap_or(&existing.title).to_string(),
        description: description
            .map(str::to_string)
            .or_else(|| existing.description.clone()),
        status: status.unwrap_or(existing.status),
        priority: priority.unwrap_or(existing.priority),
    };

    match store.update(id, &draft) {
        Ok(ticket) => {
            println!("Updated ticket #{}", ticket.id);
            Ok(())
        }
        Err(StoreError::Validation(errors)) => {
            print_field_errors(&errors);
            bail!("Please fix the errors above");
        }
        Err(StoreError::NotFound { id }) => bail!("Ticket #{} not found", id),
        Err(err) => Err(err.into()),
    }
}
