use anyhow::{bail, Result};

use crate::commands::session;
use crate::session::SessionGate;
use crate::store::TicketStore;

pub fn run(store: &TicketStore, gate: &SessionGate, id: i64) -> Result<()> {
    session::require_login(gate)?;

    let tickets = store.load()?;
    let ticket = match tickets.iter().find(|t| t.id == id) {
        Some(t) => t,
        None => bail!("Ticket #{} not found", id),
    };

    println!("Ticket #{}: {}", ticket.id, ticket.title);
    println!("Status: {}", ticket.status);
    println!("Priority: {}", ticket.priority);
    println!("Created: {}", ticket.created);

    if let Some(desc) = &ticket.description {
        println!("\nDescription:");
        for line in desc.lines() {
            println!("  {}", line);
        }
    }

    Ok(())
}
