//! Local-first support ticket tracker.
//!
//! State lives in a key-value storage partition on disk: one JSON blob per
//! key, whole-value writes, last-write-wins across processes. The ticket
//! collection is owned by [`store::TicketStore`], change notification is
//! handled by [`sync::SyncBroadcaster`], and every ticket command is guarded
//! by [`session::SessionGate`].

pub mod commands;
pub mod error;
pub mod models;
pub mod session;
pub mod storage;
pub mod store;
pub mod sync;
pub mod validate;
