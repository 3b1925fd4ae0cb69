//! Storage layer: the in-memory process panel and the persisted login session.

mod error;
pub use error::StoreError;

pub mod panel;
pub use panel::{FetchTicket, ProcessStore};

pub mod session;
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
