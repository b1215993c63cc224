//! Session-scoped conversation state
//!
//! One `ConversationStore` per authenticated session, constructed in main and
//! passed by reference to whoever needs it (pipeline, history loader, UI).
//! The movie cache is shared the same way: any consumer may populate it,
//! entries are never invalidated within a session.

mod cache;
mod store;
mod types;

pub use cache::MovieCache;
pub use store::ConversationStore;
pub use types::{Role, Turn};
