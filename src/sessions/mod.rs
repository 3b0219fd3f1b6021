//! Agent sessions and their manually relayed message histories.

pub mod manager;
pub mod model;

pub use manager::SessionManager;
pub use model::{Message, Role, Session};
