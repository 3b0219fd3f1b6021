//! Spec pack — the ordered collection of content cards awaiting publish.

pub mod drop;
pub mod model;
pub mod store;

pub use drop::DroppedFile;
pub use model::{Card, CardKind, PackEvent};
pub use store::CardStore;
