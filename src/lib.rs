//! Spec pack — fan prompts out to agent sessions, collect replies and
//! diagrams into a pack, publish the pack as a spec bundle.

pub mod app;
pub mod bundle;
pub mod cards;
pub mod cli;
pub mod config;
pub mod context;
pub mod credentials;
pub mod diagram;
pub mod dispatch;
pub mod error;
pub mod publish;
pub mod sessions;
