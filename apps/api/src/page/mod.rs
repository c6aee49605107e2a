//! Injected contexts: one `PageAgent` per tab, reached through the `PageRegistry`.

pub mod agent;
pub mod document;
pub mod handlers;
pub mod registry;
