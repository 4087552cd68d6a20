//! Application handlers for the turn engine.

pub mod command_handlers;
pub mod query_handlers;
