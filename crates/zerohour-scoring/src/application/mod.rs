//! Application handlers for the scoring flow.

pub mod command_handlers;
pub mod query_handlers;
