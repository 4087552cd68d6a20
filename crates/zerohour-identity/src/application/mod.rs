//! Application handlers for the session identity context.

pub mod command_handlers;
