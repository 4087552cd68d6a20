//! Domain model for the scoring flow.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod name;
