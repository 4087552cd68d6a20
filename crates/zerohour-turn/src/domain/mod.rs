//! Domain model for the turn engine.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod input;
