//! Domain types for the session identity context.

pub mod identifier;
