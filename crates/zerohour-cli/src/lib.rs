//! Zero Hour — terminal front end.
//!
//! Wires the session engine to stdin/stdout and the HTTP boundaries.

pub mod config;
pub mod error;
pub mod game;
pub mod terminal;
