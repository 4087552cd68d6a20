//! Zero Hour Core — shared domain abstractions.
//!
//! This crate defines the data model exchanged with the simulation service,
//! the boundary traits the engine talks through, and the aggregate/event
//! abstractions every bounded context builds on. It contains no
//! infrastructure code.

pub mod aggregate;
pub mod boundary;
pub mod choice;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod history;
pub mod rng;
pub mod stats;
pub mod storage;
