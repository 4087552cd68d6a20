//! Zero Hour — turn engine.
//!
//! Drives one game session through `boot → intro → playing → ending →
//! scored`, submits the player's choices to the simulation service one turn
//! at a time, and applies each response as a single unit.

pub mod application;
pub mod domain;
