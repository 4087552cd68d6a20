//! Zero Hour — persistent session identity.
//!
//! Obtains the opaque identifier that attributes leaderboard rows to a
//! player across restarts, generating and storing one on first use.

pub mod application;
pub mod domain;
