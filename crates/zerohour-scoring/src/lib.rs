//! Zero Hour — scoring and leaderboard flow.
//!
//! Reachable only once a session has reached an ending: captures the
//! player's display name, submits the final score to the archive, fetches
//! the ranked leaderboard, and marks the session scored.

pub mod application;
pub mod domain;
