//! Test archives — recording and failing `ArchiveBoundary` implementations.

use std::sync::Mutex;

use async_trait::async_trait;
use zerohour_core::boundary::{ArchiveBoundary, LeaderboardEntry, ScoreSubmission};
use zerohour_core::error::DomainError;

/// An archive that records submissions and answers leaderboard requests with
/// a fixed ranking.
#[derive(Debug, Default)]
pub struct RecordingArchive {
    leaderboard: Vec<LeaderboardEntry>,
    fail_leaderboard: bool,
    submissions: Mutex<Vec<ScoreSubmission>>,
    leaderboard_calls: Mutex<usize>,
}

impl RecordingArchive {
    /// Create an archive that ranks `leaderboard`.
    #[must_use]
    pub fn new(leaderboard: Vec<LeaderboardEntry>) -> Self {
        Self {
            leaderboard,
            ..Self::default()
        }
    }

    /// Create an archive that accepts submissions but fails to rank.
    #[must_use]
    pub fn failing_leaderboard() -> Self {
        Self {
            fail_leaderboard: true,
            ..Self::default()
        }
    }

    /// Returns a snapshot of all submissions received.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn submissions(&self) -> Vec<ScoreSubmission> {
        self.submissions.lock().unwrap().clone()
    }

    /// Returns the number of leaderboard requests received.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn leaderboard_calls(&self) -> usize {
        *self.leaderboard_calls.lock().unwrap()
    }
}

#[async_trait]
impl ArchiveBoundary for RecordingArchive {
    async fn submit_score(&self, submission: &ScoreSubmission) -> Result<(), DomainError> {
        self.submissions.lock().unwrap().push(submission.clone());
        Ok(())
    }

    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, DomainError> {
        *self.leaderboard_calls.lock().unwrap() += 1;
        if self.fail_leaderboard {
            return Err(DomainError::Transport("503 Service Unavailable".into()));
        }
        Ok(self.leaderboard.clone())
    }
}

/// An archive that fails every call and counts them.
#[derive(Debug, Default)]
pub struct FailingArchive {
    calls: Mutex<usize>,
}

impl FailingArchive {
    /// Returns the number of calls received.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ArchiveBoundary for FailingArchive {
    async fn submit_score(&self, _submission: &ScoreSubmission) -> Result<(), DomainError> {
        *self.calls.lock().unwrap() += 1;
        Err(DomainError::Transport("connection refused".into()))
    }

    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, DomainError> {
        *self.calls.lock().unwrap() += 1;
        Err(DomainError::Transport("connection refused".into()))
    }
}
