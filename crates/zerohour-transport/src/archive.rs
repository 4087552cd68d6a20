//! HTTP client for the score archive.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use zerohour_core::boundary::{
    ArchiveBoundary, ArchiveRequest, LeaderboardEntry, LeaderboardResponse, ScoreSubmission,
};
use zerohour_core::error::DomainError;

use crate::http::{decode, post_json};

/// Posts archive actions to the archive endpoint.
#[derive(Debug, Clone)]
pub struct HttpArchiveClient {
    client: Client,
    url: String,
}

impl HttpArchiveClient {
    /// Creates a client for the endpoint at `url`.
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ArchiveBoundary for HttpArchiveClient {
    #[instrument(skip_all, fields(url = %self.url))]
    async fn submit_score(&self, submission: &ScoreSubmission) -> Result<(), DomainError> {
        let request = ArchiveRequest::SubmitScore(submission.clone());
        post_json(&self.client, &self.url, &request).await?;
        debug!("score accepted");
        Ok(())
    }

    #[instrument(skip_all, fields(url = %self.url))]
    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, DomainError> {
        let body = post_json(&self.client, &self.url, &ArchiveRequest::GetLeaderboard).await?;
        let response: LeaderboardResponse = decode(&body)?;
        debug!(rows = response.leaderboard.len(), "leaderboard received");
        Ok(response.leaderboard)
    }
}
