//! Commands for the scoring flow.

use uuid::Uuid;
use zerohour_core::command::Command;

/// Command to submit the final score under the name the player typed.
#[derive(Debug, Clone)]
pub struct SubmitScore {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Raw display name.
    pub name: String,
}

impl Command for SubmitScore {
    fn command_type(&self) -> &'static str {
        "scoring.submit_score"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
