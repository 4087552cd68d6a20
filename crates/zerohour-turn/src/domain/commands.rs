//! Commands for the turn engine.

use uuid::Uuid;
use zerohour_core::command::Command;

/// Command to leave `boot` on the player's explicit activation.
#[derive(Debug, Clone)]
pub struct ActivateSession {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

/// Command recording that the intro reveal has finished.
#[derive(Debug, Clone)]
pub struct CompleteIntro {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

/// Command to enter play on the player's explicit advancement, which also
/// requests the opening turn.
#[derive(Debug, Clone)]
pub struct StartPlay {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

/// Command to request the opening turn again after it failed.
#[derive(Debug, Clone)]
pub struct RequestOpening {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

/// Command to submit the option number the player typed.
#[derive(Debug, Clone)]
pub struct SubmitChoice {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Raw one-based input.
    pub input: String,
}

impl Command for ActivateSession {
    fn command_type(&self) -> &'static str {
        "session.activate"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

impl Command for CompleteIntro {
    fn command_type(&self) -> &'static str {
        "session.complete_intro"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

impl Command for StartPlay {
    fn command_type(&self) -> &'static str {
        "session.start_play"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

impl Command for RequestOpening {
    fn command_type(&self) -> &'static str {
        "session.request_opening"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

impl Command for SubmitChoice {
    fn command_type(&self) -> &'static str {
        "session.submit_choice"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
