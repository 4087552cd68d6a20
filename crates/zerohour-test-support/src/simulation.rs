//! Test simulation services — scripted and failing `SimulationBoundary`
//! implementations.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use zerohour_core::boundary::{SimulationBoundary, TurnRequest, TurnResponse};
use zerohour_core::choice::Choice;
use zerohour_core::error::DomainError;
use zerohour_core::history::{EventHistory, EventId};
use zerohour_core::stats::Stats;

/// Builds a response for `event_id` on `day` whose history is `used` and
/// whose choices carry the given texts.
#[must_use]
pub fn turn_response(event_id: &str, day: u32, used: &[&str], choices: &[&str]) -> TurnResponse {
    TurnResponse {
        stats: Stats {
            day,
            ..Stats::initial()
        },
        event_id: EventId::new(event_id),
        used_events: used.iter().map(|id| EventId::new(*id)).collect::<EventHistory>(),
        narrative: format!("Narrative for {event_id}."),
        choices: choices.iter().map(|text| Choice::new(*text)).collect(),
    }
}

/// A simulation service that answers from a script, in order, and records
/// every request it receives. Once the script runs out every call fails
/// with a transport error.
#[derive(Debug, Default)]
pub struct ScriptedSimulation {
    script: Mutex<VecDeque<Result<TurnResponse, DomainError>>>,
    requests: Mutex<Vec<TurnRequest>>,
}

impl ScriptedSimulation {
    /// Create a service that answers with `script`.
    #[must_use]
    pub fn new(script: Vec<Result<TurnResponse, DomainError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a service that answers successfully with `responses`.
    #[must_use]
    pub fn responding(responses: Vec<TurnResponse>) -> Self {
        Self::new(responses.into_iter().map(Ok).collect())
    }

    /// Returns a snapshot of all requests received.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requests(&self) -> Vec<TurnRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SimulationBoundary for ScriptedSimulation {
    async fn simulate(&self, request: &TurnRequest) -> Result<TurnResponse, DomainError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DomainError::Transport("script exhausted".into())))
    }
}

/// A simulation service that always fails with a transport error and counts
/// the calls it receives.
#[derive(Debug, Default)]
pub struct FailingSimulation {
    calls: Mutex<usize>,
}

impl FailingSimulation {
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
impl SimulationBoundary for FailingSimulation {
    async fn simulate(&self, _request: &TurnRequest) -> Result<TurnResponse, DomainError> {
        *self.calls.lock().unwrap() += 1;
        Err(DomainError::Transport("connection refused".into()))
    }
}
