//! Shared test doubles and utilities for the Zero Hour session engine.

mod archive;
mod clock;
mod identity;
mod reveal;
mod rng;
mod simulation;

pub use archive::{FailingArchive, RecordingArchive};
pub use clock::FixedClock;
pub use identity::{MemoryIdentityStore, ReadOnlyIdentityStore, UnavailableIdentityStore};
pub use reveal::{RecordingAudioCue, RecordingRevealView};
pub use rng::SequenceRng;
pub use simulation::{FailingSimulation, ScriptedSimulation, turn_response};
