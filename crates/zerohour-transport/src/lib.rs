//! Zero Hour — infrastructure adapters.
//!
//! HTTP clients for the simulation service and the score archive, and a
//! JSON file that keeps the session identifier across restarts.

pub mod archive;
mod http;
pub mod identity;
pub mod simulation;

pub use archive::HttpArchiveClient;
pub use http::build_client;
pub use identity::FileIdentityStore;
pub use simulation::HttpSimulationClient;
