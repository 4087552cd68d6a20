//! Configuration read from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

/// Default simulation endpoint.
pub const DEFAULT_SIMULATION_URL: &str = "http://127.0.0.1:3000/api/simulate";
/// Default archive endpoint.
pub const DEFAULT_ARCHIVE_URL: &str = "http://127.0.0.1:3000/api/archive";
/// Default identity file.
pub const DEFAULT_IDENTITY_PATH: &str = "zerohour_identity.json";

/// Front end settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Simulation endpoint.
    pub simulation_url: String,
    /// Archive endpoint.
    pub archive_url: String,
    /// File that keeps the session identifier.
    pub identity_path: PathBuf,
    /// Narrative reveal tick.
    pub tick: Duration,
    /// Intro reveal tick.
    pub intro_tick: Duration,
    /// Request timeout for both boundaries.
    pub http_timeout: Duration,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of
    /// a variable if it is set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a numeric variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());
        Ok(Self {
            simulation_url: text("ZEROHOUR_SIMULATION_URL", DEFAULT_SIMULATION_URL),
            archive_url: text("ZEROHOUR_ARCHIVE_URL", DEFAULT_ARCHIVE_URL),
            identity_path: PathBuf::from(text("ZEROHOUR_IDENTITY_PATH", DEFAULT_IDENTITY_PATH)),
            tick: Duration::from_millis(number(&lookup, "ZEROHOUR_TICK_MS", 15)?),
            intro_tick: Duration::from_millis(number(&lookup, "ZEROHOUR_INTRO_TICK_MS", 40)?),
            http_timeout: Duration::from_secs(number(&lookup, "ZEROHOUR_HTTP_TIMEOUT_SECS", 20)?),
        })
    }
}

fn number<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} must be a whole number: {e}"))),
    }
}
