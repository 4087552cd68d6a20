//! Zero Hour terminal entry point.

use std::error::Error;
use std::sync::Arc;

use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;
use zerohour_cli::config::Config;
use zerohour_cli::error::AppError;
use zerohour_cli::game::{Boundaries, Game, Pacing};
use zerohour_cli::terminal::Console;
use zerohour_core::clock::SystemClock;
use zerohour_core::rng::SystemRng;
use zerohour_reveal::audio::{AudioChannel, SilentCue};
use zerohour_reveal::intro::IntroScript;
use zerohour_transport::{
    FileIdentityStore, HttpArchiveClient, HttpSimulationClient, build_client,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Logs go to stderr so they never interleave with the game on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        simulation_url = %config.simulation_url,
        archive_url = %config.archive_url,
        "starting Zero Hour"
    );

    let client = build_client(config.http_timeout).map_err(|e| AppError::Http(e.to_string()))?;
    let simulation = HttpSimulationClient::new(client.clone(), config.simulation_url.clone());
    let archive = HttpArchiveClient::new(client, config.archive_url.clone());
    let identity = FileIdentityStore::new(config.identity_path.clone());
    let clock = SystemClock;

    let boundaries = Boundaries {
        simulation: &simulation,
        archive: &archive,
        identity: &identity,
        clock: &clock,
    };
    let pacing = Pacing {
        tick: config.tick,
        intro_tick: config.intro_tick,
        intro: IntroScript::default(),
    };

    let game = Game::new(
        BufReader::new(tokio::io::stdin()),
        Console::new(std::io::stdout()),
        boundaries,
        AudioChannel::new(Arc::new(SilentCue)),
        pacing,
    );
    game.run(&mut SystemRng).await?;

    Ok(())
}
