//! # Lyra
//!
//! Synchronized lyrics for whatever Spotify is playing, with a line editor
//! for writing and timing them.

mod config;
mod services;
mod state;

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Cli, Command};
use services::{library, player, run_follow, SpotifySession};
use state::{run_editor, EditorSession};
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries lyrics.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lyra=info,lyra_app=info".into()),
        )
        .init();

    let cli = Cli::parse();
    info!("Starting Lyra v{}", env!("CARGO_PKG_VERSION"));

    let store = cli.config.open_store()?;
    let mut stdout = std::io::stdout();

    match cli.command {
        Command::Follow => {
            let session = SpotifySession::from_config(&cli.config)?;
            let interval = Duration::from_millis(cli.config.poll_interval_ms);
            runtime()?.block_on(run_follow(session, store, interval))?;
        }
        Command::Edit(track) => {
            let song = runtime()?.block_on(library::resolve_song(&store, &track, &cli.config))?;
            let mut session = EditorSession::new(song, cli.config.history_depth);
            run_editor(&mut session, &store, std::io::stdin().lock(), &mut stdout)?;
        }
        Command::Import {
            track,
            file,
            replace,
        } => {
            let song = runtime()?.block_on(library::resolve_song(&store, &track, &cli.config))?;
            let song = library::import_file(&store, song, &file, replace)?;
            writeln!(stdout, "{}", library::summary_row(&song.summary()))?;
        }
        Command::Show { track_id, at, lrc } => {
            write!(stdout, "{}", library::show(&store, &track_id, at.as_deref(), lrc)?)?;
        }
        Command::List => write!(stdout, "{}", library::list(&store)?)?,
        Command::Delete { track_id } => {
            writeln!(stdout, "{}", library::delete(&store, &track_id)?)?;
        }
        Command::Player(action) => {
            let mut session = SpotifySession::from_config(&cli.config)?;
            runtime()?.block_on(player::control(&mut session, &action))?;
        }
    }

    Ok(())
}

fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_config_parses() {
        let cli = Cli::try_parse_from(["lyra", "list"]);
        assert!(matches!(cli, Ok(Cli { command: Command::List, .. })));
    }
}
