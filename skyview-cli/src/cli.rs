use std::{sync::Arc, time::Duration};

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use skyview_core::{
    Config, Enrichment, EnrichmentSettings, FavoritesStore, FileFavorites, IpGeolocator,
    QueryOutcome, SessionEvent, WeatherData, WeatherSession, ai::generator_from_config,
    favorites, provider::provider_from_config,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use crate::render;

/// How long to wait for the quick summary before giving up on it.
const SUMMARY_WAIT: Duration = Duration::from_secs(10);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skyview", version, about = "Weather with AI commentary")]
pub struct Cli {
    /// Log pipeline details to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the AI API key and the fallback location.
    Configure,

    /// Show weather for a city name or a "lat, lng" pair.
    Show {
        /// Location; if absent, your approximate position is used.
        location: Option<String>,

        /// Also run the deep AI analysis.
        #[arg(long)]
        analyze: bool,

        /// Skip the quick AI summary.
        #[arg(long)]
        no_summary: bool,
    },

    /// Manage favorite cities.
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum FavoritesAction {
    /// List saved cities.
    List,
    /// Save a city.
    Add { name: String },
    /// Forget a city.
    Remove { name: String },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show {
                location,
                analyze,
                no_summary,
            } => show(location, analyze, !no_summary).await,
            Command::Favorites { action } => manage_favorites(action),
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("AI API key (leave empty to keep current):")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if !api_key.trim().is_empty() {
        config.upsert_ai_api_key(api_key.trim().to_string());
    }

    let default_location = Text::new("Fallback location:")
        .with_default(&config.default_location)
        .prompt()
        .context("Failed to read fallback location")?;
    config.default_location = default_location.trim().to_string();

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}

async fn show(location: Option<String>, analyze: bool, summary: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    debug!(
        "Loaded config: default_location={}, ai_configured={}",
        config.default_location,
        config.is_ai_configured()
    );
    let weather = provider_from_config(&config)?;
    let (mut session, mut events) = WeatherSession::new(Arc::from(weather));

    let enrichment = match (generator_from_config(&config)?, config.enrichment_settings()) {
        (Some(generator), Some(settings)) if summary || analyze => Some((
            generator,
            EnrichmentSettings {
                quick_summary: summary,
                ..settings
            },
        )),
        _ => None,
    };
    if let Some((generator, settings)) = enrichment {
        session = session.with_enrichment(Arc::from(generator), settings);
    }

    let result = match location {
        Some(location) => session.search(&location).await,
        None => {
            let geolocator = IpGeolocator::new()?;
            session
                .search_here(&geolocator, config.geolocation_timeout(), &config.default_location)
                .await
        }
    };

    let snapshot = print_pending_events(&mut events);

    let snapshot = match result {
        Ok(QueryOutcome::Applied(_)) => {
            snapshot.ok_or_else(|| anyhow!("No snapshot received"))?
        }
        Ok(QueryOutcome::Stale) => return Ok(()),
        Err(e) => return Err(anyhow!(e.user_message())),
    };

    if summary && config.is_ai_configured() {
        if let Some(text) = wait_for_summary(&mut events).await {
            println!("\n{}", render::render_summary(&text));
        }
    }

    if analyze {
        config.require_ai_api_key()?;
        eprintln!("Analyzing weather for {}...", snapshot.city);
        match session.analyze_current().await {
            Enrichment::Ready(analysis) => println!("\n{}", render::render_analysis(&analysis)),
            _ => eprintln!("Deep analysis is unavailable right now."),
        }
    }

    Ok(())
}

/// Render everything already emitted. Returns the applied snapshot, if any.
fn print_pending_events(
    events: &mut UnboundedReceiver<SessionEvent>,
) -> Option<Arc<WeatherData>> {
    let mut applied = None;

    while let Ok(event) = events.try_recv() {
        match event {
            SessionEvent::SnapshotReady { snapshot, .. } => {
                let theme = render::current_theme(&snapshot);
                println!("{}", render::render_snapshot(&snapshot, theme));
                applied = Some(snapshot);
            }
            SessionEvent::Advisory(text) => eprintln!("\n{text}"),
            SessionEvent::QueryFailed { .. }
            | SessionEvent::SummaryReady { .. }
            | SessionEvent::SummaryUnavailable { .. } => {}
        }
    }

    applied
}

async fn wait_for_summary(events: &mut UnboundedReceiver<SessionEvent>) -> Option<String> {
    let wait = async {
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::SummaryReady { summary, .. } => return Some(summary),
                SessionEvent::SummaryUnavailable { .. } => return None,
                _ => {}
            }
        }
        None
    };

    tokio::time::timeout(SUMMARY_WAIT, wait).await.ok().flatten()
}

fn manage_favorites(action: FavoritesAction) -> anyhow::Result<()> {
    let store = FileFavorites::from_default_location()?;

    let list = match action {
        FavoritesAction::List => store.load()?,
        FavoritesAction::Add { name } => favorites::add(&store, &name)?,
        FavoritesAction::Remove { name } => favorites::remove(&store, &name)?,
    };

    if list.is_empty() {
        println!("No favorites saved.");
    } else {
        for name in list {
            println!("{name}");
        }
    }

    Ok(())
}
