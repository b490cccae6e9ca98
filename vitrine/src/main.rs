use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use vitrine_core::config::Config;
use vitrine_core::credential::HmacCredentialIssuer;
use vitrine_core::logging;
use vitrine_core::models::{InteractionEvent, StoreId, StoreProfile};
use vitrine_core::registry::{HttpSessionRegistry, InMemorySessionRegistry, SessionRegistry};
use vitrine_live::{
    MediaRoomClient, MediaRoomViewer, InProcessRelay, RenderSurface, TestPatternSource,
};

#[derive(Parser)]
#[command(name = "vitrine", version, about = "Vitrine live-shopping session engine")]
struct Cli {
    /// Configuration file (TOML); defaults to ./vitrine.toml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List active live sessions from the registry
    Sessions,
    /// Run an end-to-end in-process broadcast/watch round trip
    Demo {
        /// Title of the demo live session
        #[arg(long, default_value = "Nouveautés")]
        title: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    logging::init_logging(&config.logging)?;

    match cli.command {
        Command::Sessions => list_sessions(&config).await,
        Command::Demo { title } => run_demo(&config, title).await,
    }
}

async fn list_sessions(config: &Config) -> Result<()> {
    let registry = HttpSessionRegistry::from_config(&config.registry)?;
    let sessions = registry.list_active().await?;

    if sessions.is_empty() {
        println!("No active live session.");
        return Ok(());
    }
    for session in sessions {
        println!(
            "{}  {:<32}  {}  since {}",
            session.id, session.title, session.store.name, session.started_at
        );
    }
    Ok(())
}

/// Exercise the full pipeline against the in-process relay: one broadcaster,
/// one viewer, a handful of interactions, then a clean teardown.
async fn run_demo(config: &Config, title: String) -> Result<()> {
    let registry = Arc::new(InMemorySessionRegistry::new());
    let relay = Arc::new(InProcessRelay::new());
    let secret = config
        .credentials
        .local_secret
        .clone()
        .unwrap_or_else(|| "vitrine-demo".to_string());
    let credentials = Arc::new(HmacCredentialIssuer::new(
        config.relay.url.clone(),
        secret.as_bytes(),
        config.credentials.token_ttl(),
    ));

    let store = StoreProfile {
        id: StoreId::new(),
        name: "Boutique de démonstration".to_string(),
        slug: "demo".to_string(),
        avatar: None,
    };

    let broadcaster = MediaRoomClient::new(
        store,
        registry.clone(),
        credentials.clone(),
        relay.clone(),
        Arc::new(TestPatternSource),
        RenderSurface::new(),
        &config.broadcast,
    );
    let session = broadcaster.start(title, None).await?;
    let state = broadcaster.attach_media().await;
    info!(state = state.as_str(), session_id = session.id.as_str(), "Broadcast attached");

    let viewer = MediaRoomViewer::new(
        credentials,
        relay,
        RenderSurface::new(),
        &config.viewer,
    );
    viewer.connect(&session).await;
    viewer.send_interaction(InteractionEvent::Like);
    viewer.send_interaction(InteractionEvent::Like);
    viewer.send_interaction(InteractionEvent::Comment {
        from: Some("demo".to_string()),
        text: "bonjour la boutique".to_string(),
    });
    viewer.send_interaction(InteractionEvent::BuyClick);
    tokio::time::sleep(Duration::from_millis(200)).await;

    let tally = broadcaster.tally();
    println!(
        "session {} \"{}\": {} likes, {} buy clicks, {} comments",
        session.id,
        session.title,
        tally.likes,
        tally.buy_clicks,
        tally.comments().len()
    );

    viewer.disconnect().await;
    broadcaster.stop().await;
    info!("Demo finished");
    Ok(())
}
