//! Command-line front end for the sideload engine.
//!
//! Reads account credentials from a JSON file, signs in to both services,
//! and runs one reconcile-and-transfer pass, printing progress events as
//! they arrive.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use bridge_desktop::{ReqwestHttpClient, TokioFileStore};
use core_sideload::{
    Collaborators, EventBus, RunConfig, SideloadCoordinator, SideloadEvent, DEFAULT_CONCURRENCY,
};
use provider_itchio::ItchClient;
use provider_playdate::PlaydateClient;

#[derive(Parser, Debug)]
#[clap(name = "pdsideload", about = "Sideload purchased Playdate games from itch.io")]
struct CliArgs {
    /// Path to the credentials JSON file.
    #[clap(long, default_value = "./credentials.json")]
    credentials: PathBuf,

    /// Path of the transfer log.
    #[clap(long, default_value = "./sideload-log.json")]
    log_file: PathBuf,

    /// Directory for staged downloads. Defaults to a subdirectory of the
    /// system temp dir.
    #[clap(long)]
    staging_dir: Option<PathBuf>,

    /// Maximum number of concurrent transfers.
    #[clap(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Reconcile and report only; transfer nothing.
    #[clap(long)]
    dry_run: bool,
}

#[derive(Debug, Deserialize)]
struct Credentials {
    #[serde(alias = "pd")]
    playdate: Account,
    #[serde(alias = "itch")]
    itchio: Account,
}

#[derive(Debug, Deserialize)]
struct Account {
    username: String,
    password: String,
}

async fn load_credentials(path: &PathBuf) -> Result<Credentials> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading credentials file {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing credentials file {}", path.display()))
}

/// Render progress events until the bus closes.
async fn print_events(mut rx: core_sideload::events::Receiver<SideloadEvent>) {
    loop {
        match rx.recv().await {
            Ok(SideloadEvent::System { message }) => println!("{message}"),
            Ok(SideloadEvent::Sideload { title }) => println!("Sideloading {title}..."),
            Ok(SideloadEvent::Update { title }) => println!("Updating {title}..."),
            Ok(SideloadEvent::Skip { title }) => println!("Skipping {title}."),
            Ok(SideloadEvent::ItemFailed { title, message }) => {
                eprintln!("Failed {title}: {message}")
            }
            Ok(SideloadEvent::Done {
                added,
                updated,
                skipped,
                failed,
            }) => {
                println!("Done! {added} added, {updated} updated, {skipped} skipped, {failed} failed.");
            }
            Err(core_sideload::events::RecvError::Lagged(_)) => continue,
            Err(core_sideload::events::RecvError::Closed) => break,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .init();

    let args = CliArgs::parse();
    let credentials = load_credentials(&args.credentials).await?;

    let staging_dir = args
        .staging_dir
        .unwrap_or_else(|| std::env::temp_dir().join("pdsideload"));
    let file_store = Arc::new(TokioFileStore::new(staging_dir));

    let config = RunConfig::builder()
        .log_path(&args.log_file)
        .concurrency(args.concurrency)
        .dry_run(args.dry_run)
        .build()?;

    // Separate sessions: the portal needs its own cookie jar, and store
    // downloads must not leak portal cookies.
    let store_http = Arc::new(ReqwestHttpClient::new());
    let portal_http = Arc::new(ReqwestHttpClient::new());

    println!("Logging in...");
    let (itch, playdate) = tokio::try_join!(
        async {
            ItchClient::login(
                store_http.clone() as Arc<dyn bridge_traits::HttpClient>,
                file_store.clone() as Arc<dyn bridge_traits::FileStore>,
                &credentials.itchio.username,
                &credentials.itchio.password,
            )
            .await
            .context("itch.io login")
        },
        async {
            PlaydateClient::login(
                portal_http.clone() as Arc<dyn bridge_traits::HttpClient>,
                &credentials.playdate.username,
                &credentials.playdate.password,
            )
            .await
            .context("Playdate portal login")
        },
    )?;

    let itch = Arc::new(itch);
    let playdate = Arc::new(playdate);

    let events = EventBus::default();
    let printer = tokio::spawn(print_events(events.subscribe()));

    let coordinator = SideloadCoordinator::new(
        config,
        Collaborators {
            owned: itch.clone(),
            candidates: itch.clone(),
            installed: playdate.clone(),
            downloader: itch,
            uploader: playdate,
            file_store,
        },
        events,
    );

    let report = coordinator.run().await.context("sideload run")?;
    drop(coordinator);
    printer.await.ok();

    if report.failed() > 0 {
        for failure in &report.failures {
            tracing::warn!(title = %failure.title, "{}", failure.message);
        }
        std::process::exit(1);
    }
    Ok(())
}
