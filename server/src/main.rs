//! Folio content server
//!
//! Serves the portfolio content and persists edits either to Cloud Firestore
//! (when a project is given) or to an in-process store backed by the local
//! cache. The cache is written on shutdown and seeds an empty store on the
//! next start.
//!
//! Usage:
//!   folio-server --port 5000 --admin-token secret
//!   folio-server --firestore-project my-site --id-token <token> --admin-token secret

use std::{path::PathBuf, sync::Arc};
use anyhow::{Context, Result};
use clap::Parser;
use folio_content::ContentStore;
use folio_server::{build_router, start_engine, AppState};
use folio_storage::LocalStore;
use folio_sync::{
    ContentEngine, DocumentStore, EngineConfig, FirestoreConfig, FirestoreStore, Identity,
    MemoryDocumentStore, SectionedService,
};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "folio-server")]
#[command(about = "Portfolio content server")]
struct Args {
    /// HTTP port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Directory for the local content cache
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Firestore project id; without it content lives in memory
    #[arg(long)]
    firestore_project: Option<String>,

    /// Firebase ID token used to write to Firestore
    #[arg(long)]
    id_token: Option<String>,

    /// Bearer token required by admin routes
    #[arg(long)]
    admin_token: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("Folio server starting...");

    let cache_path = args.data_dir.join("content.db");
    let local = LocalStore::new(&cache_path)
        .with_context(|| format!("failed to open local cache at {}", cache_path.display()))?;

    let (remote, identity): (Arc<dyn DocumentStore>, Identity) = match &args.firestore_project {
        Some(project) => {
            let store = FirestoreStore::new(FirestoreConfig {
                project_id: project.clone(),
                ..Default::default()
            })
            .context("failed to create Firestore client")?;
            let identity = match &args.id_token {
                Some(token) => {
                    store.set_id_token(Some(token.clone())).await;
                    Identity::admin("server")
                }
                None => {
                    warn!("No ID token given, serving Firestore content read-only");
                    Identity::viewer("server")
                }
            };
            (Arc::new(store) as Arc<dyn DocumentStore>, identity)
        }
        None => {
            info!("No Firestore project given, using the in-memory store");
            (
                Arc::new(MemoryDocumentStore::new()) as Arc<dyn DocumentStore>,
                Identity::admin("local"),
            )
        }
    };

    let engine = Arc::new(ContentEngine::new(
        Arc::new(ContentStore::new()),
        SectionedService::new(remote),
        Some(local),
        EngineConfig::default(),
    ));
    engine.set_identity(Some(identity)).await;

    if !start_engine(&engine).await {
        warn!("No stored content found, serving defaults");
    }

    if args.admin_token.is_none() {
        warn!("No admin token given, admin routes are disabled");
    }
    let app = build_router(AppState::new(Arc::clone(&engine), args.admin_token.clone()));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port))
        .await
        .with_context(|| format!("failed to bind HTTP port {}", args.port))?;
    info!("HTTP API listening on port {}", args.port);

    println!("\n========================================");
    println!("  Folio Server Running");
    println!("========================================");
    println!("  HTTP Port: {}", args.port);
    println!("  Store:     {}", engine.remote().provider_name());
    println!("  Cache:     {}", cache_path.display());
    println!("========================================\n");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    engine.stop_live_sync();
    if engine.store().status().await.is_dirty {
        info!("Unsaved edits, keeping them in the local cache");
    }
    if !engine.save_to_local().await {
        warn!("Failed to write the local cache");
    }
    info!("Folio server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
