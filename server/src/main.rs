use std::convert::Infallible;
use std::sync::Arc;

use clap::Parser;
use hyper::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpListener;
use tower::ServiceBuilder;

// Error tracing
use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use server::AppState;
use server::auth::GoogleVerifier;
use server::database::{Database, DbConfig};
use server::handlers::http::build_api_router;
use server::tower_middle::cors_layer;
use shared::config::load_config;

#[derive(Debug, Parser)]
#[command(name = "gear-server", version, about = "GoGear REST API server")]
struct Cli {
    /// Path of the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.server.log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if !config.auth.google_configured() {
        warn!("Google OAuth settings incomplete; Google login will fail");
    }

    let db = Database::connect(DbConfig::from_settings(&config.database))
        .await
        .with_context(|| format!("Failed to open database {}", config.database.file))?;

    let identity =
        Arc::new(GoogleVerifier::from_config(&config.auth).context("Failed to build Google client")?);

    let addr = config.server.listen_addr();
    if !config.server.hostname.is_empty() {
        info!("Public host name: {}", config.server.hostname);
    }

    let state = AppState::new(db.clone(), &config.auth, identity);
    let router = Arc::new(build_api_router());

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(err) => {
                        error!("Failed to accept connection: {}", err);
                        continue;
                    }
                };

                let io = TokioIo::new(stream);
                let router = router.clone();
                let state = state.clone();

                let service = ServiceBuilder::new()
                    .layer(cors_layer())
                    .service_fn(move |req: Request<Incoming>| {
                        let router = router.clone();
                        let state = state.clone();
                        async move { Ok::<_, Infallible>(router.route(req, state).await) }
                    });

                tokio::task::spawn(async move {
                    if let Err(err) = http1::Builder::new()
                        .timer(TokioTimer::new())
                        .serve_connection(io, TowerToHyperService::new(service))
                        .await
                    {
                        warn!("Error serving connection from {}: {:?}", peer, err);
                    }
                });
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    db.close().await;
    info!("Server stopped");

    Ok(())
}
