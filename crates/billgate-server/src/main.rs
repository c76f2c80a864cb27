//! Billing gateway server
//!
//! Loads configuration, connects the backend clients, loads the RBAC policy
//! and serves the REST API with graceful shutdown.

mod config;
mod telemetry;

use anyhow::{Context, Result};
use billgate_api::{
    build_api_server, AppState, AuthState, GatewayConfig, MiddlewareConfig, RbacPolicy,
    StorageBuckets,
};
use billgate_backend::{
    BillingService, GrpcBillingClient, GrpcReporterClient, HttpObjectStorage, ReporterService,
};
use clap::Parser;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use crate::config::ServerConfig;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration directory
    #[arg(short, long, env = "CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,

    /// Environment (development, production, etc.)
    #[arg(short, long, env = "ENVIRONMENT", default_value = "development")]
    environment: String,

    /// Server host
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,

    /// Server port
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// RBAC policy file
    #[arg(long, env = "POLICY_FILE")]
    policy_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config =
        ServerConfig::load(&args.config_dir, &args.environment).with_context(|| {
            format!(
                "Failed to load configuration from {}",
                args.config_dir.display()
            )
        })?;

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(policy_file) = args.policy_file {
        config.auth.policy_file = Some(policy_file);
    }

    telemetry::init(&config.logging).context("Failed to initialise logging")?;

    info!("Starting billing gateway");
    info!("Environment: {}", args.environment);

    let gateway = Arc::new(
        config
            .check(&args.environment)
            .context("Invalid configuration")?,
    );

    let policy = Arc::new(load_policy(&gateway)?);

    let billing: Arc<dyn BillingService> = Arc::new(
        GrpcBillingClient::from_config(&gateway.backend.billing)
            .context("Invalid billing backend settings")?,
    );
    let reporter: Arc<dyn ReporterService> = Arc::new(
        GrpcReporterClient::from_config(&gateway.backend.reporter)
            .context("Invalid reporter backend settings")?,
    );
    info!(
        billing = %gateway.backend.billing.endpoint,
        reporter = %gateway.backend.reporter.endpoint,
        "Backend clients configured"
    );

    let storage = StorageBuckets {
        agreements: Arc::new(
            HttpObjectStorage::new(&gateway.storage.agreements)
                .context("Invalid agreements bucket settings")?,
        ),
        reporter: Arc::new(
            HttpObjectStorage::new(&gateway.storage.reporter)
                .context("Invalid reporter bucket settings")?,
        ),
        documents: Arc::new(
            HttpObjectStorage::new(&gateway.storage.documents)
                .context("Invalid documents bucket settings")?,
        ),
    };

    let auth = AuthState::new(&gateway, policy, billing.clone())
        .context("Failed to set up authentication")?;
    let state = AppState::new(gateway.clone(), billing, reporter, storage);

    let app = build_api_server(
        state,
        auth,
        MiddlewareConfig::new().with_cors(config.cors.clone()),
    );

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .context("Invalid HTTP bind address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind HTTP server")?;

    info!("HTTP Server listening on http://{}", addr);

    if !config.server.graceful_shutdown {
        axum::serve(listener, app)
            .await
            .context("HTTP Server error")?;
        return Ok(());
    }

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                stop_rx.await.ok();
            })
            .into_future(),
    );

    tokio::select! {
        res = &mut server => {
            res.context("HTTP Server task failed")?.context("HTTP Server error")?;
        }
        _ = shutdown_signal() => {
            let _ = stop_tx.send(());
            let grace = Duration::from_secs(config.server.shutdown_timeout_seconds);
            info!("Waiting up to {} seconds for in-flight requests", grace.as_secs());

            match tokio::time::timeout(grace, server).await {
                Ok(res) => res.context("HTTP Server task failed")?.context("HTTP Server error")?,
                Err(_) => warn!("Graceful shutdown timed out, dropping remaining connections"),
            }
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Load the RBAC policy named in the configuration
///
/// Without a policy file every authorization check is denied.
fn load_policy(gateway: &GatewayConfig) -> Result<RbacPolicy> {
    match &gateway.auth.policy_file {
        Some(path) => RbacPolicy::load(path)
            .with_context(|| format!("Failed to load RBAC policy from {}", path.display())),
        None => {
            if !gateway.auth.disable_authz {
                warn!("No auth.policy_file configured; all authorized routes will be denied");
            }
            Ok(RbacPolicy::default())
        }
    }
}

/// Wait for SIGTERM or SIGINT (Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
