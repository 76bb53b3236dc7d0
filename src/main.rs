//! shieldgate — security response-header gateway.
//!
//! Loads and validates the configuration, wraps the bundled demo application
//! with the security pipeline, and serves it over HTTP or HTTPS.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{response::Html, routing::get, Json, Router};
use clap::Parser;
use tokio::net::TcpListener;

use shieldgate::config::{load_config, GatewayConfig};
use shieldgate::lifecycle::Shutdown;
use shieldgate::net::tls::load_tls_config;
use shieldgate::observability::{logging, metrics};
use shieldgate::HttpServer;

#[derive(Parser)]
#[command(name = "shieldgate")]
#[command(about = "Security response-header gateway", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    logging::init_logging("shieldgate=info,tower_http=warn");

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    if cli.check {
        println!("configuration OK");
        return Ok(());
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        enforce = config.csp.enforce,
        directives = config.csp.directives.len(),
        rewrite = config.rewrite.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Address validity is checked by config validation.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let tls = config.listener.tls.clone();
    let bind_address = config.listener.bind_address.clone();

    let server = HttpServer::new(config, demo_app())?;
    let shutdown = Shutdown::new();

    match tls {
        Some(tls) => {
            let rustls = load_tls_config(
                std::path::Path::new(&tls.cert_path),
                std::path::Path::new(&tls.key_path),
            )
            .await?;
            let addr: SocketAddr = bind_address.parse()?;
            server.run_tls(addr, rustls, shutdown.subscribe()).await?;
        }
        None => {
            let listener = TcpListener::bind(&bind_address).await?;
            server.run(listener, shutdown.subscribe()).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Minimal inner application: one HTML page with an inline script (which the
/// pipeline tags with the request nonce) and a JSON health endpoint (which it
/// leaves alone).
fn demo_app() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
}

async fn index() -> Html<&'static str> {
    Html(concat!(
        "<!DOCTYPE html>\n",
        "<html>\n<head><title>shieldgate</title></head>\n",
        "<body>\n",
        "<h1>shieldgate demo</h1>\n",
        "<p>The inline script below carries this response's nonce.</p>\n",
        "<script>document.title = 'shieldgate: ' + new Date().toISOString();</script>\n",
        "</body>\n</html>\n",
    ))
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
