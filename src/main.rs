//! Offer search HTTP server entrypoint.

use std::net::SocketAddr;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use offer_search::config::Config;
use offer_search::embedding::{EmbedderConfig, SentenceEmbedder};
use offer_search::fusion::FusionRanker;
use offer_search::gateway::{HandlerState, create_router_with_state};
use offer_search::vectordb::{FacetBackend, FacetSearchBackend};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        collection = %config.collection,
        facets = config.facets.len(),
        "Offer search starting"
    );

    let backend = FacetBackend::from_url(&config.qdrant_url, config.vector_metric)?;
    if backend.is_mock() {
        tracing::warn!("Using in-memory mock facet backend");
    } else if !backend.is_ready().await {
        tracing::warn!(url = %config.qdrant_url, "Qdrant not reachable yet, /ready will report pending");
    }

    let embedder_config = if let Some(path) = &config.model_path {
        EmbedderConfig::new(path.clone()).with_device(config.device)
    } else {
        tracing::warn!("No OFFER_SEARCH_MODEL_PATH configured, using the stub embedder");
        EmbedderConfig::stub()
    };
    let embedder =
        SentenceEmbedder::load(embedder_config.with_embedding_dim(config.embedding_dim))?;
    config.check_stub_embedder(embedder.is_stub(), backend.is_mock())?;
    if embedder.is_stub() && !backend.is_mock() {
        tracing::warn!(
            url = %config.qdrant_url,
            "Stub embedder serving a real index, /ready will report pending"
        );
    }

    tracing::info!(
        embedding_dim = embedder.embedding_dim(),
        stub = embedder.is_stub(),
        "Query embedder ready"
    );

    let ranker = FusionRanker::new(embedder, backend, config.fusion_config())?;
    tracing::debug!(?ranker, "Fusion ranker ready");

    let app = create_router_with_state(HandlerState::new(ranker));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Offer search shutdown complete");
    Ok(())
}

fn run_health_check() -> i32 {
    let port = std::env::var("OFFER_SEARCH_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let Ok(rt) = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    else {
        return 1;
    };

    rt.block_on(async {
        let Ok(client) = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
        else {
            return 1;
        };

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
