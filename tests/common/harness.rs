//! Spawns the gateway on an ephemeral port against an in-memory facet backend.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use offer_search::{
    FusionConfig, FusionRanker, HandlerState, MockFacetClient, RetryPolicy, SentenceEmbedder,
    create_router_with_state,
};

pub struct TestServerConfig {
    pub backend: MockFacetClient,
    pub fusion: FusionConfig,
}

impl Default for TestServerConfig {
    fn default() -> Self {
        Self {
            backend: MockFacetClient::new(),
            fusion: FusionConfig::default().retry(RetryPolicy::new(2, Duration::from_millis(1))),
        }
    }
}

impl TestServerConfig {
    pub fn with_backend(backend: MockFacetClient) -> Self {
        Self {
            backend,
            ..Default::default()
        }
    }
}

pub struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn spawn_test_server(config: TestServerConfig) -> anyhow::Result<TestServer> {
    let embedder = SentenceEmbedder::stub()?;
    let ranker = FusionRanker::new(embedder, config.backend, config.fusion)?;
    let app = create_router_with_state(HandlerState::new(ranker));

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(TestServer { addr, handle })
}
