use std::sync::Arc;

use tokio::net::TcpListener;
use vis_ledger::LedgerService;
use vis_store::SqliteLedgerStore;
use vis_types::ObjectIdGenerator;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;

/// vis HTTP server.
pub struct VisServer {
    config: ServerConfig,
    ledger: Arc<LedgerService>,
}

impl VisServer {
    pub fn new(config: ServerConfig, ledger: Arc<LedgerService>) -> Self {
        Self { config, ledger }
    }

    /// Open the SQLite ledger named by `config` and wrap it in a server.
    pub fn open(config: ServerConfig, ids: ObjectIdGenerator) -> ServerResult<Self> {
        let store = SqliteLedgerStore::open(&config.database, &config.sqlite_options())?;
        tracing::info!(database = %config.database.display(), "ledger store ready");
        let ledger = LedgerService::new(Arc::new(store), Arc::new(ids));
        Ok(Self::new(config, Arc::new(ledger)))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<LedgerService> {
        &self.ledger
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(Arc::clone(&self.ledger))
    }

    /// Serve until ctrl-c.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("vis server listening on {}", listener.local_addr()?);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
