use axum::Router;
use tokio::net::TcpListener;

use folio_registry::Registry;

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::router::build_router;

/// Folio document-store server.
pub struct FolioServer {
    config: ServerConfig,
}

impl FolioServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> Router {
        build_router(Registry::new(&self.config.data_dir))
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        // The registry itself never creates its base directory; server
        // startup does.
        tokio::fs::create_dir_all(&self.config.data_dir).await?;

        let app = build_router(Registry::new(&self.config.data_dir));
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("folio server listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| crate::error::ServerError::Internal(e.to_string()))
    }
}
