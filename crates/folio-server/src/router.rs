use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use folio_registry::Registry;

use crate::handler;

/// Build the axum router with all Folio endpoints.
pub fn build_router(registry: Registry) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health))
        .route(
            "/:ns",
            get(handler::read_namespace)
                .post(handler::create_document)
                .delete(handler::destroy_missing_id),
        )
        .route(
            "/:ns/:id",
            get(handler::read_document)
                .post(handler::create_document_with_id)
                .put(handler::update_document)
                .delete(handler::destroy_document),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}
