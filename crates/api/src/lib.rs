pub mod error;
pub mod extractors;
pub mod response;
pub mod routes;
pub mod state;

use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use state::AppState;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.app.cors_origins);

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/me", get(routes::auth::me))
        .route(
            "/request-verification",
            post(routes::auth::request_verification),
        );

    let deal_routes = Router::new()
        .route("/", get(routes::deal::list).post(routes::deal::create))
        .route("/{deal_id}", get(routes::deal::get));

    // Approve and reject are admin-only
    let claim_routes = Router::new()
        .route("/", get(routes::claim::list).post(routes::claim::create))
        .route("/{claim_id}/approve", post(routes::claim::approve))
        .route("/{claim_id}/reject", post(routes::claim::reject));

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/deals", deal_routes)
        .nest("/claims", claim_routes);

    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// An empty origin list allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(origins))
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
