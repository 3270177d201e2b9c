use axum::{
    http::Method,
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod state;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest("/v1/auth", auth::routes())
        .nest("/v1/admin", admin::routes(state.clone()))
        .nest("/v1/user", bookings::routes(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
