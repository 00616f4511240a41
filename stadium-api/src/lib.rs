use axum::{http::Method, middleware::from_fn_with_state, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod bookings;
pub mod error;
pub mod fields;
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

    let protected = Router::new()
        .merge(auth::protected_routes())
        .merge(fields::protected_routes(state.media.max_upload_bytes))
        .merge(bookings::protected_routes())
        .route_layer(from_fn_with_state(state.clone(), middleware::require_user));

    Router::new()
        .merge(auth::routes())
        .merge(fields::routes())
        .merge(bookings::routes())
        .merge(protected)
        .nest_service("/media", ServeDir::new(&state.media.root))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
