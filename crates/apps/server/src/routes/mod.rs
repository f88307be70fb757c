//! Route table.

mod auth;
mod floor_plans;
mod health;
mod hotspots;
mod scenes;
mod tours;
mod upload;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::rate_limit::{enforce, Limit};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let limiters = state.limiters.clone();
    let config = state.config.clone();

    let auth = auth::routes().layer(from_fn_with_state(
        Limit::counting_failures(&limiters.auth),
        enforce,
    ));

    let public_tours = tours::public_routes().layer(from_fn_with_state(
        Limit::counting_all(&limiters.public),
        enforce,
    ));
    let managed_tours = tours::routes()
        .merge(scenes::routes())
        .merge(hotspots::routes())
        .merge(floor_plans::routes())
        .layer(from_fn_with_state(
            Limit::counting_all(&limiters.api),
            enforce,
        ));

    let upload = upload::routes()
        .layer(DefaultBodyLimit::max(crate::upload::MAX_BODY_BYTES))
        .layer(from_fn_with_state(
            Limit::counting_all(&limiters.upload),
            enforce,
        ));

    Router::new()
        .merge(health::routes())
        .nest("/api/auth", auth)
        .nest("/api/tours", public_tours.merge(managed_tours))
        .nest("/api/upload", upload)
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .layer(DefaultBodyLimit::max(config.max_json_bytes))
        .layer(cors_layer(config.cors_origin.as_deref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true),
        Some(Err(err)) => {
            warn!("ignoring invalid CORS_ORIGIN: {err}");
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(methods)
        }
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_headers(Any)
            .allow_methods(methods),
    }
}
