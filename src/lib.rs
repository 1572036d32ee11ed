pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::config::SecurityConfig;
use crate::database::models::{Goal, Note, Resource, Routine, Task};
use crate::handlers::{protected, public};
use crate::middleware::identity_middleware;

pub use crate::state::AppState;

/// Builds the full HTTP application around `state`.
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let router = Router::new()
        // Public
        .route("/", get(public::root::root))
        .route("/api/health", get(public::root::health))
        .route("/api/auth/register", post(public::auth::register_post))
        .route("/api/auth/login", post(public::auth::login_post))
        // Protected
        .merge(protected_routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(cors_layer(&config.security))
                .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes)),
        );

    let router = if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(protected::auth::me_get))
        .merge(resource_routes::<Task>())
        .merge(resource_routes::<Note>())
        .merge(resource_routes::<Goal>())
        .merge(resource_routes::<Routine>())
        .route(
            "/api/routines/:id/toggle/:date",
            post(protected::routine::toggle_post),
        )
        .route_layer(from_fn_with_state(state, identity_middleware))
}

fn resource_routes<R: Resource>() -> Router<AppState> {
    use protected::resource;

    let base = format!("/api/{}", R::COLLECTION.as_str());
    Router::new()
        .route(
            &base,
            get(resource::collection_get::<R>).post(resource::collection_post::<R>),
        )
        .route(
            &format!("{}/:id", base),
            get(resource::record_get::<R>)
                .put(resource::record_put::<R>)
                .delete(resource::record_delete::<R>),
        )
}

/// CORS for the configured origins. `*` allows any origin without credentials.
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request());

    if security.cors_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}
