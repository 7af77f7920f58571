use crate::{
    api::{auth, health, notes, users},
    auth::{require_auth, JwtManager},
    cache::CacheService,
    db::{NoteRepository, UserRepository},
    observability::HealthChecker,
    rate_limit::{auth_rate_limit_middleware, rate_limit_middleware, RateLimiters},
};
use axum::{
    http::Method,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub notes: Arc<dyn NoteRepository>,
    /// `None` when caching is disabled or Redis was unreachable at startup
    pub cache: Option<CacheService>,
    pub jwt: Arc<JwtManager>,
    pub limiters: RateLimiters,
    pub health_checker: Arc<HealthChecker>,
    pub password_min_length: usize,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        // Health endpoints
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/metrics", get(health::metrics))
        .nest("/api/v1", v1_routes(&state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn v1_routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route_layer(from_fn_with_state(
            state.limiters.clone(),
            auth_rate_limit_middleware,
        ));

    // Layers run bottom-up: the limiter sees every request, authenticated or not
    let protected = Router::new()
        .route(
            "/user/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/user/change-password", post(users::change_password))
        .route("/notes", post(notes::create_note).get(notes::list_notes))
        .route(
            "/notes/:id",
            get(notes::get_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        .route("/categories", get(notes::categories))
        .route_layer(from_fn_with_state(state.jwt.clone(), require_auth))
        .route_layer(from_fn_with_state(
            state.limiters.clone(),
            rate_limit_middleware,
        ));

    public.merge(protected)
}
