//! beltline-api library - REST backend for belt progression tracking
//!
//! Exposes the router builder and application state so integration tests can
//! drive the service without binding a socket.

use std::sync::Arc;

use axum::Router;
use beltline_common::config::Config;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod ledger;
pub mod progression;
pub mod queries;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Service configuration (token secret and lifetime)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

/// Build application router
///
/// `/login` and `/health` are public; everything else goes through the
/// bearer-token middleware.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{delete, get, patch, post, put};

    let protected = Router::new()
        .route("/users", get(api::users::list).post(api::users::create))
        .route(
            "/users/:user_id",
            get(api::users::get).put(api::users::update).delete(api::users::remove),
        )
        .route("/levels", get(api::levels::list).post(api::levels::create))
        .route(
            "/levels/:level_id",
            get(api::levels::get).put(api::levels::update).delete(api::levels::remove),
        )
        .route("/classes", post(api::classes::create))
        .route(
            "/classes/:class_id",
            get(api::classes::get).put(api::classes::update).delete(api::classes::remove),
        )
        .route("/classes/:class_id/waitlist", get(api::classes::waitlist))
        .route(
            "/students",
            post(api::students::create).put(api::students::bulk_update),
        )
        .route(
            "/students/:student_id",
            get(api::students::get)
                .put(api::students::update)
                .delete(api::students::remove),
        )
        .route(
            "/students/:student_id/waitlist",
            get(api::students::waitlist).post(api::students::register_waitlist),
        )
        .route(
            "/skill-domains",
            get(api::skill_domains::list).post(api::skill_domains::create),
        )
        .route(
            "/skill-domains/:skill_domain_id",
            put(api::skill_domains::update).delete(api::skill_domains::remove),
        )
        .route("/belts", get(api::belts::list).post(api::belts::create))
        .route(
            "/belts/:belt_id",
            put(api::belts::update).delete(api::belts::remove),
        )
        .route("/belts/:belt_id/rank", patch(api::belts::change_rank))
        .route("/evaluations", post(api::evaluations::create))
        .route(
            "/evaluations/:evaluation_id",
            put(api::evaluations::update).delete(api::evaluations::remove),
        )
        .route("/waitlist/:waitlist_id", delete(api::waitlist::remove))
        .route("/waitlist/convert", post(api::waitlist::convert))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::auth_middleware,
        ));

    let public = Router::new()
        .route("/login", post(api::auth::login))
        .merge(api::health::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
