use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_admin,
    require_user_auth, security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{
    admin, admin_categories, admin_certifications, admin_professionals, admin_users, auth,
    categories, certifications, contact_requests, health, professionals, reviews, schedule,
    search, services,
};
use crate::services::{AuthService, FileStore, JobQueue};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub queue: JobQueue,
    pub files: FileStore,
    pub auth_rate_limiter: Option<Arc<RateLimiterState>>,
}

impl AppState {
    pub fn new(config: Arc<Config>, pool: PgPool) -> Result<Self, JwtError> {
        let jwt = Arc::new(config.jwt.build()?);
        let auth_rate_limiter = RateLimiterState::new(
            config.security.auth_rate_limit_per_minute,
            config.security.trust_forwarded_for,
        )
        .map(Arc::new);

        Ok(Self {
            queue: JobQueue::new(pool.clone(), config.queue.max_attempts),
            files: FileStore::new(&config.storage),
            pool,
            jwt,
            auth_rate_limiter,
            config,
        })
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(self.pool.clone(), self.jwt.clone(), self.queue.clone())
    }
}

pub fn create_app(config: Config, pool: PgPool) -> Result<Router, JwtError> {
    let state = AppState::new(Arc::new(config), pool)?;
    Ok(create_router(state))
}

/// Builds the router around an already constructed state.
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/category-groups", get(categories::list_groups))
        .route("/api/v1/categories", get(categories::list_categories))
        .route("/api/v1/categories/:slug", get(categories::get_category))
        .route("/api/v1/search", get(search::search))
        .route(
            "/api/v1/professionals/:id",
            get(professionals::get_public_profile),
        )
        // Listing is public; the UserAuth extractor guards posting.
        .route(
            "/api/v1/professionals/:id/reviews",
            get(professionals::list_reviews).post(reviews::create_review),
        )
        .route(
            "/api/v1/professionals/:id/contact",
            post(professionals::contact),
        );

    // Login-style endpoints share a per-IP budget.
    let auth_routes = Router::new()
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/verify-email", post(auth::verify_email))
        .route("/api/v1/auth/forgot-password", post(auth::forgot_password))
        .route("/api/v1/auth/reset-password", post(auth::reset_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    let upload_limit = config
        .storage
        .max_image_bytes
        .max(config.storage.max_cv_bytes)
        + 64 * 1024;

    let upload_routes = Router::new()
        .route("/api/v1/professionals/me/image", post(professionals::upload_image))
        .route("/api/v1/professionals/me/cv", post(professionals::upload_cv))
        .layer(DefaultBodyLimit::max(upload_limit));

    let protected_routes = Router::new()
        .route("/api/v1/auth/me", get(auth::me))
        .route(
            "/api/v1/professionals/me",
            get(professionals::get_my_profile)
                .post(professionals::create_my_profile)
                .patch(professionals::update_my_profile),
        )
        .route(
            "/api/v1/professionals/me/availability",
            put(professionals::set_availability),
        )
        .route(
            "/api/v1/professionals/me/services",
            get(services::list_services).post(services::create_service),
        )
        .route(
            "/api/v1/professionals/me/services/:id",
            patch(services::update_service).delete(services::delete_service),
        )
        .route(
            "/api/v1/professionals/me/schedule",
            get(schedule::get_schedule).put(schedule::replace_schedule),
        )
        .route(
            "/api/v1/professionals/me/certifications",
            get(certifications::list_certifications).post(certifications::create_certification),
        )
        .route(
            "/api/v1/professionals/me/certifications/:id",
            delete(certifications::delete_certification),
        )
        .route(
            "/api/v1/professionals/me/contact-requests",
            get(contact_requests::list_contact_requests),
        )
        .route(
            "/api/v1/professionals/me/contact-requests/:id",
            patch(contact_requests::update_contact_request),
        )
        .route(
            "/api/v1/reviews/:id",
            delete(reviews::delete_review),
        )
        .merge(upload_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    // require_admin reads the UserAuth extension, so auth must run first
    // (outermost layer runs first).
    let admin_routes = Router::new()
        .nest("/api/v1/admin/categories", admin_categories::router())
        .nest("/api/v1/admin/users", admin_users::router())
        .nest("/api/v1/admin/professionals", admin_professionals::router())
        .nest("/api/v1/admin/certifications", admin_certifications::router())
        .nest("/api/v1/admin", admin::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    let public_path = format!("/{}", config.storage.public_path.trim_matches('/'));
    let uploads =
        Router::new().nest_service(&public_path, ServeDir::new(&config.storage.upload_dir));

    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .merge(uploads)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(RequestBodyLimitLayer::new(upload_limit.max(config.server.max_body_size)))
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(cors)
        .with_state(state)
}
