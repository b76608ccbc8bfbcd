/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use assignpay_api::{app::AppState, config::Config};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::from_config(config).await?;
/// let app = assignpay_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::{
        security::SecurityHeadersLayer,
        submission_guard::{single_submission_layer, InFlightRegistry},
    },
};
use assignpay_shared::{
    auth::{
        identity::{IdentityProvider, LocalIdentity},
        middleware::authenticate_request,
    },
    db::{
        migrations::run_migrations,
        pool::{create_pool, DatabaseConfig as PoolConfig},
    },
    store::{memory::MemoryStore, postgres::PgStore, SubmissionStore, UserStore},
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Assignment and payment persistence
    pub submissions: Arc<dyn SubmissionStore>,

    /// Sign-up, sign-in and session lookup
    pub identity: Arc<dyn IdentityProvider>,

    /// Users with a submission in flight
    pub in_flight: InFlightRegistry,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates state over the given stores
    pub fn new(
        config: Config,
        submissions: Arc<dyn SubmissionStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        let identity = Arc::new(LocalIdentity::new(users, config.jwt.secret.clone()));

        Self {
            submissions,
            identity,
            in_flight: InFlightRegistry::default(),
            config: Arc::new(config),
        }
    }

    /// Creates state backed by a fresh in-memory store
    pub fn in_memory(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(config, store.clone(), store)
    }

    /// Connects to PostgreSQL when configured, otherwise falls back to memory
    ///
    /// Pending migrations are applied before the state is returned.
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let Some(database) = config.database.clone() else {
            tracing::warn!("DATABASE_URL not set, using in-memory stores (data is not persisted)");
            return Ok(Self::in_memory(config));
        };

        let pool = create_pool(PoolConfig {
            max_connections: database.max_connections,
            ..PoolConfig::from_url(database.url)
        })
        .await?;
        run_migrations(&pool).await?;

        let store = Arc::new(PgStore::new(pool));
        Ok(Self::new(config, store.clone(), store))
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Whether records are persisted in PostgreSQL
    pub fn storage_backend(&self) -> &'static str {
        if self.config.database.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /v1/
///     ├── /auth/
///     │   ├── POST /signup             # public
///     │   ├── POST /login              # public
///     │   ├── POST /refresh            # public
///     │   └── GET  /session            # authenticated
///     ├── GET  /assignment-submission  # authenticated: session gate + prefilled draft
///     ├── POST /assignment-submission  # authenticated, one in flight per user
///     ├── GET  /assignments            # authenticated
///     ├── GET  /assignments/:id        # authenticated
///     └── GET  /payments               # authenticated
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_auth_routes = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let submit = post(routes::submission::submit).layer(from_fn_with_state(
        state.clone(),
        single_submission_layer,
    ));

    // Require JWT authentication
    let protected_routes = Router::new()
        .route("/auth/session", get(routes::auth::session))
        .route(
            "/assignment-submission",
            get(routes::submission::prefill).merge(submit),
        )
        .route("/assignments", get(routes::records::list_assignments))
        .route("/assignments/:id", get(routes::records::get_assignment))
        .route("/payments", get(routes::records::list_payments))
        .layer(from_fn_with_state(state.clone(), jwt_auth_layer));

    let v1_routes = Router::new()
        .nest("/auth", public_auth_routes)
        .merge(protected_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the bearer token and injects an `AuthContext` into request
/// extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate_request(req.headers(), state.jwt_secret())?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
