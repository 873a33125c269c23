//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{FsAssetStore, LoggedInvitationSender, PgAdapter},
    config::Config,
    error::ApiError,
    web::{
        auth::{login_handler, logout_handler, signup_handler},
        dashboard::{get_school_handler, me_handler},
        onboarding::{
            add_teacher, advance_step, complete_session, create_session, get_session, go_back,
            remove_logo, remove_teacher, skip_step, status_handler, update_step_data, upload_logo,
        },
        require_auth,
        state::{ActiveSchools, AppState},
        ApiDoc,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, COOKIE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            config.log_level.to_string(),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(PgAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let asset_store = Arc::new(FsAssetStore::new(
        config.asset_root.clone(),
        config.asset_base_url.clone(),
    ));
    let invitation_sender = Arc::new(LoggedInvitationSender);

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        directory: db_adapter.clone(),
        credentials: db_adapter,
        assets: asset_store,
        invitations: invitation_sender,
        schools: Arc::new(ActiveSchools::default()),
        wizards: Mutex::new(HashMap::new()),
    });

    let cors_origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT, COOKIE]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/me", get(me_handler))
        .route("/schools/{id}", get(get_school_handler))
        .route("/onboarding/status", get(status_handler))
        .route("/onboarding/sessions", post(create_session))
        .route("/onboarding/sessions/{id}", get(get_session))
        .route("/onboarding/sessions/{id}/step-data", put(update_step_data))
        .route(
            "/onboarding/sessions/{id}/logo",
            post(upload_logo).delete(remove_logo),
        )
        .route("/onboarding/sessions/{id}/teachers", post(add_teacher))
        .route(
            "/onboarding/sessions/{id}/teachers/{email}",
            delete(remove_teacher),
        )
        .route("/onboarding/sessions/{id}/advance", post(advance_step))
        .route("/onboarding/sessions/{id}/back", post(go_back))
        .route("/onboarding/sessions/{id}/skip", post(skip_step))
        .route("/onboarding/sessions/{id}/complete", post(complete_session))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service("/assets", ServeDir::new(&config.asset_root))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
