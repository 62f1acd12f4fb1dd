use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::{AppConfig, StoreBackend};
use crate::database::{DatabaseManager, MemoryStudentStore, PgStudentStore, StudentStore};
use crate::handlers::{public, students};
use crate::middleware::jwt_auth_middleware;
use crate::services::StudentService;
use crate::storage::{build_photo_storage, local::UPLOADS_ROUTE};

/// Shared, immutable request state
#[derive(Clone)]
pub struct AppState {
    pub service: StudentService,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(service: StudentService, config: AppConfig) -> Self {
        Self {
            service,
            config: Arc::new(config),
        }
    }

    /// Wire the configured store and photo backend into a service
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn StudentStore> = match config.store.backend {
            StoreBackend::Postgres => {
                let pool = DatabaseManager::connect(&config.database).await?;
                DatabaseManager::ensure_schema(&pool).await?;
                Arc::new(PgStudentStore::new(pool, config.database.enable_query_logging))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory student store; records are lost on restart");
                Arc::new(MemoryStudentStore::new())
            }
        };

        let photos = build_photo_storage(&config.storage, &config.server)?;
        tracing::info!("Photo storage backend: {}", photos.name());

        let service = StudentService::new(store, config.policy.clone(), photos);
        Ok(Self::new(service, config))
    }
}

pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .nest_service(UPLOADS_ROUTE, ServeDir::new(&config.storage.upload_dir))
        // Protected
        .merge(student_routes(state.clone()))
        .fallback(public::not_found)
        // Global middleware
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(cors_layer(&config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn student_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/students", get(students::list).post(students::create))
        .route(
            "/students/:student_id",
            get(students::get)
                .put(students::upsert)
                .patch(students::patch)
                .delete(students::delete),
        )
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let security = &config.security;
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers(Any)
}
