//! Quiz Back binary entrypoint wiring the REST API, play sessions, and the storage backend.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "mongo-store")]
use quiz_back::dao::quiz_store::mongodb::{MongoConfig, MongoQuizStore};
use quiz_back::{
    config::AppConfig,
    dao::{
        quiz_store::{QuizStore, memory::MemoryQuizStore},
        storage::StorageError,
    },
    routes,
    services::{session_sweeper, storage_supervisor},
    state::{AppState, SharedState},
};

/// Environment variable selecting the storage backend (`memory` or `mongo`).
const STORE_ENV: &str = "QUIZ_STORE";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let app_state = AppState::new(AppConfig::load());

    spawn_storage_supervisor(app_state.clone());
    tokio::spawn(session_sweeper::run(app_state.clone()));
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Start the storage supervisor for the backend selected through [`STORE_ENV`].
fn spawn_storage_supervisor(state: SharedState) {
    let backend = env::var(STORE_ENV).unwrap_or_default();
    match backend.as_str() {
        #[cfg(feature = "mongo-store")]
        "mongo" | "mongodb" => {
            info!("using MongoDB storage backend");
            tokio::spawn(storage_supervisor::run(state, connect_mongo));
        }
        other => {
            if !other.is_empty() && other != "memory" {
                warn!(backend = other, "unknown storage backend; using in-memory storage");
            }
            info!("using in-memory storage backend");
            tokio::spawn(storage_supervisor::run(state, connect_memory));
        }
    }
}

#[cfg(feature = "mongo-store")]
async fn connect_mongo() -> Result<Arc<dyn QuizStore>, StorageError> {
    let config = MongoConfig::from_env().await?;
    let store = MongoQuizStore::connect(config).await?;
    Ok(Arc::new(store))
}

async fn connect_memory() -> Result<Arc<dyn QuizStore>, StorageError> {
    Ok(Arc::new(MemoryQuizStore::new()))
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
