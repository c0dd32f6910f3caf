use library_loans::{
    adapters::memory::InMemoryStore,
    adapters::postgres::{
        PostgresBookRepository, PostgresLoanReadModel, PostgresLoanStore, run_migrations,
    },
    api::{handlers::AppState, router::create_router},
    application::ServiceDependencies,
    config::{AppConfig, StorageBackend},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "library_loans=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(?config, "Configuration loaded");

    // Initialize adapters
    let service_deps = match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(&config.database_url)
                .await?;

            run_migrations(&pool).await?;
            tracing::info!("Database migrations applied");

            ServiceDependencies {
                loan_store: Arc::new(PostgresLoanStore::new(pool.clone())),
                book_repository: Arc::new(PostgresBookRepository::new(pool.clone())),
                loan_read_model: Arc::new(PostgresLoanReadModel::new(pool)),
                max_transaction_attempts: config.max_transaction_attempts,
            }
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; records are lost on restart");
            let store = Arc::new(InMemoryStore::new());

            ServiceDependencies {
                loan_store: store.clone(),
                book_repository: store.clone(),
                loan_read_model: store,
                max_transaction_attempts: config.max_transaction_attempts,
            }
        }
    };

    // Create application state
    let app_state = Arc::new(AppState { service_deps });

    // Create router
    let app = create_router(app_state);

    // Server configuration
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    // Start server
    axum::serve(listener, app).await?;

    Ok(())
}
