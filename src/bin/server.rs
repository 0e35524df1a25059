//! CRUD server: loads the entity document, connects to PostgreSQL and serves every entity.
//!
//! Configuration comes from the environment (and `.env`): `DATABASE_URL`, `ENTITIES_PATH`,
//! `BIND_ADDR`, `API_PREFIX`, `PAGE_SIZE`, `MAX_PAGE_SIZE`, `CORS_ALLOWED_ORIGINS`, `BODY_LIMIT_BYTES`.

use crud_scaffold::{build_app, load_from_path, AppState, PermissionRegistry, PgStore, Settings};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("crud_scaffold=info,crud_server=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let model = load_from_path(&settings.entities_path).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await?;

    let state = AppState::new(Arc::new(PgStore::new(pool)), model, settings.pagination);
    let app = build_app(state, &PermissionRegistry::new(), &settings.http);

    let listener = TcpListener::bind(settings.http.bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
