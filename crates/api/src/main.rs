use std::sync::Arc;

use anyhow::Context;

use taskdeck_api::app::{AppServices, build_app};
use taskdeck_store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    taskdeck_observability::init();

    let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
        "dev-secret".to_string()
    });

    let store = build_store().await?;
    let services = Arc::new(AppServices::new(store, &jwt_secret));
    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080")
        .await
        .context("failed to bind 0.0.0.0:8080")?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(feature = "postgres")]
async fn build_store() -> anyhow::Result<Arc<dyn Store>> {
    let url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .context("failed to connect to postgres")?;

    let store = taskdeck_store::PgStore::new(pool);
    store.migrate().await.context("migration failed")?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "postgres"))]
async fn build_store() -> anyhow::Result<Arc<dyn Store>> {
    // Volatile dev store. A platform admin account is seeded so tenant-wide
    // administration is reachable on a fresh process.
    let store = taskdeck_store::InMemoryStore::new();

    let email =
        std::env::var("SUPER_ADMIN_EMAIL").unwrap_or_else(|_| "superadmin@system.com".to_string());
    let password =
        std::env::var("SUPER_ADMIN_PASSWORD").unwrap_or_else(|_| "superadmin123".to_string());
    let hash =
        taskdeck_auth::hash_password(&password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    store.seed_super_admin(email, hash, "System Admin")?;

    Ok(Arc::new(store))
}
