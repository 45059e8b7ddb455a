use anyhow::Context;
use commission_engine::{
    app, config::Config, initial::demo_employees, state::AppState, store::InMemoryStore,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ─── Config ───────────────────────────────────────────────────────────────
    let config = Config::from_env()?;
    let addr = config.server_addr();

    // ─── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    // ─── Record Store ─────────────────────────────────────────────────────────
    let store = if config.seed_demo_data {
        info!("Seeding demo employees");
        InMemoryStore::with_employees(demo_employees())
    } else {
        InMemoryStore::new()
    };

    // ─── App State ────────────────────────────────────────────────────────────
    let state = AppState::new(store, config);

    // ─── Start Server ─────────────────────────────────────────────────────────
    info!("Commission engine listening on http://{}", addr);
    info!("Swagger UI:  http://{}/docs", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    axum::serve(listener, app(state))
        .await
        .context("server failed")?;

    Ok(())
}
