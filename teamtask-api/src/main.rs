//! # TeamTask API Server
//!
//! Serves the team task API: user enrollment and approval into the
//! reporting hierarchy, and task tracking gated by that hierarchy.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) BOOTSTRAP_ADMIN_EMAIL=root@example.com cargo run -p teamtask-api
//! ```

use teamtask_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat},
    store::Store,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "teamtask_api=debug,teamtask_shared=info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!(
        "TeamTask API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let store = Store::new();
    match &config.bootstrap_admin {
        Some(admin) => {
            store.seed_admin(&admin.name, &admin.email).await?;
        }
        None => tracing::warn!("BOOTSTRAP_ADMIN_EMAIL not set; no one can approve new users"),
    }

    let address = config.bind_address();
    let app = build_router(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, exiting...");
}
