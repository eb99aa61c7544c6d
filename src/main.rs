use study_tutor_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    init_config()?;
    let config = Arc::new(get_config().clone());

    let pool = create_pool(&config).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool.clone(), config.clone())?;
    if !config.llm_live() {
        tracing::warn!(provider = %config.llm_provider, "LLM provider not configured, serving placeholder completions");
    }

    {
        let limiter = app_state.rate_limiter.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(limiter.window());
            loop {
                tick.tick().await;
                let removed = limiter.sweep(Instant::now());
                if removed > 0 {
                    tracing::debug!(removed, "swept idle rate-limit buckets");
                }
            }
        });
    }

    let app = routes::app_router(app_state);

    let addr: SocketAddr = config.server_address.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("{} ({}) listening on {}", config.app_name, config.app_env, addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    pool.close().await;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
