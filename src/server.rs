use tokio::net::TcpListener;

use crate::{app_state::AppState, config::ServerConfig, routes::create_router};

/// Bind the display surface to the configured host and port.
pub async fn bind(config: &ServerConfig) -> std::io::Result<TcpListener> {
    let addr = format!("{}:{}", config.host, config.port);
    TcpListener::bind(&addr).await
}

/// Serve the router on an already bound listener until the task is dropped.
pub async fn serve_on(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let app = create_router(state);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Bind using `state.config.server` and serve.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let listener = bind(&state.config.server).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    serve_on(listener, state).await
}
