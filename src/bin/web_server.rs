use anyhow::Context;

use intraday_fetcher::config::AppConfig;
use intraday_fetcher::utils::logging;
use intraday_fetcher::web;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init("info", false);

    let config = AppConfig::from_env()?;
    let addr = config.bind_addr();
    let app = web::app(config);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    tracing::info!("Intraday fetcher listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(web::shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}
