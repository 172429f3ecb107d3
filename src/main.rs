use dotenvy::dotenv;
use helpdesk::{init_app_state, run_axum_server, AppConfig};
use log::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .write_style(env_logger::WriteStyle::Always)
        .init();

    let config = AppConfig::load()?;
    info!(
        "Starting helpdesk {} on {}:{} ({:?} storage)",
        env!("CARGO_PKG_VERSION"),
        config.server.host,
        config.server.port,
        config.database.backend
    );

    let state = init_app_state(config).await?;
    if let Err(e) = run_axum_server(state).await {
        error!("Server stopped with error: {e:#}");
        return Err(e);
    }

    info!("Server stopped");
    Ok(())
}
