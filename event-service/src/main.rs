use lambda_http::Error;
use log::{error, info};
use rsvp_shared::config::Settings;

mod error;
mod handlers;
mod import;
mod models;
mod pages;
mod report;
mod routes;
mod state;

#[cfg(test)]
mod tests;

const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting RSVP event service");

    let settings = Settings::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    let app = routes::create_router(&settings).await?;

    if std::env::var("AWS_LAMBDA_RUNTIME_API").is_ok() {
        info!("Running as a Lambda function");
        return lambda_http::run(app).await;
    }

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Listening on port {}", port);
    axum::serve(listener, app).await?;

    Ok(())
}
