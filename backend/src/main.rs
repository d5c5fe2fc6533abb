use clap::Parser;
use routefinder::{
    AppState,
    config::{Args, Settings},
    create_router,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "routefinder=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from(Args::parse());
    let state = AppState::from_settings(&settings)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("starting routefinder on http://{}", settings.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
