use pdfnotes::{
    config::{AppConfig, MediaConfig},
    db,
    router::build_router,
    services::{create_email_service, create_media_store},
    AppState,
};
use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdfnotes=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    // Database connection
    let pool = db::create_pool(&config.database_url).await?;

    // Run migrations
    db::run_migrations(&pool).await?;

    let media_store = create_media_store(&config.media)?;
    let media_dir = match &config.media {
        MediaConfig::Local { dir, .. } => {
            tracing::info!("Storing note PDFs under {}", dir.display());
            Some(dir.clone())
        }
        MediaConfig::Cloudinary { cloud_name, .. } => {
            tracing::info!("Storing note PDFs in Cloudinary cloud '{}'", cloud_name);
            None
        }
    };
    let email_service = Arc::from(create_email_service(config.smtp.as_ref()));

    let app_state = AppState::new(pool, &config, media_store, email_service);
    let app = build_router(app_state, media_dir);

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));

    tracing::info!("Server running on http://{} ({})", addr, config.environment);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
