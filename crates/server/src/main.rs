use tracing::info;
use tracing_subscriber::EnvFilter;

use metaprobe_server::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("metaprobe_server=info,metaprobe_core=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    info!(
        page_timeout = config.page_timeout,
        image_timeout = config.image_timeout,
        max_body_bytes = config.max_body_bytes,
        "configuration loaded"
    );

    let app = metaprobe_server::app(&config)?;
    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
