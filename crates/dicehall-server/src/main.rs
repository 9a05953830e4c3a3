//! Dicehall server binary.

use dicehall_server::DicehallServerBuilder;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "9000".into());
    let addr = format!("0.0.0.0:{port}");

    let server = DicehallServerBuilder::new().bind(&addr).build().await?;
    tracing::info!(%addr, "dicehall listening");
    server.run().await?;
    Ok(())
}
