use fairway::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND: &str = "0.0.0.0:8080";

fn bind_addr() -> String {
    std::env::var("FAIRWAY_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = bind_addr();
    let server = FairwayServer::builder().bind(&addr).build().await?;
    tracing::info!(addr = %server.local_addr()?, "starting golf server");

    server.run().await?;
    Ok(())
}
