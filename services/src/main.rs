use std::net::{IpAddr, SocketAddr};

use rollcall_services::config::Config;
use rollcall_services::{AppState, routes};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::init()?;
    info!(
        addr = %config.addr(),
        port = %config.port(),
        demo_uid = ?config.demo_uid(),
        "Configuration loaded"
    );

    let addr = SocketAddr::from((config.addr().parse::<IpAddr>()?, config.port()));
    let route = routes(AppState::new(config));

    info!("Starting server on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, route).await?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,rollcall_services=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
