use baserow_gateway::api::{build_routes, common, cors_layer};
use baserow_gateway::core::models::GatewayConfig;
use baserow_gateway::state::AppState;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    port: u16,

    /// Address to bind, use 0.0.0.0 inside containers
    #[arg(long, env = "BIND_ADDRESS", default_value = "127.0.0.1")]
    bind: String,

    #[command(flatten)]
    gateway: GatewayConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    tracing::debug!("Starting with {:?}", args.gateway);

    let cors = cors_layer(&args.gateway)?;
    let app_state = Arc::new(AppState::new(args.gateway)?);

    let app = build_routes(app_state)
        .layer(cors)
        .layer(axum::middleware::from_fn(common::request_logger));

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    tracing::info!("Gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
