use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hotelcrawl::api::{router, AppState, RateLimiter};
use hotelcrawl::telemetry::init_tracing;
use hotelcrawl::HotelCatalog;

#[derive(Parser, Debug)]
#[command(
    name = "hotel_api",
    about = "HTTP API answering hotel lookups from a geocoded hotel file"
)]
struct ApiCli {
    /// Address to bind the HTTP server to (host:port).
    #[arg(long, env = "HOTELCRAWL_BIND", default_value = "0.0.0.0:5555")]
    bind: String,

    /// Geocoded records served by the API.
    #[arg(long, env = "HOTELCRAWL_DATA", default_value = "updatedHotels.json")]
    data: PathBuf,

    /// Max requests per second allowed per client address (0 disables rate limiting).
    #[arg(long, env = "HOTELCRAWL_MAX_RPS", default_value_t = 10)]
    max_requests_per_second: u32,

    /// Rate-limit burst size (tokens available instantly).
    #[arg(long, env = "HOTELCRAWL_RATE_BURST", default_value_t = 10)]
    rate_limit_burst: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = ApiCli::parse();
    let catalog = HotelCatalog::load(&cli.data)?;
    tracing::info!(path = ?cli.data, hotels = catalog.len(), "loaded hotel catalog");

    let rate_limiter = RateLimiter::new(cli.max_requests_per_second, cli.rate_limit_burst);
    let app = router(AppState::new(catalog, rate_limiter));

    let addr: SocketAddr = cli
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", cli.bind))?;
    tracing::info!("hotel_api listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
        .context("server shutdown")?;
    Ok(())
}
