use anyhow::Result;
use clap::Parser;
use hotelcrawl::runtime::geocode_file;
use hotelcrawl::telemetry::init_tracing;
use hotelcrawl::{GeocodeCli, NominatimClient, Throttle};

fn main() -> Result<()> {
    init_tracing();
    let cli = GeocodeCli::parse();
    let geocoder = NominatimClient::new(&cli.geocoder_url, &cli.user_agent, cli.timeout())?;
    let mut throttle = Throttle::new(cli.delay());

    tracing::info!(input = ?cli.input, geocoder = %cli.geocoder_url, "starting reverse geocoding");
    geocode_file(&cli.input, &cli.output, &geocoder, &mut throttle)?;
    Ok(())
}
