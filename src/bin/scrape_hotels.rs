use anyhow::Result;
use clap::Parser;
use hotelcrawl::runtime::scrape_to_file;
use hotelcrawl::telemetry::init_tracing;
use hotelcrawl::{HttpPageSource, ScrapeCli, Throttle};

fn main() -> Result<()> {
    init_tracing();
    let cli = ScrapeCli::parse();
    let controls = cli.build_controls();
    let source = HttpPageSource::new(&cli.user_agent, cli.timeout())?;
    let mut throttle = Throttle::new(controls.politeness_delay());

    tracing::info!(url = controls.listing_url(), "starting hotel scrape");
    scrape_to_file(&source, &controls, &mut throttle, &cli.output)?;
    Ok(())
}
