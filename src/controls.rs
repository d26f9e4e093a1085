//! Command-line and environment configuration for the batch jobs.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use hotel_parser::DEFAULT_ORIGIN;

/// Listing page scraped when no override is given.
pub const DEFAULT_LISTING_URL: &str = "https://en.wikipedia.org/wiki/List_of_hotels_in_Canada";
/// Public Nominatim instance.
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
/// User-Agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "hotelcrawl/0.1 (+https://github.com/hotelcrawl/hotelcrawl)";

/// Knobs for the listing + detail pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrapeControls {
    listing_url: String,
    origin: String,
    politeness_delay: Duration,
}

impl ScrapeControls {
    /// Constructs a new set of scrape controls.
    pub fn new(listing_url: String, origin: String, politeness_delay: Duration) -> Self {
        Self {
            listing_url,
            origin,
            politeness_delay,
        }
    }

    /// Listing page holding the column lists of hotels.
    pub fn listing_url(&self) -> &str {
        &self.listing_url
    }

    /// Origin prefixed to root-relative article links.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Pause between successive detail page fetches.
    pub fn politeness_delay(&self) -> Duration {
        self.politeness_delay
    }
}

impl Default for ScrapeControls {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            politeness_delay: Duration::ZERO,
        }
    }
}

/// Command-line interface of `scrape_hotels`.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "scrape_hotels",
    about = "Scrape the hotel listing and enrich each hotel from its infobox"
)]
pub struct ScrapeCli {
    /// Listing page to scrape
    #[arg(long, env = "HOTELCRAWL_LISTING_URL", default_value = DEFAULT_LISTING_URL)]
    pub listing_url: String,

    /// Origin prefixed to root-relative article links
    #[arg(long, env = "HOTELCRAWL_ORIGIN", default_value = DEFAULT_ORIGIN)]
    pub origin: String,

    /// Where to write the enriched records
    #[arg(long, env = "HOTELCRAWL_OUTPUT", default_value = "hotels.json")]
    pub output: PathBuf,

    /// Milliseconds to wait between detail page fetches
    #[arg(long, env = "HOTELCRAWL_POLITENESS_MS", default_value_t = 0)]
    pub politeness_ms: u64,

    /// User-Agent sent to the wiki
    #[arg(long, env = "HOTELCRAWL_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "HOTELCRAWL_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl ScrapeCli {
    /// Converts the parsed CLI into `ScrapeControls`.
    pub fn build_controls(&self) -> ScrapeControls {
        ScrapeControls::new(
            self.listing_url.clone(),
            self.origin.clone(),
            Duration::from_millis(self.politeness_ms),
        )
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Command-line interface of `geocode_hotels`.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "geocode_hotels",
    about = "Reverse-geocode hotel coordinates into postal addresses"
)]
pub struct GeocodeCli {
    /// Records produced by `scrape_hotels`
    #[arg(long, env = "HOTELCRAWL_GEOCODE_INPUT", default_value = "hotels.json")]
    pub input: PathBuf,

    /// Where to write the records with addresses
    #[arg(long, env = "HOTELCRAWL_GEOCODE_OUTPUT", default_value = "updatedHotels.json")]
    pub output: PathBuf,

    /// Base URL of the Nominatim-compatible service
    #[arg(long, env = "HOTELCRAWL_GEOCODER_URL", default_value = DEFAULT_GEOCODER_URL)]
    pub geocoder_url: String,

    /// User-Agent identifying this application to the geocoder
    #[arg(long, env = "HOTELCRAWL_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Milliseconds between geocoder requests
    #[arg(long, env = "HOTELCRAWL_GEOCODE_DELAY_MS", default_value_t = 1000)]
    pub delay_ms: u64,

    /// Per-request timeout in seconds
    #[arg(long, env = "HOTELCRAWL_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl GeocodeCli {
    /// Pause between geocoder requests.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}
