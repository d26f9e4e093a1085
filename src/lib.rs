#![warn(missing_docs)]
//! Hotel listing scraper, infobox enricher and reverse-geocoding passes.

pub mod api;
pub mod catalog;
pub mod controls;
pub mod fetch;
pub mod geocode;
pub mod records;
pub mod runtime;
pub mod telemetry;
pub mod throttle;

pub use catalog::{CatalogError, HotelCatalog, HotelFilter};
pub use controls::{GeocodeCli, ScrapeCli, ScrapeControls};
pub use fetch::{FetchError, HttpPageSource, PageSource};
pub use geocode::{AddressParts, NominatimClient, ReverseGeocoder, ADDRESS_NOT_FOUND};
pub use records::{GeocodeEntry, HotelRecord};
pub use runtime::{geocode_file, run_geocode, run_scrape, scrape_to_file, GeocodeSummary};
pub use throttle::{Sleeper, ThreadSleeper, Throttle};
