//! Batch pipelines: listing + detail scrape, then reverse geocoding.
//!
//! Both passes run strictly sequentially, keep their records in memory, and
//! write the output file once at the very end.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use hotel_parser::{parse_details, parse_listing, HotelDetails, HotelStub};

use crate::controls::ScrapeControls;
use crate::fetch::{FetchError, PageSource};
use crate::geocode::{resolve_address, split_coordinates, ReverseGeocoder, ADDRESS_NOT_FOUND};
use crate::records::{load_json, save_json, GeocodeEntry, HotelRecord};
use crate::throttle::{Sleeper, Throttle};

/// Fetches the listing page and extracts its stubs.
///
/// A failed listing fetch aborts the run: without it there is nothing to enrich.
pub fn scrape_listing<S: PageSource + ?Sized>(
    source: &S,
    listing_url: &str,
    origin: &str,
) -> Result<Vec<HotelStub>, FetchError> {
    let html = source.fetch(listing_url)?;
    let stubs = parse_listing(&html, origin);
    tracing::info!(url = listing_url, count = stubs.len(), "parsed listing page");
    Ok(stubs)
}

/// Pulls infobox fields for individual hotels.
pub struct DetailEnricher<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: PageSource + ?Sized> DetailEnricher<'a, S> {
    /// Enricher reading pages from `source`.
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Fields found on the hotel's article; empty when the page can't be
    /// fetched or has no infobox.
    pub fn enrich(&self, detail_link: &str) -> HotelDetails {
        let html = match self.source.fetch(detail_link) {
            Ok(html) => html,
            Err(err) => {
                tracing::warn!(error = %err, "skipping details");
                return HotelDetails::default();
            }
        };
        match parse_details(&html, detail_link) {
            Some(details) => details,
            None => {
                tracing::warn!(url = detail_link, "no infobox found");
                HotelDetails::default()
            }
        }
    }
}

/// Runs the listing pass and enriches every stub in listing order.
pub fn run_scrape<S, Z>(
    source: &S,
    controls: &ScrapeControls,
    throttle: &mut Throttle<Z>,
) -> Result<Vec<HotelRecord>>
where
    S: PageSource + ?Sized,
    Z: Sleeper,
{
    let stubs = scrape_listing(source, controls.listing_url(), controls.origin())
        .context("failed to fetch listing page")?;
    let enricher = DetailEnricher::new(source);
    tracing::info!(
        hotels = stubs.len(),
        delay_ms = throttle.delay().as_millis() as u64,
        "enriching hotels from detail pages"
    );

    let mut records = Vec::with_capacity(stubs.len());
    for stub in stubs {
        tracing::info!(hotel = %stub.name, "scraping details");
        throttle.wait();
        let details = enricher.enrich(&stub.detail_link);
        let mut record = HotelRecord::from_stub(stub);
        record.merge_details(details);
        records.push(record);
    }
    Ok(records)
}

/// Counters reported after a geocode pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeocodeSummary {
    /// Entries read.
    pub total: usize,
    /// Entries that received a resolved address.
    pub geocoded: usize,
    /// Entries that received the not-found sentinel.
    pub failed: usize,
    /// Entries passed through without a lookup.
    pub skipped: usize,
}

/// Adds an `address` to every entry that carries coordinates.
///
/// Entries without coordinates, or with coordinates not in `"<lat>; <lon>"` form,
/// are left untouched. `throttle` runs before each lookup.
pub fn run_geocode<G, Z>(
    entries: &mut [GeocodeEntry],
    geocoder: &G,
    throttle: &mut Throttle<Z>,
) -> GeocodeSummary
where
    G: ReverseGeocoder + ?Sized,
    Z: Sleeper,
{
    let mut summary = GeocodeSummary {
        total: entries.len(),
        ..GeocodeSummary::default()
    };
    tracing::info!(
        records = entries.len(),
        delay_ms = throttle.delay().as_millis() as u64,
        "reverse geocoding records"
    );

    for entry in entries.iter_mut() {
        let Some(coordinates) = entry.coordinates() else {
            summary.skipped += 1;
            continue;
        };
        let Some((lat, lon)) = split_coordinates(coordinates) else {
            tracing::warn!(hotel = entry.name(), coordinates, "malformed coordinates");
            summary.skipped += 1;
            continue;
        };
        let (lat, lon) = (lat.to_string(), lon.to_string());

        tracing::info!(hotel = entry.name(), "fetching address");
        throttle.wait();
        let address = resolve_address(geocoder, &lat, &lon);
        if address == ADDRESS_NOT_FOUND {
            summary.failed += 1;
        } else {
            summary.geocoded += 1;
        }
        tracing::info!(hotel = entry.name(), %address, "address resolved");
        entry.set_address(address);
    }
    summary
}

/// Scrapes everything and writes the records to `output`.
pub fn scrape_to_file<S, Z>(
    source: &S,
    controls: &ScrapeControls,
    throttle: &mut Throttle<Z>,
    output: &Path,
) -> Result<Vec<HotelRecord>>
where
    S: PageSource + ?Sized,
    Z: Sleeper,
{
    let started = Instant::now();
    let records = run_scrape(source, controls, throttle)?;
    save_json(output, &records)?;
    render_scrape_stats(&records, output, started);
    Ok(records)
}

/// Geocodes the records in `input` and writes them to `output`.
pub fn geocode_file<G, Z>(
    input: &Path,
    output: &Path,
    geocoder: &G,
    throttle: &mut Throttle<Z>,
) -> Result<GeocodeSummary>
where
    G: ReverseGeocoder + ?Sized,
    Z: Sleeper,
{
    let mut entries: Vec<GeocodeEntry> = load_json(input)?;
    let summary = run_geocode(&mut entries, geocoder, throttle);
    save_json(output, &entries)?;
    render_geocode_stats(&summary, output);
    Ok(summary)
}

fn render_scrape_stats(records: &[HotelRecord], output: &Path, started: Instant) {
    let with_coordinates = records.iter().filter(|r| r.coordinates.is_some()).count();
    let with_image = records.iter().filter(|r| r.image_url.is_some()).count();
    let with_website = records.iter().filter(|r| r.website.is_some()).count();
    println!(
        "--- scrape summary ({:.2}s) ---",
        started.elapsed().as_secs_f32()
    );
    println!("hotels: {}", records.len());
    println!("with coordinates: {with_coordinates}");
    println!("with image: {with_image}");
    println!("with website: {with_website}");
    println!("wrote {:?}", output);
}

fn render_geocode_stats(summary: &GeocodeSummary, output: &Path) {
    println!("--- geocode summary ---");
    println!("records: {}", summary.total);
    println!("geocoded: {}", summary.geocoded);
    println!("not found: {}", summary.failed);
    println!("skipped: {}", summary.skipped);
    println!("wrote {:?}", output);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::AddressParts;
    use crate::throttle::testing::RecordingSleeper;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::time::Duration;

    struct StaticPages(HashMap<&'static str, &'static str>);

    impl PageSource for StaticPages {
        fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.0
                .get(url)
                .map(|body| body.to_string())
                .ok_or_else(|| FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                    body: "Not Found".to_string(),
                })
        }
    }

    #[derive(Default)]
    struct ScriptedGeocoder {
        calls: RefCell<Vec<(String, String)>>,
    }

    impl ReverseGeocoder for ScriptedGeocoder {
        fn reverse(&self, lat: &str, lon: &str) -> Result<AddressParts, FetchError> {
            self.calls
                .borrow_mut()
                .push((lat.to_string(), lon.to_string()));
            if lat.starts_with("0") {
                return Err(FetchError::Status {
                    url: "https://geo.test/reverse".to_string(),
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(serde_json::from_value(json!({
                "address": {"road": "Main St", "city": "Ottawa", "country": "Canada"}
            }))
            .unwrap())
        }
    }

    fn throttle() -> Throttle<RecordingSleeper> {
        Throttle::with_sleeper(Duration::from_secs(1), RecordingSleeper::default())
    }

    #[test]
    fn detail_enricher_returns_empty_details_without_infobox() {
        let pages = StaticPages(HashMap::from([(
            "https://wiki.test/wiki/Plain",
            "<html><body><p>No infobox here.</p></body></html>",
        )]));
        let enricher = DetailEnricher::new(&pages);
        assert!(enricher.enrich("https://wiki.test/wiki/Plain").is_empty());
    }

    #[test]
    fn detail_enricher_survives_fetch_errors() {
        let pages = StaticPages(HashMap::new());
        let enricher = DetailEnricher::new(&pages);
        assert_eq!(
            enricher.enrich("https://wiki.test/wiki/Missing"),
            HotelDetails::default()
        );
    }

    #[test]
    fn listing_fetch_failure_aborts_the_scrape() {
        let pages = StaticPages(HashMap::new());
        let controls = ScrapeControls::new(
            "https://wiki.test/wiki/List".to_string(),
            "https://wiki.test".to_string(),
            Duration::ZERO,
        );
        let err = run_scrape(&pages, &controls, &mut throttle()).unwrap_err();
        assert!(format!("{err:#}").contains("404"));
    }

    #[test]
    fn run_scrape_merges_details_and_paces_detail_fetches() {
        let pages = StaticPages(HashMap::from([
            (
                "https://wiki.test/wiki/List",
                r#"<h2>Quebec</h2><div class="div-col"><ul>
                   <li><a href="/wiki/Frontenac">Château Frontenac</a> <a href="/wiki/Quebec_City">Quebec City</a></li>
                   <li><a href="/wiki/Gone">Gone Hotel</a> <a href="/wiki/Montreal">Montreal</a></li>
                   </ul></div>"#,
            ),
            (
                "https://wiki.test/wiki/Frontenac",
                r#"<table class="infobox vcard"><tr><td><span class="geo-inline">46.8119°N 71.2050°W</span></td></tr></table>"#,
            ),
        ]));
        let controls = ScrapeControls::new(
            "https://wiki.test/wiki/List".to_string(),
            "https://wiki.test".to_string(),
            Duration::from_secs(1),
        );
        let mut throttle = throttle();

        let records = run_scrape(&pages, &controls, &mut throttle).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].coordinates.as_deref(), Some("46.8119; -71.2050"));
        assert_eq!(records[0].region, "Quebec");
        assert_eq!(records[1].coordinates, None);
        assert_eq!(records[1].locality, "Montreal");
        assert_eq!(throttle.sleeper().pauses.borrow().len(), 1);
    }

    #[test]
    fn geocode_skips_entries_without_usable_coordinates() {
        let mut entries: Vec<GeocodeEntry> = serde_json::from_value(json!([
            {"name": "No coords"},
            {"name": "Empty", "coordinates": ""},
            {"name": "Malformed", "coordinates": "45.1,-75.2"},
        ]))
        .unwrap();
        let before = entries.clone();
        let geocoder = ScriptedGeocoder::default();

        let summary = run_geocode(&mut entries, &geocoder, &mut throttle());
        assert_eq!(entries, before);
        assert!(geocoder.calls.borrow().is_empty());
        assert_eq!(
            summary,
            GeocodeSummary {
                total: 3,
                geocoded: 0,
                failed: 0,
                skipped: 3,
            }
        );
    }

    #[test]
    fn geocode_sets_addresses_and_sentinels() {
        let mut entries: Vec<GeocodeEntry> = serde_json::from_value(json!([
            {"name": "Laurier", "coordinates": "45.4256; -75.6950"},
            {"name": "Null Island Inn", "coordinates": "0.0; 0.0"},
        ]))
        .unwrap();
        let geocoder = ScriptedGeocoder::default();
        let mut throttle = throttle();

        let summary = run_geocode(&mut entries, &geocoder, &mut throttle);
        assert_eq!(entries[0].address(), Some("Main St, Ottawa, , Canada"));
        assert_eq!(entries[1].address(), Some(ADDRESS_NOT_FOUND));
        assert_eq!(
            *geocoder.calls.borrow(),
            vec![
                ("45.4256".to_string(), "-75.6950".to_string()),
                ("0.0".to_string(), "0.0".to_string()),
            ]
        );
        assert_eq!(summary.geocoded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(
            *throttle.sleeper().pauses.borrow(),
            vec![Duration::from_secs(1)]
        );
    }
}
