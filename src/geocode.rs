//! Reverse geocoding against a Nominatim-compatible `/reverse` endpoint.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::fetch::{decode, read_success, transport, FetchError};

/// Address stored when the lookup fails.
pub const ADDRESS_NOT_FOUND: &str = "Address not found";

/// Resolves a latitude/longitude pair into address components.
pub trait ReverseGeocoder {
    /// Looks up the address at (`lat`, `lon`), both passed through as written in the record.
    fn reverse(&self, lat: &str, lon: &str) -> Result<AddressParts, FetchError>;
}

/// Loosely-typed `address` object of a reverse-geocoding response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AddressParts {
    #[serde(default)]
    address: Map<String, Value>,
}

impl AddressParts {
    /// Wraps an `address` object directly.
    pub fn new(address: Map<String, Value>) -> Self {
        Self { address }
    }

    /// String component `key`, or `""` when missing or not a string.
    pub fn component(&self, key: &str) -> &str {
        self.address.get(key).and_then(Value::as_str).unwrap_or("")
    }

    /// Renders `"<house> <road>, <city>, <state>, <country>"`.
    ///
    /// Missing components render empty and only the ends are trimmed, so gaps
    /// stay visible as doubled separators (`"Main St, Ottawa, , Canada"`).
    pub fn format_address(&self) -> String {
        format!(
            "{} {}, {}, {}, {}",
            self.component("house_number"),
            self.component("road"),
            self.component("city"),
            self.component("state"),
            self.component("country"),
        )
        .trim()
        .to_string()
    }
}

/// Splits a normalized `"<lat>; <lon>"` string on the literal `"; "` separator.
pub fn split_coordinates(coordinates: &str) -> Option<(&str, &str)> {
    let (lat, lon) = coordinates.split_once("; ")?;
    if lat.is_empty() || lon.is_empty() || lon.contains("; ") {
        return None;
    }
    Some((lat, lon))
}

/// Blocking client for OpenStreetMap's Nominatim (or any compatible mirror).
#[derive(Clone)]
pub struct NominatimClient {
    client: Client,
    endpoint: String,
}

impl NominatimClient {
    /// Builds a client for `base_url` that identifies itself with `user_agent`.
    ///
    /// Nominatim's usage policy rejects anonymous clients, so the agent must name
    /// the application and a contact.
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        anyhow::ensure!(
            !user_agent.trim().is_empty(),
            "a User-Agent identifying the application is required"
        );
        let client = Client::builder()
            .user_agent(user_agent.trim())
            .timeout(timeout)
            .build()
            .context("failed to build geocoder HTTP client")?;
        let endpoint = format!("{}/reverse", base_url.trim_end_matches('/'));
        Ok(Self { client, endpoint })
    }

    /// Full URL requested for a coordinate pair.
    pub fn request_url(&self, lat: &str, lon: &str) -> String {
        format!("{}?format=json&lat={lat}&lon={lon}", self.endpoint)
    }
}

impl ReverseGeocoder for NominatimClient {
    fn reverse(&self, lat: &str, lon: &str) -> Result<AddressParts, FetchError> {
        let url = self.request_url(lat, lon);
        tracing::debug!(%url, "requesting reverse geocode");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| transport(&url, err))?;
        tracing::debug!(status = %response.status(), "geocoder responded");
        read_success(&url, response)?
            .json::<AddressParts>()
            .map_err(|err| decode(&url, err))
    }
}

/// Resolves one coordinate string into the address text stored on the record.
///
/// Every lookup failure degrades to [`ADDRESS_NOT_FOUND`] after logging it.
pub fn resolve_address<G: ReverseGeocoder + ?Sized>(geocoder: &G, lat: &str, lon: &str) -> String {
    match geocoder.reverse(lat, lon) {
        Ok(parts) => parts.format_address(),
        Err(err) => {
            tracing::warn!(status = ?err.status(), error = %err, "geocoder lookup failed");
            ADDRESS_NOT_FOUND.to_string()
        }
    }
}
