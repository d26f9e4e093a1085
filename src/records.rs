//! Hotel records as they are written to and read from the JSON batch files.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use hotel_parser::{HotelDetails, HotelStub};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A listing stub merged with infobox details and, later, an address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelRecord {
    /// Hotel display name.
    #[serde(default)]
    pub name: String,
    /// Absolute URL of the hotel's article.
    #[serde(default, alias = "wikiLink")]
    pub detail_link: String,
    /// City taken from the listing page.
    #[serde(default, alias = "city")]
    pub locality: String,
    /// Province or state taken from the listing page.
    #[serde(default, alias = "province")]
    pub region: String,
    /// Infobox image.
    #[serde(default, alias = "image", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Normalized `"<lat>; <lon>"` pair.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<String>,
    /// Official website as linked from the infobox.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Postal address resolved by the geocode pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl HotelRecord {
    /// Starts a record from a listing stub.
    pub fn from_stub(stub: HotelStub) -> Self {
        Self {
            name: stub.name,
            detail_link: stub.detail_link,
            locality: stub.locality,
            region: stub.region,
            ..Self::default()
        }
    }

    /// Copies every present detail field onto the record; absent ones leave it untouched.
    pub fn merge_details(&mut self, details: HotelDetails) {
        if let Some(image_url) = details.image_url {
            self.image_url = Some(image_url);
        }
        if let Some(coordinates) = details.coordinates {
            self.coordinates = Some(coordinates);
        }
        if let Some(website) = details.website {
            self.website = Some(website);
        }
    }
}

/// One object of the geocode input file, kept verbatim apart from `address`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeocodeEntry(Map<String, Value>);

impl GeocodeEntry {
    /// Wraps an already-parsed JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Non-empty `coordinates` string, if any.
    pub fn coordinates(&self) -> Option<&str> {
        self.0
            .get("coordinates")
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Display name used in log lines.
    pub fn name(&self) -> &str {
        self.0.get("name").and_then(Value::as_str).unwrap_or("")
    }

    /// Resolved address, if the entry has one.
    pub fn address(&self) -> Option<&str> {
        self.0.get("address").and_then(Value::as_str)
    }

    /// Sets or replaces the `address` field.
    pub fn set_address(&mut self, address: String) {
        self.0.insert("address".to_string(), Value::String(address));
    }

    /// Borrow the underlying JSON object.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<&HotelRecord> for GeocodeEntry {
    fn from(record: &HotelRecord) -> Self {
        match serde_json::to_value(record) {
            Ok(Value::Object(fields)) => Self(fields),
            _ => Self::default(),
        }
    }
}

/// Reads a JSON array of records.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("failed to open {:?}", path))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).with_context(|| format!("invalid record array in {:?}", path))
}

/// Writes `records` as one pretty-printed JSON array, creating parent directories.
pub fn save_json<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("failed to create {:?}", parent))?;
    }
    let file = File::create(path).with_context(|| format!("failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)
        .with_context(|| format!("failed to serialize records to {:?}", path))?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
