//! In-memory hotel lookups served by the query API.

use std::path::Path;

use anyhow::Result;
use hotel_parser::parse_coordinate_pair;
use thiserror::Error;

use crate::records::{load_json, HotelRecord};

/// Matches needed at the city or province level before falling back further.
pub const MIN_MATCHES: usize = 3;
/// Half-width, in degrees, of the box searched around the filter coordinates.
pub const COORDINATE_WINDOW: f64 = 20.0;

/// Lookup failures.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    /// The filter string is not `"<city>, <province>, <lat>; <lon>"`.
    #[error("invalid filter format: expected \"cityName, provinceName, coordinates\", got {0:?}")]
    InvalidFilter(String),
    /// The coordinates part is not a `"<lat>; <lon>"` pair of numbers.
    #[error("invalid coordinates format: expected \"latitude; longitude\", got {0:?}")]
    InvalidCoordinates(String),
    /// Nothing matched at any level.
    #[error("no hotel found for filter: {0}")]
    NotFound(String),
}

/// Parsed `"<city>, <province>, <lat>; <lon>"` filter.
#[derive(Debug, Clone, PartialEq)]
pub struct HotelFilter {
    /// City compared against [`HotelRecord::locality`].
    pub city: String,
    /// Province compared against [`HotelRecord::region`].
    pub province: String,
    /// Latitude of the fallback search centre.
    pub latitude: f64,
    /// Longitude of the fallback search centre.
    pub longitude: f64,
}

impl HotelFilter {
    /// Parses the comma-separated filter string.
    pub fn parse(filter: &str) -> Result<Self, CatalogError> {
        let parts: Vec<&str> = filter.split(',').map(str::trim).collect();
        let [city, province, coordinates] = parts.as_slice() else {
            return Err(CatalogError::InvalidFilter(filter.to_string()));
        };
        let (latitude, longitude) = parse_coordinate_pair(coordinates)
            .ok_or_else(|| CatalogError::InvalidCoordinates(coordinates.to_string()))?;
        Ok(Self {
            city: city.to_string(),
            province: province.to_string(),
            latitude,
            longitude,
        })
    }

    fn is_nearby(&self, record: &HotelRecord) -> bool {
        let Some((latitude, longitude)) = record
            .coordinates
            .as_deref()
            .and_then(parse_coordinate_pair)
        else {
            return false;
        };
        (latitude - self.latitude).abs() <= COORDINATE_WINDOW
            && (longitude - self.longitude).abs() <= COORDINATE_WINDOW
    }
}

/// Read-only collection of geocoded hotels.
#[derive(Debug, Clone, Default)]
pub struct HotelCatalog {
    hotels: Vec<HotelRecord>,
}

impl HotelCatalog {
    /// Wraps already-loaded records.
    pub fn new(hotels: Vec<HotelRecord>) -> Self {
        Self { hotels }
    }

    /// Loads the JSON array written by the geocode pass.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(load_json(path)?))
    }

    /// Every hotel, in file order.
    pub fn all(&self) -> &[HotelRecord] {
        &self.hotels
    }

    /// Number of hotels.
    pub fn len(&self) -> usize {
        self.hotels.len()
    }

    /// True when the catalog holds no hotels.
    pub fn is_empty(&self) -> bool {
        self.hotels.is_empty()
    }

    /// Picks one hotel for `filter`, widening from city to province to a
    /// coordinate box.
    ///
    /// City and province only win when they have at least [`MIN_MATCHES`]
    /// hotels; the coordinate box accepts any single match.
    pub fn find_one(&self, filter: &HotelFilter) -> Result<&HotelRecord, CatalogError> {
        let by_city: Vec<&HotelRecord> = self
            .hotels
            .iter()
            .filter(|hotel| hotel.locality == filter.city)
            .collect();
        tracing::debug!(city = %filter.city, count = by_city.len(), "hotels found by city");
        if by_city.len() >= MIN_MATCHES {
            return Ok(by_city[0]);
        }

        let by_province: Vec<&HotelRecord> = self
            .hotels
            .iter()
            .filter(|hotel| hotel.region == filter.province)
            .collect();
        tracing::debug!(
            province = %filter.province,
            count = by_province.len(),
            "hotels found by province"
        );
        if by_province.len() >= MIN_MATCHES {
            return Ok(by_province[0]);
        }

        self.hotels
            .iter()
            .find(|hotel| filter.is_nearby(hotel))
            .ok_or_else(|| {
                CatalogError::NotFound(format!(
                    "{}, {}, {}; {}",
                    filter.city, filter.province, filter.latitude, filter.longitude
                ))
            })
    }

    /// Parses `filter` and runs [`HotelCatalog::find_one`].
    pub fn lookup(&self, filter: &str) -> Result<&HotelRecord, CatalogError> {
        let parsed = HotelFilter::parse(filter)?;
        self.find_one(&parsed)
    }
}
