//! Extract hotel listings and infobox details from Wikipedia HTML pages.
//!
//! The crate does no networking. Callers hand it the markup of a listing
//! page (one large "List of hotels in ..." article) or of a single hotel
//! article, and get back plain serializable records.

use scraper::node::Node;
use scraper::ElementRef;
use serde::Serialize;

mod coords;
mod details;
mod listing;

pub use coords::{parse_coordinate_pair, parse_coordinates};
pub use details::parse_details;
pub use listing::parse_listing;

/// Origin prefixed to the root-relative article links found on listing pages.
pub const DEFAULT_ORIGIN: &str = "https://en.wikipedia.org";

const IGNORE_CLASSES: &[&str] = &["mw-editsection", "mw-editsection-bracket", "reference"];

/// Minimal record extracted from a listing page before enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelStub {
    /// Display name taken from the item's first anchor.
    pub name: String,
    /// Absolute URL of the hotel's article.
    pub detail_link: String,
    /// Text of the next anchor after the name (usually the city).
    pub locality: String,
    /// Text of the nearest preceding section heading (usually the province).
    pub region: String,
}

/// Optional fields pulled from a hotel article's infobox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelDetails {
    /// First image inside the infobox, as an absolute URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Normalized `"<lat>; <lon>"` pair in signed decimal degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<String>,
    /// Official website exactly as linked from the infobox.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl HotelDetails {
    /// True when no field could be extracted.
    pub fn is_empty(&self) -> bool {
        self.image_url.is_none() && self.coordinates.is_none() && self.website.is_none()
    }
}

/// Visible text of `element`, whitespace collapsed, skipping edit links and footnotes.
pub(crate) fn visible_text(element: &ElementRef<'_>) -> String {
    let mut buf = String::new();
    collect_text(element, &mut buf);
    normalize_whitespace(&buf)
}

fn collect_text(element: &ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    if !is_ignored(&child) {
                        collect_text(&child, out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn is_ignored(element: &ElementRef<'_>) -> bool {
    element
        .value()
        .classes()
        .any(|class_name| IGNORE_CLASSES.contains(&class_name))
}

pub(crate) fn normalize_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    out.trim().to_string()
}
