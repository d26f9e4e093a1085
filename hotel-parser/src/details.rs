use std::sync::OnceLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::{coords::parse_coordinates, HotelDetails};

struct InfoboxSelectors {
    infobox: Selector,
    image: Selector,
    coordinates: Selector,
    website: Selector,
    anchor: Selector,
}

fn selectors() -> &'static InfoboxSelectors {
    static SELECTORS: OnceLock<InfoboxSelectors> = OnceLock::new();
    SELECTORS.get_or_init(|| InfoboxSelectors {
        infobox: Selector::parse("table.infobox.vcard").expect("valid infobox selector"),
        image: Selector::parse("img").expect("valid image selector"),
        coordinates: Selector::parse("span.geo-inline").expect("valid coordinates selector"),
        website: Selector::parse("span.url").expect("valid website selector"),
        anchor: Selector::parse("a").expect("valid anchor selector"),
    })
}

/// Extracts image, coordinates, and website from a hotel article's infobox.
///
/// Returns `None` when the page has no `infobox vcard` table. Each field is
/// looked up independently, so a missing image never hides the coordinates.
pub fn parse_details(html: &str, page_url: &str) -> Option<HotelDetails> {
    let document = Html::parse_document(html);
    let selectors = selectors();
    let infobox = document.select(&selectors.infobox).next()?;

    Some(HotelDetails {
        image_url: image_url(&infobox, page_url),
        coordinates: coordinates(&infobox),
        website: website(&infobox),
    })
}

fn image_url(infobox: &ElementRef<'_>, page_url: &str) -> Option<String> {
    let src = infobox
        .select(&selectors().image)
        .next()?
        .value()
        .attr("src")?
        .trim();
    if src.is_empty() {
        return None;
    }
    if src.starts_with("//") {
        return Some(format!("https:{src}"));
    }
    if Url::parse(src).is_ok() {
        return Some(src.to_string());
    }
    Url::parse(page_url)
        .and_then(|base| base.join(src))
        .map(String::from)
        .ok()
}

fn coordinates(infobox: &ElementRef<'_>) -> Option<String> {
    let span = infobox.select(&selectors().coordinates).next()?;
    let text: String = span.text().collect();
    parse_coordinates(text.trim())
}

fn website(infobox: &ElementRef<'_>) -> Option<String> {
    let selectors = selectors();
    let span = infobox.select(&selectors.website).next()?;
    let anchor = span.select(&selectors.anchor).next()?;
    anchor.value().attr("href").map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = "https://en.wikipedia.org/wiki/Ch%C3%A2teau_Laurier";

    #[test]
    fn extracts_all_three_fields() {
        let html = r#"
        <table class="infobox vcard">
          <tr><td><a href="/wiki/File:Laurier.jpg"><img src="//upload.wikimedia.org/laurier.jpg"></a></td></tr>
          <tr><td><span class="geo-inline"><span class="geo-dec">45.4256°N 75.6950°W</span></span></td></tr>
          <tr><td><span class="url"><a href="http://www.fairmont.com/laurier">fairmont.com</a></span></td></tr>
        </table>
        "#;

        let details = parse_details(html, PAGE).expect("infobox present");
        assert_eq!(
            details,
            HotelDetails {
                image_url: Some("https://upload.wikimedia.org/laurier.jpg".to_string()),
                coordinates: Some("45.4256; -75.6950".to_string()),
                website: Some("http://www.fairmont.com/laurier".to_string()),
            }
        );
    }

    #[test]
    fn missing_infobox_yields_none() {
        let html = r#"<table class="wikitable"><tr><td>Not it</td></tr></table>"#;
        assert_eq!(parse_details(html, PAGE), None);
    }

    #[test]
    fn fields_are_extracted_independently() {
        let html = r#"
        <table class="infobox vcard">
          <tr><td><span class="geo-inline">somewhere north</span></td></tr>
          <tr><td><span class="url"><a href="/relative/site">site</a></span></td></tr>
        </table>
        "#;

        let details = parse_details(html, PAGE).expect("infobox present");
        assert_eq!(details.image_url, None);
        assert_eq!(details.coordinates, None);
        assert_eq!(details.website.as_deref(), Some("/relative/site"));
    }

    #[test]
    fn website_span_without_anchor_is_ignored() {
        let html = r#"<table class="infobox vcard"><tr><td><span class="url">none</span></td></tr></table>"#;
        let details = parse_details(html, PAGE).expect("infobox present");
        assert!(details.is_empty());
    }

    #[test]
    fn image_sources_are_made_absolute() {
        let html = r#"<table class="infobox vcard"><tr><td><img src="/static/logo.png"></td></tr></table>"#;
        let details = parse_details(html, PAGE).expect("infobox present");
        assert_eq!(
            details.image_url.as_deref(),
            Some("https://en.wikipedia.org/static/logo.png")
        );

        let html = r#"<table class="infobox vcard"><tr><td><img src="https://cdn.example.com/a.png"></td></tr></table>"#;
        let details = parse_details(html, PAGE).expect("infobox present");
        assert_eq!(details.image_url.as_deref(), Some("https://cdn.example.com/a.png"));
    }
}
