use std::sync::OnceLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::{visible_text, HotelStub};

const SECTION_SELECTOR: &str = "div.div-col";
const REGION_HEADING: &str = "h2";

struct ListingSelectors {
    section: Selector,
    item: Selector,
    anchor: Selector,
}

fn selectors() -> &'static ListingSelectors {
    static SELECTORS: OnceLock<ListingSelectors> = OnceLock::new();
    SELECTORS.get_or_init(|| ListingSelectors {
        section: Selector::parse(SECTION_SELECTOR).expect("valid section selector"),
        item: Selector::parse("li").expect("valid item selector"),
        anchor: Selector::parse("a").expect("valid anchor selector"),
    })
}

/// Extracts hotel stubs from a listing page.
///
/// Every `li` inside a `div.div-col` column list yields one stub. The item's
/// first anchor supplies the name and link; the next anchor in document order
/// supplies the locality and the closest `h2` before the item supplies the
/// region. Missing locality or region anchors become empty strings, while items
/// without a usable name or link are skipped.
///
/// # Example
///
/// ```
/// use hotel_parser::parse_listing;
///
/// let html = r#"
///   <h2>Ontario</h2>
///   <div class="div-col"><ul>
///     <li><a href="/wiki/Royal_York">Royal York</a>, <a href="/wiki/Toronto">Toronto</a></li>
///   </ul></div>"#;
/// let stubs = parse_listing(html, "https://en.wikipedia.org");
/// assert_eq!(stubs[0].detail_link, "https://en.wikipedia.org/wiki/Royal_York");
/// assert_eq!(stubs[0].locality, "Toronto");
/// assert_eq!(stubs[0].region, "Ontario");
/// ```
pub fn parse_listing(html: &str, origin: &str) -> Vec<HotelStub> {
    let document = Html::parse_document(html);
    let order = DocumentOrder::new(&document);
    let selectors = selectors();

    let mut stubs = Vec::new();
    for section in document.select(&selectors.section) {
        for item in section.select(&selectors.item) {
            let Some(anchor) = item.select(&selectors.anchor).next() else {
                continue;
            };
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let name = visible_text(&anchor);
            if name.is_empty() || href.trim().is_empty() {
                continue;
            }

            let locality = order
                .next_named(&anchor, "a")
                .map(|next| visible_text(&next))
                .unwrap_or_default();
            let region = order
                .previous_named(&item, REGION_HEADING)
                .map(|heading| visible_text(&heading))
                .unwrap_or_default();

            stubs.push(HotelStub {
                name,
                detail_link: absolute_link(origin, href.trim()),
                locality,
                region,
            });
        }
    }
    stubs
}

/// Joins a listing href onto the site origin.
fn absolute_link(origin: &str, href: &str) -> String {
    if href.starts_with('/') && !href.starts_with("//") {
        return format!("{}{}", origin.trim_end_matches('/'), href);
    }
    Url::parse(origin)
        .and_then(|base| base.join(href))
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}

/// Flattened pre-order view of every element, used for "next"/"previous" lookups.
struct DocumentOrder<'a> {
    elements: Vec<ElementRef<'a>>,
}

impl<'a> DocumentOrder<'a> {
    fn new(document: &'a Html) -> Self {
        let elements = document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .collect();
        Self { elements }
    }

    fn position(&self, element: &ElementRef<'a>) -> Option<usize> {
        self.elements.iter().position(|candidate| candidate == element)
    }

    fn next_named(&self, from: &ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
        let start = self.position(from)?;
        self.elements[start + 1..]
            .iter()
            .find(|element| element.value().name() == tag)
            .copied()
    }

    fn previous_named(&self, from: &ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
        let end = self.position(from)?;
        self.elements[..end]
            .iter()
            .rev()
            .find(|element| element.value().name() == tag)
            .copied()
    }
}
