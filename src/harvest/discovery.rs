//! Hotel discovery on the paginated results view.
//!
//! Each pagination step scrolls to force lazy items to render, snapshots the
//! DOM once, and parses it off-page; per-element browser round-trips are
//! avoided. Termination is purely pagination-control-driven — the loop stops
//! the first time the "Next" control is absent or fails to advance.

use crate::browser::{click_by_text, PageDriver};
use crate::error::Result;
use crate::events::{EventBus, HarvestEvent};
use crate::harvest::navigator::BASE_URL;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::info;

const SCROLL_STEPS: usize = 3;
const SCROLL_DELTA: i64 = 1_000;
const SCROLL_SETTLE_MS: u64 = 1_000;
const PAGINATE_SETTLE_MS: u64 = 3_000;

const HOTEL_ITEM: &str = "li[data-hotelid]";
const HOTEL_LINK: &str = "a[href*='/hotel/']";

/// One discovered hotel. `name` and `rating` are filled later, on the
/// hotel's own page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotelRecord {
    pub id: String,
    pub name: String,
    pub url: String,
    pub rating: String,
}

impl HotelRecord {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            url: url.into(),
            rating: String::new(),
        }
    }
}

/// Extract (hotel id, absolute detail URL) pairs from a results snapshot.
pub fn parse_hotel_snapshot(html: &str) -> Vec<(String, String)> {
    let doc = Html::parse_document(html);
    let (Ok(item_sel), Ok(link_sel)) = (Selector::parse(HOTEL_ITEM), Selector::parse(HOTEL_LINK))
    else {
        return Vec::new();
    };

    let mut pairs = Vec::new();
    for item in doc.select(&item_sel) {
        let Some(id) = item.value().attr("data-hotelid") else {
            continue;
        };
        let Some(href) = item
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            continue;
        };
        let url = if href.starts_with("http") {
            href.to_string()
        } else {
            format!("{BASE_URL}{href}")
        };
        pairs.push((id.to_string(), url));
    }
    pairs
}

/// Append pairs not yet seen (by URL), preserving first-seen order.
/// Returns how many were new.
pub fn merge_new(
    hotels: &mut Vec<HotelRecord>,
    seen: &mut HashSet<String>,
    pairs: Vec<(String, String)>,
) -> usize {
    let mut added = 0;
    for (id, url) in pairs {
        if seen.insert(url.clone()) {
            hotels.push(HotelRecord::new(id, url));
            added += 1;
        }
    }
    added
}

/// Walk the paginated results view and return hotels in discovery order.
pub async fn discover(page: &dyn PageDriver, events: &EventBus) -> Result<Vec<HotelRecord>> {
    let mut hotels = Vec::new();
    let mut seen = HashSet::new();
    let mut page_num = 1;

    loop {
        for _ in 0..SCROLL_STEPS {
            page.scroll_by(0, SCROLL_DELTA).await?;
            page.settle(SCROLL_SETTLE_MS).await;
        }

        let html = page.html().await?;
        let added = merge_new(&mut hotels, &mut seen, parse_hotel_snapshot(&html));
        info!(page = page_num, added, total = hotels.len(), "results page scanned");
        events.emit(HarvestEvent::DiscoveryPage {
            page: page_num,
            new: added,
            total: hotels.len(),
        });

        match click_by_text(page, "button, span", "Next").await {
            Ok(true) => {
                page.settle(PAGINATE_SETTLE_MS).await;
                page_num += 1;
            }
            _ => break,
        }
    }

    Ok(hotels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(entries: &[(&str, &str)]) -> String {
        let items: String = entries
            .iter()
            .map(|(id, href)| {
                format!("<li data-hotelid=\"{id}\"><a href=\"{href}\">hotel</a></li>")
            })
            .collect();
        format!("<html><body><ul>{items}</ul></body></html>")
    }

    #[test]
    fn test_parse_snapshot_absolutizes_relative_links() {
        let html = snapshot(&[("11", "/hotel/one.html"), ("22", "https://www.agoda.com/hotel/two.html")]);
        let pairs = parse_hotel_snapshot(&html);
        assert_eq!(
            pairs,
            vec![
                ("11".to_string(), "https://www.agoda.com/hotel/one.html".to_string()),
                ("22".to_string(), "https://www.agoda.com/hotel/two.html".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_snapshot_skips_items_without_detail_link() {
        let html = "<li data-hotelid=\"1\"><a href=\"/activities/x\">x</a></li>\
                    <li data-hotelid=\"2\"><a href=\"/hotel/y.html\">y</a></li>";
        let pairs = parse_hotel_snapshot(html);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, "2");
    }

    #[test]
    fn test_merge_dedupes_by_link_keeping_first_position() {
        let mut hotels = Vec::new();
        let mut seen = HashSet::new();

        let page1 = parse_hotel_snapshot(&snapshot(&[
            ("1", "/hotel/a.html"),
            ("2", "/hotel/b.html"),
        ]));
        assert_eq!(merge_new(&mut hotels, &mut seen, page1), 2);

        // Second results page repeats hotel b and adds c
        let page2 = parse_hotel_snapshot(&snapshot(&[
            ("2", "/hotel/b.html"),
            ("3", "/hotel/c.html"),
        ]));
        assert_eq!(merge_new(&mut hotels, &mut seen, page2), 1);

        let urls: Vec<&str> = hotels.iter().map(|h| h.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.agoda.com/hotel/a.html",
                "https://www.agoda.com/hotel/b.html",
                "https://www.agoda.com/hotel/c.html",
            ]
        );
    }
}
