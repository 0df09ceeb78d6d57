//! Listing source client: turns a marketplace URL into raw listing fields.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::time::Duration;

static TITLE_AREA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)\s*м²").unwrap());
static TITLE_ROOMS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*-\s*к\.").unwrap());
static TITLE_FLOOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*/\s*(\d+)\s*эт\.").unwrap());

/// Raw fields scraped from a listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedListing {
    pub url: String,
    pub price: i64,
    pub room_area: f64,
    pub room_count: i32,
    pub floor: i32,
    pub floor_count: i32,
    pub address: String,
    pub description: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Listing source rate-limited the request")]
    RateLimited,
    #[error("Listing is closed")]
    ListingClosed,
    #[error("Failed to scrape listing: {0}")]
    Malformed(String),
    #[error("HTTP error: {0}")]
    Http(String),
}

#[async_trait]
pub trait ListingSourceClient: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ScrapedListing, SourceError>;
}

/// HTTP implementation scraping the marketplace's listing page.
pub struct AvitoSourceClient {
    client: reqwest::Client,
}

impl AvitoSourceClient {
    pub fn new(timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3",
            )
            .build()
            .map_err(|e| SourceError::Http(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ListingSourceClient for AvitoSourceClient {
    async fn fetch(&self, url: &str) -> Result<ScrapedListing, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        if response.status().as_u16() == 429 {
            tracing::warn!(url = %url, "listing source rate-limited the request");
            return Err(SourceError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(SourceError::Http(format!(
                "status {} while fetching {url}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        scrape_listing_page(url, &body)
    }
}

/// Extract the listing fields from the page HTML. Pure with respect to I/O
/// so the extraction rules can be tested against captured pages.
pub fn scrape_listing_page(url: &str, html: &str) -> Result<ScrapedListing, SourceError> {
    let document = Html::parse_document(html);

    let closed = Selector::parse(r#"a[data-marker="item-view/closed-warning"]"#).unwrap();
    if document.select(&closed).next().is_some() {
        return Err(SourceError::ListingClosed);
    }

    let title_sel = Selector::parse(r#"h1[itemprop="name"]"#).unwrap();
    let title = document
        .select(&title_sel)
        .next()
        .map(|el| el.text().collect::<String>())
        .ok_or_else(|| SourceError::Malformed("missing title".to_string()))?;

    let (room_area, room_count, floor, floor_count) = parse_listing_title(&title)?;

    let price_sel = Selector::parse(r#"span[itemprop="price"]"#).unwrap();
    let price_text = document
        .select(&price_sel)
        .next()
        .map(|el| el.text().collect::<String>())
        .ok_or_else(|| SourceError::Malformed("missing price".to_string()))?;
    let price: i64 = price_text
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .map_err(|_| SourceError::Malformed("unparseable price".to_string()))?;

    let address_sel = Selector::parse(r#"div[itemprop="address"] span"#).unwrap();
    let address = document
        .select(&address_sel)
        .next()
        .map(|el| el.text().collect::<String>())
        .ok_or_else(|| SourceError::Malformed("missing address".to_string()))?;

    let description_sel = Selector::parse(r#"div[itemprop="description"] p"#).unwrap();
    let description = document
        .select(&description_sel)
        .map(|el| el.text().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n");

    Ok(ScrapedListing {
        url: url.to_string(),
        price,
        room_area,
        room_count,
        floor,
        floor_count,
        address: address.trim().to_string(),
        description,
    })
}

/// Parse `"N-к. A м², F/T эт."` out of a listing title.
pub fn parse_listing_title(title: &str) -> Result<(f64, i32, i32, i32), SourceError> {
    let area = TITLE_AREA_RE
        .captures(title)
        .and_then(|c| c[1].replace(',', ".").parse::<f64>().ok())
        .ok_or_else(|| SourceError::Malformed(format!("no area in title: {title}")))?;

    let rooms = TITLE_ROOMS_RE
        .captures(title)
        .and_then(|c| c[1].parse::<i32>().ok())
        .ok_or_else(|| SourceError::Malformed(format!("no room count in title: {title}")))?;

    let (floor, floor_count) = TITLE_FLOOR_RE
        .captures(title)
        .and_then(|c| Some((c[1].parse::<i32>().ok()?, c[2].parse::<i32>().ok()?)))
        .ok_or_else(|| SourceError::Malformed(format!("no floors in title: {title}")))?;

    Ok((area, rooms, floor, floor_count))
}

/// In-process source client for tests: serves canned results per URL.
#[derive(Default)]
pub struct MockSourceClient {
    responses: parking_lot::Mutex<std::collections::HashMap<String, ScrapedListing>>,
    pub fail_with_rate_limit: std::sync::atomic::AtomicBool,
}

impl MockSourceClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: &str, listing: ScrapedListing) {
        self.responses.lock().insert(url.to_string(), listing);
    }
}

#[async_trait]
impl ListingSourceClient for MockSourceClient {
    async fn fetch(&self, url: &str) -> Result<ScrapedListing, SourceError> {
        if self
            .fail_with_rate_limit
            .load(std::sync::atomic::Ordering::SeqCst)
        {
            return Err(SourceError::RateLimited);
        }
        self.responses
            .lock()
            .get(url)
            .cloned()
            .ok_or(SourceError::Malformed("unknown url".to_string()))
    }
}
