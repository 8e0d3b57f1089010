use crate::error::{Result, ScanError};
use crate::filter::LinkFilter;
use crate::result::PageLinks;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

/// Fetches pages and extracts their outbound content links.
#[derive(Clone)]
pub struct Grabber {
    client: Client,
    filter: LinkFilter,
}

impl Grabber {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(10))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent("wikipath/0.1 (https://github.com/trapdoorsec/wikipath)")
            .timeout(timeout)
            .connect_timeout(timeout / 2)
            .pool_max_idle_per_host(50) // Connection pooling
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            filter: LinkFilter::default(),
        })
    }

    pub fn with_filter(mut self, filter: LinkFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn filter(&self) -> &LinkFilter {
        &self.filter
    }

    /// Fetch `url` and return the filtered links found on it, in document order.
    pub async fn fetch_links(&self, url: &str) -> Result<PageLinks> {
        let page = Url::parse(url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;
        debug!("Fetching {}", page);

        let start = Instant::now();
        let response = self.client.get(page.clone()).send().await?;
        let response_time = start.elapsed();

        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let is_html = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false);

        let body = response.text().await?;

        let mut result = PageLinks::new(url.to_string());
        result.status_code = status.as_u16();
        result.response_time = response_time;

        // Only parse HTML content
        if is_html {
            result.links = self.extract_links(&page, &body)?;
        }

        info!(
            "Grabbed {} ({} links in {:?})",
            url,
            result.links.len(),
            response_time
        );
        Ok(result)
    }

    /// Extract filtered, deduplicated links from an HTML document.
    pub fn extract_links(&self, page: &Url, html: &str) -> Result<Vec<String>> {
        let document = Html::parse_document(html);
        let link_selector = Selector::parse("a[href]")
            .map_err(|e| ScanError::Other(format!("Bad selector: {}", e)))?;

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for element in document.select(&link_selector) {
            if let Some(href) = element.value().attr("href")
                && let Some(link) = self.filter.accept(page, href)
                && seen.insert(link.clone())
            {
                links.push(link);
            }
        }

        Ok(links)
    }
}
