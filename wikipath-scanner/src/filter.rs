use url::Url;

/// Namespaces that never hold article content.
pub const DEFAULT_EXCLUDED_NAMESPACES: &[&str] = &[
    "File:",
    "Talk:",
    "Category:",
    "Special:",
    "Wikipedia:",
    "Help:",
    "Portal:",
];

/// Decides which hrefs on a page count as outbound content links.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    path_prefix: String,
    excluded_namespaces: Vec<String>,
}

impl LinkFilter {
    pub fn new(path_prefix: impl Into<String>) -> Self {
        Self {
            path_prefix: path_prefix.into(),
            excluded_namespaces: Vec::new(),
        }
    }

    pub fn with_excluded_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.excluded_namespaces.push(namespace.into());
        self
    }

    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    /// Resolve `href` against the page it was found on and return the canonical
    /// link if it points at a content page on the same host.
    pub fn accept(&self, page: &Url, href: &str) -> Option<String> {
        // Skip empty, javascript:, mailto:, tel:, etc.
        if href.is_empty()
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
            || href.starts_with('#')
        {
            return None;
        }

        let mut resolved = page.join(href).ok()?;
        if resolved.host_str() != page.host_str() || resolved.query().is_some() {
            return None;
        }

        let title = resolved.path().strip_prefix(self.path_prefix.as_str())?;
        if title.is_empty() || self.is_excluded(title) {
            return None;
        }

        resolved.set_fragment(None);
        Some(resolved.to_string())
    }

    fn is_excluded(&self, title: &str) -> bool {
        self.excluded_namespaces
            .iter()
            .any(|namespace| title.starts_with(namespace.as_str()))
    }
}

impl Default for LinkFilter {
    fn default() -> Self {
        DEFAULT_EXCLUDED_NAMESPACES
            .iter()
            .fold(Self::new("/wiki/"), |filter, namespace| {
                filter.with_excluded_namespace(*namespace)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://en.wikipedia.org/wiki/Rust_(programming_language)").unwrap()
    }

    #[test]
    fn test_accepts_relative_article_link() {
        let filter = LinkFilter::default();
        assert_eq!(
            filter.accept(&page(), "/wiki/Mozilla"),
            Some("https://en.wikipedia.org/wiki/Mozilla".to_string())
        );
    }

    #[test]
    fn test_strips_fragment() {
        let filter = LinkFilter::default();
        assert_eq!(
            filter.accept(&page(), "/wiki/Mozilla#History"),
            Some("https://en.wikipedia.org/wiki/Mozilla".to_string())
        );
    }

    #[test]
    fn test_rejects_excluded_namespaces() {
        let filter = LinkFilter::default();
        for href in [
            "/wiki/File:Rust_logo.svg",
            "/wiki/Talk:Rust",
            "/wiki/Category:Programming_languages",
            "/wiki/Special:Random",
            "/wiki/Wikipedia:About",
            "/wiki/Help:Contents",
            "/wiki/Portal:Technology",
        ] {
            assert_eq!(filter.accept(&page(), href), None, "{} should be rejected", href);
        }
    }

    #[test]
    fn test_rejects_other_hosts_and_paths() {
        let filter = LinkFilter::default();
        assert_eq!(filter.accept(&page(), "https://example.com/wiki/Mozilla"), None);
        assert_eq!(filter.accept(&page(), "/w/index.php?title=Rust&action=edit"), None);
        assert_eq!(filter.accept(&page(), "#cite_note-1"), None);
        assert_eq!(filter.accept(&page(), "mailto:someone@example.com"), None);
        assert_eq!(filter.accept(&page(), "/wiki/"), None);
    }

    #[test]
    fn test_custom_prefix() {
        let filter = LinkFilter::new("/docs/").with_excluded_namespace("internal-");
        let page = Url::parse("http://localhost:8080/docs/index").unwrap();
        assert_eq!(
            filter.accept(&page, "guide"),
            Some("http://localhost:8080/docs/guide".to_string())
        );
        assert_eq!(filter.accept(&page, "/docs/internal-notes"), None);
    }
}
