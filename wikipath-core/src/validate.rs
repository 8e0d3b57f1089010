use crate::error::SearchError;
use url::Url;

/// Which URLs a search may start from or aim at.
#[derive(Debug, Clone)]
pub struct UrlPolicy {
    allowed_domain: String,
}

impl UrlPolicy {
    /// Accept `domain` and its subdomains. An empty domain accepts any host.
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            allowed_domain: domain.into().trim_matches('.').to_lowercase(),
        }
    }

    pub fn allowed_domain(&self) -> &str {
        &self.allowed_domain
    }

    /// Validate `url` and return its canonical page key.
    pub fn check(&self, url: &str) -> Result<String, SearchError> {
        let invalid = |reason: String| SearchError::InvalidUrl {
            url: url.to_string(),
            reason,
        };

        let mut parsed = Url::parse(url.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| invalid("missing host".to_string()))?;
        if !self.is_allowed_host(host) {
            return Err(invalid(format!(
                "expected a {} url, but received host {}",
                self.allowed_domain, host
            )));
        }

        parsed.set_fragment(None);
        Ok(parsed.to_string())
    }

    fn is_allowed_host(&self, host: &str) -> bool {
        let domain = self.allowed_domain.as_str();
        domain.is_empty() || host == domain || host.ends_with(&format!(".{}", domain))
    }
}

impl Default for UrlPolicy {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_ALLOWED_DOMAIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_language_subdomains() {
        let policy = UrlPolicy::default();
        assert_eq!(
            policy.check("https://en.wikipedia.org/wiki/Rust").unwrap(),
            "https://en.wikipedia.org/wiki/Rust"
        );
        assert!(policy.check("https://de.wikipedia.org/wiki/Rost").is_ok());
        assert!(policy.check("https://wikipedia.org/").is_ok());
    }

    #[test]
    fn test_canonicalizes() {
        let policy = UrlPolicy::default();
        assert_eq!(
            policy.check("  https://EN.Wikipedia.org/wiki/Rust#History ").unwrap(),
            "https://en.wikipedia.org/wiki/Rust"
        );
    }

    #[test]
    fn test_rejects_foreign_hosts() {
        let policy = UrlPolicy::default();
        for url in [
            "https://example.com/wiki/Rust",
            "https://notwikipedia.org/wiki/Rust",
            "https://wikipedia.org.evil.com/wiki/Rust",
        ] {
            let err = policy.check(url).unwrap_err();
            assert_eq!(err.kind(), "invalid_input", "{} should be rejected", url);
        }
    }

    #[test]
    fn test_rejects_unparseable_and_odd_schemes() {
        let policy = UrlPolicy::default();
        assert!(policy.check("not a url").is_err());
        assert!(policy.check("ftp://en.wikipedia.org/wiki/Rust").is_err());
        assert!(policy.check("mailto:someone@wikipedia.org").is_err());
    }

    #[test]
    fn test_empty_domain_accepts_any_host() {
        let policy = UrlPolicy::new("");
        assert!(policy.check("http://localhost:8080/wiki/A").is_ok());
    }
}
