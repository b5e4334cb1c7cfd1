//! Allowed-URL gate for remote model downloads
//!
//! Every download path must call [`UrlAllowlist::is_url_allowed`] before
//! fetching. The gate is open only when `allowed_urls` still holds the
//! built-in default; a value that fails to parse closes the gate entirely.

use tracing::warn;
use url::Url;

/// Built-in `allowed_urls` value: any file, http or https URL
pub const DEFAULT_ALLOWED_URLS: &str = "file://.*|http(s)?://.*";

/// Operator warning for the open gate
pub const OPEN_GATE_WARNING: &str = "This tserve instance can access any URL to load models. \
     When deploying to production, limit the set of allowed URLs with `allowed_urls` in config.properties";

/// A single allowlist entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlPattern {
    /// `*` on its own
    Any,
    /// Entry ending in `*`; matches normalised URLs starting with the rest
    Prefix(String),
    /// Normalised URL compared for equality
    Exact(String),
}

impl UrlPattern {
    fn parse(entry: &str) -> Result<Self, String> {
        if entry.is_empty() {
            return Err("empty entry".to_string());
        }
        if entry == "*" {
            return Ok(Self::Any);
        }
        if let Some(prefix) = entry.strip_suffix('*') {
            if prefix.contains('*') {
                return Err(format!("`{entry}`: `*` is only allowed at the end"));
            }
            // Normalise when the prefix is a URL on its own so it lines up
            // with the normalised form of the URLs it is compared against.
            let prefix = Url::parse(prefix).map_or_else(|_| prefix.to_string(), String::from);
            return Ok(Self::Prefix(prefix));
        }
        if entry.contains('*') {
            return Err(format!("`{entry}`: `*` is only allowed at the end"));
        }
        let url = Url::parse(entry).map_err(|e| format!("`{entry}`: {e}"))?;
        Ok(Self::Exact(url.to_string()))
    }

    /// `url` must already be normalised
    fn matches(&self, url: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Prefix(prefix) => url.starts_with(prefix.as_str()),
            Self::Exact(expected) => url == expected,
        }
    }
}

/// Parsed `allowed_urls` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlAllowlist {
    raw: String,
    patterns: Vec<UrlPattern>,
    default_open: bool,
    parse_error: Option<String>,
}

impl UrlAllowlist {
    /// The unconfigured, open gate
    pub fn open_default() -> Self {
        Self {
            raw: DEFAULT_ALLOWED_URLS.to_string(),
            patterns: Vec::new(),
            default_open: true,
            parse_error: None,
        }
    }

    /// Parse an `allowed_urls` value; `None` means unset
    pub fn parse(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Self::open_default();
        };
        if value.trim() == DEFAULT_ALLOWED_URLS {
            return Self::open_default();
        }

        let mut patterns = Vec::new();
        for entry in value.split(',') {
            match UrlPattern::parse(entry.trim()) {
                Ok(pattern) => patterns.push(pattern),
                Err(reason) => {
                    warn!(
                        "Invalid allowed_urls entry {}; no model URLs will be allowed",
                        reason
                    );
                    return Self {
                        raw: value.to_string(),
                        patterns: Vec::new(),
                        default_open: false,
                        parse_error: Some(reason),
                    };
                }
            }
        }

        Self {
            raw: value.to_string(),
            patterns,
            default_open: false,
            parse_error: None,
        }
    }

    /// True when the gate is the unconfigured default that allows everything
    pub fn is_default_open(&self) -> bool {
        self.default_open
    }

    /// Warning text the caller should log while the gate is open
    pub fn security_warning(&self) -> Option<&'static str> {
        self.default_open.then_some(OPEN_GATE_WARNING)
    }

    pub fn parse_error(&self) -> Option<&str> {
        self.parse_error.as_deref()
    }

    pub fn patterns(&self) -> &[UrlPattern] {
        &self.patterns
    }

    /// Configured entries as written, one per pattern
    pub fn allowed_urls(&self) -> Vec<String> {
        if self.default_open {
            return vec![DEFAULT_ALLOWED_URLS.to_string()];
        }
        if self.parse_error.is_some() {
            return Vec::new();
        }
        self.raw.split(',').map(|e| e.trim().to_string()).collect()
    }

    pub fn is_url_allowed(&self, url: &str) -> bool {
        if self.default_open {
            return true;
        }
        // Dot segments (plain or percent-encoded) are resolved before any
        // pattern sees the URL; anything unparseable is refused.
        let Ok(normalised) = Url::parse(url.trim()).map(String::from) else {
            return false;
        };
        self.patterns
            .iter()
            .any(|pattern| pattern.matches(&normalised))
    }
}

impl Default for UrlAllowlist {
    fn default() -> Self {
        Self::open_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_is_open() {
        let gate = UrlAllowlist::parse(None);
        assert!(gate.is_default_open());
        assert!(gate.security_warning().is_some());
        assert_eq!(gate.allowed_urls(), vec![DEFAULT_ALLOWED_URLS.to_string()]);
        assert!(gate.is_url_allowed("https://anything.example"));
        assert!(gate.is_url_allowed("not even a url"));
    }

    #[test]
    fn test_explicit_default_is_open() {
        let gate = UrlAllowlist::parse(Some(DEFAULT_ALLOWED_URLS));
        assert!(gate.is_default_open());
    }

    #[test]
    fn test_explicit_list() {
        let gate = UrlAllowlist::parse(Some("https://a.example,https://b.example"));
        assert!(!gate.is_default_open());
        assert!(gate.security_warning().is_none());
        assert!(gate.is_url_allowed("https://a.example"));
        assert!(gate.is_url_allowed("https://b.example/"));
        assert!(!gate.is_url_allowed("https://c.example"));
        assert!(!gate.is_url_allowed("https://a.example/model.mar"));
        assert_eq!(
            gate.allowed_urls(),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn test_prefix_patterns() {
        let gate = UrlAllowlist::parse(Some(" https://models.example/* , s3://bucket/* "));
        assert!(gate.is_url_allowed("https://models.example/resnet.mar"));
        assert!(gate.is_url_allowed("s3://bucket/a/b.mar"));
        assert!(!gate.is_url_allowed("https://models.example.evil.test/x.mar"));
    }

    #[test]
    fn test_prefix_rejects_dot_segment_escapes() {
        let gate = UrlAllowlist::parse(Some("file:///srv/models/*"));
        assert!(gate.is_url_allowed("file:///srv/models/noop.mar"));
        assert!(gate.is_url_allowed("file:///srv/models/a/../b.mar"));
        assert!(!gate.is_url_allowed("file:///srv/models/../../etc/passwd"));

        let gate = UrlAllowlist::parse(Some("https://models.example/team/*"));
        assert!(gate.is_url_allowed("https://MODELS.example/team/x.mar"));
        assert!(!gate.is_url_allowed("https://models.example/team/%2e%2e/other/x.mar"));
        assert!(!gate.is_url_allowed("https://models.example/team/%2E%2E/other/x.mar"));
        assert!(!gate.is_url_allowed("https://models.example/team/../other/x.mar"));
    }

    #[test]
    fn test_unparseable_url_refused_when_closed() {
        let gate = UrlAllowlist::parse(Some("*"));
        assert!(!gate.is_url_allowed("not even a url"));
        assert!(!gate.is_url_allowed("/srv/models/noop.mar"));
    }

    #[test]
    fn test_star_entry_matches_everything_but_is_not_default() {
        let gate = UrlAllowlist::parse(Some("*"));
        assert!(!gate.is_default_open());
        assert!(gate.is_url_allowed("https://anything.example"));
    }

    #[test]
    fn test_parse_error_fails_closed() {
        for bad in ["https://a.example,,https://b.example", "https://*.example", "not a url", ""] {
            let gate = UrlAllowlist::parse(Some(bad));
            assert!(!gate.is_default_open(), "{bad}");
            assert!(gate.parse_error().is_some(), "{bad}");
            assert!(gate.allowed_urls().is_empty(), "{bad}");
            assert!(!gate.is_url_allowed("https://a.example"), "{bad}");
        }
    }
}
