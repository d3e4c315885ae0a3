use curedoc_types::{DEFAULT_BASE_URL, HISTORY_STORAGE_KEY};
use serde::{Deserialize, Serialize};

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_storage_key() -> String {
    HISTORY_STORAGE_KEY.to_string()
}

/// Where the CureBot service lives and where history is kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            storage_key: default_storage_key(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            ..Self::default()
        }
    }

    /// Absolute URL of an endpoint path such as `ask` or `/upload`
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// URL the PDF report of a session is served from
    pub fn pdf_url(&self, session_id: &str) -> String {
        self.endpoint(&format!("download/pdf/{}", session_id))
    }

    /// Resolve a link returned by the server, which may be relative
    pub fn resolve_link(&self, link: &str) -> String {
        if link.starts_with("http://") || link.starts_with("https://") {
            link.to_string()
        } else {
            self.endpoint(link)
        }
    }
}

/// Trim whitespace and trailing slashes; fall back to the default when empty
pub fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_BASE_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = ClientConfig::new("http://example.test:5009/");
        assert_eq!(config.endpoint("/ask"), "http://example.test:5009/ask");
        assert_eq!(config.endpoint("upload"), "http://example.test:5009/upload");
    }

    #[test]
    fn test_pdf_link_resolution() {
        let config = ClientConfig::default();
        assert_eq!(
            config.resolve_link("/download/pdf/abc"),
            "http://localhost:5009/download/pdf/abc"
        );
        assert_eq!(
            config.resolve_link("https://reports.test/abc.pdf"),
            "https://reports.test/abc.pdf"
        );
        assert_eq!(config.pdf_url("abc"), "http://localhost:5009/download/pdf/abc");
    }

    #[test]
    fn test_blank_base_url_uses_default() {
        assert_eq!(normalize_base_url("  "), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: ClientConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ClientConfig::default());
    }
}
