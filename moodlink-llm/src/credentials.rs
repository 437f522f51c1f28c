//! Service credentials loaded from a small JSON file.
//!
//! ```json
//! { "apiKey": "sk-...", "baseUrl": "https://api.example.com/v1" }
//! ```
//!
//! `api_key` / `OPENAI_API_KEY` and `base_url` are accepted as well.

use std::fmt;
use std::path::Path;

use reqwest::Url;
use serde::Deserialize;

use crate::error::{LlmError, Result};

#[derive(Deserialize)]
struct RawCredentials {
    #[serde(default, alias = "apiKey", alias = "OPENAI_API_KEY")]
    api_key: Option<String>,
    #[serde(default, alias = "baseUrl")]
    base_url: Option<String>,
}

/// API key and base URL of an OpenAI-compatible endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    base_url: String,
}

impl Credentials {
    /// Validate and build credentials.
    ///
    /// The base URL must be an absolute http(s) URL. A trailing slash is dropped.
    ///
    /// # Errors
    /// Returns [`LlmError::Credentials`] if either field is blank or the URL is unusable.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into().trim().to_string();
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();

        if api_key.is_empty() {
            return Err(LlmError::Credentials("api key is empty".into()));
        }
        if base_url.is_empty() {
            return Err(LlmError::Credentials("base url is empty".into()));
        }
        let parsed = Url::parse(&base_url)
            .map_err(|e| LlmError::Credentials(format!("base url '{base_url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(LlmError::Credentials(format!(
                "base url '{base_url}' must use http or https"
            )));
        }

        Ok(Self { api_key, base_url })
    }

    /// Parse credentials from JSON text.
    ///
    /// # Errors
    /// Returns [`LlmError::Credentials`] for malformed JSON or missing fields.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawCredentials = serde_json::from_str(json)
            .map_err(|e| LlmError::Credentials(format!("invalid JSON: {e}")))?;
        match (raw.api_key, raw.base_url) {
            (Some(key), Some(url)) => Self::new(key, url),
            _ => Err(LlmError::Credentials("missing 'apiKey' or 'baseUrl'".into())),
        }
    }

    /// Load credentials from a JSON file.
    ///
    /// # Errors
    /// Returns [`LlmError::Credentials`] if the file is missing or invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LlmError::Credentials(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// The bearer token.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Endpoint root without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_camel_and_snake_case_keys() {
        let camel = Credentials::from_json(r#"{"apiKey":"k","baseUrl":"https://h.example/v1/"}"#)
            .expect("camel");
        assert_eq!(camel.base_url(), "https://h.example/v1");

        let snake = Credentials::from_json(r#"{"OPENAI_API_KEY":"k","base_url":"http://localhost:8080"}"#)
            .expect("snake");
        assert_eq!(snake.api_key(), "k");
    }

    #[test]
    fn missing_field_is_credentials_error() {
        let err = Credentials::from_json(r#"{"apiKey":"k"}"#).expect_err("no url");
        assert!(matches!(err, LlmError::Credentials(_)));
    }

    #[test]
    fn blank_key_is_rejected() {
        assert!(Credentials::new("   ", "https://h.example").is_err());
    }

    #[test]
    fn non_http_url_is_rejected() {
        assert!(Credentials::new("k", "ftp://h.example").is_err());
        assert!(Credentials::new("k", "not a url").is_err());
    }

    #[test]
    fn malformed_json_is_credentials_error() {
        assert!(matches!(
            Credentials::from_json("{apiKey: nope"),
            Err(LlmError::Credentials(_))
        ));
    }

    #[test]
    fn missing_file_is_credentials_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Credentials::load(&dir.path().join("navigator_api_key.json")).expect_err("missing");
        assert!(matches!(err, LlmError::Credentials(msg) if msg.contains("navigator_api_key.json")));
    }

    #[test]
    fn debug_hides_the_key() {
        let creds = Credentials::new("secret-key", "https://h.example").expect("valid");
        assert!(!format!("{creds:?}").contains("secret-key"));
    }
}
