//! Encoded screenshot payloads.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use regex::Regex;
use std::sync::OnceLock;

use crate::error::{ForgeError, Result};

const DEFAULT_MIME: &str = "image/png";

/// A base64 image as uploaded by the browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    mime_type: String,
    data: String,
}

fn data_url_prefix() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| Regex::new(r"^data:(image/[a-z]+);base64,").unwrap())
}

impl ImagePayload {
    /// Parse a data URL (`data:image/webp;base64,...`) or bare base64 string
    ///
    /// The MIME type falls back to `image/png` when no data URL prefix is present.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ForgeError::InvalidImage("empty payload".to_string()));
        }

        let mime_type = data_url_prefix()
            .captures(raw)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| DEFAULT_MIME.to_string());

        let data = match raw.split(',').nth(1) {
            Some(encoded) if !encoded.is_empty() => encoded,
            _ => raw,
        };
        if data.starts_with("data:") {
            return Err(ForgeError::InvalidImage("data URL has no content".to_string()));
        }

        Ok(Self {
            mime_type,
            data: data.to_string(),
        })
    }

    /// Encode raw image bytes
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(ForgeError::InvalidImage("empty file".to_string()));
        }
        Ok(Self {
            mime_type: mime_type.into(),
            data: BASE64.encode(bytes),
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Base64 content without the data URL prefix
    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_data_url() {
        let image = ImagePayload::parse("data:image/jpeg;base64,/9j/4AAQ").unwrap();
        assert_eq!(image.mime_type(), "image/jpeg");
        assert_eq!(image.data(), "/9j/4AAQ");
    }

    #[test]
    fn test_parse_bare_base64_defaults_to_png() {
        let image = ImagePayload::parse("iVBORw0KGgo").unwrap();
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!(image.data(), "iVBORw0KGgo");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(matches!(
            ImagePayload::parse("   "),
            Err(ForgeError::InvalidImage(_))
        ));
        assert!(ImagePayload::parse("data:image/png;base64,").is_err());
    }

    #[test]
    fn test_from_bytes_builds_data_url() {
        let image = ImagePayload::from_bytes(b"png", "image/png").unwrap();
        assert_eq!(image.to_data_url(), "data:image/png;base64,cG5n");
    }
}
