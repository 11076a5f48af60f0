//! Site identifiers: the tenant key that selects a knowledge blob.
//!
//! A site is interpolated into file names (`knowledge_{site}.txt`) and URLs
//! (`https://{site}/knowledge.txt`), so only hostname-shaped values are
//! accepted.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

const MAX_SITE_LEN: usize = 253;

/// A normalized, validated site identifier (usually a domain name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SiteId(String);

impl SiteId {
    /// Normalize and validate a raw site value.
    ///
    /// Trims, lower-cases, and strips a leading `http://`/`https://` and
    /// trailing slashes. The remainder must be a hostname with an optional
    /// `:port`.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let lowered = raw.trim().to_lowercase();
        let without_scheme = lowered
            .strip_prefix("https://")
            .or_else(|| lowered.strip_prefix("http://"))
            .unwrap_or(&lowered);
        let site = without_scheme.trim_end_matches('/');

        if site.is_empty() || site.len() > MAX_SITE_LEN || site.contains("..") {
            return Err(ValidationError::InvalidSite(raw.to_string()));
        }

        let (host, port) = match site.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (site, None),
        };

        let host_ok = !host.is_empty()
            && !host.starts_with(['.', '-'])
            && host
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
        let port_ok = port.is_none_or(|p| !p.is_empty() && p.len() <= 5 && p.chars().all(|c| c.is_ascii_digit()));

        if !host_ok || !port_ok {
            return Err(ValidationError::InvalidSite(raw.to_string()));
        }

        Ok(Self(site.to_string()))
    }

    /// Parse an optional raw value; blank counts as "no site".
    pub fn parse_optional(raw: Option<&str>) -> Result<Option<Self>, ValidationError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => Self::parse(value).map(Some),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of this site's knowledge document: `knowledge_{site}.txt`.
    ///
    /// A `:port` suffix becomes `_port` so the name is portable.
    pub fn knowledge_file_name(&self) -> String {
        format!("knowledge_{}.txt", self.0.replace(':', "_"))
    }
}

impl std::fmt::Display for SiteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SiteId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SiteId> for String {
    fn from(site: SiteId) -> Self {
        site.0
    }
}
