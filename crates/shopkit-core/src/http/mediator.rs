//! Response mediation: content decoding, pagination links and call limits
//!
//! Pure functions over [`Response`] values. None of them touch the network.

use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::Duration;

use http::header::{LINK, RETRY_AFTER};
use regex::Regex;
use serde_json::Value;

use crate::http::message::{Content, Response};
use crate::{Error, Result};

/// Header reporting API usage as `used/limit`
pub const API_CALL_LIMIT_HEADER: &str = "x-shopify-shop-api-call-limit";

/// Bucket size assumed when a rate-limited response carries no usage header
pub const DEFAULT_CALL_LIMIT: u32 = 40;

/// Cooldown assumed when a rate-limited response carries no `Retry-After`
pub const DEFAULT_RATE_LIMIT_RESET: Duration = Duration::from_secs(1);

const JSON_MEDIA_TYPE: &str = "application/json";

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)^<([^>]*)>\s*;\s*rel="([^"]*)"$"#).expect("Valid regex pattern")
    })
}

fn call_limit_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d+)/(\d+)$").expect("Valid regex pattern"))
}

/// Relation name to absolute URI, parsed from a `Link` header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    links: BTreeMap<String, String>,
}

impl Pagination {
    pub const NEXT: &'static str = "next";
    pub const PREVIOUS: &'static str = "prev";
    pub const FIRST: &'static str = "first";
    pub const LAST: &'static str = "last";

    pub fn get(&self, rel: &str) -> Option<&str> {
        self.links.get(rel).map(String::as_str)
    }

    pub fn has(&self, rel: &str) -> bool {
        self.links.contains_key(rel)
    }

    pub fn next(&self) -> Option<&str> {
        self.get(Self::NEXT)
    }

    pub fn previous(&self) -> Option<&str> {
        self.get(Self::PREVIOUS)
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.links.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Pagination {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            links: iter.into_iter().collect(),
        }
    }
}

/// Decodes responses into content and metadata
pub struct ResponseMediator;

impl ResponseMediator {
    /// JSON structure for JSON content types, raw text otherwise or when parsing fails
    pub fn get_content(response: &Response) -> Content {
        let body = response.text();
        if response.content_type().starts_with(JSON_MEDIA_TYPE) {
            if let Ok(value) = serde_json::from_str::<Value>(&body) {
                return Content::Json(value);
            }
            tracing::debug!(target: "shopkit::http", "JSON content type with unparsable body, returning raw text");
        }
        Content::Text(body)
    }

    /// Links from the `Link` header; `None` when the header is absent
    pub fn get_pagination(response: &Response) -> Option<Pagination> {
        let values: Vec<&str> = response
            .headers()
            .get_all(LINK)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if values.is_empty() {
            return None;
        }

        let header = values.join(",");
        Some(Self::parse_link_header(&header))
    }

    /// Parse a `Link` header value; malformed segments are skipped
    pub fn parse_link_header(header: &str) -> Pagination {
        header
            .split(',')
            .filter_map(|segment| {
                let captures = link_pattern().captures(segment.trim())?;
                Some((captures[2].to_string(), captures[1].to_string()))
            })
            .collect()
    }

    /// The call limit from the usage header
    ///
    /// `Ok(None)` when the header is absent or malformed, `Ok(Some(limit))`
    /// within bounds, `Err(RateLimitExceeded)` when usage exceeds the limit.
    pub fn get_api_limit(response: &Response) -> Result<Option<u32>> {
        let header = match response.header(API_CALL_LIMIT_HEADER) {
            Some(header) => header,
            None => return Ok(None),
        };

        let captures = match call_limit_pattern().captures(header.trim()) {
            Some(captures) => captures,
            None => return Ok(None),
        };

        let (used, limit) = match (captures[1].parse::<u32>(), captures[2].parse::<u32>()) {
            (Ok(used), Ok(limit)) => (used, limit),
            _ => return Ok(None),
        };

        if used > limit {
            return Err(Error::RateLimitExceeded {
                limit,
                reset: Self::get_reset_delay(response),
            });
        }

        Ok(Some(limit))
    }

    /// Recommended cooldown: `Retry-After` seconds, or the default
    pub fn get_reset_delay(response: &Response) -> Duration {
        response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<f64>().ok())
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_RESET)
    }

    /// The rate-limit failure describing a throttled response
    pub fn rate_limit_error(response: &Response) -> Error {
        match Self::get_api_limit(response) {
            Err(err) => err,
            Ok(limit) => Error::RateLimitExceeded {
                limit: limit.unwrap_or(DEFAULT_CALL_LIMIT),
                reset: Self::get_reset_delay(response),
            },
        }
    }
}
