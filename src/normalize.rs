//! Mapping of arbitrary backend JSON into [`ShortLink`] records.
//!
//! Backends disagree on field names, so every canonical attribute is
//! resolved from an ordered list of synonyms: the first key holding a value
//! of the right type wins. Records without both a slug and a destination
//! URL are dropped, never surfaced half-filled.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::models::ShortLink;

const SLUG_KEYS: &[&str] = &[
    "slug",
    "shortCode",
    "code",
    "short_code",
    "hash",
    "alias",
    "shortId",
    "short_id",
    "key",
    "id",
];

const ORIGINAL_URL_KEYS: &[&str] = &[
    "originalUrl",
    "original_url",
    "original",
    "destination",
    "target",
    "targetUrl",
    "url",
    "longUrl",
    "long_url",
];

const ID_KEYS: &[&str] = &["id", "uuid", "key", "slug", "shortId", "short_id"];

const SHORT_URL_KEYS: &[&str] = &[
    "shortUrl",
    "shortURL",
    "short_url",
    "shortLink",
    "short_link",
    "short",
    "shortened",
];

const HOST_KEYS: &[&str] = &["domain", "host", "baseUrl"];

const CLICK_KEYS: &[&str] = &["clicks", "visits", "usageCount", "count"];

const CREATED_KEYS: &[&str] = &[
    "createdAt",
    "created_at",
    "created",
    "createdDate",
    "createdTime",
];

const EXPIRES_KEYS: &[&str] = &["expiresAt", "expires_at", "expiry", "expireAt"];

const COLLECTION_KEYS: &[&str] = &["items", "urls", "links", "data", "results", "list"];

/// Turns raw payloads into canonical links using the configured display bases.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    short_base_url: Option<String>,
    page_origin: Option<String>,
}

impl Normalizer {
    pub fn new(short_base_url: Option<String>, page_origin: Option<String>) -> Self {
        Self {
            short_base_url,
            page_origin,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.short_base_url.clone(), config.page_origin.clone())
    }

    /// Normalize a single record. Returns `None` for anything that is not an
    /// object carrying both a slug and an original URL.
    pub fn link(&self, raw: &Value) -> Option<ShortLink> {
        let record = raw.as_object()?;

        let slug = pick_string(record, SLUG_KEYS)?;
        let original_url = pick_string(record, ORIGINAL_URL_KEYS)?;
        let id = pick_string(record, ID_KEYS).unwrap_or(slug);

        Some(ShortLink {
            id: id.to_owned(),
            slug: slug.to_owned(),
            original_url: original_url.to_owned(),
            short_url: self.short_url(record, slug),
            created_at: pick_date(record, CREATED_KEYS),
            expires_at: pick_date(record, EXPIRES_KEYS),
            clicks: pick_count(record, CLICK_KEYS),
        })
    }

    /// Normalize a list payload: a bare array, or an object wrapping one
    /// under a well-known container key. Invalid elements are dropped.
    pub fn links(&self, raw: &Value) -> Vec<ShortLink> {
        collection(raw)
            .iter()
            .filter_map(|item| self.link(item))
            .collect()
    }

    /// Recover the slug from a short URL built on the configured short base.
    pub fn slug_of<'a>(&self, short_url: &'a str) -> Option<&'a str> {
        let base = self.short_base_url.as_deref()?;
        short_url
            .strip_prefix(base)?
            .strip_prefix('/')
            .filter(|slug| !slug.is_empty())
    }

    fn short_url(&self, record: &Map<String, Value>, slug: &str) -> String {
        if let Some(direct) = pick_string(record, SHORT_URL_KEYS) {
            return direct.to_owned();
        }
        if let Some(base) = &self.short_base_url {
            return format!("{base}/{slug}");
        }
        if let Some(host) = pick_string(record, HOST_KEYS) {
            return format!("{}/{slug}", host.trim_end_matches('/'));
        }
        if let Some(origin) = &self.page_origin {
            return format!("{origin}/{slug}");
        }
        slug.to_owned()
    }
}

fn collection(raw: &Value) -> &[Value] {
    match raw {
        Value::Array(items) => items,
        Value::Object(container) => COLLECTION_KEYS
            .iter()
            .find_map(|key| container.get(*key).and_then(Value::as_array))
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    }
}

fn pick_string<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| {
        record
            .get(*key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    })
}

fn pick_count(record: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    keys.iter()
        .find_map(|key| record.get(*key).and_then(as_count))
}

fn as_count(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let n = value.as_f64()?;
    (n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n <= u64::MAX as f64).then_some(n as u64)
}

fn pick_date(record: &Map<String, Value>, keys: &[&str]) -> Option<DateTime<Utc>> {
    let raw = keys.iter().find_map(|key| match record.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })?;
    parse_date(&raw)
}

/// Parse either an epoch-milliseconds number or a date string in any of
/// the common textual forms. Anything else is absent, never an invalid date.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(millis) = input.parse::<f64>() {
        if !millis.is_finite() || millis <= 0.0 {
            return None;
        }
        return DateTime::from_timestamp_millis(millis as i64);
    }

    if let Ok(at) = DateTime::parse_from_rfc3339(input) {
        return Some(at.with_timezone(&Utc));
    }
    if let Ok(at) = DateTime::parse_from_rfc2822(input) {
        return Some(at.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
