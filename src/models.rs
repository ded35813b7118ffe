use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LinkError;

const MAX_ALIAS_LEN: usize = 64;
const DATE_LABEL_FORMAT: &str = "%d %b %Y, %H:%M";

/// A short link in canonical form, as produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortLink {
    pub id: String,
    pub slug: String,
    pub original_url: String,
    pub short_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clicks: Option<u64>,
}

impl ShortLink {
    pub fn created_label(&self) -> Option<String> {
        self.created_at.map(date_label)
    }

    pub fn expires_label(&self) -> Option<String> {
        self.expires_at.map(date_label)
    }
}

fn date_label(at: DateTime<Utc>) -> String {
    at.format(DATE_LABEL_FORMAT).to_string()
}

/// Validated input for creating (or updating) a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateLinkInput {
    pub url: String,
    pub alias: Option<String>,
}

impl CreateLinkInput {
    /// Trim and validate raw form values. An empty alias means "let the
    /// backend pick one".
    pub fn new(url: &str, alias: Option<&str>) -> Result<Self, LinkError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(LinkError::validation("URL must not be empty."));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(LinkError::validation(
                "URL must start with http:// or https://",
            ));
        }

        let alias = alias.map(str::trim).filter(|s| !s.is_empty());
        if let Some(alias) = alias {
            if alias.chars().count() > MAX_ALIAS_LEN {
                return Err(LinkError::validation(format!(
                    "Alias must be at most {MAX_ALIAS_LEN} characters."
                )));
            }
            if !alias
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                return Err(LinkError::validation(
                    "Alias may only contain latin letters, digits, hyphens, and underscores.",
                ));
            }
        }

        Ok(Self {
            url: url.to_owned(),
            alias: alias.map(str::to_owned),
        })
    }
}
