use anyhow::{Context, Result};
use std::time::Duration;

const DEFAULT_LIST_ROUTES: &[&str] = &[
    "/api/v1/urls",
    "/api/v1/short-urls",
    "/api/v1/links",
    "/api/urls",
    "/api/links",
    "/urls",
    "/links",
];

const DEFAULT_CREATE_ROUTES: &[&str] = &[
    "/api/v1/urls",
    "/api/v1/links",
    "/api/urls",
    "/api/links",
    "/urls",
    "/links",
    "/shorten",
];

const DEFAULT_ITEM_ROUTES: &[&str] = &[
    "/api/v1/urls/{id}",
    "/api/v1/links/{id}",
    "/api/urls/{id}",
    "/api/links/{id}",
    "/urls/{id}",
    "/links/{id}",
    "/url/{id}",
];

const DEFAULT_BODY_SHAPES: &[(&str, &str)] = &[
    ("originalUrl", "alias"),
    ("url", "alias"),
    ("target", "alias"),
    ("longUrl", "alias"),
    ("original_url", "alias"),
    ("url", "customAlias"),
    ("url", "shortCode"),
];

/// Placeholder substituted with the (escaped) link id in item routes.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Field names used for one create/update request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyShape {
    pub url_key: String,
    pub alias_key: String,
}

impl BodyShape {
    pub fn new(url_key: impl Into<String>, alias_key: impl Into<String>) -> Self {
        Self {
            url_key: url_key.into(),
            alias_key: alias_key.into(),
        }
    }
}

/// Ordered candidate routes per operation. Order is a prior: the most
/// likely route comes first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteCatalog {
    pub list: Vec<String>,
    pub create: Vec<String>,
    /// Item templates used for delete and update; each contains `{id}`.
    pub item: Vec<String>,
    pub body_shapes: Vec<BodyShape>,
}

impl Default for RouteCatalog {
    fn default() -> Self {
        Self {
            list: owned(DEFAULT_LIST_ROUTES),
            create: owned(DEFAULT_CREATE_ROUTES),
            item: owned(DEFAULT_ITEM_ROUTES),
            body_shapes: DEFAULT_BODY_SHAPES
                .iter()
                .map(|(url, alias)| BodyShape::new(*url, *alias))
                .collect(),
        }
    }
}

impl RouteCatalog {
    /// A catalog with a single known route set, e.g. a backend exposing
    /// `/alias` and `/alias/{id}`.
    pub fn single(collection: &str) -> Self {
        let collection = collection.trim_end_matches('/');
        Self {
            list: vec![collection.to_owned()],
            create: vec![collection.to_owned()],
            item: vec![format!("{collection}/{ID_PLACEHOLDER}")],
            body_shapes: vec![BodyShape::new("url", "alias")],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Prefix for every request path, e.g. "https://api.example.com".
    /// Must NOT have a trailing slash.
    pub api_base_url: String,

    /// Public base used to display short links, e.g. "https://go.example.com".
    pub short_base_url: Option<String>,

    /// Origin of the page hosting the client; last-resort short link base.
    pub page_origin: Option<String>,

    /// Optional client-level request timeout. `None` means requests may
    /// hang until the backend answers.
    pub request_timeout: Option<Duration>,

    pub routes: RouteCatalog,
}

impl ClientConfig {
    /// Build a config with default routes and no display bases.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: trim_base(&api_base_url.into()),
            short_base_url: None,
            page_origin: None,
            request_timeout: None,
            routes: RouteCatalog::default(),
        }
    }

    pub fn with_short_base_url(mut self, base: impl Into<String>) -> Self {
        self.short_base_url = non_empty_base(&base.into());
        self
    }

    pub fn with_page_origin(mut self, origin: impl Into<String>) -> Self {
        self.page_origin = non_empty_base(&origin.into());
        self
    }

    pub fn with_routes(mut self, routes: RouteCatalog) -> Self {
        self.routes = routes;
        self
    }

    /// Load configuration from environment variables (populated by dotenvy before this is called).
    pub fn from_env() -> Result<Self> {
        let api_base_url = std::env::var("API_BASE_URL")
            .ok()
            .and_then(|v| non_empty_base(&v))
            .unwrap_or_else(|| "http://localhost:3000".into());

        let request_timeout = match std::env::var("REQUEST_TIMEOUT_SECS") {
            Ok(raw) => Some(parse_timeout(&raw)?),
            Err(_) => None,
        };

        let defaults = RouteCatalog::default();
        let item = match env_list("ITEM_ROUTES") {
            Some(routes) => {
                if let Some(bad) = routes.iter().find(|r| !r.contains(ID_PLACEHOLDER)) {
                    anyhow::bail!("ITEM_ROUTES entry '{bad}' must contain {ID_PLACEHOLDER}");
                }
                routes
            }
            None => defaults.item,
        };

        Ok(Self {
            api_base_url,
            short_base_url: std::env::var("SHORT_BASE_URL")
                .ok()
                .and_then(|v| non_empty_base(&v)),
            page_origin: std::env::var("PAGE_ORIGIN")
                .ok()
                .and_then(|v| non_empty_base(&v)),
            request_timeout,
            routes: RouteCatalog {
                list: env_list("LIST_ROUTES").unwrap_or(defaults.list),
                create: env_list("CREATE_ROUTES").unwrap_or(defaults.create),
                item,
                body_shapes: defaults.body_shapes,
            },
        })
    }
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    let secs = raw
        .trim()
        .parse::<u64>()
        .context("REQUEST_TIMEOUT_SECS must be a positive integer in seconds")?;
    if secs == 0 {
        anyhow::bail!("REQUEST_TIMEOUT_SECS must be greater than 0");
    }
    Ok(Duration::from_secs(secs))
}

fn env_list(name: &str) -> Option<Vec<String>> {
    std::env::var(name).ok().and_then(|raw| parse_route_list(&raw))
}

fn parse_route_list(raw: &str) -> Option<Vec<String>> {
    let routes: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect();
    if routes.is_empty() {
        None
    } else {
        Some(routes)
    }
}

fn trim_base(value: &str) -> String {
    value.trim().trim_end_matches('/').to_owned()
}

fn non_empty_base(value: &str) -> Option<String> {
    Some(trim_base(value)).filter(|s| !s.is_empty())
}

fn owned(routes: &[&str]) -> Vec<String> {
    routes.iter().map(|r| (*r).to_owned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bases_lose_trailing_slashes() {
        let config = ClientConfig::new("https://api.example.com/")
            .with_short_base_url("https://sho.rt//")
            .with_page_origin("   ");
        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.short_base_url.as_deref(), Some("https://sho.rt"));
        assert_eq!(config.page_origin, None);
    }

    #[test]
    fn route_lists_are_comma_separated() {
        assert_eq!(
            parse_route_list(" /alias , ,/links "),
            Some(vec!["/alias".to_owned(), "/links".to_owned()])
        );
        assert_eq!(parse_route_list(" , "), None);
    }

    #[test]
    fn timeout_must_be_positive() {
        assert_eq!(parse_timeout("5").unwrap(), Duration::from_secs(5));
        assert!(parse_timeout("0").is_err());
        assert!(parse_timeout("soon").is_err());
    }

    #[test]
    fn single_catalog_derives_item_template() {
        let catalog = RouteCatalog::single("/alias/");
        assert_eq!(catalog.list, vec!["/alias"]);
        assert_eq!(catalog.item, vec!["/alias/{id}"]);
        assert_eq!(catalog.body_shapes.len(), 1);
    }

    #[test]
    fn default_catalog_keeps_declared_order() {
        let catalog = RouteCatalog::default();
        assert_eq!(catalog.list.first().map(String::as_str), Some("/api/v1/urls"));
        assert_eq!(catalog.create.last().map(String::as_str), Some("/shorten"));
        assert!(catalog.item.iter().all(|r| r.contains(ID_PLACEHOLDER)));
        assert_eq!(catalog.body_shapes[0], BodyShape::new("originalUrl", "alias"));
    }
}
