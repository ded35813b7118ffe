use serde_json::Value;

use crate::error::LinkError;
use crate::memory::{EndpointMemory, Operation};

// ── Types ──────────────────────────────────────────────────────────────────

/// One request to try: the concrete path plus the route label that gets
/// remembered on success (for item routes, the `{id}` template).
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub route: String,
    pub path: String,
    pub body: Option<Value>,
}

impl Attempt {
    pub fn new(route: impl Into<String>, body: Option<Value>) -> Self {
        let route = route.into();
        Self {
            path: route.clone(),
            route,
            body,
        }
    }

    pub fn item(template: impl Into<String>, path: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            route: template.into(),
            path: path.into(),
            body,
        }
    }
}

/// How to treat the body of a 2xx response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decode {
    /// Parse as JSON; an empty body is `null`, anything unparseable fails
    /// the attempt.
    Json,
    /// Any 2xx is enough; the body is not read.
    Ignore,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSuccess {
    pub data: Value,
    pub route: String,
}

/// Tries candidate routes in order against one backend and remembers what
/// worked.
#[derive(Debug, Clone)]
pub struct EndpointProber {
    client: reqwest::Client,
    base_url: String,
    memory: EndpointMemory,
}

// ── Public API ─────────────────────────────────────────────────────────────

impl EndpointProber {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        memory: EndpointMemory,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            memory,
        }
    }

    pub fn memory(&self) -> &EndpointMemory {
        &self.memory
    }

    /// Absolute URL for a route path.
    pub fn url(&self, path: &str) -> String {
        if self.base_url.is_empty() {
            return path.to_owned();
        }
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    /// The remembered route for `cache_key` (if any) followed by the full
    /// candidate list in declared order. A remembered route that is also a
    /// candidate gets a second try in its own slot.
    pub fn ordered_routes(
        &self,
        operation: Operation,
        candidates: &[String],
        cache_key: Option<&str>,
    ) -> Vec<String> {
        cache_key
            .and_then(|key| self.memory.recall(operation, key))
            .into_iter()
            .chain(candidates.iter().cloned())
            .collect()
    }

    /// Probe `candidates` with the same body on every attempt.
    pub async fn probe(
        &self,
        operation: Operation,
        candidates: &[String],
        body: Option<&Value>,
        cache_key: Option<&str>,
    ) -> Result<ProbeSuccess, LinkError> {
        let attempts = self
            .ordered_routes(operation, candidates, cache_key)
            .into_iter()
            .map(|route| Attempt::new(route, body.cloned()))
            .collect();
        self.run(operation, attempts, cache_key, Decode::Json).await
    }

    /// Fire `attempts` in order until one answers 2xx.
    ///
    /// A 5xx is recorded as the last error and the scan moves on. Any other
    /// non-success status means "not here" and is skipped silently. When
    /// nothing succeeds the last recorded error is reported, or none if no
    /// attempt produced one.
    pub async fn run(
        &self,
        operation: Operation,
        attempts: Vec<Attempt>,
        cache_key: Option<&str>,
        decode: Decode,
    ) -> Result<ProbeSuccess, LinkError> {
        let method = operation.method();
        let total = attempts.len();
        let mut last: Option<String> = None;

        for attempt in attempts {
            let url = self.url(&attempt.path);
            let mut request = self.client.request(method.clone(), &url);
            if let Some(body) = &attempt.body {
                request = request.json(body);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    tracing::debug!("{} {}: transport error: {}", method, url, e);
                    last = Some(transport_message(&e));
                    continue;
                }
            };

            let status = response.status();
            if status.is_server_error() {
                tracing::warn!("{} {}: server responded with {}", method, url, status);
                last = Some(format!("server responded with {}", status.as_u16()));
                continue;
            }
            if !status.is_success() {
                tracing::debug!("{} {}: {}, trying next candidate", method, url, status);
                continue;
            }

            let data = match decode_body(response, decode).await {
                Ok(data) => data,
                Err(detail) => {
                    tracing::debug!("{} {}: {}", method, url, detail);
                    last = Some(detail);
                    continue;
                }
            };

            if let Some(key) = cache_key {
                self.memory.remember(operation, key, attempt.route.clone());
            }
            tracing::info!("{} route discovered: {} {}", operation, method, attempt.route);

            return Ok(ProbeSuccess {
                data,
                route: attempt.route,
            });
        }

        Err(LinkError::NetworkExhausted {
            operation,
            attempts: total,
            last,
        })
    }
}

// ── Internal helpers ───────────────────────────────────────────────────────

async fn decode_body(response: reqwest::Response, decode: Decode) -> Result<Value, String> {
    if decode == Decode::Ignore {
        return Ok(Value::Null);
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| format!("failed to read response body: {e}"))?;

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }

    serde_json::from_slice(&bytes).map_err(|e| format!("response is not JSON: {e}"))
}

fn transport_message(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_owned()
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        format!("transport error: {error}")
    }
}
