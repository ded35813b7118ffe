use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

/// The kinds of request the prober discovers routes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn method(self) -> reqwest::Method {
        match self {
            Operation::List => reqwest::Method::GET,
            Operation::Create => reqwest::Method::POST,
            Operation::Update => reqwest::Method::PUT,
            Operation::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::List => "list",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Process-scoped memory of which route last worked, keyed by
/// `(operation, cache key)`.
///
/// Backed by a DashMap so clones of one memory can be shared between a
/// repository and anything else probing the same backend. Nothing is
/// persisted; a fresh memory starts every probe from the candidate list.
#[derive(Clone, Debug, Default)]
pub struct EndpointMemory {
    inner: Arc<DashMap<(Operation, String), String>>,
}

impl EndpointMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the remembered route.
    pub fn remember(&self, operation: Operation, key: impl Into<String>, route: impl Into<String>) {
        self.inner.insert((operation, key.into()), route.into());
    }

    /// Return a clone of the remembered route if there is one.
    pub fn recall(&self, operation: Operation, key: &str) -> Option<String> {
        self.inner
            .get(&(operation, key.to_owned()))
            .map(|route| route.clone())
    }

    pub fn forget(&self, operation: Operation, key: &str) {
        self.inner.remove(&(operation, key.to_owned()));
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
