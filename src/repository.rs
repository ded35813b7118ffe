use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{
    config::{BodyShape, ClientConfig, RouteCatalog, ID_PLACEHOLDER},
    error::LinkError,
    memory::{EndpointMemory, Operation},
    models::{CreateLinkInput, ShortLink},
    normalize::Normalizer,
    probe::{Attempt, Decode, EndpointProber},
};

const LIST_KEY: &str = "list";
const CREATE_KEY: &str = "create";
const ITEM_KEY: &str = "item";

/// The link operations the list state is built on.
#[async_trait]
pub trait LinkRepository: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<ShortLink>, LinkError>;

    async fn create(&self, input: &CreateLinkInput) -> Result<ShortLink, LinkError>;

    async fn update(&self, id: &str, input: &CreateLinkInput) -> Result<ShortLink, LinkError>;

    async fn delete(&self, id: &str) -> Result<(), LinkError>;
}

/// [`LinkRepository`] over HTTP against a backend whose routes and field
/// names are discovered at runtime.
#[derive(Debug, Clone)]
pub struct HttpLinkRepository {
    prober: EndpointProber,
    normalizer: Normalizer,
    routes: RouteCatalog,
}

impl HttpLinkRepository {
    /// Build a repository with its own reqwest client.
    pub fn new(config: &ClientConfig, memory: EndpointMemory) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, config, memory))
    }

    pub fn with_client(
        client: reqwest::Client,
        config: &ClientConfig,
        memory: EndpointMemory,
    ) -> Self {
        Self {
            prober: EndpointProber::new(client, config.api_base_url.clone(), memory),
            normalizer: Normalizer::from_config(config),
            routes: config.routes.clone(),
        }
    }

    pub fn memory(&self) -> &EndpointMemory {
        self.prober.memory()
    }

    /// Item templates for `operation`, most promising first: the template
    /// that last worked for it, then ones derived from the list and create
    /// routes already discovered, then the configured fallbacks.
    fn item_templates(&self, operation: Operation) -> Vec<String> {
        let memory = self.memory();
        let derived = [
            memory.recall(Operation::List, LIST_KEY),
            memory.recall(Operation::Create, CREATE_KEY),
        ]
        .into_iter()
        .flatten()
        .map(|route| format!("{}/{ID_PLACEHOLDER}", route.trim_end_matches('/')));

        let mut templates: Vec<String> = Vec::new();
        for template in memory
            .recall(operation, ITEM_KEY)
            .into_iter()
            .chain(derived)
            .chain(self.routes.item.iter().cloned())
        {
            if !templates.contains(&template) {
                templates.push(template);
            }
        }
        templates
    }

    fn item_attempts(
        &self,
        operation: Operation,
        id: &str,
        input: Option<&CreateLinkInput>,
    ) -> Vec<Attempt> {
        let escaped = urlencoding::encode(id);
        let mut attempts = Vec::new();
        for template in self.item_templates(operation) {
            let path = template.replace(ID_PLACEHOLDER, &escaped);
            match input {
                Some(input) => {
                    for shape in &self.routes.body_shapes {
                        let body = body_for(shape, input);
                        attempts.push(Attempt::item(&template, &path, Some(body)));
                    }
                }
                None => attempts.push(Attempt::item(&template, &path, None)),
            }
        }
        attempts
    }

    fn record(&self, data: &Value, operation: Operation) -> Result<ShortLink, LinkError> {
        self.normalizer.link(data).ok_or_else(|| {
            tracing::error!(
                "{} succeeded but returned an unrecognised record: {}",
                operation,
                data
            );
            LinkError::Normalization(format!("{operation} response carries no slug and URL"))
        })
    }
}

#[async_trait]
impl LinkRepository for HttpLinkRepository {
    async fn fetch_all(&self) -> Result<Vec<ShortLink>, LinkError> {
        let found = self
            .prober
            .probe(Operation::List, &self.routes.list, None, Some(LIST_KEY))
            .await?;

        let links = self.normalizer.links(&found.data);
        tracing::debug!("Fetched {} link(s) from {}", links.len(), found.route);
        Ok(links)
    }

    async fn create(&self, input: &CreateLinkInput) -> Result<ShortLink, LinkError> {
        if input.url.trim().is_empty() {
            return Err(LinkError::validation("URL must not be empty."));
        }

        // Every route is tried with every body shape before moving on.
        let attempts = self
            .prober
            .ordered_routes(Operation::Create, &self.routes.create, Some(CREATE_KEY))
            .into_iter()
            .flat_map(|route| {
                self.routes
                    .body_shapes
                    .iter()
                    .map(move |shape| Attempt::new(route.clone(), Some(body_for(shape, input))))
            })
            .collect();

        let found = self
            .prober
            .run(Operation::Create, attempts, Some(CREATE_KEY), Decode::Json)
            .await?;
        self.record(&found.data, Operation::Create)
    }

    async fn update(&self, id: &str, input: &CreateLinkInput) -> Result<ShortLink, LinkError> {
        if input.url.trim().is_empty() {
            return Err(LinkError::validation("URL must not be empty."));
        }

        let attempts = self.item_attempts(Operation::Update, id, Some(input));
        let found = self
            .prober
            .run(Operation::Update, attempts, Some(ITEM_KEY), Decode::Json)
            .await?;
        self.record(&found.data, Operation::Update)
    }

    async fn delete(&self, id: &str) -> Result<(), LinkError> {
        let attempts = self.item_attempts(Operation::Delete, id, None);
        self.prober
            .run(Operation::Delete, attempts, Some(ITEM_KEY), Decode::Ignore)
            .await?;
        Ok(())
    }
}

/// JSON body for one shape. An absent alias is left out rather than sent
/// as null.
fn body_for(shape: &BodyShape, input: &CreateLinkInput) -> Value {
    let mut body = Map::new();
    body.insert(shape.url_key.clone(), Value::String(input.url.clone()));
    if let Some(alias) = &input.alias {
        body.insert(shape.alias_key.clone(), Value::String(alias.clone()));
    }
    Value::Object(body)
}
