#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use linkdeck::{CreateLinkInput, LinkError, LinkRepository, Operation, ShortLink};
use tokio::sync::{oneshot, watch};

pub fn link(id: &str) -> ShortLink {
    ShortLink {
        id: id.to_owned(),
        slug: id.to_owned(),
        original_url: format!("https://example.com/{id}"),
        short_url: format!("https://sho.rt/{id}"),
        created_at: None,
        expires_at: None,
        clicks: None,
    }
}

pub fn ids(links: &[ShortLink]) -> Vec<&str> {
    links.iter().map(|l| l.id.as_str()).collect()
}

pub fn exhausted(operation: Operation) -> LinkError {
    LinkError::NetworkExhausted {
        operation,
        attempts: 1,
        last: Some("server responded with 500".into()),
    }
}

type Reply<T> = oneshot::Receiver<Result<T, LinkError>>;

/// One scripted operation: each call takes the next queued reply and
/// waits for it, so tests decide when (and in which order) calls finish.
struct Script<T> {
    replies: Mutex<VecDeque<Reply<T>>>,
    calls: watch::Sender<usize>,
}

impl<T> Script<T> {
    fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: watch::channel(0).0,
        }
    }

    fn queue(&self) -> oneshot::Sender<Result<T, LinkError>> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().unwrap().push_back(rx);
        tx
    }

    fn queue_ready(&self, reply: Result<T, LinkError>) {
        let _ = self.queue().send(reply);
    }

    async fn call(&self, operation: Operation) -> Result<T, LinkError> {
        let reply = self.replies.lock().unwrap().pop_front();
        self.calls.send_modify(|n| *n += 1);
        match reply {
            Some(rx) => rx.await.unwrap_or_else(|_| Err(unreachable(operation))),
            None => Err(unreachable(operation)),
        }
    }

    async fn wait_for_calls(&self, count: usize) {
        let mut rx = self.calls.subscribe();
        rx.wait_for(|n| *n >= count).await.unwrap();
    }

    fn calls(&self) -> usize {
        *self.calls.borrow()
    }
}

fn unreachable(operation: Operation) -> LinkError {
    LinkError::NetworkExhausted {
        operation,
        attempts: 0,
        last: None,
    }
}

pub struct FakeRepository {
    fetches: Script<Vec<ShortLink>>,
    creates: Script<ShortLink>,
    updates: Script<ShortLink>,
    deletes: Script<()>,
    pub created_with: Mutex<Vec<CreateLinkInput>>,
    pub deleted_ids: Mutex<Vec<String>>,
}

impl Default for FakeRepository {
    fn default() -> Self {
        Self {
            fetches: Script::new(),
            creates: Script::new(),
            updates: Script::new(),
            deletes: Script::new(),
            created_with: Mutex::new(Vec::new()),
            deleted_ids: Mutex::new(Vec::new()),
        }
    }
}

impl FakeRepository {
    pub fn next_fetch(&self) -> oneshot::Sender<Result<Vec<ShortLink>, LinkError>> {
        self.fetches.queue()
    }

    pub fn fetch_returns(&self, reply: Result<Vec<ShortLink>, LinkError>) {
        self.fetches.queue_ready(reply);
    }

    pub fn next_create(&self) -> oneshot::Sender<Result<ShortLink, LinkError>> {
        self.creates.queue()
    }

    pub fn create_returns(&self, reply: Result<ShortLink, LinkError>) {
        self.creates.queue_ready(reply);
    }

    pub fn update_returns(&self, reply: Result<ShortLink, LinkError>) {
        self.updates.queue_ready(reply);
    }

    pub fn next_delete(&self) -> oneshot::Sender<Result<(), LinkError>> {
        self.deletes.queue()
    }

    pub fn delete_returns(&self, reply: Result<(), LinkError>) {
        self.deletes.queue_ready(reply);
    }

    pub async fn wait_for_fetches(&self, count: usize) {
        self.fetches.wait_for_calls(count).await;
    }

    pub async fn wait_for_creates(&self, count: usize) {
        self.creates.wait_for_calls(count).await;
    }

    pub async fn wait_for_deletes(&self, count: usize) {
        self.deletes.wait_for_calls(count).await;
    }

    pub fn create_calls(&self) -> usize {
        self.creates.calls()
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.calls()
    }
}

#[async_trait]
impl LinkRepository for FakeRepository {
    async fn fetch_all(&self) -> Result<Vec<ShortLink>, LinkError> {
        self.fetches.call(Operation::List).await
    }

    async fn create(&self, input: &CreateLinkInput) -> Result<ShortLink, LinkError> {
        self.created_with.lock().unwrap().push(input.clone());
        self.creates.call(Operation::Create).await
    }

    async fn update(&self, _id: &str, _input: &CreateLinkInput) -> Result<ShortLink, LinkError> {
        self.updates.call(Operation::Update).await
    }

    async fn delete(&self, id: &str) -> Result<(), LinkError> {
        self.deleted_ids.lock().unwrap().push(id.to_owned());
        self.deletes.call(Operation::Delete).await
    }
}
