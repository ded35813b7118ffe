use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::{
    clipboard::Clipboard,
    error::LinkError,
    models::{CreateLinkInput, ShortLink},
    notifications::{NotificationCenter, NotifyOptions},
    repository::LinkRepository,
};

/// How long a link stays marked as "just copied".
pub const COPY_FEEDBACK_WINDOW: Duration = Duration::from_millis(2500);

/// Everything the UI renders from, captured at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkView {
    pub links: Arc<Vec<ShortLink>>,
    pub loading: bool,
    pub creating: bool,
    pub deleting: HashSet<String>,
    pub copied_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The result replaced the visible collection.
    Applied(usize),
    /// A newer refresh was issued meanwhile; this result was dropped.
    Superseded,
}

/// Owner of the visible link collection.
///
/// Every change to `links` swaps in a freshly derived vector, so readers
/// holding a snapshot never observe a half-applied update. The lock is never
/// held across an `.await`.
#[derive(Clone)]
pub struct LinkListState {
    inner: Arc<Shared>,
}

struct Shared {
    repository: Arc<dyn LinkRepository>,
    clipboard: Arc<dyn Clipboard>,
    notifications: NotificationCenter,
    copy_window: Duration,
    state: Mutex<State>,
    copy_timer: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Default)]
struct State {
    view: LinkView,
    /// Token of the most recently issued refresh.
    latest_refresh: u64,
    creates_in_flight: usize,
}

impl LinkListState {
    pub fn new(
        repository: Arc<dyn LinkRepository>,
        clipboard: Arc<dyn Clipboard>,
        notifications: NotificationCenter,
    ) -> Self {
        Self::with_copy_window(repository, clipboard, notifications, COPY_FEEDBACK_WINDOW)
    }

    pub fn with_copy_window(
        repository: Arc<dyn LinkRepository>,
        clipboard: Arc<dyn Clipboard>,
        notifications: NotificationCenter,
        copy_window: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Shared {
                repository,
                clipboard,
                notifications,
                copy_window,
                state: Mutex::new(State::default()),
                copy_timer: Mutex::new(None),
            }),
        }
    }

    pub fn snapshot(&self) -> LinkView {
        self.lock().view.clone()
    }

    pub fn links(&self) -> Arc<Vec<ShortLink>> {
        self.lock().view.links.clone()
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.inner.notifications
    }

    pub fn reset_error(&self) {
        self.lock().view.error = None;
    }

    pub fn set_error(&self, message: impl Into<String>) {
        self.lock().view.error = Some(message.into());
    }

    // ── Refresh ────────────────────────────────────────────────────────────

    /// Reload the collection. Only the most recently issued refresh may
    /// replace it; older ones finishing later are ignored.
    pub async fn refresh(&self) -> Result<RefreshOutcome, LinkError> {
        let token = {
            let mut state = self.lock();
            state.latest_refresh += 1;
            state.view.loading = true;
            state.view.error = None;
            state.latest_refresh
        };

        let result = self.inner.repository.fetch_all().await;

        let mut state = self.lock();
        if state.latest_refresh != token {
            tracing::debug!(
                "Discarding refresh #{} (latest is #{})",
                token,
                state.latest_refresh
            );
            return Ok(RefreshOutcome::Superseded);
        }
        state.view.loading = false;

        match result {
            Ok(links) => {
                let count = links.len();
                state.view.links = Arc::new(links);
                tracing::info!("Loaded {} link(s)", count);
                Ok(RefreshOutcome::Applied(count))
            }
            Err(e) => {
                state.view.error = Some(e.to_string());
                drop(state);
                self.report(&e, "Couldn't load links");
                Err(e)
            }
        }
    }

    // ── Create ─────────────────────────────────────────────────────────────

    /// Validate, create, prepend, and copy the new short link.
    pub async fn create_link(
        &self,
        url: &str,
        alias: Option<&str>,
    ) -> Result<ShortLink, LinkError> {
        let input = match CreateLinkInput::new(url, alias) {
            Ok(input) => input,
            Err(e) => {
                // Shown next to the form; no toast.
                self.set_error(e.to_string());
                return Err(e);
            }
        };

        {
            let mut state = self.lock();
            state.creates_in_flight += 1;
            state.view.creating = true;
            state.view.error = None;
        }

        let result = self.inner.repository.create(&input).await;
        self.finish_create();

        let link = match result {
            Ok(link) => link,
            Err(e) => {
                self.set_error(e.to_string());
                self.report(&e, "Couldn't create short link");
                return Err(e);
            }
        };

        self.update(|view| {
            view.links = Arc::new(
                std::iter::once(link.clone())
                    .chain(view.links.iter().filter(|l| l.id != link.id).cloned())
                    .collect(),
            );
        });
        self.mark_copied(&link.id);
        tracing::info!("Created {} -> {}", link.short_url, link.original_url);

        match self.inner.clipboard.write_text(&link.short_url).await {
            Ok(()) => {
                self.inner.notifications.notify(
                    NotifyOptions::success(format!("{} copied to the clipboard", link.short_url))
                        .with_title("Short link created"),
                );
            }
            Err(e) => {
                tracing::warn!("Failed to copy newly created link: {}", e);
                self.inner.notifications.notify(
                    NotifyOptions::info(format!("Link created, but {e}"))
                        .with_title("Short link created"),
                );
            }
        }

        Ok(link)
    }

    // ── Update ─────────────────────────────────────────────────────────────

    /// Change the destination (and optionally alias) of an existing link,
    /// keeping its position in the collection.
    pub async fn update_link(
        &self,
        link: &ShortLink,
        url: &str,
        alias: Option<&str>,
    ) -> Result<ShortLink, LinkError> {
        let input =
            CreateLinkInput::new(url, alias).inspect_err(|e| self.set_error(e.to_string()))?;

        self.reset_error();
        match self.inner.repository.update(&link.id, &input).await {
            Ok(updated) => {
                let old_id = link.id.clone();
                let replacement = updated.clone();
                self.update(move |view| {
                    let mut links: Vec<ShortLink> = view
                        .links
                        .iter()
                        .filter(|l| l.id == old_id || l.id != replacement.id)
                        .cloned()
                        .collect();
                    match links.iter().position(|l| l.id == old_id) {
                        Some(index) => links[index] = replacement,
                        None => links.insert(0, replacement),
                    }
                    view.links = Arc::new(links);
                });
                self.inner
                    .notifications
                    .notify(NotifyOptions::success(format!("{} updated", updated.short_url)));
                Ok(updated)
            }
            Err(e) => {
                self.set_error(e.to_string());
                self.report(&e, "Couldn't update short link");
                Err(e)
            }
        }
    }

    // ── Copy ───────────────────────────────────────────────────────────────

    pub async fn copy_link(&self, link: &ShortLink) -> Result<(), LinkError> {
        match self.inner.clipboard.write_text(&link.short_url).await {
            Ok(()) => {
                self.mark_copied(&link.id);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to copy {}: {}", link.short_url, e);
                self.set_error("Couldn't copy the link to the clipboard");
                self.report(&e, "Couldn't copy link");
                Err(e)
            }
        }
    }

    /// Flag `id` as just copied and (re)start the revert timer.
    fn mark_copied(&self, id: &str) {
        self.update(|view| view.copied_id = Some(id.to_owned()));

        let shared = Arc::clone(&self.inner);
        let copied = id.to_owned();
        let window = self.inner.copy_window;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let mut state = shared.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.view.copied_id.as_deref() == Some(copied.as_str()) {
                state.view.copied_id = None;
            }
        });

        let mut timer = self
            .inner
            .copy_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = timer.replace(handle) {
            previous.abort();
        }
    }

    // ── Delete ─────────────────────────────────────────────────────────────

    /// Remove `link` optimistically, restoring it if the backend refuses.
    ///
    /// A link that is not in the visible collection is left alone, and a
    /// second delete for an id that is still outstanding is rejected.
    pub async fn delete_link(&self, link: &ShortLink) -> Result<(), LinkError> {
        let id = link.id.clone();

        let (slot, removed) = {
            let mut state = self.lock();
            if state.view.deleting.contains(&id) {
                tracing::warn!("Delete of '{}' already in progress", id);
                return Err(LinkError::DeleteInProgress(id));
            }
            let Some(index) = state.view.links.iter().position(|l| l.id == id) else {
                tracing::debug!("Delete of '{}' ignored: not in the visible collection", id);
                return Ok(());
            };
            let removed = state.view.links[index].clone();
            let slot = Slot {
                index,
                after: index
                    .checked_sub(1)
                    .map(|prev| state.view.links[prev].id.clone()),
            };
            state.view.deleting.insert(id.clone());
            state.view.error = None;
            state.view.links = Arc::new(without(&state.view.links, &id));
            (slot, removed)
        };

        let result = self.inner.repository.delete(&id).await;

        match result {
            Ok(()) => {
                self.update(|view| {
                    view.deleting.remove(&id);
                    // A refresh that landed meanwhile may have brought it back.
                    if view.links.iter().any(|l| l.id == id) {
                        view.links = Arc::new(without(&view.links, &id));
                    }
                });
                tracing::info!("Deleted link '{}'", id);
                self.inner
                    .notifications
                    .notify(NotifyOptions::success(format!("{} deleted", removed.short_url)));
                Ok(())
            }
            Err(e) => {
                self.update(|view| {
                    view.deleting.remove(&id);
                    view.error = Some(e.to_string());
                    if view.links.iter().all(|l| l.id != id) {
                        let mut links = view.links.as_ref().clone();
                        links.insert(slot.resolve(&links), removed);
                        view.links = Arc::new(links);
                    }
                });
                self.report(&e, "Couldn't delete link");
                Err(e)
            }
        }
    }

    // ── Private helpers ────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn finish_create(&self) {
        let mut state = self.lock();
        state.creates_in_flight = state.creates_in_flight.saturating_sub(1);
        state.view.creating = state.creates_in_flight > 0;
    }

    fn update(&self, apply: impl FnOnce(&mut LinkView)) {
        apply(&mut self.lock().view);
    }

    /// Surface a failure as a toast; clipboard trouble is only a notice.
    fn report(&self, error: &LinkError, title: &str) {
        let options = if error.is_minor() {
            tracing::warn!("{}: {}", title, error);
            NotifyOptions::info(error.to_string())
        } else {
            tracing::error!("{}: {}", title, error);
            NotifyOptions::error(error.to_string())
        };
        self.inner.notifications.notify(options.with_title(title));
    }
}

/// Where a removed link sat, relative to its predecessor.
struct Slot {
    index: usize,
    after: Option<String>,
}

impl Slot {
    /// Index to reinsert at: right after the predecessor if it is still
    /// present, at the top if there was none, otherwise the old index.
    fn resolve(&self, links: &[ShortLink]) -> usize {
        match &self.after {
            None => 0,
            Some(prev) => links
                .iter()
                .position(|l| &l.id == prev)
                .map_or(self.index.min(links.len()), |at| at + 1),
        }
    }
}

fn without(links: &[ShortLink], id: &str) -> Vec<ShortLink> {
    links.iter().filter(|l| l.id != id).cloned().collect()
}
