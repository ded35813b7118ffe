use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const DEFAULT_AUTO_CLOSE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: Option<String>,
    pub message: String,
    /// Zero means the notification stays until dismissed.
    pub auto_close: Duration,
}

/// What a caller supplies to [`NotificationCenter::notify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyOptions {
    pub id: Option<String>,
    pub kind: NotificationKind,
    pub title: Option<String>,
    pub message: String,
    pub auto_close: Duration,
}

impl NotifyOptions {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            title: None,
            message: message.into(),
            auto_close: DEFAULT_AUTO_CLOSE,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_auto_close(mut self, auto_close: Duration) -> Self {
        self.auto_close = auto_close;
        self
    }
}

/// Toast queue with per-entry auto-close timers.
///
/// Cloning shares the queue. Timers need a tokio runtime; notifications
/// raised outside one simply stay until dismissed.
#[derive(Clone, Debug, Default)]
pub struct NotificationCenter {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    counter: AtomicU64,
    entries: Mutex<Vec<Notification>>,
    timers: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a notification and return its id. Re-using an id replaces the
    /// earlier entry and restarts its timer.
    pub fn notify(&self, options: NotifyOptions) -> String {
        let id = options.id.unwrap_or_else(|| {
            let n = self.inner.counter.fetch_add(1, Ordering::SeqCst) + 1;
            format!("notification-{n}")
        });

        {
            let mut entries = self.entries();
            entries.retain(|n| n.id != id);
            entries.push(Notification {
                id: id.clone(),
                kind: options.kind,
                title: options.title,
                message: options.message,
                auto_close: options.auto_close,
            });
        }

        self.cancel_timer(&id);
        if !options.auto_close.is_zero() {
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                let center = self.clone();
                let timer_id = id.clone();
                let delay = options.auto_close;
                let handle = runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    center.expire(&timer_id);
                });
                self.timers().insert(id.clone(), handle);
            }
        }

        id
    }

    pub fn dismiss(&self, id: &str) {
        self.entries().retain(|n| n.id != id);
        self.cancel_timer(id);
    }

    /// Current notifications, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.entries().clone()
    }

    pub fn clear(&self) {
        self.entries().clear();
        for (_, handle) in self.timers().drain() {
            handle.abort();
        }
    }

    fn expire(&self, id: &str) {
        self.entries().retain(|n| n.id != id);
        self.timers().remove(id);
    }

    fn cancel_timer(&self, id: &str) {
        if let Some(handle) = self.timers().remove(id) {
            handle.abort();
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn timers(&self) -> std::sync::MutexGuard<'_, HashMap<String, JoinHandle<()>>> {
        self.inner
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
