//! Client for URL-shortener backends whose routes and payload shapes are
//! not known up front.
//!
//! [`HttpLinkRepository`] hides route discovery and payload normalization
//! behind the [`LinkRepository`] trait; [`LinkListState`] keeps the visible
//! collection consistent across overlapping refreshes, creates and deletes.

pub mod clipboard;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod memory;
pub mod models;
pub mod normalize;
pub mod notifications;
pub mod probe;
pub mod repository;
pub mod theme;

pub use clipboard::{Clipboard, MemoryClipboard, SystemClipboard};
pub use config::{BodyShape, ClientConfig, RouteCatalog};
pub use coordinator::{LinkListState, LinkView, RefreshOutcome};
pub use error::LinkError;
pub use memory::{EndpointMemory, Operation};
pub use models::{CreateLinkInput, ShortLink};
pub use normalize::Normalizer;
pub use notifications::{Notification, NotificationCenter, NotificationKind, NotifyOptions};
pub use probe::EndpointProber;
pub use repository::{HttpLinkRepository, LinkRepository};
pub use theme::{Theme, ThemeParams};
