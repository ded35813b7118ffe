use crate::memory::Operation;

/// Every failure a link operation can surface to the list state.
///
/// Transport errors and HTTP statuses never leave the prober on their own;
/// they are folded into [`LinkError::NetworkExhausted`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    /// User input failed a precondition; nothing was sent.
    #[error("{0}")]
    Validation(String),

    /// Every route / body-shape combination failed.
    #[error("{}", exhausted_message(.operation, .attempts, .last))]
    NetworkExhausted {
        operation: Operation,
        attempts: usize,
        last: Option<String>,
    },

    /// The backend answered 2xx but the payload is not a link record.
    #[error("unexpected response format from URL shortener: {0}")]
    Normalization(String),

    #[error("clipboard unavailable: {0}")]
    ClipboardUnavailable(String),

    /// A delete for this id is still outstanding.
    #[error("link '{0}' is already being deleted")]
    DeleteInProgress(String),
}

impl LinkError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// `true` for failures that should be shown as a low-severity notice.
    pub fn is_minor(&self) -> bool {
        matches!(self, Self::ClipboardUnavailable(_))
    }
}

fn exhausted_message(operation: &Operation, attempts: &usize, last: &Option<String>) -> String {
    match last {
        Some(detail) => format!("{operation} failed after {attempts} attempt(s): {detail}"),
        None => "unable to reach URL shortener service".to_owned(),
    }
}
