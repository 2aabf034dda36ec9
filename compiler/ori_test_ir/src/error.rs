//! Error types shared by test bodies, condition predicates and the catalog.

use std::any::Any;

use crate::TestId;

/// Error raised by a test body or a condition predicate.
pub type TestError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// What a test body returns.
pub type BodyResult = Result<(), TestError>;

/// A panic caught at a test or predicate boundary.
#[derive(Debug, thiserror::Error)]
#[error("panicked: {message}")]
pub struct PanicError {
    message: String,
}

impl PanicError {
    /// Recover the message from a `catch_unwind` payload.
    #[cold]
    pub fn from_payload(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else {
            "non-string panic payload".to_string()
        };
        PanicError { message }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Structural problems detected while assembling a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate test id `{0}`")]
    DuplicateId(TestId),

    #[error("`{child}` is nested under `{parent}`, which is not a suite")]
    ParentNotSuite { parent: TestId, child: TestId },
}
