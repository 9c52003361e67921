use super::View;
use crate::error::{ContextError, Result};
use std::sync::{Arc, Mutex, PoisonError};

/// Stops render errors of its children from propagating further.
///
/// Each child is reconciled independently; a failing child does not
/// prevent its siblings from rendering. The most recent error is kept
/// until the next update that completes without one.
pub struct ErrorBoundary {
    name: Arc<str>,
    children: Vec<Arc<dyn View>>,
    last_error: Mutex<Option<ContextError>>,
}

impl ErrorBoundary {
    pub fn new(name: impl Into<Arc<str>>, children: Vec<Arc<dyn View>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            children,
            last_error: Mutex::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The error caught by the latest update, if any.
    pub fn last_error(&self) -> Option<ContextError> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl View for ErrorBoundary {
    fn update(&self) -> Result<()> {
        let mut caught = None;
        for child in &self.children {
            if let Err(err) = child.update() {
                tracing::warn!(boundary = %self.name, error = %err, "caught render error");
                caught = Some(err);
            }
        }
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = caught;
        Ok(())
    }
}
