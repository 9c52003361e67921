//! Errors raised while rendering a tree.

use thiserror::Error;

/// Failures that abort a render pass and propagate to the nearest
/// [`ErrorBoundary`](crate::ErrorBoundary).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// A context accessor ran outside any matching provider, or the
    /// nearest provider published an unset value.
    #[error("use{prefix} must be used within a {prefix}Provider")]
    MissingProvider { prefix: String },

    /// A component's own render logic failed.
    #[error("component `{component}` failed to render: {message}")]
    Render { component: String, message: String },
}

impl ContextError {
    pub fn missing_provider(prefix: impl Into<String>) -> Self {
        Self::MissingProvider {
            prefix: prefix.into(),
        }
    }

    pub fn render(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            component: component.into(),
            message: message.into(),
        }
    }
}

pub type Result<T, E = ContextError> = std::result::Result<T, E>;
