//! Render tree nodes.
//!
//! - `Component`: leaf instances with a render closure
//! - `Provider` / `ProviderNode`: publish scopes produced by the factories
//! - `ErrorBoundary`: stops render errors from propagating

mod boundary;
mod component;
mod provider;

pub use boundary::ErrorBoundary;
pub use component::{Component, View};
pub(crate) use provider::Publisher;
pub use provider::{Provider, ProviderNode};
