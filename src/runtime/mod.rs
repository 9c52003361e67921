//! Runtime support for context providers and consumers.
//!
//! This module provides the infrastructure for subscription tracking,
//! publish slots, per-instance hook storage, and render scopes.

mod context;
pub(crate) mod scope;

pub use context::{ErasedValue, ReactiveRuntime, RuntimeInner};
pub use scope::Frame;
