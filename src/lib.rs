//! # Context Helper
//!
//! Typed shared-state contexts for a fine-grained render runtime.
//!
//! Context Helper provides two factories on top of a small provider and
//! consumer runtime:
//!
//! ## Simple contexts
//!
//! [`create_context_helper`] publishes one aggregate value as a unit:
//! - `Provider<T>` - merges its props over the default and publishes the result
//! - `ContextAccessor<T>` - reads the nearest provider's value, failing with
//!   [`ContextError::MissingProvider`] outside one
//! - `Channel<T>` - the underlying broadcast slot
//!
//! ## Atomic contexts
//!
//! [`create_atomic_context_helper`] publishes every field on its own channel:
//! - `Provider<T>` - one nested publish scope per field
//! - `AtomicAccessor<T>` - subscribes only to the selected fields
//! - `ChannelMap` - field name to channel, for direct use
//!
//! Aggregates are plain structs declared with [`aggregate!`].

pub mod channel;
pub mod component;
pub mod error;
pub mod factory;
pub mod runtime;

// Re-export main types for convenience
pub use channel::{Channel, ChannelMap, ErasedChannel};
pub use component::{Component, ErrorBoundary, Provider, ProviderNode, View};
pub use error::{ContextError, Result};
pub use factory::{
    create_atomic_context_helper, create_context_helper, Aggregate, AtomicAccessor,
    AtomicAggregate, ContextAccessor, Selected,
};
