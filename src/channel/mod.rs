//! Typed broadcast channels.
//!
//! This module provides the slots providers publish into:
//! - `Channel<T>`: one typed slot with a label and a static default
//! - `ErasedChannel`: object-safe view for heterogeneous collections
//! - `ChannelMap`: ordered field name to channel mapping

mod channel;
mod map;

pub use channel::{Channel, ErasedChannel};
pub use map::ChannelMap;
