//! Context factories.
//!
//! - `create_context_helper`: one channel carrying the whole aggregate
//! - `create_atomic_context_helper`: one channel per aggregate field, read
//!   through a selector so consumers only track the fields they use

mod aggregate;
mod atomic;
mod selected;
mod simple;

pub use aggregate::{Aggregate, AtomicAggregate};
pub use atomic::{create_atomic_context_helper, AtomicAccessor};
pub use selected::Selected;
pub use simple::{create_context_helper, ContextAccessor};
