use crate::runtime::{scope, ErasedValue, Frame, ReactiveRuntime};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// Channels are process-wide, so their ids are not tied to any runtime.
static NEXT_CHANNEL_ID: AtomicUsize = AtomicUsize::new(0);

/// A typed broadcast slot that providers publish into and consumers read.
///
/// A channel carries a static default, returned to readers that are not
/// nested in any provider for it, and a label used in diagnostics.
///
/// # Examples
///
/// ```
/// use context_helper::Channel;
///
/// let theme = Channel::new("ThemeContext", String::from("light"));
/// assert_eq!(theme.label(), "ThemeContext");
/// assert_eq!(theme.read(), "light");
/// assert_eq!(theme.lookup(), None);
/// ```
pub struct Channel<T> {
    id: usize,
    label: Arc<str>,
    default: Arc<T>,
}

impl<T: Clone + PartialEq + Send + Sync + 'static> Channel<T> {
    /// Create a new channel with the given label and static default.
    pub fn new(label: impl Into<Arc<str>>, default: T) -> Self {
        let id = NEXT_CHANNEL_ID.fetch_add(1, Ordering::SeqCst);
        let label = label.into();
        tracing::trace!(channel = id, label = %label, "created channel");

        Self {
            id,
            label,
            default: Arc::new(default),
        }
    }

    /// Get the channel's unique ID.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Debug label, e.g. `ThemeContext`.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The value readers see outside any provider.
    pub fn default_value(&self) -> T {
        (*self.default).clone()
    }

    /// Read the nearest published value, falling back to the default.
    pub fn read(&self) -> T {
        self.lookup().unwrap_or_else(|| self.default_value())
    }

    /// Read the nearest published value.
    ///
    /// Returns `None` when no enclosing provider publishes this channel.
    /// A component rendering this read is subscribed to the provider's
    /// slot and re-renders when a different value is published there.
    pub fn lookup(&self) -> Option<T> {
        let value = self.lookup_erased()?;
        value.downcast_ref::<T>().cloned()
    }

    // The slot is resolved in the runtime of the provider that pushed the
    // frame, which need not be the reader's runtime.
    fn lookup_erased(&self) -> Option<ErasedValue> {
        let frame = scope::nearest(self.id)?;
        if let Some(observer) = scope::current_observer() {
            frame
                .runtime
                .track_read(frame.slot, observer.id, &observer.runtime);
        }
        frame.runtime.slot_value(frame.slot)
    }

    fn publish_arc(&self, runtime: &ReactiveRuntime, slot: usize, value: Arc<T>) -> Frame {
        let changed = runtime.publish(slot, Arc::clone(&value) as ErasedValue, |prev| {
            prev.downcast_ref::<T>() != Some(&*value)
        });
        if changed {
            tracing::trace!(channel = self.id, label = %self.label, slot, "published new value");
        }
        Frame {
            channel: self.id,
            slot,
            runtime: runtime.inner(),
        }
    }

    /// Publish `value` into `slot` and return the frame that exposes it.
    pub(crate) fn publish(&self, runtime: &ReactiveRuntime, slot: usize, value: T) -> Frame {
        self.publish_arc(runtime, slot, Arc::new(value))
    }
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            label: Arc::clone(&self.label),
            default: Arc::clone(&self.default),
        }
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

mod sealed {
    pub trait Sealed {}
}

impl<T> sealed::Sealed for Channel<T> {}

/// Object-safe view of a [`Channel`], used where channels of different
/// value types share one collection.
pub trait ErasedChannel: sealed::Sealed + fmt::Debug + Send + Sync {
    /// Get the channel's unique ID.
    fn id(&self) -> usize;

    /// Debug label of the channel.
    fn label(&self) -> &str;

    /// Read the nearest published value, falling back to the default.
    fn read_erased(&self) -> ErasedValue;

    /// Publish a value of the channel's type. Values of any other type
    /// are rejected and nothing is published.
    #[doc(hidden)]
    fn publish_erased(&self, runtime: &ReactiveRuntime, slot: usize, value: ErasedValue)
        -> Option<Frame>;

    /// Access the concrete channel for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Clone + PartialEq + Send + Sync + 'static> ErasedChannel for Channel<T> {
    fn id(&self) -> usize {
        self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn read_erased(&self) -> ErasedValue {
        self.lookup_erased()
            .unwrap_or_else(|| Arc::clone(&self.default) as ErasedValue)
    }

    fn publish_erased(
        &self,
        runtime: &ReactiveRuntime,
        slot: usize,
        value: ErasedValue,
    ) -> Option<Frame> {
        match value.downcast::<T>() {
            Ok(value) => Some(self.publish_arc(runtime, slot, value)),
            Err(_) => {
                tracing::error!(label = %self.label, "published value has the wrong type");
                None
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
