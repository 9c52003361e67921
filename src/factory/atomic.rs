use super::{AtomicAggregate, Selected};
use crate::channel::{ChannelMap, ErasedChannel};
use crate::component::{Provider, Publisher};
use crate::runtime::{Frame, ReactiveRuntime};
use std::marker::PhantomData;
use std::sync::Arc;

/// Publishes one field of the merged aggregate on that field's channel.
struct FieldPublisher {
    key: &'static str,
    channel: Arc<dyn ErasedChannel>,
}

impl<A: AtomicAggregate> Publisher<A> for FieldPublisher {
    fn publish(&self, runtime: &ReactiveRuntime, slot: usize, value: &A) -> Option<Frame> {
        let Some(field) = value.field(self.key) else {
            tracing::error!(key = self.key, label = self.channel.label(), "aggregate has no such field");
            return None;
        };
        self.channel.publish_erased(runtime, slot, field)
    }
}

/// Selector-based accessor of an atomic context.
///
/// A component subscribes only to the channels of the fields it selects,
/// so changes to other fields never re-render it. The selector a component
/// instance first renders with is kept for the instance's lifetime.
pub struct AtomicAccessor<A> {
    prefix: Arc<str>,
    channels: ChannelMap,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A: AtomicAggregate> AtomicAccessor<A> {
    /// Read the selected fields, or every field when `selector` is `None`.
    ///
    /// Within a component render the first selector is remembered; a later
    /// render passing a different one logs an error and keeps the first.
    /// A name with no channel logs an error and is bound as undefined.
    pub fn use_context(&self, selector: Option<&[&str]>) -> Selected {
        let requested: Vec<String> = match selector {
            Some(keys) => keys.iter().map(|key| key.to_string()).collect(),
            None => self.channels.keys().map(str::to_string).collect(),
        };
        let selector = self.stable_selector(requested);

        let mut selected = Selected::default();
        for key in selector {
            match self.channels.get(&key) {
                Some(channel) => {
                    let value = channel.read_erased();
                    selected.bind(key, Some(value));
                }
                None => {
                    tracing::error!("{}Context.{} is not defined", self.prefix, key);
                    selected.bind(key, None);
                }
            }
        }
        selected
    }

    /// Read the given fields.
    pub fn select(&self, selector: &[&str]) -> Selected {
        self.use_context(Some(selector))
    }

    /// Read every field.
    pub fn use_all(&self) -> Selected {
        self.use_context(None)
    }

    /// Read one field with its concrete type.
    ///
    /// Subscribes to that field's channel only and takes no part in
    /// selector tracking. An unknown field, or a `T` that is not the
    /// field's type, is logged and yields `None`.
    pub fn use_field<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + PartialEq + Send + Sync + 'static,
    {
        if let Some(channel) = self.channels.typed::<T>(key) {
            return Some(channel.read());
        }
        if self.channels.contains_key(key) {
            tracing::error!(
                requested = std::any::type_name::<T>(),
                "{}Context.{} holds a different type",
                self.prefix,
                key
            );
        } else {
            tracing::error!("{}Context.{} is not defined", self.prefix, key);
        }
        None
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn stable_selector(&self, requested: Vec<String>) -> Vec<String> {
        let runtime = ReactiveRuntime::current();
        let Some(remembered) = runtime.use_hook(|| requested.clone()) else {
            return requested;
        };
        if *remembered != requested {
            tracing::error!(
                "{}Context.useContext: selector has been changed which is not allowed.",
                self.prefix
            );
        }
        Vec::clone(&remembered)
    }
}

impl<A> Clone for AtomicAccessor<A> {
    fn clone(&self) -> Self {
        Self {
            prefix: Arc::clone(&self.prefix),
            channels: self.channels.clone(),
            _aggregate: PhantomData,
        }
    }
}

/// Create a context that publishes every field on its own channel.
///
/// One channel is created per key of `default`, labelled
/// `{prefix}Context.{key}` and defaulting to that field's value. Returns
/// the provider definition, the selector-based accessor, and the channels.
///
/// # Examples
///
/// ```
/// use context_helper::{aggregate, create_atomic_context_helper};
///
/// aggregate! {
///     pub struct Editor => EditorProps {
///         pub path: String,
///         pub dirty: bool,
///     }
/// }
///
/// let (provider, use_editor, channels) = create_atomic_context_helper(
///     "Editor",
///     Editor { path: "main.rs".into(), dirty: false },
/// );
///
/// assert_eq!(provider.display_name(), "EditorProvider");
/// assert_eq!(channels.get("dirty").unwrap().label(), "EditorContext.dirty");
///
/// let selected = use_editor.select(&["path"]);
/// assert_eq!(selected.get::<String>("path").as_deref(), Some("main.rs"));
/// assert!(!selected.contains_key("dirty"));
/// ```
pub fn create_atomic_context_helper<A: AtomicAggregate>(
    prefix: &str,
    default: A,
) -> (Provider<A>, AtomicAccessor<A>, ChannelMap) {
    let mut channels = ChannelMap::default();
    let mut publishers: Vec<Arc<dyn Publisher<A>>> = Vec::with_capacity(A::KEYS.len());

    for &key in A::KEYS {
        let label = format!("{prefix}Context.{key}");
        let Some(channel) = default.channel_for(key, &label) else {
            tracing::error!(key, "aggregate lists a key it cannot build a channel for");
            continue;
        };
        channels.insert(key, Arc::clone(&channel));
        publishers.push(Arc::new(FieldPublisher { key, channel }));
    }
    tracing::debug!(prefix, channels = channels.len(), "created atomic context");

    let provider = Provider::new(format!("{prefix}Provider"), default, publishers);
    let accessor = AtomicAccessor {
        prefix: Arc::from(prefix),
        channels: channels.clone(),
        _aggregate: PhantomData,
    };

    (provider, accessor, channels)
}
