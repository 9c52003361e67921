use super::{Channel, ErasedChannel};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Ordered mapping from field name to that field's channel.
///
/// Iteration follows the key order of the aggregate the map was built from.
#[derive(Clone, Default)]
pub struct ChannelMap {
    channels: IndexMap<&'static str, Arc<dyn ErasedChannel>>,
}

impl ChannelMap {
    pub(crate) fn insert(&mut self, key: &'static str, channel: Arc<dyn ErasedChannel>) {
        self.channels.insert(key, channel);
    }

    /// Look up the channel of a field.
    pub fn get(&self, key: &str) -> Option<&Arc<dyn ErasedChannel>> {
        self.channels.get(key)
    }

    /// Look up the channel of a field with its concrete value type.
    ///
    /// Returns `None` if the field is unknown or holds a different type.
    pub fn typed<T>(&self, key: &str) -> Option<Channel<T>>
    where
        T: Clone + PartialEq + Send + Sync + 'static,
    {
        self.get(key)?.as_any().downcast_ref::<Channel<T>>().cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.channels.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.channels.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Arc<dyn ErasedChannel>)> + '_ {
        self.channels.iter().map(|(key, channel)| (*key, channel))
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl fmt::Debug for ChannelMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.channels.iter().map(|(key, channel)| (key, channel.label())))
            .finish()
    }
}
