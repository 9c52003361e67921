use super::View;
use crate::error::Result;
use crate::factory::Aggregate;
use crate::runtime::{scope, Frame, ReactiveRuntime};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Publishes one channel's share of an aggregate value.
pub(crate) trait Publisher<A>: Send + Sync {
    fn publish(&self, runtime: &ReactiveRuntime, slot: usize, value: &A) -> Option<Frame>;
}

/// A provider component definition.
///
/// Returned by the context factories. Each [`mount`](Provider::mount)
/// creates an independent provider instance with its own publish scope,
/// so the same definition can be nested or used side by side.
pub struct Provider<A: Aggregate> {
    display_name: Arc<str>,
    default: Arc<A>,
    publishers: Arc<[Arc<dyn Publisher<A>>]>,
}

impl<A: Aggregate> Provider<A> {
    pub(crate) fn new(
        display_name: impl Into<Arc<str>>,
        default: A,
        publishers: Vec<Arc<dyn Publisher<A>>>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            default: Arc::new(default),
            publishers: publishers.into(),
        }
    }

    /// Debug name, e.g. `ThemeProvider`.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn default_value(&self) -> &A {
        &self.default
    }

    /// Number of channels each instance publishes on.
    pub fn channel_count(&self) -> usize {
        self.publishers.len()
    }

    /// Create a provider instance around `children` in the current runtime.
    ///
    /// Nothing is published until the instance is rendered.
    pub fn mount(&self, children: Vec<Arc<dyn View>>) -> Arc<ProviderNode<A>> {
        let runtime = ReactiveRuntime::current();
        let slots = self.publishers.iter().map(|_| runtime.next_id()).collect();

        Arc::new(ProviderNode {
            provider: self.clone(),
            slots,
            children,
            props: Mutex::new(A::Props::default()),
            runtime,
        })
    }
}

impl<A: Aggregate> Clone for Provider<A> {
    fn clone(&self) -> Self {
        Self {
            display_name: Arc::clone(&self.display_name),
            default: Arc::clone(&self.default),
            publishers: Arc::clone(&self.publishers),
        }
    }
}

impl<A: Aggregate + fmt::Debug> fmt::Debug for Provider<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("display_name", &self.display_name)
            .field("default", &self.default)
            .field("channels", &self.publishers.len())
            .finish()
    }
}

/// A mounted provider instance.
///
/// [`render`](ProviderNode::render) merges new props over the default,
/// publishes the result and reconciles the children inside the new scope.
/// Children re-render only if a value they read actually changed.
pub struct ProviderNode<A: Aggregate> {
    provider: Provider<A>,
    slots: Vec<usize>,
    children: Vec<Arc<dyn View>>,
    props: Mutex<A::Props>,
    runtime: Arc<ReactiveRuntime>,
}

impl<A: Aggregate> ProviderNode<A> {
    /// Render with new props.
    pub fn render(&self, props: A::Props) -> Result<()> {
        *self.props.lock().unwrap_or_else(PoisonError::into_inner) = props.clone();
        self.reconcile(&props)
    }

    /// The aggregate this instance publishes for its current props.
    pub fn value(&self) -> A {
        let props = self.current_props();
        self.provider.default.merge(&props)
    }

    pub fn display_name(&self) -> &str {
        self.provider.display_name()
    }

    pub fn children(&self) -> &[Arc<dyn View>] {
        &self.children
    }

    fn current_props(&self) -> A::Props {
        self.props
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn reconcile(&self, props: &A::Props) -> Result<()> {
        let value = self.provider.default.merge(props);
        let runtime = &self.runtime;

        ReactiveRuntime::with_runtime(Arc::clone(runtime), || {
            let frames: Vec<Frame> = self
                .provider
                .publishers
                .iter()
                .zip(&self.slots)
                .filter_map(|(publisher, &slot)| publisher.publish(runtime, slot, &value))
                .collect();
            tracing::debug!(
                provider = %self.provider.display_name,
                channels = frames.len(),
                children = self.children.len(),
                "reconciling"
            );

            scope::with_frames(&frames, || {
                self.children.iter().try_for_each(|child| child.update())
            })
        })
    }
}

impl<A: Aggregate> View for ProviderNode<A> {
    fn update(&self) -> Result<()> {
        let props = self.current_props();
        self.reconcile(&props)
    }
}

impl<A: Aggregate> Drop for ProviderNode<A> {
    fn drop(&mut self) {
        let inner = self.runtime.inner();
        for &slot in &self.slots {
            inner.release_slot(slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::factory::create_context_helper;

    crate::aggregate! {
        #[derive(Debug)]
        struct Counter => CounterProps {
            count: i32,
        }
    }

    #[test]
    fn instance_exposes_definition_and_children() {
        ReactiveRuntime::scope(|| {
            let (provider, _, _) = create_context_helper("Counter", Counter { count: 3 });
            let leaf = Component::new("Leaf", || Ok(()));
            let node = provider.mount(vec![leaf.clone()]);

            assert_eq!(provider.default_value(), &Counter { count: 3 });
            assert_eq!(node.display_name(), "CounterProvider");
            assert_eq!(node.children().len(), 1);
            assert_eq!(node.value(), Counter { count: 3 });
        });
    }

    #[test]
    fn dropping_a_subtree_releases_slots_and_subscriptions() {
        ReactiveRuntime::scope(|| {
            let runtime = ReactiveRuntime::current();
            let (provider, use_counter, _) = create_context_helper("Counter", Counter { count: 0 });
            let reader = Component::new("Reader", move || use_counter.use_context().map(|_| ()));
            let node = provider.mount(vec![reader.clone()]);
            node.render(CounterProps { count: Some(1) }).unwrap();

            let slot = node.slots[0];
            assert_eq!(runtime.subscriber_count(slot), 1);

            drop(reader);
            assert_eq!(runtime.subscriber_count(slot), 1);
            drop(node);
            assert_eq!(runtime.subscriber_count(slot), 0);
            assert!(runtime.slot_value(slot).is_none());
        });
    }

    /// Renders its child only while one is mounted.
    struct Conditional {
        child: Mutex<Option<Arc<dyn View>>>,
    }

    impl View for Conditional {
        fn update(&self) -> Result<()> {
            let child = self.child.lock().unwrap().clone();
            child.map_or(Ok(()), |child| child.update())
        }
    }

    #[test]
    fn unmounted_consumer_no_longer_rerenders() {
        ReactiveRuntime::scope(|| {
            let runtime = ReactiveRuntime::current();
            let (provider, use_counter, _) = create_context_helper("Counter", Counter { count: 0 });
            let renders = Arc::new(std::sync::atomic::AtomicUsize::new(0));
            let reader = Component::new("Reader", {
                let renders = Arc::clone(&renders);
                move || {
                    renders.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    use_counter.use_context().map(|_| ())
                }
            });
            let conditional = Arc::new(Conditional {
                child: Mutex::new(Some(reader as Arc<dyn View>)),
            });
            let node = provider.mount(vec![conditional.clone()]);
            node.render(CounterProps::default()).unwrap();
            let slot = node.slots[0];
            assert_eq!(runtime.subscriber_count(slot), 1);

            conditional.child.lock().unwrap().take();
            assert_eq!(runtime.subscriber_count(slot), 0);

            node.render(CounterProps { count: Some(5) }).unwrap();
            assert_eq!(renders.load(std::sync::atomic::Ordering::SeqCst), 1);
            assert_eq!(runtime.subscriber_count(slot), 0);
        });
    }
}
