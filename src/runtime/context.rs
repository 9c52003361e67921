use std::any::Any;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::scope;

/// A type-erased value held by a publish slot or a hook.
pub type ErasedValue = Arc<dyn Any + Send + Sync>;

// Slot and instance ids are process-wide, so a frame or a subscription can
// refer to any runtime without its ids colliding with another runtime's.
static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// Subscription graph and per-instance state of one runtime.
struct ReactiveContext {
    // Map from slot ID to the components that read it, with their runtimes
    dependencies: HashMap<usize, HashMap<usize, Weak<RuntimeInner>>>,
    // Map from component ID to the slots it reads, with their runtimes
    observer_deps: HashMap<usize, HashMap<usize, Weak<RuntimeInner>>>,
    // Components that must re-render on their next update
    dirty: HashSet<usize>,
    // Per-component hook storage, in call order
    hooks: HashMap<usize, Vec<ErasedValue>>,
    // Latest value published into each slot
    slots: HashMap<usize, ErasedValue>,
}

impl ReactiveContext {
    fn new() -> Self {
        Self {
            dependencies: HashMap::new(),
            observer_deps: HashMap::new(),
            dirty: HashSet::new(),
            hooks: HashMap::new(),
            slots: HashMap::new(),
        }
    }

    fn clear(&mut self) {
        self.dependencies.clear();
        self.observer_deps.clear();
        self.dirty.clear();
        self.hooks.clear();
        self.slots.clear();
    }
}

/// Inner runtime state that can be shared.
///
/// Publish slots live in the runtime of the provider instance that owns
/// them. A component may read slots of other runtimes; the slot's runtime
/// records the reader together with the reader's runtime, where its dirty
/// mark is kept.
pub struct RuntimeInner {
    context: Mutex<ReactiveContext>,
}

impl RuntimeInner {
    fn new() -> Self {
        Self {
            context: Mutex::new(ReactiveContext::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ReactiveContext> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forget a component instance: its subscriptions, hooks and dirty mark.
    pub fn remove_observer(&self, observer_id: usize) {
        self.unsubscribe(observer_id);
        let mut ctx = self.lock();
        ctx.hooks.remove(&observer_id);
        ctx.dirty.remove(&observer_id);
    }

    /// Drop a publish slot and its subscriber list.
    pub fn release_slot(&self, slot_id: usize) {
        let mut ctx = self.lock();
        ctx.slots.remove(&slot_id);
        ctx.dependencies.remove(&slot_id);
    }

    /// Subscribe `observer`, a component of `observer_runtime`, to a slot
    /// of this runtime.
    pub fn track_read(
        self: &Arc<Self>,
        slot_id: usize,
        observer: usize,
        observer_runtime: &Arc<RuntimeInner>,
    ) {
        self.lock()
            .dependencies
            .entry(slot_id)
            .or_default()
            .insert(observer, Arc::downgrade(observer_runtime));
        observer_runtime
            .lock()
            .observer_deps
            .entry(observer)
            .or_default()
            .insert(slot_id, Arc::downgrade(self));
    }

    /// Mark every component that read `slot_id` as dirty in its own runtime.
    pub fn notify_observers(&self, slot_id: usize) {
        // Collected first: an observer may live in this runtime.
        let observers: Vec<(usize, Weak<RuntimeInner>)> = self
            .lock()
            .dependencies
            .get(&slot_id)
            .map(|obs| obs.iter().map(|(&id, rt)| (id, rt.clone())).collect())
            .unwrap_or_default();

        for (observer_id, runtime) in observers {
            let Some(runtime) = runtime.upgrade() else {
                continue;
            };
            tracing::trace!(slot = slot_id, component = observer_id, "marking dirty");
            runtime.lock().dirty.insert(observer_id);
        }
    }

    /// Replace the value of a publish slot, notifying readers if `changed`
    /// reports a difference from the previous value.
    pub fn publish<F>(&self, slot_id: usize, value: ErasedValue, changed: F) -> bool
    where
        F: FnOnce(&ErasedValue) -> bool,
    {
        let changed = {
            let mut ctx = self.lock();
            let changed = ctx.slots.get(&slot_id).map_or(true, changed);
            ctx.slots.insert(slot_id, value);
            changed
        };
        if changed {
            self.notify_observers(slot_id);
        }
        changed
    }

    /// Current value of a publish slot.
    pub fn slot_value(&self, slot_id: usize) -> Option<ErasedValue> {
        self.lock().slots.get(&slot_id).cloned()
    }

    fn unsubscribe(&self, observer_id: usize) {
        let Some(old_deps) = self.lock().observer_deps.remove(&observer_id) else {
            return;
        };
        for (slot_id, runtime) in old_deps {
            let Some(runtime) = runtime.upgrade() else {
                continue;
            };
            if let Some(deps) = runtime.lock().dependencies.get_mut(&slot_id) {
                deps.remove(&observer_id);
            };
        }
    }

    fn clear(&self) {
        self.lock().clear();
    }
}

impl fmt::Debug for RuntimeInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ctx = self.lock();
        f.debug_struct("RuntimeInner")
            .field("slots", &ctx.slots.len())
            .field("observers", &ctx.observer_deps.len())
            .field("dirty", &ctx.dirty.len())
            .finish_non_exhaustive()
    }
}

/// Hybrid render runtime for providers and consumers.
///
/// Supports both a global runtime (default) and scoped runtimes for isolation.
/// The runtime tracks which component instances read which publish slots,
/// marks readers dirty when a slot receives a different value, and keeps
/// per-instance hook state across renders.
///
/// # Examples
///
/// Using the default global runtime:
///
/// ```
/// use context_helper::Channel;
///
/// let channel = Channel::new("ThemeContext", 42);
/// assert_eq!(channel.read(), 42);
/// ```
///
/// Using scoped runtimes for isolation:
///
/// ```
/// use context_helper::runtime::ReactiveRuntime;
/// use context_helper::{Component, View};
///
/// ReactiveRuntime::scope(|| {
///     let component = Component::new("Leaf", || Ok(()));
///     component.update().unwrap();
///     assert_eq!(component.render_count(), 1);
/// });
/// // Runtime and all its state is dropped here
/// ```
pub struct ReactiveRuntime {
    inner: Arc<RuntimeInner>,
}

// Thread-local stack for scoped runtimes
thread_local! {
    static RUNTIME_STACK: RefCell<Vec<Arc<ReactiveRuntime>>> = const { RefCell::new(vec![]) };
}

impl ReactiveRuntime {
    /// Create a new isolated runtime.
    ///
    /// This creates a completely independent runtime with its own
    /// subscription graph. Useful for testing or creating isolated trees.
    pub fn new() -> Arc<Self> {
        Arc::new(ReactiveRuntime {
            inner: Arc::new(RuntimeInner::new()),
        })
    }

    /// Run a function with a fresh isolated runtime.
    ///
    /// The runtime and all its state is automatically cleaned up when
    /// the function returns, unless something created inside keeps it alive.
    ///
    /// # Examples
    ///
    /// ```
    /// use context_helper::runtime::ReactiveRuntime;
    /// use context_helper::Channel;
    ///
    /// ReactiveRuntime::scope(|| {
    ///     let channel = Channel::new("CountContext", 0);
    ///     assert_eq!(channel.read(), 0);
    /// });
    /// ```
    pub fn scope<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let runtime = Self::new();
        Self::with_runtime(runtime, f)
    }

    /// Get or create the global runtime (fallback).
    ///
    /// This is used as the default runtime when no scoped runtime is active.
    pub fn global() -> Arc<Self> {
        use std::sync::OnceLock;
        static RUNTIME: OnceLock<Arc<ReactiveRuntime>> = OnceLock::new();
        Arc::clone(RUNTIME.get_or_init(Self::new))
    }

    /// Get the current runtime (scoped or global fallback).
    ///
    /// Returns the runtime from the top of the thread-local stack,
    /// or the global runtime if no scoped runtime is active.
    pub fn current() -> Arc<Self> {
        RUNTIME_STACK.with(|stack| stack.borrow().last().cloned().unwrap_or_else(Self::global))
    }

    /// Run a function with a specific runtime as the current context.
    ///
    /// This pushes the runtime onto the thread-local stack for the duration
    /// of the function execution.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use context_helper::runtime::ReactiveRuntime;
    ///
    /// let runtime = ReactiveRuntime::new();
    /// ReactiveRuntime::with_runtime(runtime.clone(), || {
    ///     assert!(Arc::ptr_eq(&ReactiveRuntime::current(), &runtime));
    /// });
    /// ```
    pub fn with_runtime<F, R>(runtime: Arc<Self>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().push(runtime);
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });

        match result {
            Ok(r) => r,
            Err(e) => std::panic::resume_unwind(e),
        }
    }

    /// Clear all subscriptions, hooks, published values and dirty marks.
    ///
    /// Useful for resetting between tests. IDs are never reused, so
    /// instances created before the reset stay distinguishable.
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Get a reference to the inner runtime state.
    pub fn inner(&self) -> Arc<RuntimeInner> {
        Arc::clone(&self.inner)
    }

    /// Generate the next unique ID for a component instance or publish slot.
    ///
    /// IDs are unique across all runtimes of the process.
    pub fn next_id(&self) -> usize {
        NEXT_ID.fetch_add(1, Ordering::SeqCst)
    }

    /// Track a read of one of this runtime's slots by the rendering
    /// component, if any.
    pub fn track_read(&self, slot_id: usize) {
        let Some(observer) = scope::current_observer() else {
            return;
        };
        self.inner
            .track_read(slot_id, observer.id, &observer.runtime);
    }

    /// Mark every component that read `slot_id` as dirty.
    pub fn notify_observers(&self, slot_id: usize) {
        self.inner.notify_observers(slot_id);
    }

    /// Replace the value of a publish slot.
    ///
    /// `changed` compares the previous value with the new one; readers are
    /// only notified when it reports a change. The first publish into a
    /// slot always counts as a change. Returns whether readers were notified.
    pub fn publish<F>(&self, slot_id: usize, value: ErasedValue, changed: F) -> bool
    where
        F: FnOnce(&ErasedValue) -> bool,
    {
        self.inner.publish(slot_id, value, changed)
    }

    /// Current value of a publish slot.
    pub fn slot_value(&self, slot_id: usize) -> Option<ErasedValue> {
        self.inner.slot_value(slot_id)
    }

    /// Force a component to re-render on its next update.
    pub fn mark_dirty(&self, observer_id: usize) {
        self.inner.lock().dirty.insert(observer_id);
    }

    /// Check if a component is waiting to re-render.
    pub fn is_dirty(&self, observer_id: usize) -> bool {
        self.inner.lock().dirty.contains(&observer_id)
    }

    /// Consume the dirty mark of a component, returning whether it was set.
    pub fn take_dirty(&self, observer_id: usize) -> bool {
        self.inner.lock().dirty.remove(&observer_id)
    }

    /// Prepare a component for a render pass.
    ///
    /// Subscriptions are rebuilt by every render, so the old ones are dropped.
    pub fn begin_render(&self, observer_id: usize) {
        self.inner.unsubscribe(observer_id);
        self.inner.lock().dirty.remove(&observer_id);
    }

    /// Discard the hook state of a component, so its next render starts
    /// over as a first render.
    pub fn reset_hooks(&self, observer_id: usize) {
        self.inner.lock().hooks.remove(&observer_id);
    }

    /// Number of components subscribed to `slot_id`.
    pub fn subscriber_count(&self, slot_id: usize) -> usize {
        self.inner
            .lock()
            .dependencies
            .get(&slot_id)
            .map_or(0, HashMap::len)
    }

    /// Per-instance persistent storage for the rendering component.
    ///
    /// Hooks are identified by call order within a render. The first render
    /// stores `init()`; later renders get the stored value back. Returns
    /// `None` when called outside a component render.
    pub fn use_hook<T, F>(&self, init: F) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        let (observer, index) = scope::next_hook()?;

        let existing = self
            .inner
            .lock()
            .hooks
            .get(&observer)
            .and_then(|hooks| hooks.get(index).cloned());
        if let Some(existing) = existing {
            match existing.downcast::<T>() {
                Ok(value) => return Some(value),
                Err(_) => tracing::warn!(
                    component = observer,
                    hook = index,
                    "hook changed type between renders; reinitialising"
                ),
            }
        }

        let value = Arc::new(init());
        let mut ctx = self.inner.lock();
        let hooks = ctx.hooks.entry(observer).or_default();
        let erased: ErasedValue = Arc::clone(&value) as ErasedValue;
        if index < hooks.len() {
            hooks[index] = erased;
        } else {
            hooks.push(erased);
        }
        Some(value)
    }
}
