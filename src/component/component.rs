use crate::error::Result;
use crate::runtime::{scope, ReactiveRuntime};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// A node of the render tree.
pub trait View: Send + Sync {
    /// Reconcile this node: render it if it needs to, then its children.
    fn update(&self) -> Result<()>;
}

type RenderFn = dyn Fn() -> Result<()> + Send + Sync;

/// A leaf component instance.
///
/// The first [`update`](View::update) mounts the instance by running its
/// render closure. Later updates skip the closure unless a channel value it
/// read has changed or [`invalidate`](Component::invalidate) was called.
/// Dropping the instance unmounts it and releases its subscriptions.
///
/// # Examples
///
/// ```
/// use context_helper::{Component, View};
///
/// let component = Component::new("Greeting", || Ok(()));
/// component.update().unwrap();
/// component.update().unwrap();
/// assert_eq!(component.render_count(), 1);
///
/// component.invalidate();
/// component.update().unwrap();
/// assert_eq!(component.render_count(), 2);
/// ```
pub struct Component {
    id: usize,
    name: Arc<str>,
    render_fn: Box<RenderFn>,
    runtime: Arc<ReactiveRuntime>,
    mounted: AtomicBool,
    renders: AtomicUsize,
}

impl Component {
    /// Create an unmounted instance in the current runtime.
    pub fn new<F>(name: impl Into<Arc<str>>, render: F) -> Arc<Self>
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        let runtime = ReactiveRuntime::current();
        let id = runtime.next_id();

        Arc::new(Self {
            id,
            name: name.into(),
            render_fn: Box::new(render),
            runtime,
            mounted: AtomicBool::new(false),
            renders: AtomicUsize::new(0),
        })
    }

    /// Get the instance's unique ID.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// How many times the render closure has run.
    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    /// Whether a render has completed successfully.
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Force a re-render on the next update.
    pub fn invalidate(&self) {
        self.runtime.mark_dirty(self.id);
    }

    fn run_render(&self) -> Result<()> {
        let runtime = &self.runtime;
        ReactiveRuntime::with_runtime(Arc::clone(runtime), || {
            runtime.begin_render(self.id);
            scope::with_observer(self.id, runtime.inner(), || (self.render_fn)())
        })
    }
}

impl View for Component {
    fn update(&self) -> Result<()> {
        if self.is_mounted() && !self.runtime.take_dirty(self.id) {
            return Ok(());
        }

        tracing::trace!(component = %self.name, id = self.id, "rendering");
        let result = self.run_render();
        self.renders.fetch_add(1, Ordering::SeqCst);

        match result {
            Ok(()) => {
                self.mounted.store(true, Ordering::SeqCst);
                Ok(())
            }
            Err(err) => {
                tracing::debug!(component = %self.name, error = %err, "render failed");
                // A first render that failed leaves no state behind.
                if !self.is_mounted() {
                    self.runtime.reset_hooks(self.id);
                }
                Err(err)
            }
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("renders", &self.render_count())
            .finish_non_exhaustive()
    }
}

impl Drop for Component {
    fn drop(&mut self) {
        self.runtime.inner().remove_observer(self.id);
    }
}
