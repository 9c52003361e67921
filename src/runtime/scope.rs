//! Thread-local render scope.
//!
//! While a provider reconciles its children it pushes one [`Frame`] per
//! channel it publishes. Consumers resolve a channel by walking the stack
//! from the top, so the nearest enclosing provider wins. The stack also
//! tracks which component instance is rendering and its hook cursor.

use std::cell::RefCell;
use std::sync::Arc;

use super::RuntimeInner;

/// A publish frame: `channel` is visible to nested content through `slot`
/// of the publishing provider's `runtime`.
#[derive(Clone, Debug)]
pub struct Frame {
    pub channel: usize,
    pub slot: usize,
    pub runtime: Arc<RuntimeInner>,
}

/// The component instance currently rendering and the runtime it belongs to.
#[derive(Clone)]
pub(crate) struct Observer {
    pub id: usize,
    pub runtime: Arc<RuntimeInner>,
}

struct ObserverFrame {
    observer: Observer,
    next_hook: usize,
}

#[derive(Default)]
struct RenderScope {
    frames: Vec<Frame>,
    observers: Vec<ObserverFrame>,
}

thread_local! {
    static RENDER_SCOPE: RefCell<RenderScope> = RefCell::new(RenderScope::default());
}

/// Pops everything pushed above `depth` when dropped, including on unwind.
struct FramesGuard {
    depth: usize,
}

impl Drop for FramesGuard {
    fn drop(&mut self) {
        RENDER_SCOPE.with(|scope| scope.borrow_mut().frames.truncate(self.depth));
    }
}

struct ObserverGuard;

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        RENDER_SCOPE.with(|scope| {
            scope.borrow_mut().observers.pop();
        });
    }
}

/// Run `f` with `frames` pushed on top of the current scope.
pub(crate) fn with_frames<R>(frames: &[Frame], f: impl FnOnce() -> R) -> R {
    let depth = RENDER_SCOPE.with(|scope| {
        let mut scope = scope.borrow_mut();
        let depth = scope.frames.len();
        scope.frames.extend_from_slice(frames);
        depth
    });
    let _guard = FramesGuard { depth };
    f()
}

/// Run `f` as the render pass of component instance `id`.
pub(crate) fn with_observer<R>(
    id: usize,
    runtime: Arc<RuntimeInner>,
    f: impl FnOnce() -> R,
) -> R {
    RENDER_SCOPE.with(|scope| {
        scope.borrow_mut().observers.push(ObserverFrame {
            observer: Observer { id, runtime },
            next_hook: 0,
        });
    });
    let _guard = ObserverGuard;
    f()
}

/// The component instance currently rendering on this thread.
pub(crate) fn current_observer() -> Option<Observer> {
    RENDER_SCOPE.with(|scope| {
        scope
            .borrow()
            .observers
            .last()
            .map(|frame| frame.observer.clone())
    })
}

/// Claim the next hook index of the rendering instance.
pub(crate) fn next_hook() -> Option<(usize, usize)> {
    RENDER_SCOPE.with(|scope| {
        let mut scope = scope.borrow_mut();
        let observer = scope.observers.last_mut()?;
        let index = observer.next_hook;
        observer.next_hook += 1;
        Some((observer.observer.id, index))
    })
}

/// The nearest frame publishing `channel`.
pub(crate) fn nearest(channel: usize) -> Option<Frame> {
    RENDER_SCOPE.with(|scope| {
        scope
            .borrow()
            .frames
            .iter()
            .rev()
            .find(|frame| frame.channel == channel)
            .cloned()
    })
}
