use std::cell::{Cell, RefCell};

/// Handler invoked with a flow's result.
pub type CompletionHandler<R> = Box<dyn FnOnce(R)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionState {
    /// Completion has not been reported yet.
    Pending,
    /// Completion was reported; later reports are ignored.
    Fired,
    /// The owning parent released the flow before it completed.
    Detached,
}

/// Single-fire completion cell.
///
/// The handler belongs to whoever listens for the result. The release hook
/// belongs to the parent that owns the flow and always runs after the
/// handler, so setting the handler late never skips the release.
pub struct CompletionSlot<R> {
    handler: RefCell<Option<CompletionHandler<R>>>,
    release: RefCell<Option<Box<dyn FnOnce()>>>,
    state: Cell<CompletionState>,
}

impl<R> Default for CompletionSlot<R> {
    fn default() -> Self {
        Self {
            handler: RefCell::new(None),
            release: RefCell::new(None),
            state: Cell::new(CompletionState::Pending),
        }
    }
}

impl<R: 'static> CompletionSlot<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CompletionState {
        self.state.get()
    }

    pub fn is_pending(&self) -> bool {
        self.state.get() == CompletionState::Pending
    }

    pub fn has_handler(&self) -> bool {
        self.handler.borrow().is_some()
    }

    /// Replaces the handler. A handler set after the slot fired is dropped.
    pub fn set_handler(&self, handler: CompletionHandler<R>) {
        if !self.is_pending() {
            return;
        }
        let previous = self.handler.replace(Some(handler));
        drop(previous);
    }

    pub(crate) fn set_release(&self, hook: Box<dyn FnOnce()>) {
        if !self.is_pending() {
            return;
        }
        let previous = self.release.replace(Some(hook));
        drop(previous);
    }

    /// Reports `value`. Returns `false` when the slot already fired or was
    /// detached, in which case nothing runs.
    pub fn fire(&self, value: R) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.state.set(CompletionState::Fired);

        let handler = self.handler.borrow_mut().take();
        if let Some(handler) = handler {
            handler(value);
        }
        let release = self.release.borrow_mut().take();
        if let Some(release) = release {
            release();
        }
        true
    }

    /// Disarms the slot without running anything.
    pub(crate) fn detach(&self) {
        if self.is_pending() {
            self.state.set(CompletionState::Detached);
        }
        let handler = self.handler.borrow_mut().take();
        let release = self.release.borrow_mut().take();
        drop((handler, release));
    }
}
