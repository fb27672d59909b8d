//! Small flows and surfaces shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::Result;
use crate::flow::{FlowController, FlowCore};
use crate::navigation::Surface;
use crate::scope::{DependencyScope, ModuleList};

type StartHook<R> = Box<dyn FnOnce(&Rc<ProbeFlow<R>>) -> Result<()>>;

/// Flow whose behaviour on start is supplied by the test.
pub(crate) struct ProbeFlow<R: 'static> {
    core: FlowCore<R>,
    modules: RefCell<Option<ModuleList>>,
    on_start: RefCell<Option<StartHook<R>>>,
    starts: Cell<usize>,
}

impl<R: 'static> ProbeFlow<R> {
    /// Unscoped flow.
    pub(crate) fn plain(label: impl Into<String>) -> Rc<Self> {
        Rc::new(Self::build(FlowCore::new(label), None))
    }

    /// Flow that asks for a child scope built from `modules`.
    pub(crate) fn scoped(label: impl Into<String>, modules: ModuleList) -> Rc<Self> {
        Rc::new(Self::build(FlowCore::new(label), Some(modules)))
    }

    /// Tree root that owns a root scope from the start.
    pub(crate) fn root(modules: ModuleList) -> Rc<Self> {
        let scope = DependencyScope::root("root", modules);
        Rc::new(Self::build(FlowCore::with_scope("root", scope), None))
    }

    fn build(core: FlowCore<R>, modules: Option<ModuleList>) -> Self {
        Self {
            core,
            modules: RefCell::new(modules),
            on_start: RefCell::new(None),
            starts: Cell::new(0),
        }
    }

    pub(crate) fn set_on_start<F>(&self, hook: F)
    where
        F: FnOnce(&Rc<Self>) -> Result<()> + 'static,
    {
        *self.on_start.borrow_mut() = Some(Box::new(hook));
    }

    pub(crate) fn starts(&self) -> usize {
        self.starts.get()
    }
}

impl<R: 'static> FlowController for ProbeFlow<R> {
    type Output = R;

    fn core(&self) -> &FlowCore<R> {
        &self.core
    }

    fn modules(&self) -> Option<ModuleList> {
        self.modules.borrow_mut().take()
    }

    fn start(self: Rc<Self>) -> Result<()> {
        self.starts.set(self.starts.get() + 1);
        let hook = self.on_start.borrow_mut().take();
        match hook {
            Some(hook) => hook(&self),
            None => Ok(()),
        }
    }
}

/// Surface with nothing but a title.
#[derive(Debug)]
pub(crate) struct StubSurface {
    title: String,
}

impl StubSurface {
    pub(crate) fn new(title: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            title: title.into(),
        })
    }
}

impl Surface for StubSurface {
    fn title(&self) -> &str {
        &self.title
    }
}
