use std::cell::{Cell, RefCell};

use crate::navigation::SurfaceRef;

/// Top-level container the application shows its root surface in.
#[derive(Default)]
pub struct Window {
    root: RefCell<Option<SurfaceRef>>,
    visible: Cell<bool>,
}

impl Window {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `surface` as the root, returning the one it replaced.
    pub fn set_root(&self, surface: SurfaceRef) -> Option<SurfaceRef> {
        self.root.replace(Some(surface))
    }

    pub fn root(&self) -> Option<SurfaceRef> {
        self.root.borrow().clone()
    }

    pub fn root_title(&self) -> Option<String> {
        self.root
            .borrow()
            .as_ref()
            .map(|surface| surface.title().to_string())
    }

    pub fn make_visible(&self) {
        self.visible.set(true);
    }

    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("root", &self.root_title())
            .field("visible", &self.visible.get())
            .finish()
    }
}
