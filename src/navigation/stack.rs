use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::tabs::TabBarItem;

use super::surface::{Surface, SurfaceRef};

/// How a secondary stack is shown over its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalStyle {
    /// Partial sheet anchored at a surface; a swipe closes it.
    Popover,
    /// Covers the host entirely; only an explicit dismiss closes it.
    FullScreenCover,
}

impl ModalStyle {
    pub fn dismissible_by_gesture(self) -> bool {
        matches!(self, ModalStyle::Popover)
    }
}

/// A stack currently shown modally over another one.
#[derive(Clone)]
pub struct Presentation {
    pub stack: Rc<NavigationStack>,
    pub style: ModalStyle,
    pub anchor: Weak<dyn Surface>,
}

impl std::fmt::Debug for Presentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presentation")
            .field("stack", &self.stack.label())
            .field("style", &self.style)
            .field("anchored", &(self.anchor.strong_count() > 0))
            .finish()
    }
}

#[derive(Clone)]
struct StackEntry {
    surface: SurfaceRef,
    hides_tab_bar: bool,
}

/// Ordered stack of surfaces with at most one modal presentation on top.
///
/// The root entry is never popped; `pop_to_root` and `set_surfaces` are the
/// only ways to replace it.
pub struct NavigationStack {
    label: String,
    entries: RefCell<Vec<StackEntry>>,
    presented: RefCell<Option<Presentation>>,
    tab_item: RefCell<Option<TabBarItem>>,
}

impl NavigationStack {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: RefCell::new(Vec::new()),
            presented: RefCell::new(None),
            tab_item: RefCell::new(None),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn push(&self, surface: SurfaceRef, hides_tab_bar: bool) {
        self.entries.borrow_mut().push(StackEntry {
            surface,
            hides_tab_bar,
        });
    }

    /// Pops the top surface, keeping the root in place.
    pub fn pop(&self) -> Option<SurfaceRef> {
        let mut entries = self.entries.borrow_mut();
        if entries.len() <= 1 {
            return None;
        }
        entries.pop().map(|entry| entry.surface)
    }

    /// Pops everything above the root and returns it, top first.
    pub fn pop_to_root(&self) -> Vec<SurfaceRef> {
        let popped: Vec<StackEntry> = {
            let mut entries = self.entries.borrow_mut();
            if entries.len() <= 1 {
                return Vec::new();
            }
            entries.drain(1..).collect()
        };
        popped.into_iter().rev().map(|entry| entry.surface).collect()
    }

    /// Replaces the whole stack. Entries start with the tab bar visible.
    pub fn set_surfaces(&self, surfaces: Vec<SurfaceRef>) {
        let replaced: Vec<StackEntry> = surfaces
            .into_iter()
            .map(|surface| StackEntry {
                surface,
                hides_tab_bar: false,
            })
            .collect();
        let previous = self.entries.replace(replaced);
        drop(previous);
    }

    pub fn top(&self) -> Option<SurfaceRef> {
        self.entries
            .borrow()
            .last()
            .map(|entry| Rc::clone(&entry.surface))
    }

    pub fn root(&self) -> Option<SurfaceRef> {
        self.entries
            .borrow()
            .first()
            .map(|entry| Rc::clone(&entry.surface))
    }

    pub fn depth(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn titles(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .map(|entry| entry.surface.title().to_string())
            .collect()
    }

    /// Whether the tab bar is hidden while the top surface is showing.
    pub fn tab_bar_hidden(&self) -> bool {
        self.entries
            .borrow()
            .last()
            .is_some_and(|entry| entry.hides_tab_bar)
    }

    pub fn hides_tab_bar_at(&self, index: usize) -> Option<bool> {
        self.entries
            .borrow()
            .get(index)
            .map(|entry| entry.hides_tab_bar)
    }

    /// Shows `presentation` over this stack, returning whatever it replaced.
    pub fn present(&self, presentation: Presentation) -> Option<Presentation> {
        self.presented.replace(Some(presentation))
    }

    pub fn presented(&self) -> Option<Presentation> {
        self.presented.borrow().clone()
    }

    pub fn is_presenting(&self) -> bool {
        self.presented.borrow().is_some()
    }

    pub fn dismiss_presented(&self) -> Option<Presentation> {
        self.presented.borrow_mut().take()
    }

    /// Swipe-down on the presented stack. Full-screen covers ignore it.
    pub fn dismiss_by_gesture(&self) -> bool {
        let dismissible = self
            .presented
            .borrow()
            .as_ref()
            .is_some_and(|presentation| presentation.style.dismissible_by_gesture());
        if dismissible {
            let dismissed = self.dismiss_presented();
            drop(dismissed);
        }
        dismissible
    }

    pub fn tab_item(&self) -> Option<TabBarItem> {
        self.tab_item.borrow().clone()
    }

    pub fn set_tab_item(&self, item: TabBarItem) {
        *self.tab_item.borrow_mut() = Some(item);
    }
}

impl Surface for NavigationStack {
    fn title(&self) -> &str {
        &self.label
    }
}

impl std::fmt::Debug for NavigationStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationStack")
            .field("label", &self.label)
            .field("titles", &self.titles())
            .field("presenting", &self.is_presenting())
            .finish()
    }
}
