use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{FlowError, Result};
use crate::navigation::{NavigationStack, Surface};

use super::table::TabId;

/// A selection reported by the tab bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabSelection {
    pub index: usize,
    pub previous: Option<usize>,
}

impl TabSelection {
    /// The user tapped the tab that was already showing.
    pub fn is_reselection(&self) -> bool {
        self.previous == Some(self.index)
    }
}

type SelectionObserver = Rc<dyn Fn(TabSelection)>;

struct AttachedTab {
    id: TabId,
    stack: Rc<NavigationStack>,
}

/// Container surface holding one navigation stack per attached tab.
pub struct TabBar {
    tabs: RefCell<Vec<AttachedTab>>,
    selected: Cell<Option<usize>>,
    previous: Cell<Option<usize>>,
    observers: RefCell<Vec<SelectionObserver>>,
}

impl Default for TabBar {
    fn default() -> Self {
        Self::new()
    }
}

impl TabBar {
    pub fn new() -> Self {
        Self {
            tabs: RefCell::new(Vec::new()),
            selected: Cell::new(None),
            previous: Cell::new(None),
            observers: RefCell::new(Vec::new()),
        }
    }

    /// Appends a tab. The first attached tab becomes the selected one.
    pub fn attach(&self, id: TabId, stack: Rc<NavigationStack>) -> usize {
        let mut tabs = self.tabs.borrow_mut();
        tabs.push(AttachedTab { id, stack });
        if self.selected.get().is_none() {
            self.selected.set(Some(0));
        }
        tabs.len() - 1
    }

    pub fn len(&self) -> usize {
        self.tabs.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.borrow().is_empty()
    }

    pub fn tab_ids(&self) -> Vec<TabId> {
        self.tabs.borrow().iter().map(|tab| tab.id.clone()).collect()
    }

    pub fn tab_id(&self, index: usize) -> Option<TabId> {
        self.tabs.borrow().get(index).map(|tab| tab.id.clone())
    }

    pub fn stack(&self, index: usize) -> Option<Rc<NavigationStack>> {
        self.tabs
            .borrow()
            .get(index)
            .map(|tab| Rc::clone(&tab.stack))
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected.get()
    }

    pub fn previous_index(&self) -> Option<usize> {
        self.previous.get()
    }

    pub fn selected_stack(&self) -> Option<Rc<NavigationStack>> {
        self.selected.get().and_then(|index| self.stack(index))
    }

    pub fn observe(&self, observer: impl Fn(TabSelection) + 'static) {
        self.observers.borrow_mut().push(Rc::new(observer));
    }

    /// Selects `index`, remembering the tab shown before, and notifies every
    /// observer.
    pub fn select(&self, index: usize) -> Result<TabSelection> {
        if index >= self.len() {
            return Err(FlowError::TabIndexOutOfRange(index));
        }
        let previous = self.selected.replace(Some(index));
        self.previous.set(previous);
        let selection = TabSelection { index, previous };

        let observers: Vec<SelectionObserver> = self.observers.borrow().clone();
        for observer in observers {
            observer(selection);
        }
        Ok(selection)
    }
}

impl Surface for TabBar {
    fn title(&self) -> &str {
        "tab_bar"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar_with(ids: &[&str]) -> TabBar {
        let bar = TabBar::new();
        for id in ids {
            bar.attach(TabId::from(*id), Rc::new(NavigationStack::new(*id)));
        }
        bar
    }

    #[test]
    fn first_tab_starts_selected() {
        let bar = bar_with(&["main", "more"]);
        assert_eq!(bar.selected_index(), Some(0));
        assert_eq!(bar.selected_stack().unwrap().label(), "main");
    }

    #[test]
    fn select_tracks_previous_and_notifies() {
        let bar = bar_with(&["main", "more"]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bar.observe(move |selection| sink.borrow_mut().push(selection));

        bar.select(1).unwrap();
        let again = bar.select(1).unwrap();

        assert!(again.is_reselection());
        assert_eq!(
            *seen.borrow(),
            vec![
                TabSelection {
                    index: 1,
                    previous: Some(0)
                },
                TabSelection {
                    index: 1,
                    previous: Some(1)
                },
            ]
        );
        assert_eq!(bar.previous_index(), Some(1));
    }

    #[test]
    fn out_of_range_selection_is_rejected() {
        let bar = bar_with(&["main"]);
        assert!(matches!(bar.select(3), Err(FlowError::TabIndexOutOfRange(3))));
        assert_eq!(bar.selected_index(), Some(0));
    }
}
