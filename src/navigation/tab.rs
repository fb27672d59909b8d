use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::flow::{FlowController, FlowControllerExt};
use crate::logging::{LogLevel, json_kv, json_str};

use super::NAVIGATION_TARGET;
use super::stack::NavigationStack;

/// Weak link from a tab's flow to the stack its host created for it.
#[derive(Default)]
pub struct TabNavigation {
    stack: RefCell<Weak<NavigationStack>>,
}

impl TabNavigation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, stack: &Rc<NavigationStack>) {
        *self.stack.borrow_mut() = Rc::downgrade(stack);
    }

    pub fn stack(&self) -> Option<Rc<NavigationStack>> {
        self.stack.borrow().upgrade()
    }

    pub fn is_bound(&self) -> bool {
        self.stack.borrow().strong_count() > 0
    }
}

/// Flow that owns the content of one tab.
pub trait TabFlow: FlowController<Output = ()> {
    fn navigation(&self) -> &TabNavigation;

    /// Returns the tab to its first screen: closes any modal, pops the stack
    /// to its root and drops every child flow. Returns how many children
    /// were released.
    fn reset_to_root(&self) -> usize {
        let mut popped = 0;
        if let Some(stack) = self.navigation().stack() {
            let dismissed = stack.dismiss_presented();
            drop(dismissed);
            popped = stack.pop_to_root().len();
        }
        let released = self.release_all_children();
        self.core().diagnostics().log(
            LogLevel::Info,
            NAVIGATION_TARGET,
            "tab_reset_to_root",
            [
                json_str("tab", self.core().label()),
                json_kv("popped", popped),
                json_kv("released", released),
            ],
        );
        released
    }
}
