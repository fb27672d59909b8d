use std::rc::Rc;

use indexmap::IndexMap;

use super::{FlowController, FlowId};

/// Type-erased strong handle a parent keeps for each running child.
pub(crate) trait OwnedChild {
    fn id(&self) -> FlowId;
    fn label(&self) -> &str;
    /// Disarms the child's completion so a late report becomes a no-op.
    fn detach(&self);
}

pub(crate) struct Owned<C: ?Sized>(pub(crate) Rc<C>);

impl<C> OwnedChild for Owned<C>
where
    C: FlowController + ?Sized,
{
    fn id(&self) -> FlowId {
        self.0.core().id()
    }

    fn label(&self) -> &str {
        self.0.core().label()
    }

    fn detach(&self) {
        self.0.core().detach();
    }
}

/// Children keyed by identity, in the order they were started.
#[derive(Default)]
pub(crate) struct ChildRegistry {
    entries: IndexMap<FlowId, Box<dyn OwnedChild>>,
}

impl ChildRegistry {
    pub(crate) fn insert(&mut self, child: Box<dyn OwnedChild>) -> Option<Box<dyn OwnedChild>> {
        self.entries.insert(child.id(), child)
    }

    pub(crate) fn remove(&mut self, id: &FlowId) -> Option<Box<dyn OwnedChild>> {
        self.entries.shift_remove(id)
    }

    pub(crate) fn drain(&mut self) -> Vec<Box<dyn OwnedChild>> {
        self.entries.drain(..).map(|(_, child)| child).collect()
    }

    pub(crate) fn contains(&self, id: &FlowId) -> bool {
        self.entries.contains_key(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn ids(&self) -> Vec<FlowId> {
        self.entries.keys().copied().collect()
    }

    pub(crate) fn labels(&self) -> Vec<String> {
        self.entries
            .values()
            .map(|child| child.label().to_string())
            .collect()
    }
}
