use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::json;

use crate::logging::{LogLevel, json_kv, json_str};
use crate::scope::DependencyScope;

use super::FlowId;
use super::audit::{FlowAuditEvent, FlowAuditStage};
use super::completion::{CompletionSlot, CompletionState};
use super::diagnostics::Diagnostics;
use super::registry::ChildRegistry;

pub(crate) const FLOW_TARGET: &str = "flowcoord::flow";

/// State every flow controller embeds: identity, completion, the registry of
/// children it keeps alive and the dependency scope it resolves through.
/// Flows without modules of their own borrow their parent's scope.
pub struct FlowCore<R> {
    id: FlowId,
    label: String,
    completion: Rc<CompletionSlot<R>>,
    children: Rc<RefCell<ChildRegistry>>,
    scope: RefCell<Option<Rc<DependencyScope>>>,
    owns_scope: Cell<bool>,
    diagnostics: RefCell<Diagnostics>,
}

impl<R: 'static> FlowCore<R> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: FlowId::new(),
            label: label.into(),
            completion: Rc::new(CompletionSlot::new()),
            children: Rc::new(RefCell::new(ChildRegistry::default())),
            scope: RefCell::new(None),
            owns_scope: Cell::new(false),
            diagnostics: RefCell::new(Diagnostics::default()),
        }
    }

    /// Core for a flow that builds its own scope up front (the tree root).
    pub fn with_scope(label: impl Into<String>, scope: Rc<DependencyScope>) -> Self {
        let core = Self::new(label);
        core.attach_scope(scope);
        core
    }

    pub fn id(&self) -> FlowId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn scope(&self) -> Option<Rc<DependencyScope>> {
        self.scope.borrow().clone()
    }

    /// Whether the scope was built for this flow rather than inherited.
    pub fn owns_scope(&self) -> bool {
        self.owns_scope.get()
    }

    pub(crate) fn attach_scope(&self, scope: Rc<DependencyScope>) {
        *self.scope.borrow_mut() = Some(scope);
        self.owns_scope.set(true);
    }

    pub(crate) fn inherit_scope(&self, scope: Rc<DependencyScope>) {
        *self.scope.borrow_mut() = Some(scope);
        self.owns_scope.set(false);
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics.borrow().clone()
    }

    pub fn set_diagnostics(&self, diagnostics: Diagnostics) {
        *self.diagnostics.borrow_mut() = diagnostics;
    }

    pub fn on_complete(&self, handler: impl FnOnce(R) + 'static) {
        self.completion.set_handler(Box::new(handler));
    }

    /// Reports `value` to whoever listens for this flow's result. Returns
    /// `false` if completion already fired or the flow was released.
    pub fn complete(&self, value: R) -> bool {
        let fired = self.completion.fire(value);
        note_completion(&self.diagnostics(), self.id, &self.label, fired);
        fired
    }

    pub fn completion_state(&self) -> CompletionState {
        self.completion.state()
    }

    pub fn has_completed(&self) -> bool {
        self.completion.state() == CompletionState::Fired
    }

    pub fn child_count(&self) -> usize {
        self.children.borrow().len()
    }

    pub fn child_ids(&self) -> Vec<FlowId> {
        self.children.borrow().ids()
    }

    pub fn child_labels(&self) -> Vec<String> {
        self.children.borrow().labels()
    }

    pub fn has_child(&self, id: FlowId) -> bool {
        self.children.borrow().contains(&id)
    }

    pub(crate) fn completion_slot(&self) -> &Rc<CompletionSlot<R>> {
        &self.completion
    }

    pub(crate) fn registry(&self) -> &Rc<RefCell<ChildRegistry>> {
        &self.children
    }

    pub(crate) fn detach(&self) {
        self.completion.detach();
    }
}

pub(crate) fn note_completion(diagnostics: &Diagnostics, id: FlowId, label: &str, fired: bool) {
    if fired {
        diagnostics.record(|metrics| metrics.record_completion());
        diagnostics.audit(|| {
            FlowAuditEvent::builder(FlowAuditStage::FlowCompleted)
                .flow(id)
                .detail("label", label)
                .finish()
        });
    }
    diagnostics.log(
        LogLevel::Debug,
        FLOW_TARGET,
        if fired {
            "flow_completed"
        } else {
            "completion_ignored"
        },
        [json_str("flow", id.to_string()), json_str("label", label), json_kv("fired", json!(fired))],
    );
}

impl<R: 'static> std::fmt::Debug for FlowCore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowCore")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("state", &self.completion.state())
            .field("children", &self.children.borrow().len())
            .finish()
    }
}
