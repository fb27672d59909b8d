//! Flow controllers and the parent → child ownership tree.
//!
//! A parent keeps each started child alive in an identity-keyed registry
//! until the child reports its result, then lets it go. Children never hold
//! strong handles back to their parents: the release hook a parent installs
//! only keeps a weak handle to the parent's registry.

pub mod audit;
mod completion;
mod core;
pub mod diagnostics;
mod id;
mod registry;

use std::rc::Rc;

use serde_json::json;

use crate::error::{FlowError, Result};
use crate::logging::{LogLevel, json_kv, json_str};
use crate::scope::{DependencyScope, ModuleList};

use self::audit::{FlowAuditEvent, FlowAuditStage};
use self::core::{FLOW_TARGET, note_completion};
use self::registry::Owned;

pub use self::completion::{CompletionHandler, CompletionSlot, CompletionState};
pub use self::core::FlowCore;
pub use self::diagnostics::Diagnostics;
pub use self::id::FlowId;

/// A unit of application flow that shows content and reports one result.
pub trait FlowController: 'static {
    /// What the flow reports when it finishes; `()` for flows with no result.
    type Output: 'static;

    fn core(&self) -> &FlowCore<Self::Output>;

    /// Begins the flow's work. Called once, by whoever starts the flow.
    fn start(self: Rc<Self>) -> Result<()>;

    /// Modules for this flow's own scope. `Some` (even empty) gets a scope
    /// chained to its parent's before `start` runs; `None` resolves through
    /// the parent's scope as is.
    fn modules(&self) -> Option<ModuleList> {
        None
    }
}

/// Operations every flow controller gets for free.
pub trait FlowControllerExt: FlowController {
    fn id(&self) -> FlowId {
        self.core().id()
    }

    /// Keeps `child` alive until it completes and starts it. A child that
    /// declares modules gets its own scope chained to the parent's; any other
    /// child resolves through the parent's scope. A child that already
    /// finished is refused, and one whose `start` fails is released again.
    ///
    /// `FlowStarted` is recorded before the child's `start` runs, so a child
    /// that completes inside `start` reports its completion afterwards.
    fn start_child<C>(&self, child: Rc<C>) -> Result<()>
    where
        C: FlowController + ?Sized,
    {
        let parent = self.core();
        let child_id = child.core().id();
        if child.core().completion_state() != CompletionState::Pending {
            return Err(FlowError::FlowFinished(child_id));
        }

        let diagnostics = parent.diagnostics();
        let parent_id = parent.id();
        let child_label = child.core().label().to_string();

        child.core().set_diagnostics(diagnostics.clone());
        match (child.modules(), parent.scope()) {
            (Some(modules), Some(parent_scope)) => {
                let scope = DependencyScope::child(&parent_scope, child_label.clone(), modules);
                let depth = scope.depth();
                child.core().attach_scope(scope);
                diagnostics.audit(|| {
                    FlowAuditEvent::builder(FlowAuditStage::ScopeCreated)
                        .flow(child_id)
                        .detail("depth", depth)
                        .finish()
                });
            }
            (Some(_), None) => return Err(FlowError::Unscoped(parent_id)),
            (None, Some(parent_scope)) => child.core().inherit_scope(parent_scope),
            (None, None) => {}
        }

        parent
            .registry()
            .borrow_mut()
            .insert(Box::new(Owned(Rc::clone(&child))));

        let registry = Rc::downgrade(parent.registry());
        let release_diagnostics = diagnostics.clone();
        child
            .core()
            .completion_slot()
            .set_release(Box::new(move || {
                let Some(registry) = registry.upgrade() else {
                    return;
                };
                let released = registry.borrow_mut().remove(&child_id);
                if let Some(child) = released.as_ref() {
                    release_diagnostics.audit(|| {
                        FlowAuditEvent::builder(FlowAuditStage::ChildReleased)
                            .flow(parent_id)
                            .detail("child", child.id().to_string())
                            .finish()
                    });
                    release_diagnostics.log(
                        LogLevel::Debug,
                        FLOW_TARGET,
                        "child_released",
                        [
                            json_str("parent", parent_id.to_string()),
                            json_str("child", child.label()),
                        ],
                    );
                }
                drop(released);
            }));

        diagnostics.audit(|| {
            FlowAuditEvent::builder(FlowAuditStage::ChildRegistered)
                .flow(parent_id)
                .detail("child", child_id.to_string())
                .detail("label", child_label.as_str())
                .finish()
        });
        diagnostics.record(|metrics| metrics.record_start());
        diagnostics.audit(|| {
            FlowAuditEvent::builder(FlowAuditStage::FlowStarted)
                .flow(child_id)
                .detail("label", child_label.as_str())
                .finish()
        });
        diagnostics.log(
            LogLevel::Debug,
            FLOW_TARGET,
            "child_started",
            [
                json_str("parent", parent_id.to_string()),
                json_str("child", child_label.as_str()),
            ],
        );

        if let Err(err) = child.start() {
            let removed = parent.registry().borrow_mut().remove(&child_id);
            if let Some(removed) = removed.as_ref() {
                removed.detach();
            }
            drop(removed);
            diagnostics.log(
                LogLevel::Warn,
                FLOW_TARGET,
                "child_start_failed",
                [
                    json_str("child", child_label.as_str()),
                    json_str("error", err.to_string()),
                ],
            );
            return Err(err);
        }
        Ok(())
    }

    /// Drops every child without reporting their completion. Children released
    /// this way can no longer complete. Returns how many were released.
    fn release_all_children(&self) -> usize {
        let core = self.core();
        let drained = core.registry().borrow_mut().drain();
        for child in &drained {
            child.detach();
        }
        let count = drained.len();
        drop(drained);

        let diagnostics = core.diagnostics();
        if count > 0 {
            diagnostics.record(|metrics| metrics.record_released(count));
            diagnostics.audit(|| {
                FlowAuditEvent::builder(FlowAuditStage::ChildrenCleared)
                    .flow(core.id())
                    .detail("count", count)
                    .finish()
            });
        }
        diagnostics.log(
            LogLevel::Debug,
            FLOW_TARGET,
            "children_released",
            [json_str("flow", core.label()), json_kv("count", json!(count))],
        );
        count
    }

    fn on_complete<F>(&self, handler: F)
    where
        F: FnOnce(Self::Output) + 'static,
    {
        self.core().on_complete(handler);
    }

    fn complete(&self, value: Self::Output) -> bool {
        self.core().complete(value)
    }

    /// Returns a callback that ignores its input and finishes this flow with
    /// `value`. Invoking it after the first time, or after the flow is gone,
    /// does nothing.
    fn complete_with<I>(&self, value: Self::Output) -> Box<dyn Fn(I)>
    where
        I: 'static,
        Self::Output: Clone,
    {
        let core = self.core();
        let slot = Rc::downgrade(core.completion_slot());
        let id = core.id();
        let label = core.label().to_string();
        let diagnostics = core.diagnostics();
        Box::new(move |_: I| {
            if let Some(slot) = slot.upgrade() {
                let fired = slot.fire(value.clone());
                note_completion(&diagnostics, id, &label, fired);
            }
        })
    }

    /// Looks `T` up through this flow's scope chain.
    fn resolve<T: 'static>(&self) -> Result<Rc<T>> {
        let core = self.core();
        let scope = core.scope().ok_or(FlowError::Unscoped(core.id()))?;
        let resolved = scope.resolve::<T>();
        core.diagnostics()
            .record(|metrics| metrics.record_resolution(resolved.is_ok()));
        resolved
    }

    /// Releases the instances cached by this flow's own scope. A flow that
    /// only borrows its parent's scope has nothing to release.
    fn teardown(&self) -> usize {
        let core = self.core();
        let Some(scope) = core.scope().filter(|_| core.owns_scope()) else {
            return 0;
        };
        let released = scope.teardown();
        let diagnostics = core.diagnostics();
        diagnostics.audit(|| {
            FlowAuditEvent::builder(FlowAuditStage::ScopeTornDown)
                .flow(core.id())
                .detail("released", released)
                .finish()
        });
        diagnostics.log(
            LogLevel::Info,
            FLOW_TARGET,
            "scope_torn_down",
            [
                json_str("scope", scope.label()),
                json_kv("released", json!(released)),
            ],
        );
        released
    }
}

impl<F: FlowController + ?Sized> FlowControllerExt for F {}
