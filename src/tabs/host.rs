use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::app::Window;
use crate::error::{FlowError, Result};
use crate::flow::audit::{FlowAuditEvent, FlowAuditStage};
use crate::flow::{FlowController, FlowControllerExt, FlowCore};
use crate::logging::{LogLevel, json_kv, json_str};
use crate::navigation::{NavigationStack, SurfaceRef, TabFlow};
use crate::scope::{DependencyModule, ModuleList, ObjectScope, Registrations};

use super::bar::{TabBar, TabSelection};
use super::table::{TabId, TabTable};

const TABS_TARGET: &str = "flowcoord::tabs";

/// What happens when the user taps the tab that is already showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReselectPolicy {
    #[default]
    Ignore,
    ResetToRoot,
}

#[derive(Debug, Clone, Default)]
pub struct TabHostOptions {
    /// Tabs to show, in order. `None` shows every declared tab.
    pub tabs: Option<Vec<TabId>>,
    pub reselect_policy: ReselectPolicy,
}

/// A tab that could not be configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabFailure {
    pub tab: TabId,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Uninitialized,
    Running,
}

/// Registers the host's [`TabBar`]. The bar is shared while the window or
/// host holds it.
pub struct TabBarModule;

impl DependencyModule for TabBarModule {
    fn name(&self) -> &str {
        "tab_bar"
    }

    fn register(&self, registrations: &mut Registrations) {
        registrations.register(ObjectScope::Weak, |_| Ok(TabBar::new()));
    }
}

/// Builds the tab bar, puts it on the window and starts one flow per tab.
pub struct TabHostFlow {
    core: FlowCore<()>,
    window: Weak<Window>,
    table: TabTable,
    options: TabHostOptions,
    stacks: IndexMap<TabId, Rc<NavigationStack>>,
    state: Cell<HostState>,
    bar: RefCell<Option<Rc<TabBar>>>,
    flows: RefCell<IndexMap<TabId, Weak<dyn TabFlow>>>,
    failures: RefCell<Vec<TabFailure>>,
}

impl TabHostFlow {
    pub fn new(window: &Rc<Window>, table: TabTable, options: TabHostOptions) -> Rc<Self> {
        let stacks = table
            .ids()
            .into_iter()
            .map(|id| {
                let stack = Rc::new(NavigationStack::new(id.as_str()));
                (id, stack)
            })
            .collect();
        Rc::new(Self {
            core: FlowCore::new("tab_host"),
            window: Rc::downgrade(window),
            table,
            options,
            stacks,
            state: Cell::new(HostState::Uninitialized),
            bar: RefCell::new(None),
            flows: RefCell::new(IndexMap::new()),
            failures: RefCell::new(Vec::new()),
        })
    }

    pub fn state(&self) -> HostState {
        self.state.get()
    }

    pub fn is_running(&self) -> bool {
        self.state.get() == HostState::Running
    }

    pub fn options(&self) -> &TabHostOptions {
        &self.options
    }

    pub fn bar(&self) -> Option<Rc<TabBar>> {
        self.bar.borrow().clone()
    }

    /// The stack created for `id`, whether or not its tab is showing.
    pub fn stack(&self, id: &TabId) -> Option<Rc<NavigationStack>> {
        self.stacks.get(id).map(Rc::clone)
    }

    pub fn tab_flow(&self, id: &TabId) -> Option<Rc<dyn TabFlow>> {
        self.flows.borrow().get(id).and_then(Weak::upgrade)
    }

    /// Ids of the tabs attached to the bar, in display order.
    pub fn tab_order(&self) -> Vec<TabId> {
        self.bar().map(|bar| bar.tab_ids()).unwrap_or_default()
    }

    pub fn selected_tab(&self) -> Option<usize> {
        self.bar().and_then(|bar| bar.selected_index())
    }

    /// Index that was showing before the most recent selection.
    pub fn previous_tab(&self) -> Option<usize> {
        self.bar().and_then(|bar| bar.previous_index())
    }

    pub fn failures(&self) -> Vec<TabFailure> {
        self.failures.borrow().clone()
    }

    pub fn select_tab(&self, index: usize) -> Result<TabSelection> {
        let bar = self.bar().ok_or(FlowError::NotRunning)?;
        bar.select(index)
    }

    pub fn on_tab_selected(&self, observer: impl Fn(TabSelection) + 'static) -> Result<()> {
        let bar = self.bar().ok_or(FlowError::NotRunning)?;
        bar.observe(observer);
        Ok(())
    }

    fn tabs_to_show(&self) -> Vec<TabId> {
        match self.options.tabs.as_ref() {
            Some(tabs) => tabs.clone(),
            None => self.table.ids(),
        }
    }

    fn attach_tab(&self, bar: &TabBar, id: &TabId) -> Result<()> {
        if self.flows.borrow().contains_key(id) {
            return Err(FlowError::DuplicateTab(id.clone()));
        }
        let stack = self
            .stacks
            .get(id)
            .ok_or_else(|| FlowError::MissingTabStack(id.clone()))?;
        let declaration = self
            .table
            .get(id)
            .ok_or_else(|| FlowError::MissingTabStack(id.clone()))?;

        stack.set_tab_item(declaration.item.clone());
        let flow = declaration.build().map_err(|err| match err {
            factory @ FlowError::TabFactory { .. } => factory,
            other => FlowError::TabFactory {
                tab: id.clone(),
                reason: other.to_string(),
            },
        })?;
        flow.navigation().bind(stack);
        self.start_child(Rc::clone(&flow))?;

        let index = bar.attach(id.clone(), Rc::clone(stack));
        self.flows
            .borrow_mut()
            .insert(id.clone(), Rc::downgrade(&flow));

        let diagnostics = self.core.diagnostics();
        diagnostics.audit(|| {
            FlowAuditEvent::builder(FlowAuditStage::TabAttached)
                .flow(flow.core().id())
                .detail("tab", id.as_str())
                .detail("index", index)
                .finish()
        });
        diagnostics.log(
            LogLevel::Debug,
            TABS_TARGET,
            "tab_attached",
            [json_str("tab", id.as_str()), json_kv("index", index)],
        );
        Ok(())
    }

    fn record_failure(&self, id: TabId, err: FlowError) {
        let reason = err.to_string();
        let diagnostics = self.core.diagnostics();
        diagnostics.log(
            LogLevel::Warn,
            TABS_TARGET,
            "tab_skipped",
            [json_str("tab", id.as_str()), json_str("reason", reason.as_str())],
        );
        diagnostics.audit(|| {
            FlowAuditEvent::builder(FlowAuditStage::TabSkipped)
                .flow(self.core.id())
                .detail("tab", id.as_str())
                .detail("reason", reason.as_str())
                .finish()
        });
        self.failures
            .borrow_mut()
            .push(TabFailure { tab: id, reason });
    }

    fn handle_selection(&self, selection: TabSelection) {
        let diagnostics = self.core.diagnostics();
        diagnostics.audit(|| {
            FlowAuditEvent::builder(FlowAuditStage::TabSelected)
                .flow(self.core.id())
                .detail("index", selection.index)
                .detail("previous", json!(selection.previous))
                .finish()
        });
        diagnostics.log(
            LogLevel::Debug,
            TABS_TARGET,
            "tab_selected",
            [
                json_kv("index", selection.index),
                json_kv("previous", json!(selection.previous)),
            ],
        );

        if !selection.is_reselection() || self.options.reselect_policy != ReselectPolicy::ResetToRoot {
            return;
        }
        let flow = self
            .bar()
            .and_then(|bar| bar.tab_id(selection.index))
            .and_then(|id| self.tab_flow(&id));
        if let Some(flow) = flow {
            flow.reset_to_root();
        }
    }
}

impl FlowController for TabHostFlow {
    type Output = ();

    fn core(&self) -> &FlowCore<()> {
        &self.core
    }

    fn modules(&self) -> Option<ModuleList> {
        Some(vec![Box::new(TabBarModule)])
    }

    fn start(self: Rc<Self>) -> Result<()> {
        if self.is_running() {
            return Err(FlowError::AlreadyRunning);
        }
        let window = self.window.upgrade().ok_or(FlowError::WindowUnavailable)?;
        let bar = self.resolve::<TabBar>()?;
        let surface: SurfaceRef = bar.clone();
        window.set_root(surface);
        *self.bar.borrow_mut() = Some(Rc::clone(&bar));
        self.state.set(HostState::Running);

        let host = Rc::downgrade(&self);
        bar.observe(move |selection| {
            if let Some(host) = host.upgrade() {
                host.handle_selection(selection);
            }
        });

        for id in self.tabs_to_show() {
            if let Err(err) = self.attach_tab(&bar, &id) {
                self.record_failure(id, err);
            }
        }

        self.core.diagnostics().log(
            LogLevel::Info,
            TABS_TARGET,
            "tabs_configured",
            [
                json_kv("attached", bar.len()),
                json_kv("skipped", self.failures.borrow().len()),
            ],
        );
        Ok(())
    }
}
