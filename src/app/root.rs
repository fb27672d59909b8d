use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::error::{FlowError, Result};
use crate::flow::{FlowController, FlowControllerExt, FlowCore};
use crate::logging::{LogLevel, json_kv, json_str};
use crate::scope::{DependencyScope, ModuleList};
use crate::tabs::{TabHostFlow, TabHostOptions, TabTable};

use super::builder::ApplicationBuilder;
use super::window::Window;

const APP_TARGET: &str = "flowcoord::app";

/// Root of the flow tree. Built once at process entry and handed to whoever
/// needs it; the caller keeps the only strong handle.
pub struct ApplicationRoot {
    core: FlowCore<()>,
    window: Rc<Window>,
    tabs: TabTable,
    host_options: TabHostOptions,
    host: RefCell<Weak<TabHostFlow>>,
}

impl ApplicationRoot {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub(crate) fn new(
        modules: ModuleList,
        window: Rc<Window>,
        tabs: TabTable,
        host_options: TabHostOptions,
    ) -> Rc<Self> {
        let scope = DependencyScope::root("application", modules);
        Rc::new(Self {
            core: FlowCore::with_scope("application", scope),
            window,
            tabs,
            host_options,
            host: RefCell::new(Weak::new()),
        })
    }

    pub fn window(&self) -> &Rc<Window> {
        &self.window
    }

    /// The running tab host, once `start` has succeeded.
    pub fn tab_host(&self) -> Option<Rc<TabHostFlow>> {
        self.host.borrow().upgrade()
    }

    /// Drops every instance cached by the application scope so the next
    /// lookups start from fresh state. Returns how many were released.
    pub fn remove_all(&self) -> usize {
        let released = self.teardown();
        self.core.diagnostics().log(
            LogLevel::Info,
            APP_TARGET,
            "application_state_removed",
            [json_kv("released", released)],
        );
        released
    }
}

impl FlowController for ApplicationRoot {
    type Output = ();

    fn core(&self) -> &FlowCore<()> {
        &self.core
    }

    fn start(self: Rc<Self>) -> Result<()> {
        if self.tab_host().is_some() {
            return Err(FlowError::AlreadyRunning);
        }
        self.window.make_visible();

        let host = TabHostFlow::new(&self.window, self.tabs.clone(), self.host_options.clone());
        self.start_child(Rc::clone(&host))?;
        *self.host.borrow_mut() = Rc::downgrade(&host);

        self.core.diagnostics().log(
            LogLevel::Info,
            APP_TARGET,
            "application_started",
            [json_str(
                "root",
                self.window.root_title().unwrap_or_default(),
            )],
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppConfig;
    use crate::flow::audit::{FlowAuditStage, RecordingFlowAudit};
    use crate::flow::Diagnostics;
    use crate::navigation::{
        ModalStyle, NavigationalFlow, Navigator, SimpleTransition, TabFlow, TabNavigation,
    };
    use crate::scope::{ObjectScope, module_fn};
    use crate::tabs::{ReselectPolicy, TabBarItem, TabDeclaration, TabId};
    use crate::testing::StubSurface;
    use std::cell::Cell;

    struct Catalog {
        items: Vec<&'static str>,
    }

    struct Care {
        core: FlowCore<()>,
        navigator: Navigator,
    }

    impl FlowController for Care {
        type Output = ();

        fn core(&self) -> &FlowCore<()> {
            &self.core
        }

        fn modules(&self) -> Option<ModuleList> {
            Some(Vec::new())
        }

        fn start(self: Rc<Self>) -> Result<()> {
            let catalog = self.resolve::<Catalog>()?;
            self.present(StubSurface::new(catalog.items[0]))
        }
    }

    impl NavigationalFlow for Care {
        fn navigator(&self) -> &Navigator {
            &self.navigator
        }
    }

    struct ContentTab {
        core: FlowCore<()>,
        navigation: TabNavigation,
    }

    impl ContentTab {
        fn open_care(&self) -> Result<()> {
            let care = Rc::new(Care {
                core: FlowCore::new("care"),
                navigator: Navigator::from_tab(&self.navigation, SimpleTransition::PopOver)?,
            });
            self.start_child(care)
        }
    }

    impl FlowController for ContentTab {
        type Output = ();

        fn core(&self) -> &FlowCore<()> {
            &self.core
        }

        fn modules(&self) -> Option<ModuleList> {
            Some(Vec::new())
        }

        fn start(self: Rc<Self>) -> Result<()> {
            let stack = self.navigation.stack().ok_or(FlowError::StackUnavailable)?;
            stack.set_surfaces(vec![StubSurface::new(self.core.label())]);
            Ok(())
        }
    }

    impl TabFlow for ContentTab {
        fn navigation(&self) -> &TabNavigation {
            &self.navigation
        }
    }

    fn main_tab() -> TabDeclaration {
        TabDeclaration::new("main", TabBarItem::new("Main", 0), || {
            let tab: Rc<dyn TabFlow> = Rc::new(ContentTab {
                core: FlowCore::new("main"),
                navigation: TabNavigation::new(),
            });
            Ok(tab)
        })
    }

    fn more_tab() -> TabDeclaration {
        TabDeclaration::new("more", TabBarItem::new("More", 1), || {
            let tab: Rc<dyn TabFlow> = Rc::new(ContentTab {
                core: FlowCore::new("more"),
                navigation: TabNavigation::new(),
            });
            Ok(tab)
        })
    }

    fn catalog_module() -> crate::scope::ModuleFn<impl Fn(&mut crate::scope::Registrations)> {
        module_fn("catalog", |registrations| {
            registrations.singleton(|_| {
                Ok(Catalog {
                    items: vec!["care"],
                })
            });
        })
    }

    #[test]
    fn starts_tab_host_with_tabs_in_order() {
        let app = ApplicationRoot::builder()
            .tab(main_tab())
            .tab(more_tab())
            .build();
        Rc::clone(&app).start().unwrap();

        let host = app.tab_host().unwrap();
        assert_eq!(host.tab_order(), vec![TabId::from("main"), TabId::from("more")]);
        assert_eq!(app.core().child_count(), 1);
        assert!(app.window().is_visible());
        assert_eq!(app.window().root_title().as_deref(), Some("tab_bar"));
    }

    #[test]
    fn bad_tab_leaves_the_good_one_running() {
        let broken = TabDeclaration::new("main", TabBarItem::new("Main", 0), || {
            Err(FlowError::NoVisibleSurface)
        });
        let app = ApplicationRoot::builder()
            .tab(broken)
            .tab(more_tab())
            .build();
        Rc::clone(&app).start().unwrap();

        let host = app.tab_host().unwrap();
        assert_eq!(host.tab_order(), vec![TabId::from("more")]);
        assert_eq!(host.failures().len(), 1);
        assert!(host.tab_flow(&TabId::from("more")).is_some());
    }

    #[test]
    fn care_popover_resolves_from_application_scope() {
        let audit = Rc::new(RecordingFlowAudit::new());
        let opened: Rc<RefCell<Weak<ContentTab>>> = Rc::default();
        let slot = Rc::clone(&opened);
        let main = TabDeclaration::new("main", TabBarItem::new("Main", 0), move || {
            let tab = Rc::new(ContentTab {
                core: FlowCore::new("main"),
                navigation: TabNavigation::new(),
            });
            *slot.borrow_mut() = Rc::downgrade(&tab);
            Ok(tab as Rc<dyn TabFlow>)
        });
        let app = ApplicationRoot::builder()
            .module(catalog_module())
            .tab(main)
            .tab(more_tab())
            .diagnostics(Diagnostics::new().with_audit(Rc::clone(&audit)))
            .build();
        Rc::clone(&app).start().unwrap();

        let main_tab = opened.borrow().upgrade().unwrap();
        main_tab.open_care().unwrap();

        let stack = app.tab_host().unwrap().stack(&TabId::from("main")).unwrap();
        let presentation = stack.presented().unwrap();
        assert_eq!(presentation.style, ModalStyle::Popover);
        assert_eq!(presentation.stack.titles(), vec!["care"]);
        assert_eq!(stack.titles(), vec!["main"]);
        assert_eq!(main_tab.core().child_count(), 1);
        assert_eq!(audit.count(FlowAuditStage::SurfacePresented), 1);
        assert!(stack.dismiss_by_gesture());
    }

    #[test]
    fn remove_all_resets_cached_state() {
        let builds = Rc::new(Cell::new(0));
        let counter = Rc::clone(&builds);
        let module = module_fn("catalog", move |registrations| {
            let counter = Rc::clone(&counter);
            registrations.register(ObjectScope::Container, move |_| {
                counter.set(counter.get() + 1);
                Ok(Catalog { items: Vec::new() })
            });
        });
        let app = ApplicationRoot::builder().module(module).build();

        let first = app.resolve::<Catalog>().unwrap();
        assert_eq!(app.remove_all(), 1);
        let second = app.resolve::<Catalog>().unwrap();
        assert!(!Rc::ptr_eq(&first, &second));
        assert_eq!(builds.get(), 2);
    }

    #[test]
    fn starting_twice_is_rejected() {
        let app = ApplicationRoot::builder().tab(main_tab()).build();
        Rc::clone(&app).start().unwrap();
        assert!(matches!(
            Rc::clone(&app).start(),
            Err(FlowError::AlreadyRunning)
        ));
    }

    #[test]
    fn config_drives_tab_order_and_reselect() {
        let config = AppConfig::from_json_str(
            r#"{"tabs": ["more", "main"], "reselect_policy": "reset_to_root"}"#,
        )
        .unwrap();
        let app = ApplicationRoot::builder()
            .tab(main_tab())
            .tab(more_tab())
            .host_options(config.host_options())
            .build();
        Rc::clone(&app).start().unwrap();

        let host = app.tab_host().unwrap();
        assert_eq!(host.tab_order(), vec![TabId::from("more"), TabId::from("main")]);
        assert_eq!(host.options().reselect_policy, ReselectPolicy::ResetToRoot);

        let more = host.stack(&TabId::from("more")).unwrap();
        more.push(StubSurface::new("settings"), false);
        host.select_tab(0).unwrap();
        assert_eq!(more.titles(), vec!["more"]);
        assert_eq!(more.top().map(|s| s.title().to_string()), Some("more".into()));
    }
}
