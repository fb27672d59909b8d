//! Headless tab shell: a "main" tab whose button opens a care popover, and a
//! "more" tab. Pass a JSON config path to override tab order and logging.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use flowcoord::{
    AppConfig, ApplicationRoot, FlowController, FlowControllerExt, FlowCore, FlowError, LogLevel,
    ModuleList, NavigationalFlow, Navigator, ObjectScope, RecordingFlowAudit, Result,
    SimpleTransition, Surface, TabBarItem, TabDeclaration, TabFlow, TabId, TabNavigation,
    module_fn,
};

struct Screen {
    title: String,
}

impl Screen {
    fn new(title: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            title: title.into(),
        })
    }
}

impl Surface for Screen {
    fn title(&self) -> &str {
        &self.title
    }
}

/// Main tab content with a single button.
#[derive(Default)]
struct MainScreen {
    on_tap: RefCell<Option<Box<dyn Fn()>>>,
}

impl MainScreen {
    fn tap(&self) {
        if let Some(handler) = self.on_tap.borrow().as_ref() {
            handler();
        }
    }
}

impl Surface for MainScreen {
    fn title(&self) -> &str {
        "main"
    }
}

struct CareFlow {
    core: FlowCore<()>,
    navigator: Navigator,
}

impl FlowController for CareFlow {
    type Output = ();

    fn core(&self) -> &FlowCore<()> {
        &self.core
    }

    fn modules(&self) -> Option<ModuleList> {
        Some(Vec::new())
    }

    fn start(self: Rc<Self>) -> Result<()> {
        self.present(Screen::new("care"))
    }
}

impl NavigationalFlow for CareFlow {
    fn navigator(&self) -> &Navigator {
        &self.navigator
    }
}

struct MainTab {
    core: FlowCore<()>,
    navigation: TabNavigation,
}

impl MainTab {
    fn open_care(&self) -> Result<()> {
        let care = Rc::new(CareFlow {
            core: FlowCore::new("care"),
            navigator: Navigator::from_tab(&self.navigation, SimpleTransition::PopOver)?,
        });
        let stack = self.navigation.stack().map(|stack| Rc::downgrade(&stack));
        care.on_complete(move |()| {
            if let Some(stack) = stack.and_then(|stack| stack.upgrade()) {
                stack.dismiss_presented();
            }
        });
        self.start_child(care)
    }
}

impl FlowController for MainTab {
    type Output = ();

    fn core(&self) -> &FlowCore<()> {
        &self.core
    }

    fn modules(&self) -> Option<ModuleList> {
        Some(vec![Box::new(module_fn("main_tab", |registrations| {
            registrations.register(ObjectScope::Weak, |_| Ok(MainScreen::default()));
        }))])
    }

    fn start(self: Rc<Self>) -> Result<()> {
        let stack = self.navigation.stack().ok_or(FlowError::StackUnavailable)?;
        let screen = self.resolve::<MainScreen>()?;
        stack.set_surfaces(vec![Rc::clone(&screen) as Rc<dyn Surface>]);

        let tab: Weak<Self> = Rc::downgrade(&self);
        *screen.on_tap.borrow_mut() = Some(Box::new(move || {
            if let Some(tab) = tab.upgrade() {
                if let Err(err) = tab.open_care() {
                    eprintln!("care flow failed: {err}");
                }
            }
        }));
        Ok(())
    }
}

impl TabFlow for MainTab {
    fn navigation(&self) -> &TabNavigation {
        &self.navigation
    }
}

struct MoreTab {
    core: FlowCore<()>,
    navigation: TabNavigation,
}

impl FlowController for MoreTab {
    type Output = ();

    fn core(&self) -> &FlowCore<()> {
        &self.core
    }

    fn start(self: Rc<Self>) -> Result<()> {
        let stack = self.navigation.stack().ok_or(FlowError::StackUnavailable)?;
        stack.set_surfaces(vec![Screen::new("more")]);
        Ok(())
    }
}

impl TabFlow for MoreTab {
    fn navigation(&self) -> &TabNavigation {
        &self.navigation
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig {
            log_level: LogLevel::Debug,
            metrics: true,
            ..AppConfig::default()
        },
    };
    let audit = Rc::new(RecordingFlowAudit::new());
    let diagnostics = config.build_diagnostics()?.with_audit(Rc::clone(&audit));

    let app = ApplicationRoot::builder()
        .tab(TabDeclaration::new(
            "main",
            TabBarItem::new("Main", 0).with_icon("house"),
            || {
                let tab: Rc<dyn TabFlow> = Rc::new(MainTab {
                    core: FlowCore::new("main"),
                    navigation: TabNavigation::new(),
                });
                Ok(tab)
            },
        ))
        .tab(TabDeclaration::new(
            "more",
            TabBarItem::new("More", 1).with_icon("ellipsis"),
            || {
                let tab: Rc<dyn TabFlow> = Rc::new(MoreTab {
                    core: FlowCore::new("more"),
                    navigation: TabNavigation::new(),
                });
                Ok(tab)
            },
        ))
        .host_options(config.host_options())
        .diagnostics(diagnostics)
        .build();
    Rc::clone(&app).start()?;

    let host = app.tab_host().ok_or(FlowError::NotRunning)?;
    let order: Vec<String> = host.tab_order().iter().map(TabId::to_string).collect();
    println!("tabs: {}", order.join(", "));

    let main_id = TabId::from("main");
    let main_tab = host
        .tab_flow(&main_id)
        .ok_or_else(|| FlowError::MissingTabStack(main_id.clone()))?;
    let main_stack = host
        .stack(&main_id)
        .ok_or_else(|| FlowError::MissingTabStack(main_id.clone()))?;

    main_tab.resolve::<MainScreen>()?.tap();
    if let Some(presentation) = main_stack.presented() {
        println!(
            "presented {:?} over {}: {}",
            presentation.style,
            main_stack.label(),
            presentation.stack.titles().join(" > ")
        );
    }
    println!("main children: {:?}", main_tab.core().child_labels());

    main_tab.reset_to_root();
    println!("after reset: presenting={}", main_stack.is_presenting());

    host.select_tab(1)?;
    host.select_tab(1)?;

    let diagnostics = app.core().diagnostics();
    diagnostics.emit_metrics("flowcoord::metrics");
    if let Some(snapshot) = diagnostics.snapshot() {
        println!(
            "flows started={} completed={} released={} presented={}",
            snapshot.flows_started,
            snapshot.flows_completed,
            snapshot.children_released,
            snapshot.surfaces_presented
        );
    }
    println!("audit events: {}", audit.events().len());
    Ok(())
}
