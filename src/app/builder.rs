use std::rc::Rc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::flow::{Diagnostics, FlowController};
use crate::scope::{DependencyModule, ModuleList};
use crate::tabs::{ReselectPolicy, TabDeclaration, TabHostOptions, TabTable};

use super::root::ApplicationRoot;
use super::window::Window;

/// Collects application-wide modules, tab declarations and diagnostics before
/// the root flow exists.
pub struct ApplicationBuilder {
    modules: ModuleList,
    tabs: TabTable,
    host_options: TabHostOptions,
    diagnostics: Diagnostics,
    window: Option<Rc<Window>>,
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationBuilder {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            tabs: TabTable::new(),
            host_options: TabHostOptions::default(),
            diagnostics: Diagnostics::new(),
            window: None,
        }
    }

    /// Adds a module to the application scope.
    pub fn module(mut self, module: impl DependencyModule + 'static) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    pub fn tab(mut self, declaration: TabDeclaration) -> Self {
        self.tabs.insert(declaration);
        self
    }

    pub fn tabs(mut self, table: TabTable) -> Self {
        self.tabs = table;
        self
    }

    pub fn host_options(mut self, options: TabHostOptions) -> Self {
        self.host_options = options;
        self
    }

    pub fn reselect_policy(mut self, policy: ReselectPolicy) -> Self {
        self.host_options.reselect_policy = policy;
        self
    }

    pub fn diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn window(mut self, window: Rc<Window>) -> Self {
        self.window = Some(window);
        self
    }

    /// Applies tab order, reselect policy and logging from `config`.
    pub fn config(self, config: &AppConfig) -> Result<Self> {
        let diagnostics = config.build_diagnostics()?;
        Ok(self
            .host_options(config.host_options())
            .diagnostics(diagnostics))
    }

    pub fn build(self) -> Rc<ApplicationRoot> {
        let window = self.window.unwrap_or_else(|| Rc::new(Window::new()));
        let root = ApplicationRoot::new(self.modules, window, self.tabs, self.host_options);
        root.core().set_diagnostics(self.diagnostics);
        root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::FlowControllerExt;
    use crate::logging::LogLevel;
    use crate::scope::module_fn;

    #[test]
    fn modules_land_in_the_application_scope() {
        let app = ApplicationBuilder::new()
            .module(module_fn("answer", |registrations| {
                registrations.instance(Rc::new(42_u32));
            }))
            .build();
        assert_eq!(*app.resolve::<u32>().unwrap(), 42);
        let scope = app.core().scope().unwrap();
        assert_eq!(scope.label(), "application");
        assert_eq!(scope.module_names(), ["answer"]);
    }

    #[test]
    fn config_sets_options_and_logging() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            reselect_policy: ReselectPolicy::ResetToRoot,
            log_file: Some(dir.path().join("app.log")),
            log_level: LogLevel::Debug,
            metrics: true,
            ..AppConfig::default()
        };
        let window = Rc::new(Window::new());
        let app = ApplicationBuilder::new()
            .window(Rc::clone(&window))
            .config(&config)
            .unwrap()
            .build();

        assert!(Rc::ptr_eq(app.window(), &window));
        let diagnostics = app.core().diagnostics();
        assert_eq!(diagnostics.logger().unwrap().min_level(), LogLevel::Debug);
        assert!(diagnostics.snapshot().is_some());
    }
}
