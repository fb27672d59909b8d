//! Headless flow coordination for tabbed applications.
//!
//! A tree of flow controllers owns each other's lifetimes, chains dependency
//! scopes from the application root down to the smallest flow, reports a
//! single typed result upwards and drives navigation stacks through a fixed
//! set of transitions. Rendering is left to whoever implements [`Surface`].

pub mod app;
pub mod config;
pub mod error;
pub mod flow;
pub mod logging;
pub mod metrics;
pub mod navigation;
pub mod scope;
pub mod tabs;

#[cfg(test)]
pub(crate) mod testing;

pub use app::{ApplicationBuilder, ApplicationRoot, Window};
pub use config::AppConfig;
pub use error::{FlowError, Result};
pub use flow::audit::{
    FlowAudit, FlowAuditEvent, FlowAuditEventBuilder, FlowAuditStage, NullFlowAudit,
    RecordingFlowAudit,
};
pub use flow::{
    CompletionState, Diagnostics, FlowController, FlowControllerExt, FlowCore, FlowId,
};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink, NullSink, StderrSink,
};
pub use metrics::{FlowMetrics, MetricSnapshot};
pub use navigation::{
    ModalStyle, NavigationStack, NavigationalFlow, Navigator, Presentation, SimpleTransition,
    SourceSurface, Surface, SurfaceRef, TabFlow, TabNavigation, Transition,
};
pub use scope::{DependencyModule, DependencyScope, ModuleList, ObjectScope, Registrations, module_fn};
pub use tabs::{
    ReselectPolicy, TabBar, TabBarItem, TabDeclaration, TabHostFlow, TabHostOptions, TabId,
    TabSelection, TabTable,
};
