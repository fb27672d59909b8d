use thiserror::Error;

use crate::flow::FlowId;
use crate::logging::LoggingError;
use crate::tabs::TabId;

/// Unified result type for the flow coordinator crate.
pub type Result<T> = std::result::Result<T, FlowError>;

/// Errors surfaced by flow controllers, scopes and the tab host.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("no registration for `{type_name}` reachable from scope `{scope}`")]
    Unresolved {
        type_name: &'static str,
        scope: String,
    },
    #[error("registration for `{0}` produced a value of another type")]
    TypeMismatch(&'static str),
    #[error("flow `{0}` has no dependency scope")]
    Unscoped(FlowId),
    #[error("flow `{0}` already finished and cannot be started")]
    FlowFinished(FlowId),
    #[error("navigation stack is no longer available")]
    StackUnavailable,
    #[error("no visible surface to anchor a modal presentation")]
    NoVisibleSurface,
    #[error("tab `{0}` has no navigation stack slot")]
    MissingTabStack(TabId),
    #[error("tab `{0}` is already attached")]
    DuplicateTab(TabId),
    #[error("tab index {0} out of range")]
    TabIndexOutOfRange(usize),
    #[error("tab `{tab}` could not build its flow: {reason}")]
    TabFactory { tab: TabId, reason: String },
    #[error("tab host is already running")]
    AlreadyRunning,
    #[error("tab host is not running")]
    NotRunning,
    #[error("window is no longer available")]
    WindowUnavailable,
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
    #[error(transparent)]
    Logging(#[from] LoggingError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
