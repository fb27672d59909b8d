//! Tab declarations, the tab bar surface and the flow that hosts them.

mod bar;
mod host;
mod table;

pub use bar::{TabBar, TabSelection};
pub use host::{HostState, ReselectPolicy, TabBarModule, TabFailure, TabHostFlow, TabHostOptions};
pub use table::{TabBarItem, TabDeclaration, TabFactory, TabId, TabTable};
