//! Application entry point: the window, the root flow and its builder.

mod builder;
mod root;
mod window;

pub use builder::ApplicationBuilder;
pub use root::ApplicationRoot;
pub use window::Window;
