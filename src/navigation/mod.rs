//! Navigation stacks and the transitions flows use to show surfaces on them.

mod stack;
mod surface;
mod tab;
mod transition;

use crate::Result;
use crate::flow::FlowController;
use crate::flow::audit::{FlowAuditEvent, FlowAuditStage};
use crate::logging::{LogLevel, json_str};

pub use stack::{ModalStyle, NavigationStack, Presentation};
pub use surface::{Surface, SurfaceRef, same_surface};
pub use tab::{TabFlow, TabNavigation};
pub use transition::{Navigator, SimpleTransition, SourceSurface, Transition};

pub(crate) const NAVIGATION_TARGET: &str = "flowcoord::navigation";

/// A flow that shows its surfaces through a fixed [`Navigator`].
pub trait NavigationalFlow: FlowController {
    fn navigator(&self) -> &Navigator;

    fn present(&self, surface: SurfaceRef) -> Result<()> {
        let title = surface.title().to_string();
        let navigator = self.navigator();
        navigator.present(surface)?;

        let core = self.core();
        let kind = navigator.transition().kind();
        let diagnostics = core.diagnostics();
        diagnostics.record(|metrics| metrics.record_presentation());
        diagnostics.audit(|| {
            FlowAuditEvent::builder(FlowAuditStage::SurfacePresented)
                .flow(core.id())
                .detail("transition", kind)
                .detail("surface", title.as_str())
                .finish()
        });
        diagnostics.log(
            LogLevel::Debug,
            NAVIGATION_TARGET,
            "surface_presented",
            [
                json_str("flow", core.label()),
                json_str("transition", kind),
                json_str("surface", title.as_str()),
            ],
        );
        Ok(())
    }
}
