use std::cell::OnceCell;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::error::{FlowError, Result};

use super::stack::{ModalStyle, NavigationStack, Presentation};
use super::surface::{Surface, SurfaceRef};
use super::tab::TabNavigation;

/// The surface a modal transition starts from, together with the stack that
/// currently hosts it. Both links are weak.
#[derive(Clone)]
pub struct SourceSurface {
    host: Weak<NavigationStack>,
    surface: Weak<dyn Surface>,
}

impl SourceSurface {
    pub fn new(host: &Rc<NavigationStack>, surface: &SurfaceRef) -> Self {
        Self {
            host: Rc::downgrade(host),
            surface: Rc::downgrade(surface),
        }
    }

    pub fn host(&self) -> Option<Rc<NavigationStack>> {
        self.host.upgrade()
    }

    pub fn surface(&self) -> Option<SurfaceRef> {
        self.surface.upgrade()
    }
}

impl std::fmt::Debug for SourceSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceSurface")
            .field("host", &self.host().map(|host| host.label().to_string()))
            .field("surface", &self.surface().map(|s| s.title().to_string()))
            .finish()
    }
}

/// How a navigational flow shows its surfaces.
#[derive(Clone, Debug)]
pub enum Transition {
    /// Push onto an existing stack.
    StackPush {
        target: Weak<NavigationStack>,
        hide_tab_bar: bool,
    },
    /// Present a fresh stack as a popover anchored at `source`.
    ModalPopover { source: SourceSurface },
    /// Present a fresh stack covering the whole screen.
    ModalFullSlide { source: SourceSurface },
}

impl Transition {
    pub fn push(target: &Rc<NavigationStack>, hide_tab_bar: bool) -> Self {
        Transition::StackPush {
            target: Rc::downgrade(target),
            hide_tab_bar,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Transition::StackPush { .. } => "stack_push",
            Transition::ModalPopover { .. } => "modal_popover",
            Transition::ModalFullSlide { .. } => "modal_full_slide",
        }
    }

    pub fn is_modal(&self) -> bool {
        !matches!(self, Transition::StackPush { .. })
    }
}

/// Transition choice relative to a tab's current stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimpleTransition {
    Push { hide_tab_bar: bool },
    PopOver,
    SlideFromBottomToFullScreen,
}

/// Carries out one fixed [`Transition`].
///
/// Modal transitions reuse a single secondary stack, created the first time
/// something is presented.
#[derive(Debug)]
pub struct Navigator {
    transition: Transition,
    modal_stack: OnceCell<Rc<NavigationStack>>,
}

impl Navigator {
    pub fn new(transition: Transition) -> Self {
        Self {
            transition,
            modal_stack: OnceCell::new(),
        }
    }

    /// Builds a navigator from a tab's bound stack. Modal transitions anchor
    /// at whatever is on top of that stack right now.
    pub fn from_tab(tab: &TabNavigation, transition: SimpleTransition) -> Result<Self> {
        let stack = tab.stack().ok_or(FlowError::StackUnavailable)?;
        let transition = match transition {
            SimpleTransition::Push { hide_tab_bar } => Transition::push(&stack, hide_tab_bar),
            SimpleTransition::PopOver => Transition::ModalPopover {
                source: anchored_source(&stack)?,
            },
            SimpleTransition::SlideFromBottomToFullScreen => Transition::ModalFullSlide {
                source: anchored_source(&stack)?,
            },
        };
        Ok(Self::new(transition))
    }

    pub fn transition(&self) -> &Transition {
        &self.transition
    }

    /// The secondary stack, if a modal transition has presented yet.
    pub fn modal_stack(&self) -> Option<Rc<NavigationStack>> {
        self.modal_stack.get().map(Rc::clone)
    }

    /// Shows `surface` according to the transition.
    pub fn present(&self, surface: SurfaceRef) -> Result<()> {
        match &self.transition {
            Transition::StackPush {
                target,
                hide_tab_bar,
            } => {
                let target = target.upgrade().ok_or(FlowError::StackUnavailable)?;
                target.push(surface, *hide_tab_bar);
            }
            Transition::ModalPopover { source } => {
                self.present_modal(source, surface, ModalStyle::Popover)?
            }
            Transition::ModalFullSlide { source } => {
                self.present_modal(source, surface, ModalStyle::FullScreenCover)?
            }
        }
        Ok(())
    }

    fn present_modal(
        &self,
        source: &SourceSurface,
        surface: SurfaceRef,
        style: ModalStyle,
    ) -> Result<()> {
        let host = source.host().ok_or(FlowError::StackUnavailable)?;
        let anchor = source.surface().ok_or(FlowError::NoVisibleSurface)?;
        let stack = self
            .modal_stack
            .get_or_init(|| Rc::new(NavigationStack::new(format!("{}.modal", host.label()))));
        stack.set_surfaces(vec![surface]);
        let replaced = host.present(Presentation {
            stack: Rc::clone(stack),
            style,
            anchor: Rc::downgrade(&anchor),
        });
        drop(replaced);
        Ok(())
    }
}

fn anchored_source(stack: &Rc<NavigationStack>) -> Result<SourceSurface> {
    let top = stack.top().ok_or(FlowError::NoVisibleSurface)?;
    Ok(SourceSurface::new(stack, &top))
}
