use std::rc::Rc;

/// Anything that can be shown on screen: a screen, a tab bar, a whole stack.
pub trait Surface: 'static {
    fn title(&self) -> &str;
}

pub type SurfaceRef = Rc<dyn Surface>;

/// Whether two handles point at the same surface, ignoring vtables.
pub fn same_surface(left: &SurfaceRef, right: &SurfaceRef) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(left), Rc::as_ptr(right))
}
