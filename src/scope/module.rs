use std::any::{Any, TypeId, type_name};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::Result;

use super::DependencyScope;

/// How long a resolved instance lives inside the scope that registered it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectScope {
    /// A new instance for every resolve.
    #[default]
    Transient,
    /// Built once and cached until the scope is dropped or torn down.
    Container,
    /// Shared while anyone else still holds it, rebuilt afterwards.
    Weak,
}

/// Declarative registration unit applied to a scope when it is built.
pub trait DependencyModule {
    fn name(&self) -> &str {
        "dependency_module"
    }

    fn register(&self, registrations: &mut Registrations);
}

pub type ModuleList = Vec<Box<dyn DependencyModule>>;

/// Closure-backed module, mostly handy for small wiring and tests.
pub struct ModuleFn<F> {
    name: String,
    register: F,
}

pub fn module_fn<F>(name: impl Into<String>, register: F) -> ModuleFn<F>
where
    F: Fn(&mut Registrations),
{
    ModuleFn {
        name: name.into(),
        register,
    }
}

impl<F> DependencyModule for ModuleFn<F>
where
    F: Fn(&mut Registrations),
{
    fn name(&self) -> &str {
        &self.name
    }

    fn register(&self, registrations: &mut Registrations) {
        (self.register)(registrations)
    }
}

type ErasedFactory = Rc<dyn Fn(&DependencyScope) -> Result<Rc<dyn Any>>>;

enum Cached {
    Empty,
    Strong(Rc<dyn Any>),
    Weak(Weak<dyn Any>),
}

pub(crate) struct Registration {
    type_name: &'static str,
    object_scope: ObjectScope,
    factory: ErasedFactory,
    cached: RefCell<Cached>,
    pinned: bool,
}

impl Registration {
    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Produces the instance for this registration. `owner` is the scope the
    /// registration lives in, so factories resolve their own dependencies
    /// from there rather than from whichever descendant asked.
    pub(crate) fn instance(&self, owner: &DependencyScope) -> Result<Rc<dyn Any>> {
        if let Some(existing) = self.cached_instance() {
            return Ok(existing);
        }

        let value = (self.factory)(owner)?;
        match self.object_scope {
            ObjectScope::Transient => {}
            ObjectScope::Container => *self.cached.borrow_mut() = Cached::Strong(Rc::clone(&value)),
            ObjectScope::Weak => *self.cached.borrow_mut() = Cached::Weak(Rc::downgrade(&value)),
        }
        Ok(value)
    }

    fn cached_instance(&self) -> Option<Rc<dyn Any>> {
        match &*self.cached.borrow() {
            Cached::Empty => None,
            Cached::Strong(value) => Some(Rc::clone(value)),
            Cached::Weak(value) => value.upgrade(),
        }
    }

    /// Drops the cached instance, returning whether one was alive. Values
    /// registered with [`Registrations::instance`] are pinned and stay put.
    pub(crate) fn release(&self) -> bool {
        if self.pinned {
            return false;
        }
        let previous = self.cached.replace(Cached::Empty);
        match previous {
            Cached::Empty => false,
            Cached::Strong(_) => true,
            Cached::Weak(value) => value.strong_count() > 0,
        }
    }
}

/// Collects the registrations contributed by a scope's modules. Registering a
/// type twice keeps the last registration.
#[derive(Default)]
pub struct Registrations {
    entries: HashMap<TypeId, Rc<Registration>>,
}

impl Registrations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T, F>(&mut self, object_scope: ObjectScope, factory: F) -> &mut Self
    where
        T: 'static,
        F: Fn(&DependencyScope) -> Result<T> + 'static,
    {
        let factory: ErasedFactory =
            Rc::new(move |scope| factory(scope).map(|value| Rc::new(value) as Rc<dyn Any>));
        self.insert::<T>(object_scope, factory, None)
    }

    pub fn transient<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static,
        F: Fn(&DependencyScope) -> Result<T> + 'static,
    {
        self.register(ObjectScope::Transient, factory)
    }

    pub fn singleton<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static,
        F: Fn(&DependencyScope) -> Result<T> + 'static,
    {
        self.register(ObjectScope::Container, factory)
    }

    /// Registers an already-built value. Teardown leaves it in place.
    pub fn instance<T: 'static>(&mut self, value: Rc<T>) -> &mut Self {
        let erased: Rc<dyn Any> = value;
        let pinned = Rc::clone(&erased);
        let factory: ErasedFactory = Rc::new(move |_| Ok(Rc::clone(&erased)));
        self.insert::<T>(ObjectScope::Container, factory, Some(pinned))
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> HashMap<TypeId, Rc<Registration>> {
        self.entries
    }

    fn insert<T: 'static>(
        &mut self,
        object_scope: ObjectScope,
        factory: ErasedFactory,
        pinned: Option<Rc<dyn Any>>,
    ) -> &mut Self {
        let registration = Registration {
            type_name: type_name::<T>(),
            object_scope,
            factory,
            pinned: pinned.is_some(),
            cached: RefCell::new(pinned.map_or(Cached::Empty, Cached::Strong)),
        };
        self.entries
            .insert(TypeId::of::<T>(), Rc::new(registration));
        self
    }
}
