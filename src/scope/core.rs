use std::any::{Any, TypeId, type_name};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::error::{FlowError, Result};

use super::module::{ModuleList, Registration, Registrations};

/// Resolution context owned by a single flow controller.
///
/// The parent link is weak: a scope never keeps its ancestors alive. Once a
/// parent scope has been dropped, lookups that would have fallen back to it
/// miss.
pub struct DependencyScope {
    label: String,
    modules: Vec<String>,
    registrations: RefCell<HashMap<TypeId, Rc<Registration>>>,
    parent: Option<Weak<DependencyScope>>,
    depth: usize,
}

impl DependencyScope {
    /// Builds a scope with no parent.
    pub fn root(label: impl Into<String>, modules: ModuleList) -> Rc<Self> {
        Rc::new(Self::build(label.into(), None, modules))
    }

    /// Builds a scope that falls back to `parent` on a local miss.
    pub fn child(parent: &Rc<Self>, label: impl Into<String>, modules: ModuleList) -> Rc<Self> {
        Rc::new(Self::build(label.into(), Some(parent), modules))
    }

    fn build(label: String, parent: Option<&Rc<Self>>, modules: ModuleList) -> Self {
        let mut registrations = Registrations::new();
        let mut names = Vec::with_capacity(modules.len());
        for module in &modules {
            module.register(&mut registrations);
            names.push(module.name().to_string());
        }

        Self {
            label,
            modules: names,
            registrations: RefCell::new(registrations.into_entries()),
            parent: parent.map(Rc::downgrade),
            depth: parent.map(|p| p.depth + 1).unwrap_or(0),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Names of the modules applied when the scope was built.
    pub fn module_names(&self) -> &[String] {
        &self.modules
    }

    /// Distance from the root scope; the root is at depth zero.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn parent(&self) -> Option<Rc<Self>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn registered_locally<T: 'static>(&self) -> bool {
        self.registrations.borrow().contains_key(&TypeId::of::<T>())
    }

    /// Whether any scope from here up to the root can provide `T`.
    pub fn provides<T: 'static>(&self) -> bool {
        if self.registered_locally::<T>() {
            return true;
        }
        self.parent().is_some_and(|parent| parent.provides::<T>())
    }

    /// Resolves `T`, preferring the nearest registration in the chain.
    pub fn resolve<T: 'static>(&self) -> Result<Rc<T>> {
        let erased = self
            .resolve_erased(TypeId::of::<T>())?
            .ok_or_else(|| FlowError::Unresolved {
                type_name: type_name::<T>(),
                scope: self.label.clone(),
            })?;
        erased
            .downcast::<T>()
            .map_err(|_| FlowError::TypeMismatch(type_name::<T>()))
    }

    fn resolve_erased(&self, type_id: TypeId) -> Result<Option<Rc<dyn Any>>> {
        // Clone the registration out so factories can resolve from this scope.
        let local = self.registrations.borrow().get(&type_id).cloned();
        if let Some(registration) = local {
            return registration.instance(self).map(Some);
        }
        match self.parent() {
            Some(parent) => parent.resolve_erased(type_id),
            None => Ok(None),
        }
    }

    /// Releases every instance cached directly by this scope. Registrations
    /// stay in place, so later lookups build fresh instances. Returns how many
    /// live instances were dropped.
    pub fn teardown(&self) -> usize {
        let registrations: Vec<_> = self.registrations.borrow().values().cloned().collect();
        registrations
            .iter()
            .filter(|registration| registration.release())
            .count()
    }

    /// Type names registered directly in this scope, sorted.
    pub fn registered_types(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .registrations
            .borrow()
            .values()
            .map(|registration| registration.type_name())
            .collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for DependencyScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyScope")
            .field("label", &self.label)
            .field("modules", &self.modules)
            .field("depth", &self.depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{ObjectScope, module_fn};
    use std::cell::Cell;

    #[derive(Debug, PartialEq)]
    struct Greeting(&'static str);

    #[derive(Debug)]
    struct Session {
        user: String,
    }

    fn greeting(text: &'static str) -> ModuleList {
        vec![Box::new(module_fn("greeting", move |registrations| {
            registrations.transient(move |_| Ok(Greeting(text)));
        }))]
    }

    #[test]
    fn resolves_from_root_at_any_depth() {
        let root = DependencyScope::root("root", greeting("hello"));
        let mut chain = vec![Rc::clone(&root)];
        for level in 1..=5 {
            let parent = Rc::clone(chain.last().unwrap());
            chain.push(DependencyScope::child(&parent, format!("level-{level}"), Vec::new()));
        }

        let leaf = chain.last().unwrap();
        assert_eq!(leaf.depth(), 5);
        assert_eq!(*leaf.resolve::<Greeting>().unwrap(), Greeting("hello"));
    }

    #[test]
    fn nearest_registration_wins() {
        let root = DependencyScope::root("root", greeting("root"));
        let middle = DependencyScope::child(&root, "middle", greeting("middle"));
        let leaf = DependencyScope::child(&middle, "leaf", Vec::new());

        assert_eq!(*leaf.resolve::<Greeting>().unwrap(), Greeting("middle"));
        assert_eq!(*root.resolve::<Greeting>().unwrap(), Greeting("root"));
    }

    #[test]
    fn missing_type_reports_requesting_scope() {
        let root = DependencyScope::root("root", Vec::new());
        let leaf = DependencyScope::child(&root, "leaf", Vec::new());
        let err = leaf.resolve::<Session>().unwrap_err();
        match err {
            FlowError::Unresolved { scope, type_name } => {
                assert_eq!(scope, "leaf");
                assert!(type_name.ends_with("Session"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn dropped_parent_is_not_consulted() {
        let root = DependencyScope::root("root", greeting("root"));
        let leaf = DependencyScope::child(&root, "leaf", Vec::new());
        drop(root);
        assert!(leaf.parent().is_none());
        assert!(!leaf.provides::<Greeting>());
        assert!(leaf.resolve::<Greeting>().is_err());
    }

    #[test]
    fn object_scopes_control_sharing() {
        let builds = Rc::new(Cell::new(0));
        let build_counter = Rc::clone(&builds);
        let module = module_fn("sessions", move |registrations| {
            let counter = Rc::clone(&build_counter);
            registrations.register(ObjectScope::Container, move |_| {
                counter.set(counter.get() + 1);
                Ok(Session {
                    user: "ada".into(),
                })
            });
        });
        let scope = DependencyScope::root("root", vec![Box::new(module)]);

        let first = scope.resolve::<Session>().unwrap();
        let second = scope.resolve::<Session>().unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(first.user, "ada");
        assert_eq!(builds.get(), 1);

        assert_eq!(scope.teardown(), 1);
        let third = scope.resolve::<Session>().unwrap();
        assert!(!Rc::ptr_eq(&first, &third));
        assert_eq!(builds.get(), 2);
    }

    #[test]
    fn weak_scope_rebuilds_once_released() {
        let module = module_fn("weak", |registrations| {
            registrations.register(ObjectScope::Weak, |_| {
                Ok(Session {
                    user: "grace".into(),
                })
            });
        });
        let scope = DependencyScope::root("root", vec![Box::new(module)]);

        let held = scope.resolve::<Session>().unwrap();
        let again = scope.resolve::<Session>().unwrap();
        assert!(Rc::ptr_eq(&held, &again));

        let stale = Rc::downgrade(&held);
        drop(held);
        drop(again);
        assert!(stale.upgrade().is_none());

        let rebuilt = scope.resolve::<Session>().unwrap();
        assert_eq!(rebuilt.user, "grace");
        assert_eq!(Rc::weak_count(&rebuilt), 1);
    }

    #[test]
    fn factories_resolve_from_their_own_scope() {
        let root_modules: ModuleList = vec![
            Box::new(module_fn("greeting", |registrations| {
                registrations.transient(|_| Ok(Greeting("root")));
            })),
            Box::new(module_fn("session", |registrations| {
                registrations.transient(|scope| {
                    let greeting = scope.resolve::<Greeting>()?;
                    Ok(Session {
                        user: greeting.0.to_string(),
                    })
                });
            })),
        ];
        let root = DependencyScope::root("root", root_modules);
        let leaf = DependencyScope::child(&root, "leaf", greeting("leaf"));

        assert_eq!(leaf.resolve::<Session>().unwrap().user, "root");
        assert_eq!(root.module_names(), ["greeting", "session"]);
    }

    #[test]
    fn instances_survive_teardown() {
        let shared = Rc::new(Greeting("pinned"));
        let pinned = Rc::clone(&shared);
        let module = module_fn("pinned", move |registrations| {
            registrations.instance(Rc::clone(&pinned));
        });
        let scope = DependencyScope::root("root", vec![Box::new(module)]);

        assert!(Rc::ptr_eq(&scope.resolve::<Greeting>().unwrap(), &shared));
        assert_eq!(scope.teardown(), 0);
        assert!(Rc::ptr_eq(&scope.resolve::<Greeting>().unwrap(), &shared));
    }
}
