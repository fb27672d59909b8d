use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::navigation::TabFlow;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(String);

impl TabId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TabId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TabId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// What the tab bar shows for one tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabBarItem {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub tag: usize,
}

impl TabBarItem {
    pub fn new(title: impl Into<String>, tag: usize) -> Self {
        Self {
            title: title.into(),
            icon: None,
            tag,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

pub type TabFactory = Rc<dyn Fn() -> Result<Rc<dyn TabFlow>>>;

#[derive(Clone)]
pub struct TabDeclaration {
    pub id: TabId,
    pub item: TabBarItem,
    factory: TabFactory,
}

impl TabDeclaration {
    pub fn new<F>(id: impl Into<TabId>, item: TabBarItem, factory: F) -> Self
    where
        F: Fn() -> Result<Rc<dyn TabFlow>> + 'static,
    {
        Self {
            id: id.into(),
            item,
            factory: Rc::new(factory),
        }
    }

    /// Builds a fresh flow for this tab.
    pub fn build(&self) -> Result<Rc<dyn TabFlow>> {
        (self.factory)()
    }
}

impl fmt::Debug for TabDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabDeclaration")
            .field("id", &self.id)
            .field("item", &self.item)
            .finish_non_exhaustive()
    }
}

/// Every tab the application knows about, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct TabTable {
    entries: IndexMap<TabId, TabDeclaration>,
}

impl TabTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tab, replacing any earlier declaration with the same id in place.
    pub fn declare(mut self, declaration: TabDeclaration) -> Self {
        self.insert(declaration);
        self
    }

    pub fn insert(&mut self, declaration: TabDeclaration) {
        self.entries.insert(declaration.id.clone(), declaration);
    }

    pub fn get(&self, id: &TabId) -> Option<&TabDeclaration> {
        self.entries.get(id)
    }

    pub fn ids(&self) -> Vec<TabId> {
        self.entries.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TabDeclaration> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
