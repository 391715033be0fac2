//! Read/write view over one node of a configuration tree.

use serde::Serialize;
use std::fmt;

use super::iter::ScalarIter;
use super::store::{NodeId, SharedStore, Slot, Store};
use crate::errors::ConfigError;
use crate::format::{ConfigNode, ConfigValue, Scalar};

/// Result of a [`Collection::get`]: a scalar by value, or a view over a
/// section.
#[derive(Debug, Clone)]
pub enum Item {
    Scalar(Scalar),
    Section(Collection),
}

/// A view over one configuration node.
///
/// A layered view addresses the same path in three trees: the effective
/// tree (every read), the local tree (mirrors every write), and the
/// inherited tree (read-only, used to restore a value when its local
/// override is deleted). A standalone view has only the effective tree.
///
/// Sections can only be added to a root view: the text format has a single
/// level of `[section]` headers.
///
/// Cloning a view, or fetching the same section twice, never copies data:
/// all views share the owning store and its dirty flag.
#[derive(Clone)]
pub struct Collection {
    store: SharedStore,
    effective: NodeId,
    local: Option<NodeId>,
    inherited: Option<NodeId>,
    nested: bool,
}

impl Collection {
    /// A standalone, non-layered collection over an owned tree.
    pub fn from_node(node: ConfigNode) -> Self {
        let store = Store::shared();
        let effective = store.borrow_mut().import(node);
        Self {
            store,
            effective,
            local: None,
            inherited: None,
            nested: false,
        }
    }

    pub(crate) fn layered(
        store: SharedStore,
        effective: NodeId,
        local: NodeId,
        inherited: Option<NodeId>,
    ) -> Self {
        Self {
            store,
            effective,
            local: Some(local),
            inherited,
            nested: false,
        }
    }

    /// Value stored at `key`.
    ///
    /// For a section, returns a view over it. In a layered view, a section
    /// that has no local counterpart yet is created empty in the local tree
    /// first and the configuration is flagged as changed, since the caller
    /// may now write into it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `key` is absent.
    pub fn get(&self, key: &str) -> Result<Item, ConfigError> {
        let slot = self.store.borrow().get(self.effective, key).cloned();
        match slot {
            None => Err(ConfigError::not_found(key)),
            Some(Slot::Scalar(scalar)) => Ok(Item::Scalar(scalar)),
            Some(Slot::Section(effective)) => self.section_view(key, effective).map(Item::Section),
        }
    }

    /// Scalar stored at `key`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NotFound`] if absent, [`ConfigError::InvalidValue`] if
    /// `key` is a section.
    pub fn scalar(&self, key: &str) -> Result<Scalar, ConfigError> {
        match self.get(key)? {
            Item::Scalar(scalar) => Ok(scalar),
            Item::Section(_) => Err(ConfigError::invalid_value(key, "is a section")),
        }
    }

    /// Section view at `key`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NotFound`] if absent, [`ConfigError::InvalidValue`] if
    /// `key` is a scalar.
    pub fn section(&self, key: &str) -> Result<Collection, ConfigError> {
        match self.get(key)? {
            Item::Section(section) => Ok(section),
            Item::Scalar(_) => Err(ConfigError::invalid_value(key, "is not a section")),
        }
    }

    fn section_view(&self, key: &str, effective: NodeId) -> Result<Collection, ConfigError> {
        let mut store = self.store.borrow_mut();

        let local = match self.local {
            None => None,
            Some(local) => match store.get(local, key).cloned() {
                Some(Slot::Section(id)) => Some(id),
                Some(Slot::Scalar(_)) => {
                    return Err(ConfigError::invalid_value(
                        key,
                        "local value is a scalar but the merged value is a section",
                    ));
                }
                None => {
                    let id = store.alloc();
                    store.insert(local, key, Slot::Section(id));
                    store.mark_dirty();
                    tracing::debug!(
                        event = "core.collection.local_section_created",
                        section = key
                    );
                    Some(id)
                }
            },
        };

        let inherited = self.inherited.and_then(|id| store.child_section(id, key));

        Ok(Collection {
            store: self.store.clone(),
            effective,
            local,
            inherited,
            nested: true,
        })
    }

    /// Store a scalar at `key`.
    ///
    /// The configuration is flagged as changed only if the local value was
    /// absent or different.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `key` is not a valid key,
    /// already holds a section, or `value` is a non-finite float.
    /// Returns [`ConfigError::NotLoaded`] before the owning configuration
    /// is loaded. Nothing is modified in either case.
    pub fn set(&self, key: &str, value: impl Into<Scalar>) -> Result<(), ConfigError> {
        validate_key(key)?;
        let value = value.into();
        let mut store = self.store.borrow_mut();
        check_write(&store, key, &value)?;

        let reference = self.local.unwrap_or(self.effective);
        let holds_section = |id: NodeId| matches!(store.get(id, key), Some(Slot::Section(_)));
        if holds_section(self.effective) || holds_section(reference) {
            return Err(ConfigError::invalid_value(
                key,
                "unable to overwrite section with a scalar",
            ));
        }

        let unchanged = matches!(
            store.get(reference, key),
            Some(Slot::Scalar(existing)) if *existing == value
        );

        store.insert(self.effective, key, Slot::Scalar(value.clone()));
        if let Some(local) = self.local {
            store.insert(local, key, Slot::Scalar(value));
        }
        if !unchanged {
            store.mark_dirty();
        }

        Ok(())
    }

    /// Store an arbitrary value, rejecting anything that is not a scalar.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for section values, and
    /// whatever [`Collection::set`] returns otherwise.
    pub fn set_value(&self, key: &str, value: ConfigValue) -> Result<(), ConfigError> {
        match value {
            ConfigValue::Scalar(scalar) => self.set(key, scalar),
            ConfigValue::Section(_) => Err(ConfigError::invalid_value(
                key,
                "value must be a scalar, section given",
            )),
        }
    }

    /// Append a scalar under the next free integer key and return that key.
    ///
    /// The key is one past the largest all-digit key, or `0`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the largest index is
    /// `u64::MAX` or `value` is a non-finite float, and
    /// [`ConfigError::NotLoaded`] before the owning configuration is loaded.
    pub fn push(&self, value: impl Into<Scalar>) -> Result<String, ConfigError> {
        let value = value.into();
        let mut store = self.store.borrow_mut();

        let last = store
            .entries(self.effective)
            .iter()
            .filter(|(k, _)| is_index_key(k))
            .filter_map(|(k, _)| k.parse::<u64>().ok())
            .max();
        let next = match last {
            None => 0,
            Some(last) => last.checked_add(1).ok_or_else(|| {
                ConfigError::invalid_value(&last.to_string(), "no index left to append after")
            })?,
        };
        let key = next.to_string();
        check_write(&store, &key, &value)?;

        store.insert(self.effective, &key, Slot::Scalar(value.clone()));
        if let Some(local) = self.local {
            store.insert(local, &key, Slot::Scalar(value));
        }
        store.mark_dirty();

        Ok(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.store.borrow().get(self.effective, key).is_some()
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.store
            .borrow()
            .child_section(self.effective, name)
            .is_some()
    }

    /// Remove `key`, returning whether anything was removed.
    ///
    /// In a layered view only the local override is removed: the effective
    /// value falls back to the inherited one, if any. A key that is only
    /// inherited is left untouched and the configuration is not flagged as
    /// changed.
    pub fn delete(&self, key: &str) -> bool {
        let mut store = self.store.borrow_mut();

        let Some(local) = self.local else {
            let removed = store.remove(self.effective, key).is_some();
            if removed {
                store.mark_dirty();
            }
            return removed;
        };

        if store.remove(local, key).is_none() {
            return false;
        }
        store.mark_dirty();

        let inherited = self.inherited.and_then(|id| store.get(id, key).cloned());
        match inherited {
            Some(Slot::Scalar(scalar)) => {
                store.insert(self.effective, key, Slot::Scalar(scalar));
            }
            Some(Slot::Section(id)) => {
                let copy = store.deep_copy(id);
                store.insert(self.effective, key, Slot::Section(copy));
            }
            None => {
                store.remove(self.effective, key);
            }
        }

        true
    }

    /// Create an empty section at `name`, or return the existing one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `name` is not a valid key,
    /// holds a scalar, or this view is itself a section.
    pub fn add_section(&self, name: &str) -> Result<Collection, ConfigError> {
        validate_key(name)?;
        if self.nested {
            return Err(ConfigError::invalid_value(
                name,
                "sections can only be added at the top level",
            ));
        }

        let existing = self.store.borrow().get(self.effective, name).cloned();
        match existing {
            Some(Slot::Section(_)) => self.section(name),
            Some(Slot::Scalar(_)) => Err(ConfigError::invalid_value(
                name,
                "unable to overwrite scalar with a section",
            )),
            None => {
                let mut store = self.store.borrow_mut();

                let effective = store.alloc();
                store.insert(self.effective, name, Slot::Section(effective));

                let local = self.local.map(|local| {
                    let id = store.alloc();
                    store.insert(local, name, Slot::Section(id));
                    id
                });
                store.mark_dirty();

                let inherited = self.inherited.and_then(|id| store.child_section(id, name));

                Ok(Collection {
                    store: self.store.clone(),
                    effective,
                    local,
                    inherited,
                    nested: true,
                })
            }
        }
    }

    /// Names of the direct children that are sections.
    pub fn section_names(&self) -> Vec<String> {
        self.store
            .borrow()
            .entries(self.effective)
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Section(_)))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Number of direct children, scalars and sections alike.
    pub fn count(&self) -> usize {
        self.store.borrow().entries(self.effective).len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Iterate the direct scalar children in order, skipping sections.
    pub fn iter(&self) -> ScalarIter {
        ScalarIter::new(self.store.clone(), self.effective)
    }

    /// Owned snapshot of the effective tree below this view.
    pub fn to_node(&self) -> ConfigNode {
        self.store.borrow().export(self.effective)
    }

    /// JSON rendering of the effective tree below this view.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.store.borrow().is_dirty()
    }

    pub(crate) fn clear_dirty(&self) {
        self.store.borrow_mut().clear_dirty();
    }

    /// Owned snapshot of the local tree; `None` for standalone views.
    pub(crate) fn local_node(&self) -> Option<ConfigNode> {
        self.local.map(|id| self.store.borrow().export(id))
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = (String, Scalar);
    type IntoIter = ScalarIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for Collection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_node().serialize(serializer)
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.to_node(), f)
    }
}

fn check_write(store: &Store, key: &str, value: &Scalar) -> Result<(), ConfigError> {
    if store.is_unloaded() {
        return Err(ConfigError::NotLoaded);
    }
    if let Scalar::Float(number) = value
        && !number.is_finite()
    {
        return Err(ConfigError::invalid_value(key, "float value must be finite"));
    }
    Ok(())
}

fn is_index_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

/// Keys must survive a write/parse cycle of the text format.
fn validate_key(key: &str) -> Result<(), ConfigError> {
    if key.is_empty() {
        return Err(ConfigError::invalid_value(key, "key must not be empty"));
    }
    if key.trim() != key {
        return Err(ConfigError::invalid_value(
            key,
            "key must not have surrounding whitespace",
        ));
    }
    if key.contains(['=', '[', ']', ';', '#', '"', '\n', '\r']) {
        return Err(ConfigError::invalid_value(
            key,
            "key contains a reserved character",
        ));
    }
    Ok(())
}
