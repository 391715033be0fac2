//! Arena storage for configuration trees.
//!
//! Every node of a loaded configuration lives in one [`Store`], addressed by
//! a [`NodeId`]. Views hold ids instead of references, so any number of them
//! can expose the same subtree and all observe each other's writes.

use std::cell::RefCell;
use std::rc::Rc;

use crate::format::{ConfigNode, ConfigValue, Scalar};

pub(crate) type SharedStore = Rc<RefCell<Store>>;

/// Stable handle to a node inside a [`Store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Slot {
    Scalar(Scalar),
    Section(NodeId),
}

#[derive(Debug, Default)]
struct Node {
    entries: Vec<(String, Slot)>,
}

/// Node table plus the unsaved-changes flag shared by all views.
#[derive(Debug, Default)]
pub(crate) struct Store {
    nodes: Vec<Node>,
    dirty: bool,
    // No file bound yet: scalar writes are refused
    unloaded: bool,
}

impl Store {
    pub(crate) fn shared() -> SharedStore {
        Rc::new(RefCell::new(Store::default()))
    }

    pub(crate) fn shared_unloaded() -> SharedStore {
        Rc::new(RefCell::new(Store {
            unloaded: true,
            ..Store::default()
        }))
    }

    pub(crate) fn is_unloaded(&self) -> bool {
        self.unloaded
    }

    pub(crate) fn alloc(&mut self) -> NodeId {
        self.nodes.push(Node::default());
        NodeId(self.nodes.len() - 1)
    }

    /// Copy an owned tree into the arena, returning the id of its root.
    pub(crate) fn import(&mut self, node: ConfigNode) -> NodeId {
        let id = self.alloc();
        for (key, value) in node {
            let slot = match value {
                ConfigValue::Scalar(scalar) => Slot::Scalar(scalar),
                ConfigValue::Section(child) => Slot::Section(self.import(child)),
            };
            self.nodes[id.0].entries.push((key, slot));
        }
        id
    }

    pub(crate) fn export(&self, id: NodeId) -> ConfigNode {
        let mut node = ConfigNode::new();
        for (key, slot) in &self.nodes[id.0].entries {
            match slot {
                Slot::Scalar(scalar) => node.insert(key.clone(), scalar.clone()),
                Slot::Section(child) => node.insert(key.clone(), self.export(*child)),
            }
        }
        node
    }

    pub(crate) fn deep_copy(&mut self, id: NodeId) -> NodeId {
        let entries = self.nodes[id.0].entries.clone();
        let copy = self.alloc();
        for (key, slot) in entries {
            let slot = match slot {
                Slot::Section(child) => Slot::Section(self.deep_copy(child)),
                scalar => scalar,
            };
            self.nodes[copy.0].entries.push((key, slot));
        }
        copy
    }

    pub(crate) fn get(&self, id: NodeId, key: &str) -> Option<&Slot> {
        self.nodes[id.0]
            .entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, slot)| slot)
    }

    pub(crate) fn child_section(&self, id: NodeId, key: &str) -> Option<NodeId> {
        match self.get(id, key) {
            Some(Slot::Section(child)) => Some(*child),
            _ => None,
        }
    }

    pub(crate) fn insert(&mut self, id: NodeId, key: &str, slot: Slot) {
        let entries = &mut self.nodes[id.0].entries;
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = slot,
            None => entries.push((key.to_string(), slot)),
        }
    }

    pub(crate) fn remove(&mut self, id: NodeId, key: &str) -> Option<Slot> {
        let entries = &mut self.nodes[id.0].entries;
        let idx = entries.iter().position(|(k, _)| k == key)?;
        Some(entries.remove(idx).1)
    }

    pub(crate) fn entries(&self, id: NodeId) -> &[(String, Slot)] {
        &self.nodes[id.0].entries
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}
