use super::store::{NodeId, SharedStore, Slot};
use crate::format::Scalar;

/// Lazy iterator over the scalar children of one node.
///
/// Each step reads the shared store afresh, so writes made between steps
/// are visible. Sections are skipped.
pub struct ScalarIter {
    store: SharedStore,
    node: NodeId,
    position: usize,
}

impl ScalarIter {
    pub(crate) fn new(store: SharedStore, node: NodeId) -> Self {
        Self {
            store,
            node,
            position: 0,
        }
    }
}

impl Iterator for ScalarIter {
    type Item = (String, Scalar);

    fn next(&mut self) -> Option<Self::Item> {
        let store = self.store.borrow();
        let entries = store.entries(self.node);

        while let Some((key, slot)) = entries.get(self.position) {
            self.position += 1;
            if let Slot::Scalar(scalar) = slot {
                return Some((key.clone(), scalar.clone()));
            }
        }

        None
    }
}
