//! Configuration merge logic
//!
//! - Sections: deep-merge by key (recursive)
//! - Scalars: override (last wins)
//! - Type conflicts: the overlay value replaces the base value

use crate::format::{ConfigNode, ConfigValue};

/// Merge `overlay` into `base`, overlay taking precedence.
pub fn deep_merge(base: &mut ConfigNode, overlay: ConfigNode) {
    for (key, value) in overlay {
        match value {
            ConfigValue::Section(incoming) => match base.get_mut(&key) {
                Some(ConfigValue::Section(existing)) => deep_merge(existing, incoming),
                _ => base.insert(key, incoming),
            },
            scalar => base.insert(key, scalar),
        }
    }
}

/// Merge layers in order: the first is the base, the last has the highest
/// precedence.
pub fn merge_layers(layers: impl IntoIterator<Item = ConfigNode>) -> ConfigNode {
    layers.into_iter().fold(ConfigNode::new(), |mut acc, layer| {
        deep_merge(&mut acc, layer);
        acc
    })
}
