//! Deep merge of YAML configuration values.
//!
//! # Merge Rules
//!
//! - Mappings merge recursively
//! - Sequences are replaced entirely, so a local `steps:` list replaces
//!   the shared one
//! - A null in the overlay deletes the key
//! - Scalars in the overlay replace the base

use serde_yaml::Value;

/// Merge `overlay` onto `base`, the overlay winning at every conflict.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    let (Value::Mapping(base_map), Value::Mapping(overlay_map)) = (base, overlay) else {
        return overlay.clone();
    };

    let mut merged = base_map.clone();
    for (key, value) in overlay_map {
        if value.is_null() {
            merged.remove(key);
            continue;
        }
        let next = match base_map.get(key) {
            Some(existing) => deep_merge(existing, value),
            None => value.clone(),
        };
        merged.insert(key.clone(), next);
    }

    Value::Mapping(merged)
}

/// Merge several values in order, later ones winning.
pub fn merge_configs(configs: &[Value]) -> Value {
    configs
        .iter()
        .fold(Value::Mapping(Default::default()), |acc, config| {
            deep_merge(&acc, config)
        })
}
