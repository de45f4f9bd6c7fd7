use serde_json::{Map, Value};

use crate::model::LayerKind;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    #[error("field path is empty")]
    EmptyPath,
    #[error("'{segment}' in path '{path}' is not an object")]
    PathConflict { path: String, segment: String },
}

/// One precedence layer of a resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub kind: LayerKind,
    pub data: Value,
}

impl Layer {
    pub fn new(kind: LayerKind, data: Value) -> Self {
        Self { kind, data }
    }

    /// A layer that carries nothing does not count as contributing
    pub fn is_empty(&self) -> bool {
        match &self.data {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }
}

/// Recursively merge `overlay` into `base`.
///
/// Objects merge key by key at every depth. Arrays and scalars from the
/// overlay replace the base value. `null` in the overlay is treated as absent.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        if !overlay_value.is_null() {
                            base_map.insert(key.clone(), strip_nulls(overlay_value));
                        }
                    }
                }
            }
        }
        (base, overlay) => *base = strip_nulls(overlay),
    }
}

fn strip_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), strip_nulls(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Merge layers in precedence order. Layers are sorted by kind first, so
/// callers cannot accidentally invert the precedence.
///
/// Returns the merged value and the kinds of the layers that contributed.
pub fn merge_layers(layers: &[Layer]) -> (Value, Vec<LayerKind>) {
    let mut ordered: Vec<&Layer> = layers.iter().collect();
    ordered.sort_by_key(|layer| layer.kind);

    let mut merged = Value::Object(Map::new());
    let mut contributed = Vec::new();
    for layer in ordered {
        if layer.is_empty() {
            continue;
        }
        deep_merge(&mut merged, &layer.data);
        contributed.push(layer.kind);
    }
    (merged, contributed)
}

/// Look up a dotted path such as `colors.title.value`
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Write `new_value` at a dotted path, creating intermediate objects
pub fn set_path(target: &mut Value, path: &str, new_value: Value) -> Result<(), MergeError> {
    let segments: Vec<&str> = path.split('.').collect();
    if path.is_empty() || segments.iter().any(|s| s.is_empty()) {
        return Err(MergeError::EmptyPath);
    }

    if target.is_null() {
        *target = Value::Object(Map::new());
    }

    let (last, parents) = segments.split_last().ok_or(MergeError::EmptyPath)?;
    let mut current = target;
    for segment in parents {
        let Value::Object(map) = current else {
            return Err(MergeError::PathConflict {
                path: path.to_string(),
                segment: segment.to_string(),
            });
        };
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if current.is_null() {
            *current = Value::Object(Map::new());
        }
    }

    match current {
        Value::Object(map) => {
            map.insert(last.to_string(), new_value);
            Ok(())
        }
        _ => Err(MergeError::PathConflict {
            path: path.to_string(),
            segment: parents.last().unwrap_or(last).to_string(),
        }),
    }
}
