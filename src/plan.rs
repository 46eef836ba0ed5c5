//! Plan rendering.
//!
//! [`plan_resource`] turns (prior state, configuration) into the planned
//! state the apply step will receive, applying the two plan modifiers that
//! affect observable behaviour:
//!
//! - **static defaults**: a null configuration value with a declared default
//!   is replaced by that default, so a default-filled attribute and an
//!   explicit equal value are indistinguishable in state;
//! - **use state for unknown**: a computed attribute with no predictable
//!   value stays unknown (absent key) unless the prior state already knows
//!   it, in which case the prior value is carried forward. This is what
//!   keeps `id` and server-managed counters stable across updates.
//!
//! Diffing is order-insensitive for `Set`-typed values: elements are sorted
//! by their serialized form before comparison, so reordering a set in
//! configuration never produces a spurious change.

use serde_json::{Map, Value};

use crate::schema::{AttributeType, BlockNestingMode, Schema};
use crate::types::{AttributeChange, PlanResult};

/// Render the planned state for one resource instance.
///
/// `prior` is `None` on create. The configuration must already have passed
/// validation; this function is total.
pub fn plan_resource(schema: &Schema, prior: Option<&Value>, config: &Value) -> PlanResult {
    let empty = Map::new();
    let config_obj = config.as_object().unwrap_or(&empty);
    let prior_obj = prior.and_then(Value::as_object);

    let mut planned = Map::new();

    for (name, attr) in &schema.block.attributes {
        let configured = config_obj.get(name).filter(|v| !v.is_null());
        match configured {
            Some(v) => {
                planned.insert(name.clone(), v.clone());
            }
            None => {
                if let Some(default) = &attr.default {
                    planned.insert(name.clone(), default.clone());
                } else if attr.flags.computed {
                    let prior_known = attr
                        .use_state_for_unknown
                        .then(|| prior_obj.and_then(|p| p.get(name)))
                        .flatten()
                        .filter(|v| !v.is_null());
                    if let Some(v) = prior_known {
                        planned.insert(name.clone(), v.clone());
                    }
                    // Otherwise the attribute stays unknown (absent key)
                    // until apply resolves it.
                } else {
                    planned.insert(name.clone(), Value::Null);
                }
            }
        }
    }

    for (name, nested) in &schema.block.blocks {
        let configured = config_obj.get(name).filter(|v| !v.is_null());
        match configured {
            Some(v) => {
                planned.insert(name.clone(), fill_block_defaults(&nested.block, v));
            }
            None => {
                let default = match nested.nesting_mode {
                    BlockNestingMode::Single => Value::Null,
                    BlockNestingMode::List | BlockNestingMode::Set => Value::Array(vec![]),
                };
                planned.insert(name.clone(), default);
            }
        }
    }

    let planned = Value::Object(planned);
    let (changes, requires_replace) = diff(schema, prior, &planned);

    if changes.is_empty() {
        PlanResult::no_change(planned)
    } else {
        PlanResult::with_changes(planned, changes, requires_replace)
    }
}

/// Fill attribute defaults inside a configured nested block value, so that
/// a sparse block in configuration and the backend's fully-populated echo
/// compare equal. Applies recursively to each element of list/set blocks.
fn fill_block_defaults(block: &crate::schema::Block, value: &Value) -> Value {
    match value {
        Value::Object(obj) => {
            let mut filled = obj.clone();
            for (name, attr) in &block.attributes {
                let missing = filled.get(name).map(Value::is_null).unwrap_or(true);
                if missing {
                    if let Some(default) = &attr.default {
                        filled.insert(name.clone(), default.clone());
                    } else if !attr.flags.computed {
                        filled.insert(name.clone(), Value::Null);
                    }
                }
            }
            Value::Object(filled)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| fill_block_defaults(block, item))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn diff(schema: &Schema, prior: Option<&Value>, planned: &Value) -> (Vec<AttributeChange>, bool) {
    let mut changes = Vec::new();
    let mut requires_replace = false;
    let planned_obj = match planned.as_object() {
        Some(obj) => obj,
        None => return (changes, false),
    };

    match prior.and_then(Value::as_object) {
        None => {
            // Create: every non-null planned value is an addition.
            for (name, value) in planned_obj {
                if !value.is_null() {
                    changes.push(AttributeChange::added(name.clone(), value.clone()));
                }
            }
        }
        Some(prior_obj) => {
            for (name, attr) in &schema.block.attributes {
                let before = prior_obj.get(name);
                let after = planned_obj.get(name);
                // An absent planned value is unknown; nothing to predict.
                let after = match after {
                    Some(v) => v,
                    None => continue,
                };
                let set_semantics = matches!(attr.attr_type, AttributeType::Set(_));
                if !values_equal(before.unwrap_or(&Value::Null), after, set_semantics) {
                    if attr.force_new {
                        requires_replace = true;
                    }
                    changes.push(AttributeChange::new(
                        name.clone(),
                        before.cloned(),
                        Some(after.clone()),
                    ));
                }
            }
            for (name, nested) in &schema.block.blocks {
                let before = prior_obj.get(name);
                let after = match planned_obj.get(name) {
                    Some(v) => v,
                    None => continue,
                };
                let set_semantics = nested.nesting_mode == BlockNestingMode::Set;
                if !values_equal(before.unwrap_or(&Value::Null), after, set_semantics) {
                    changes.push(AttributeChange::new(
                        name.clone(),
                        before.cloned(),
                        Some(after.clone()),
                    ));
                }
            }
        }
    }

    (changes, requires_replace)
}

/// Compare two wire values, order-insensitively when `set_semantics` is set.
pub fn values_equal(before: &Value, after: &Value, set_semantics: bool) -> bool {
    if set_semantics {
        normalize_set(before) == normalize_set(after)
    } else {
        before == after
    }
}

/// Normalize a set value for comparison: sort elements by serialized form.
fn normalize_set(value: &Value) -> Value {
    match value {
        Value::Array(items) => {
            let mut sorted: Vec<Value> = items.clone();
            sorted.sort_by_key(|v| v.to_string());
            Value::Array(sorted)
        }
        other => other.clone(),
    }
}
