use crate::errors::OdmError;
use crate::query::compare_numbers;
use crate::types::{Filter, Item};
use serde_json::Value;
use std::cmp::Ordering;

const MAX_PATH_DEPTH: usize = 32;

/// Evaluate a store filter against one item.
///
/// Each mapping key is `<path>` (equality) or `<path>?<op>`; paths may be dotted
/// to reach into nested mappings. All conditions of a mapping must hold; a list
/// of mappings matches when any of them does.
///
/// # Errors
/// `InvalidQuery` for an unknown operator or a malformed range operand.
pub fn matches(item: &Item, filter: &Filter) -> Result<bool, OdmError> {
    match filter {
        Filter::All(conditions) => all_hold(item, conditions),
        Filter::Any(groups) if groups.is_empty() => Ok(true),
        Filter::Any(groups) => {
            for group in groups {
                if all_hold(item, group)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

fn all_hold(item: &Item, conditions: &serde_json::Map<String, Value>) -> Result<bool, OdmError> {
    for (spec, operand) in conditions {
        let (path, op) = spec.split_once('?').unwrap_or((spec.as_str(), "eq"));
        if !holds(get_path(item, path), op, operand)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn holds(value: Option<&Value>, op: &str, operand: &Value) -> Result<bool, OdmError> {
    let ord = || value.and_then(|v| compare(v, operand));
    Ok(match op {
        "eq" => value.is_some_and(|v| equal(v, operand)),
        "ne" => !value.is_some_and(|v| equal(v, operand)),
        "lt" => ord() == Some(Ordering::Less),
        "gt" => ord() == Some(Ordering::Greater),
        "lte" => matches!(ord(), Some(Ordering::Less | Ordering::Equal)),
        "gte" => matches!(ord(), Some(Ordering::Greater | Ordering::Equal)),
        "pfx" => match (value, operand) {
            (Some(Value::String(s)), Value::String(p)) => s.starts_with(p.as_str()),
            _ => false,
        },
        "r" => {
            let Some(bounds) = operand.as_array().filter(|b| b.len() == 2) else {
                return Err(OdmError::InvalidQuery(format!("range operand must be [lower, upper], got {operand}")));
            };
            let (lo, hi) = (&bounds[0], &bounds[1]);
            value.is_some_and(|v| {
                matches!(compare(v, lo), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(compare(v, hi), Some(Ordering::Less | Ordering::Equal))
            })
        }
        "contains" => value.is_some_and(|v| contains(v, operand)),
        "not_contains" => !value.is_some_and(|v| contains(v, operand)),
        other => return Err(OdmError::InvalidQuery(format!("unknown operator '{other}'"))),
    })
}

fn get_path<'a>(item: &'a Item, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    let mut parts = path.split('.');
    let mut cur = item.get(parts.next()?)?;
    for (depth, part) in parts.enumerate() {
        if depth >= MAX_PATH_DEPTH {
            return None;
        }
        cur = cur.as_object()?.get(part)?;
    }
    Some(cur)
}

fn equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare_numbers(a, b) == Some(Ordering::Equal),
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare_numbers(a, b),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn contains(value: &Value, needle: &Value) -> bool {
    match (value, needle) {
        (Value::String(s), Value::String(n)) => s.contains(n.as_str()),
        (Value::Array(items), _) => items.iter().any(|i| equal(i, needle)),
        _ => false,
    }
}
