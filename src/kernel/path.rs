//! Dot-path access over untyped JSON mappings.
//!
//! Every other layer reads request envelopes and attribute scopes through here.
//! Absence is never an error: `get` reports it as `None` (or the caller's fallback)
//! and `set` reports a blocked write as `None` without touching the source.

use serde_json::{Map, Value};

pub type Mapping = Map<String, Value>;

/// Falsy sentinel handed back by [`get_or_false`] when a path is absent.
pub static FALSY: Value = Value::Bool(false);

/// Looks up `path` inside `source`.
///
/// Sequences are indexed by decimal segments (`list.0.url`). A `null` leaf is
/// present and returned as-is; only missing keys count as absent.
pub fn get<'a>(path: &str, source: &'a Value) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }

    let mut cursor = source;
    for segment in path.split('.') {
        cursor = match cursor {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(cursor)
}

/// Same as [`get`], starting from a bare mapping.
pub fn lookup<'a>(path: &str, source: &'a Mapping) -> Option<&'a Value> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    let value = source.get(head)?;
    match rest {
        Some(rest) => get(rest, value),
        None => Some(value),
    }
}

pub fn get_or<'a>(path: &str, source: &'a Value, fallback: &'a Value) -> &'a Value {
    get(path, source).unwrap_or(fallback)
}

pub fn get_or_false<'a>(path: &str, source: &'a Value) -> &'a Value {
    get_or(path, source, &FALSY)
}

pub fn get_str<'a>(path: &str, source: &'a Value) -> Option<&'a str> {
    get(path, source).and_then(Value::as_str)
}

/// Writes `value` at `path`, creating empty mappings for missing intermediates.
///
/// Returns `None` and leaves `source` untouched when the path is empty or an
/// existing intermediate holds a non-mapping value. `null` intermediates are
/// treated as missing.
pub fn set<'a>(path: &str, source: &'a mut Mapping, value: Value) -> Option<&'a mut Mapping> {
    if path.is_empty() {
        return None;
    }

    let segments: Vec<&str> = path.split('.').collect();
    let (leaf, parents) = segments.split_last()?;
    if is_blocked(source, parents) {
        return None;
    }

    let mut cursor = &mut *source;
    for segment in parents {
        let slot = cursor
            .entry(segment.to_string())
            .or_insert(Value::Null);
        if slot.is_null() {
            *slot = Value::Object(Mapping::new());
        }
        cursor = slot.as_object_mut()?;
    }
    cursor.insert(leaf.to_string(), value);

    Some(source)
}

/// Builds a fresh mapping holding `value` at `path`.
pub fn nest(path: &str, value: Value) -> Option<Mapping> {
    let mut fresh = Mapping::new();
    set(path, &mut fresh, value)?;
    Some(fresh)
}

/// Shallow merge: top-level keys of `update` overwrite those in `target`.
pub fn merge_shallow(target: &mut Mapping, update: Mapping) {
    for (key, value) in update {
        target.insert(key, value);
    }
}

fn is_blocked(source: &Mapping, parents: &[&str]) -> bool {
    let mut cursor = source;
    for segment in parents {
        match cursor.get(*segment) {
            None | Some(Value::Null) => return false,
            Some(Value::Object(next)) => cursor = next,
            Some(_) => return true,
        }
    }
    false
}
