//! Patch generation.

use crate::op::{join_path, PatchOperation};
use serde_json::Value;

/// Computes the operations that overlay `modified` onto `original`.
///
/// Object keys present only in `modified` are added and keys present in both
/// are compared recursively. Keys missing from `modified` are never removed.
/// Arrays are compared by position: trailing items beyond the new length are
/// removed last-index first, extra items are appended. Anything else falls
/// back to [`full_diff`].
pub fn diff(original: &Value, modified: &Value) -> Vec<PatchOperation> {
    let mut operations = Vec::new();
    overlay(&mut operations, original, modified, "");
    operations
}

/// Computes a complete patch turning `original` into `modified`.
///
/// Unlike [`diff`], keys missing from `modified` are removed.
pub fn full_diff(original: &Value, modified: &Value) -> Vec<PatchOperation> {
    let mut operations = Vec::new();
    compare(&mut operations, original, modified, "");
    operations
}

fn overlay(ops: &mut Vec<PatchOperation>, original: &Value, modified: &Value, base: &str) {
    match (original, modified) {
        (Value::Object(old), Value::Object(new)) => {
            for (key, value) in new {
                let path = join_path(base, key);
                match old.get(key) {
                    Some(current) => overlay(ops, current, value, &path),
                    None => ops.push(PatchOperation::Add {
                        path,
                        value: value.clone(),
                    }),
                }
            }
        }
        (Value::Array(old), Value::Array(new)) => {
            diff_arrays(ops, old, new, base, overlay);
        }
        _ => compare(ops, original, modified, base),
    }
}

fn compare(ops: &mut Vec<PatchOperation>, original: &Value, modified: &Value, base: &str) {
    match (original, modified) {
        (Value::Object(old), Value::Object(new)) => {
            for key in old.keys().filter(|key| !new.contains_key(*key)) {
                ops.push(PatchOperation::Remove {
                    path: join_path(base, key),
                });
            }
            for (key, value) in new {
                let path = join_path(base, key);
                match old.get(key) {
                    Some(current) => compare(ops, current, value, &path),
                    None => ops.push(PatchOperation::Add {
                        path,
                        value: value.clone(),
                    }),
                }
            }
        }
        (Value::Array(old), Value::Array(new)) => {
            diff_arrays(ops, old, new, base, compare);
        }
        _ if original == modified => {}
        _ => ops.push(PatchOperation::Replace {
            path: base.to_string(),
            value: modified.clone(),
        }),
    }
}

type Recurse = fn(&mut Vec<PatchOperation>, &Value, &Value, &str);

fn diff_arrays(
    ops: &mut Vec<PatchOperation>,
    old: &[Value],
    new: &[Value],
    base: &str,
    recurse: Recurse,
) {
    // Tail first so earlier indices stay valid while removing.
    for index in (new.len()..old.len()).rev() {
        ops.push(PatchOperation::Remove {
            path: join_path(base, &index.to_string()),
        });
    }
    for (index, value) in new.iter().enumerate() {
        let path = join_path(base, &index.to_string());
        match old.get(index) {
            Some(current) => recurse(ops, current, value, &path),
            None => ops.push(PatchOperation::Add {
                path,
                value: value.clone(),
            }),
        }
    }
}
