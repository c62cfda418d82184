//! Patch application.

use crate::error::{PatchError, PatchResult};
use crate::op::{parse_pointer, PatchOperation};
use serde_json::Value;

/// Applies `operations` in order to a copy of `original`.
///
/// The original is never modified; on error the partially patched copy is
/// discarded.
pub fn apply(original: &Value, operations: &[PatchOperation]) -> PatchResult<Value> {
    let mut document = original.clone();
    for operation in operations {
        apply_one(&mut document, operation)?;
    }
    Ok(document)
}

fn apply_one(document: &mut Value, operation: &PatchOperation) -> PatchResult<()> {
    let path = operation.path();
    let mut tokens = parse_pointer(path)?;
    let Some(last) = tokens.pop() else {
        return match operation {
            PatchOperation::Add { value, .. } | PatchOperation::Replace { value, .. } => {
                *document = value.clone();
                Ok(())
            }
            PatchOperation::Remove { .. } => Err(PatchError::RemoveRoot),
        };
    };
    let parent = resolve(document, &tokens, path)?;

    match (operation, parent) {
        (PatchOperation::Add { value, .. }, Value::Object(map)) => {
            map.insert(last, value.clone());
        }
        (PatchOperation::Add { value, .. }, Value::Array(items)) => {
            if last == "-" {
                items.push(value.clone());
            } else {
                let index = parse_index(&last, path)?;
                if index > items.len() {
                    return Err(out_of_bounds(path, index, items.len()));
                }
                items.insert(index, value.clone());
            }
        }
        (PatchOperation::Remove { .. }, Value::Object(map)) => {
            if map.remove(&last).is_none() {
                return Err(PatchError::PathNotFound(path.to_string()));
            }
        }
        (PatchOperation::Remove { .. }, Value::Array(items)) => {
            let index = parse_index(&last, path)?;
            if index >= items.len() {
                return Err(out_of_bounds(path, index, items.len()));
            }
            items.remove(index);
        }
        (PatchOperation::Replace { value, .. }, Value::Object(map)) => {
            let slot = map
                .get_mut(&last)
                .ok_or_else(|| PatchError::PathNotFound(path.to_string()))?;
            *slot = value.clone();
        }
        (PatchOperation::Replace { value, .. }, Value::Array(items)) => {
            let index = parse_index(&last, path)?;
            let len = items.len();
            let slot = items
                .get_mut(index)
                .ok_or_else(|| out_of_bounds(path, index, len))?;
            *slot = value.clone();
        }
        _ => return Err(PatchError::PathNotFound(path.to_string())),
    }
    Ok(())
}

fn resolve<'a>(document: &'a mut Value, tokens: &[String], path: &str) -> PatchResult<&'a mut Value> {
    let mut current = document;
    for token in tokens {
        current = match current {
            Value::Object(map) => map.get_mut(token),
            Value::Array(items) => {
                let index = parse_index(token, path)?;
                items.get_mut(index)
            }
            _ => None,
        }
        .ok_or_else(|| PatchError::PathNotFound(path.to_string()))?;
    }
    Ok(current)
}

fn parse_index(token: &str, path: &str) -> PatchResult<usize> {
    let canonical = token == "0" || !token.starts_with('0');
    if token.is_empty() || !canonical || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PatchError::InvalidPointer(path.to_string()));
    }
    token
        .parse()
        .map_err(|_| PatchError::InvalidPointer(path.to_string()))
}

fn out_of_bounds(path: &str, index: usize, len: usize) -> PatchError {
    PatchError::IndexOutOfBounds {
        path: path.to_string(),
        index,
        len,
    }
}
