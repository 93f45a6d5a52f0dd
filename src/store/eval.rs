//! Query, sort and projection evaluation over BSON documents

use crate::error::{Error, Result};
use crate::types::Document;
use crate::value::{compare_bson, get_path, remove_path, set_path, SortValue};
use bson::Bson;
use std::cmp::Ordering;

// ============================================================================
// Filters
// ============================================================================

/// Check whether `document` satisfies the query document `filter`
pub fn matches_filter(document: &Document, filter: &Document) -> Result<bool> {
    for (key, condition) in filter {
        let matched = match key.as_str() {
            "$and" => all_match(document, condition)?,
            "$or" => any_match(document, condition)?,
            "$nor" => !any_match(document, condition)?,
            op if op.starts_with('$') => {
                return Err(Error::store(format!("unsupported query operator '{op}'")))
            }
            path => matches_condition(get_path(document, path), condition)?,
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn clauses(condition: &Bson) -> Result<Vec<&Document>> {
    let Bson::Array(items) = condition else {
        return Err(Error::store(format!(
            "logical operator expects an array, got {condition}"
        )));
    };
    items
        .iter()
        .map(|item| {
            item.as_document().ok_or_else(|| {
                Error::store(format!("logical clause must be a document, got {item}"))
            })
        })
        .collect()
}

fn all_match(document: &Document, condition: &Bson) -> Result<bool> {
    for clause in clauses(condition)? {
        if !matches_filter(document, clause)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn any_match(document: &Document, condition: &Bson) -> Result<bool> {
    for clause in clauses(condition)? {
        if matches_filter(document, clause)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn operator_document(value: &Bson) -> Option<&Document> {
    match value {
        Bson::Document(ops) if !ops.is_empty() && ops.keys().all(|k| k.starts_with('$')) => {
            Some(ops)
        }
        _ => None,
    }
}

fn matches_condition(value: Option<&Bson>, condition: &Bson) -> Result<bool> {
    let Some(ops) = operator_document(condition) else {
        return Ok(values_equal(value, condition));
    };

    for (op, operand) in ops {
        let matched = match op.as_str() {
            "$eq" => values_equal(value, operand),
            "$ne" => !values_equal(value, operand),
            "$gt" => compare_op(value, operand, &|o| o == Ordering::Greater),
            "$gte" => compare_op(value, operand, &|o| o != Ordering::Less),
            "$lt" => compare_op(value, operand, &|o| o == Ordering::Less),
            "$lte" => compare_op(value, operand, &|o| o != Ordering::Greater),
            "$in" => in_list(value, operand)?,
            "$nin" => !in_list(value, operand)?,
            "$exists" => value.is_some() == is_truthy(operand),
            other => return Err(Error::store(format!("unsupported operator '{other}'"))),
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn in_list(value: Option<&Bson>, operand: &Bson) -> Result<bool> {
    let list = operand
        .as_array()
        .ok_or_else(|| Error::store(format!("$in expects an array, got {operand}")))?;
    Ok(list.iter().any(|candidate| values_equal(value, candidate)))
}

/// Equality with array-element matching and type-aware scalar comparison
///
/// A missing value equals null.
pub(crate) fn values_equal(value: Option<&Bson>, operand: &Bson) -> bool {
    match value {
        None => matches!(operand, Bson::Null),
        Some(Bson::Array(items)) if !matches!(operand, Bson::Array(_)) => {
            items.iter().any(|item| values_equal(Some(item), operand))
        }
        Some(v) => match (SortValue::from_bson(v), SortValue::from_bson(operand)) {
            (Some(a), Some(b)) => a.same_bracket(&b) && a.canonical_cmp(&b) == Ordering::Equal,
            _ => v == operand,
        },
    }
}

/// Range comparison only matches within one type bracket
fn compare_op(value: Option<&Bson>, operand: &Bson, accept: &dyn Fn(Ordering) -> bool) -> bool {
    let Some(value) = value else {
        return false;
    };
    if let Bson::Array(items) = value {
        return items
            .iter()
            .any(|item| compare_op(Some(item), operand, accept));
    }
    match (SortValue::from_bson(value), SortValue::from_bson(operand)) {
        (Some(a), Some(b)) if a.same_bracket(&b) => accept(a.canonical_cmp(&b)),
        _ => false,
    }
}

// ============================================================================
// Sorting
// ============================================================================

fn direction(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(i) => Some(i64::from(*i)),
        Bson::Int64(i) => Some(*i),
        Bson::Double(f) if f.fract() == 0.0 => Some(*f as i64),
        _ => None,
    }
}

/// Stable sort by an ordered `{path: 1 | -1}` document
pub fn sort_documents(documents: &mut [Document], spec: &Document) -> Result<()> {
    let keys: Vec<(&str, bool)> = spec
        .iter()
        .map(|(path, dir)| match direction(dir) {
            Some(1) => Ok((path.as_str(), false)),
            Some(-1) => Ok((path.as_str(), true)),
            _ => Err(Error::store(format!("invalid sort direction {dir} for '{path}'"))),
        })
        .collect::<Result<_>>()?;

    documents.sort_by(|a, b| {
        for (path, descending) in &keys {
            let ordering = compare_bson(get_path(a, path), get_path(b, path));
            let ordering = if *descending {
                ordering.reverse()
            } else {
                ordering
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
    Ok(())
}

// ============================================================================
// Projection
// ============================================================================

fn is_truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Int32(i) => *i != 0,
        Bson::Int64(i) => *i != 0,
        Bson::Double(f) => *f != 0.0,
        Bson::Null | Bson::Undefined => false,
        _ => true,
    }
}

/// Resolve `"$path"` references, leaving other values as literals
pub(crate) fn resolve_expression(document: &Document, expression: &Bson) -> Bson {
    match expression.as_str().and_then(|s| s.strip_prefix('$')) {
        Some(path) => get_path(document, path).cloned().unwrap_or(Bson::Null),
        None => expression.clone(),
    }
}

/// Apply an inclusion or exclusion projection
///
/// `_id` is kept unless explicitly excluded. String values starting with `$`
/// compute a field from another path.
pub fn apply_projection(document: &Document, projection: &Document) -> Result<Document> {
    if projection.is_empty() {
        return Ok(document.clone());
    }

    let computed = |v: &Bson| matches!(v, Bson::String(_));
    let inclusive = projection
        .iter()
        .any(|(path, v)| path != "_id" && (computed(v) || is_truthy(v)));

    if !inclusive {
        let mut out = document.clone();
        for (path, v) in projection {
            if !is_truthy(v) {
                remove_path(&mut out, path);
            }
        }
        return Ok(out);
    }

    let mut out = Document::new();
    let keep_id = projection.get("_id").map_or(true, is_truthy);
    if keep_id {
        if let Some(id) = document.get("_id") {
            out.insert("_id", id.clone());
        }
    }
    for (path, v) in projection {
        if path == "_id" {
            continue;
        }
        if computed(v) {
            set_path(&mut out, path, resolve_expression(document, v));
        } else if is_truthy(v) {
            if let Some(found) = get_path(document, path) {
                set_path(&mut out, path, found.clone());
            }
        } else {
            return Err(Error::store(format!(
                "cannot mix inclusion and exclusion on '{path}'"
            )));
        }
    }
    Ok(out)
}
