//! Filter, update, sort and projection evaluation for in-memory documents.
//!
//! Filters and updates are the same raw documents the façade sends to a real
//! server. The supported subset:
//!
//! - top level: `$and`, `$or`, `$nor`, and `field: value` equality
//! - field operators: `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`, `$in`, `$nin`,
//!   `$exists`, `$not`
//! - update operators: `$set`, `$unset`, `$inc`, `$push`
//!
//! Dotted paths descend into embedded documents and array indexes. A field
//! holding an array matches when any element matches.

use std::cmp::Ordering;

use bson::{
    Binary, Bson, Decimal128, Document as BsonDocument, Timestamp, datetime::DateTime, oid::ObjectId,
};

use pmongo_core::error::{PMongoError, PMongoResult};

/// Comparable representation of BSON values.
///
/// Numbers of every width are normalized to `f64` so `1`, `1i64` and `1.0`
/// compare equal, as they do on the server. Embedded documents keep their
/// field order, which equality respects.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    Decimal(&'a Decimal128),
    DateTime(DateTime),
    Timestamp(Timestamp),
    String(&'a str),
    ObjectId(ObjectId),
    Binary(&'a Binary),
    Array(Vec<Comparable<'a>>),
    Map(Vec<(&'a str, Comparable<'a>)>),
    /// Any other type, compared strictly by value.
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::Decimal128(value) => Comparable::Decimal(value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::Timestamp(value) => Comparable::Timestamp(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::Binary(value) => Comparable::Binary(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<Vec<_>>()
            ),
            other => Comparable::Other(other),
        }
    }
}

impl<'a> Comparable<'a> {
    /// Position in the server's cross-type sort order.
    fn type_rank(&self) -> u8 {
        match self {
            Comparable::Other(Bson::MinKey) => 0,
            Comparable::Null => 1,
            Comparable::Number(_) | Comparable::Decimal(_) => 2,
            Comparable::String(_) => 3,
            Comparable::Map(_) => 4,
            Comparable::Array(_) => 5,
            Comparable::Binary(_) => 6,
            Comparable::ObjectId(_) => 7,
            Comparable::Bool(_) => 8,
            Comparable::DateTime(_) => 9,
            Comparable::Timestamp(_) => 10,
            Comparable::Other(Bson::RegularExpression(_)) => 11,
            Comparable::Other(Bson::MaxKey) => 13,
            Comparable::Other(_) => 12,
        }
    }

    /// Total order used for sorting: by type rank first, then by value.
    fn sort_cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other)
            .unwrap_or_else(|| self.type_rank().cmp(&other.type_rank()))
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::Decimal(a), Comparable::Decimal(b)) => a.bytes() == b.bytes(),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::Timestamp(a), Comparable::Timestamp(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::Binary(a), Comparable::Binary(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::Timestamp(a), Comparable::Timestamp(b)) => {
                (a.time, a.increment).partial_cmp(&(b.time, b.increment))
            }
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.bytes().partial_cmp(&b.bytes()),
            // Length first, then subtype, then bytes.
            (Comparable::Binary(a), Comparable::Binary(b)) => Some(
                a.bytes.len()
                    .cmp(&b.bytes.len())
                    .then_with(|| u8::from(a.subtype).cmp(&u8::from(b.subtype)))
                    .then_with(|| a.bytes.cmp(&b.bytes))
            ),
            _ => None,
        }
    }
}

/// Resolves a dotted path inside `document`.
pub(crate) fn lookup<'a>(document: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Bson::Document(inner) => inner.get(segment)?,
            Bson::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Sets a dotted path inside `document`, creating embedded documents on the way.
fn assign(document: &mut BsonDocument, path: &str, value: Bson) -> PMongoResult<()> {
    match path.split_once('.') {
        None => {
            document.insert(path, value);
            Ok(())
        }
        Some((head, rest)) => {
            if document.get(head).is_none() {
                document.insert(head, BsonDocument::new());
            }

            match document.get_mut(head) {
                Some(Bson::Document(inner)) => assign(inner, rest, value),
                _ => Err(PMongoError::Write(format!(
                    "Cannot create field '{}' in element '{}'",
                    rest, head
                ))),
            }
        }
    }
}

/// Removes a dotted path from `document`, if present.
fn unassign(document: &mut BsonDocument, path: &str) {
    match path.split_once('.') {
        None => {
            document.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Bson::Document(inner)) = document.get_mut(head) {
                unassign(inner, rest);
            }
        }
    }
}

fn is_operator_document(value: &Bson) -> bool {
    match value {
        Bson::Document(doc) => !doc.is_empty() && doc.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

fn is_truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Int32(n) => *n != 0,
        Bson::Int64(n) => *n != 0,
        Bson::Double(n) => *n != 0.0,
        Bson::Null => false,
        _ => true,
    }
}

/// Evaluates raw filter documents against stored documents.
pub(crate) struct FilterEvaluator<'a> {
    document: &'a BsonDocument,
}

impl<'a> FilterEvaluator<'a> {
    pub fn new(document: &'a BsonDocument) -> Self {
        Self { document }
    }

    /// Whether the document satisfies every clause of `filter`.
    pub fn matches(&self, filter: &BsonDocument) -> PMongoResult<bool> {
        for (key, value) in filter {
            let matched = match key.as_str() {
                "$and" => self.all(value)?,
                "$or" => self.any(value)?,
                "$nor" => !self.any(value)?,
                op if op.starts_with('$') => {
                    return Err(PMongoError::Read(format!("Unsupported top-level operator {}", op)));
                }
                field => self.field_matches(field, value)?,
            };

            if !matched {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn clauses<'v>(value: &'v Bson) -> PMongoResult<impl Iterator<Item = &'v BsonDocument>> {
        match value {
            Bson::Array(items) if !items.is_empty() => items
                .iter()
                .map(|item| {
                    item.as_document()
                        .ok_or_else(|| PMongoError::Read("Logical operator entries must be documents".to_string()))
                })
                .collect::<PMongoResult<Vec<_>>>()
                .map(Vec::into_iter),
            _ => Err(PMongoError::Read("Logical operators require a non-empty array".to_string())),
        }
    }

    fn all(&self, value: &Bson) -> PMongoResult<bool> {
        for clause in Self::clauses(value)? {
            if !self.matches(clause)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn any(&self, value: &Bson) -> PMongoResult<bool> {
        for clause in Self::clauses(value)? {
            if self.matches(clause)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn field_matches(&self, field: &str, expected: &Bson) -> PMongoResult<bool> {
        let actual = lookup(self.document, field);

        match expected {
            Bson::Document(ops) if is_operator_document(expected) => {
                for (op, operand) in ops {
                    if !Self::apply_operator(actual, op, operand)? {
                        return Ok(false);
                    }
                }

                Ok(true)
            }
            _ => Ok(Self::equals(actual, expected)),
        }
    }

    fn apply_operator(actual: Option<&Bson>, op: &str, operand: &Bson) -> PMongoResult<bool> {
        match op {
            "$eq" => Ok(Self::equals(actual, operand)),
            "$ne" => Ok(!Self::equals(actual, operand)),
            "$gt" | "$gte" | "$lt" | "$lte" => Ok(Self::compare(actual, op, operand)),
            "$in" => match operand {
                Bson::Array(candidates) => Ok(
                    candidates
                        .iter()
                        .any(|candidate| Self::equals(actual, candidate))
                ),
                _ => Err(PMongoError::Read("$in needs an array".to_string())),
            },
            "$nin" => match operand {
                Bson::Array(candidates) => Ok(
                    !candidates
                        .iter()
                        .any(|candidate| Self::equals(actual, candidate))
                ),
                _ => Err(PMongoError::Read("$nin needs an array".to_string())),
            },
            "$exists" => Ok(actual.is_some() == is_truthy(operand)),
            "$not" => match operand {
                Bson::Document(ops) => {
                    for (inner_op, inner_operand) in ops {
                        if !Self::apply_operator(actual, inner_op, inner_operand)? {
                            return Ok(true);
                        }
                    }

                    Ok(false)
                }
                _ => Err(PMongoError::Read("$not needs an operator document".to_string())),
            },
            other => Err(PMongoError::Read(format!("Unsupported operator {}", other))),
        }
    }

    /// Equality with array semantics: an array field matches when it equals the
    /// value as a whole or when any element does. A missing field equals null.
    fn equals(actual: Option<&Bson>, expected: &Bson) -> bool {
        let expected = Comparable::from(expected);

        match actual {
            None => expected == Comparable::Null,
            Some(value) => {
                let value = Comparable::from(value);

                if value == expected {
                    return true;
                }

                match value {
                    Comparable::Array(items) => items.iter().any(|item| item == &expected),
                    _ => false,
                }
            }
        }
    }

    fn compare(actual: Option<&Bson>, op: &str, operand: &Bson) -> bool {
        let operand = Comparable::from(operand);
        let check = |value: &Comparable| match value.partial_cmp(&operand) {
            Some(ordering) => match op {
                "$gt" => ordering == Ordering::Greater,
                "$gte" => ordering != Ordering::Less,
                "$lt" => ordering == Ordering::Less,
                "$lte" => ordering != Ordering::Greater,
                _ => false,
            },
            None => false,
        };

        match actual.map(Comparable::from) {
            Some(Comparable::Array(items)) => items.iter().any(check),
            Some(value) => check(&value),
            None => false,
        }
    }
}

/// Applies an update expression to `document`.
///
/// Returns whether the document changed.
pub(crate) fn apply_update(document: &mut BsonDocument, update: &BsonDocument) -> PMongoResult<bool> {
    if update.is_empty() {
        return Err(PMongoError::Write("Update document must not be empty".to_string()));
    }

    let before = document.clone();

    if let Err(err) = apply_operators(document, update) {
        *document = before;
        return Err(err);
    }

    if document.get("_id") != before.get("_id") {
        *document = before;
        return Err(PMongoError::Write(
            "Performing an update on the path '_id' would modify the immutable field '_id'".to_string(),
        ));
    }

    Ok(*document != before)
}

fn apply_operators(document: &mut BsonDocument, update: &BsonDocument) -> PMongoResult<()> {
    for (op, fields) in update {
        let fields = match fields {
            Bson::Document(fields) => fields,
            _ => return Err(PMongoError::Write(format!("Modifier {} expects a document", op))),
        };

        for (path, value) in fields {
            match op.as_str() {
                "$set" => assign(document, path, value.clone())?,
                "$unset" => unassign(document, path),
                "$inc" => {
                    let next = increment(lookup(document, path), value, path)?;
                    assign(document, path, next)?;
                }
                "$push" => {
                    let next = match lookup(document, path) {
                        None => Bson::Array(vec![value.clone()]),
                        Some(Bson::Array(items)) => {
                            let mut items = items.clone();
                            items.push(value.clone());
                            Bson::Array(items)
                        }
                        Some(_) => {
                            return Err(PMongoError::Write(format!("Field {} is not an array", path)));
                        }
                    };
                    assign(document, path, next)?;
                }
                other if other.starts_with('$') => {
                    return Err(PMongoError::Write(format!("Unsupported update operator {}", other)));
                }
                _ => {
                    return Err(PMongoError::Write("Update document requires atomic operators".to_string()));
                }
            }
        }
    }

    Ok(())
}

fn increment(current: Option<&Bson>, by: &Bson, path: &str) -> PMongoResult<Bson> {
    let not_numeric = || PMongoError::Write(format!("Cannot apply $inc to non-numeric field {}", path));

    match (current.unwrap_or(&Bson::Int32(0)), by) {
        (Bson::Int32(a), Bson::Int32(b)) => Ok(
            a.checked_add(*b)
                .map(Bson::Int32)
                .unwrap_or(Bson::Int64(*a as i64 + *b as i64))
        ),
        (Bson::Int32(a), Bson::Int64(b)) => add_i64(*a as i64, *b, path),
        (Bson::Int64(a), Bson::Int32(b)) => add_i64(*a, *b as i64, path),
        (Bson::Int64(a), Bson::Int64(b)) => add_i64(*a, *b, path),
        (Bson::Double(a), b) => Ok(Bson::Double(a + as_f64(b).ok_or_else(not_numeric)?)),
        (a, Bson::Double(b)) => Ok(Bson::Double(as_f64(a).ok_or_else(not_numeric)? + b)),
        _ => Err(not_numeric()),
    }
}

fn add_i64(a: i64, b: i64, path: &str) -> PMongoResult<Bson> {
    a.checked_add(b)
        .map(Bson::Int64)
        .ok_or_else(|| PMongoError::Write(format!(
            "Failed to apply $inc operations: overflow incrementing field {}",
            path
        )))
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(*n as f64),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

/// Sorts documents by a sort specification such as `{ "status": 1, "_id": -1 }`.
pub(crate) fn sort_documents(documents: &mut [BsonDocument], sort: &BsonDocument) {
    documents.sort_by(|a, b| {
        for (field, direction) in sort {
            let left = lookup(a, field).map(Comparable::from).unwrap_or(Comparable::Null);
            let right = lookup(b, field).map(Comparable::from).unwrap_or(Comparable::Null);

            let ordering = match as_f64(direction) {
                Some(d) if d < 0.0 => right.sort_cmp(&left),
                _ => left.sort_cmp(&right),
            };

            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        Ordering::Equal
    });
}

/// Copies the value at a dotted path from `source` into `projected`, following
/// embedded documents only.
fn include(projected: &mut BsonDocument, source: &BsonDocument, path: &str) {
    match path.split_once('.') {
        None => {
            if let Some(value) = source.get(path) {
                projected.insert(path, value.clone());
            }
        }
        Some((head, rest)) => {
            let Some(Bson::Document(inner_source)) = source.get(head) else {
                return;
            };

            if !matches!(projected.get(head), Some(Bson::Document(_))) {
                projected.insert(head, BsonDocument::new());
            }

            if let Some(Bson::Document(inner)) = projected.get_mut(head) {
                include(inner, inner_source, rest);
            }
        }
    }
}

/// Applies an inclusion or exclusion projection.
pub(crate) fn project(document: BsonDocument, projection: &BsonDocument) -> BsonDocument {
    if projection.is_empty() {
        return document;
    }

    let inclusive = projection
        .iter()
        .any(|(field, flag)| field != "_id" && is_truthy(flag));

    if inclusive {
        let mut projected = BsonDocument::new();

        if projection.get("_id").is_none_or(is_truthy) {
            if let Some(id) = document.get("_id") {
                projected.insert("_id", id.clone());
            }
        }

        for (field, flag) in projection {
            if field != "_id" && is_truthy(flag) {
                include(&mut projected, &document, field);
            }
        }

        projected
    } else {
        let mut projected = document;

        for (field, _) in projection {
            unassign(&mut projected, field);
        }

        projected
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;

    fn matches(document: &BsonDocument, filter: BsonDocument) -> bool {
        FilterEvaluator::new(document).matches(&filter).unwrap()
    }

    #[test]
    fn implicit_equality_and_operators() {
        let document = doc! { "status": "open", "count": 3, "tags": ["a", "b"] };

        assert!(matches(&document, doc! { "status": "open" }));
        assert!(!matches(&document, doc! { "status": "closed" }));
        assert!(matches(&document, doc! { "count": { "$gte": 3, "$lt": 4 } }));
        assert!(matches(&document, doc! { "count": 3.0 }));
        assert!(matches(&document, doc! { "tags": "b" }));
        assert!(matches(&document, doc! { "status": { "$in": ["open", "pending"] } }));
        assert!(matches(&document, doc! { "missing": { "$exists": false } }));
        assert!(matches(&document, doc! { "missing": null }));
        assert!(matches(&document, doc! { "count": { "$not": { "$gt": 5 } } }));
    }

    #[test]
    fn logical_operators() {
        let document = doc! { "a": 1, "b": 2 };

        assert!(matches(&document, doc! { "$or": [{ "a": 5 }, { "b": 2 }] }));
        assert!(!matches(&document, doc! { "$and": [{ "a": 1 }, { "b": 3 }] }));
        assert!(matches(&document, doc! { "$nor": [{ "a": 5 }] }));
    }

    #[test]
    fn nested_paths() {
        let document = doc! { "address": { "city": "Oslo" }, "items": [{ "sku": "x" }] };

        assert!(matches(&document, doc! { "address.city": "Oslo" }));
        assert!(matches(&document, doc! { "items.0.sku": "x" }));
    }

    #[test]
    fn unsupported_operator_is_an_error() {
        let document = doc! { "a": 1 };
        assert!(FilterEvaluator::new(&document).matches(&doc! { "a": { "$where": "x" } }).is_err());
    }

    #[test]
    fn binary_values_compare_by_content() {
        let document = doc! { "token": bson::Uuid::from_bytes([1; 16]) };
        let untagged = doc! { "name": "x" };

        assert!(matches(&document, doc! { "token": bson::Uuid::from_bytes([1; 16]) }));
        assert!(!matches(&document, doc! { "token": bson::Uuid::from_bytes([2; 16]) }));
        assert!(!matches(&untagged, doc! { "token": bson::Uuid::from_bytes([1; 16]) }));
        assert!(matches(&untagged, doc! { "token": { "$ne": bson::Uuid::from_bytes([1; 16]) } }));
    }

    #[test]
    fn other_types_never_equal_null() {
        let stamp = Bson::Timestamp(Timestamp { time: 10, increment: 1 });
        let document = doc! { "at": stamp.clone(), "edge": Bson::MaxKey };

        assert!(matches(&document, doc! { "at": stamp }));
        assert!(!matches(&document, doc! { "at": Bson::Timestamp(Timestamp { time: 10, increment: 2 }) }));
        assert!(matches(&document, doc! { "at": { "$lt": Bson::Timestamp(Timestamp { time: 11, increment: 0 }) } }));
        assert!(!matches(&document, doc! { "missing": Bson::Timestamp(Timestamp { time: 10, increment: 1 }) }));
        assert!(matches(&document, doc! { "edge": Bson::MaxKey }));
        assert!(!matches(&document, doc! { "edge": null }));
        assert!(!matches(&document, doc! { "edge": Bson::MinKey }));
    }

    #[test]
    fn embedded_document_equality_respects_field_order() {
        let document = doc! { "a": { "x": 1, "y": 2 } };

        assert!(matches(&document, doc! { "a": { "x": 1, "y": 2 } }));
        assert!(!matches(&document, doc! { "a": { "y": 2, "x": 1 } }));
    }

    #[test]
    fn inc_overflow_is_a_write_error() {
        let mut document = doc! { "_id": 1, "n": i64::MAX };

        let err = apply_update(&mut document, &doc! { "$inc": { "n": 1i64 } }).unwrap_err();
        assert!(matches!(err, PMongoError::Write(_)));
        assert!(apply_update(&mut document, &doc! { "$inc": { "n": 1 } }).is_err());
        assert_eq!(document, doc! { "_id": 1, "n": i64::MAX });

        let mut small = doc! { "n": i32::MAX };
        apply_update(&mut small, &doc! { "$inc": { "n": 1 } }).unwrap();
        assert_eq!(small, doc! { "n": i32::MAX as i64 + 1 });
    }

    #[test]
    fn update_operators() {
        let mut document = doc! { "_id": 1, "n": 1, "gone": true };
        let changed = apply_update(
            &mut document,
            &doc! { "$set": { "a.b": "c" }, "$inc": { "n": 2 }, "$unset": { "gone": "" }, "$push": { "log": "x" } },
        )
        .unwrap();

        assert!(changed);
        assert_eq!(document, doc! { "_id": 1, "n": 3, "a": { "b": "c" }, "log": ["x"] });
    }

    #[test]
    fn update_rejects_plain_documents_and_id_changes() {
        let mut document = doc! { "_id": 1 };
        assert!(apply_update(&mut document, &doc! { "name": "x" }).is_err());
        assert!(apply_update(&mut document, &doc! { "$set": { "_id": 2 } }).is_err());
        assert_eq!(document, doc! { "_id": 1 });
    }

    #[test]
    fn sort_and_project() {
        let mut documents = vec![doc! { "_id": 2, "v": "b" }, doc! { "_id": 1, "v": "a" }, doc! { "_id": 3 }];
        sort_documents(&mut documents, &doc! { "_id": -1 });

        let ids: Vec<_> = documents.iter().map(|d| d.get_i32("_id").unwrap()).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        assert_eq!(project(doc! { "_id": 1, "v": "a", "w": 1 }, &doc! { "v": 1 }), doc! { "_id": 1, "v": "a" });
        assert_eq!(project(doc! { "_id": 1, "v": "a" }, &doc! { "_id": 0, "v": 1 }), doc! { "v": "a" });
        assert_eq!(project(doc! { "_id": 1, "v": "a" }, &doc! { "v": 0 }), doc! { "_id": 1 });
    }

    #[test]
    fn project_nested_paths() {
        let document = doc! { "_id": 1, "a": { "b": 1, "c": 2 }, "s": "x" };

        assert_eq!(project(document.clone(), &doc! { "a.b": 1 }), doc! { "_id": 1, "a": { "b": 1 } });
        assert_eq!(project(document, &doc! { "s.t": 1, "missing": 1 }), doc! { "_id": 1 });
    }
}
