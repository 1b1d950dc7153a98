//! Typed references into the remote database.
//!
//! References are plain descriptors: constructing one performs no I/O and
//! establishes no subscription. Validation happens at construction, so a
//! reference in hand is always well-formed.

use crate::error::{Result, SyncError};
use crate::types::FieldMap;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// Reference to exactly one document in a collection.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    collection: String,
    id: String,
}

impl DocumentRef {
    pub(crate) fn new(collection: &str, id: &str) -> Result<Self> {
        if id.is_empty() {
            return Err(SyncError::InvalidReference(
                "document id must not be empty".to_string(),
            ));
        }
        Ok(Self {
            collection: collection.to_string(),
            id: id.to_string(),
        })
    }

    /// Name of the collection this document belongs to.
    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    /// Document id within the collection.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Slash-joined path, for display and logging.
    pub fn path(&self) -> String {
        format!("{}/{}", self.collection, self.id)
    }
}

impl fmt::Debug for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentRef({})", self.path())
    }
}

/// Reference to a whole collection.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CollectionRef {
    name: String,
}

impl CollectionRef {
    /// Create a collection reference. The name must be non-empty.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(SyncError::InvalidReference(
                "collection name must not be empty".to_string(),
            ));
        }
        Ok(Self { name })
    }

    /// Collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reference a document within this collection.
    pub fn doc(&self, id: &str) -> Result<DocumentRef> {
        DocumentRef::new(&self.name, id)
    }

    /// Turn this collection into an unfiltered query over its documents.
    pub fn query(&self) -> QueryRef {
        QueryRef {
            collection: self.name.clone(),
            filter: None,
        }
    }
}

impl fmt::Debug for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CollectionRef({})", self.name)
    }
}

/// Reference to a (possibly filtered) result set over one collection.
#[derive(Clone, Debug)]
pub struct QueryRef {
    collection: String,
    filter: Option<Filter>,
}

impl QueryRef {
    /// Collection the query runs over.
    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    /// Narrow the result set with a filter. Replaces any previous filter.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Whether a document's fields belong to this query's result set.
    pub(crate) fn matches(&self, fields: &FieldMap) -> bool {
        match &self.filter {
            Some(filter) => filter.matches(fields),
            None => true,
        }
    }
}

/// Comparison operator for query filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// A single-field filter: `field <op> value`.
///
/// Numbers compare numerically, strings lexicographically. Ordering
/// comparisons between mismatched or non-comparable types match nothing.
/// A document missing the field never matches.
#[derive(Clone, Debug)]
pub struct Filter {
    field: String,
    op: FilterOp,
    value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: Value) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Ne, value)
    }

    pub fn gt(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Gt, value)
    }

    pub fn gte(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Gte, value)
    }

    pub fn lt(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Lt, value)
    }

    pub fn lte(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Lte, value)
    }

    pub(crate) fn matches(&self, fields: &FieldMap) -> bool {
        let actual = match fields.get(&self.field) {
            Some(value) => value,
            None => return false,
        };

        match self.op {
            FilterOp::Eq => actual == &self.value,
            FilterOp::Ne => actual != &self.value,
            FilterOp::Gt => compare(actual, &self.value) == Some(Ordering::Greater),
            FilterOp::Gte => matches!(
                compare(actual, &self.value),
                Some(Ordering::Greater) | Some(Ordering::Equal)
            ),
            FilterOp::Lt => compare(actual, &self.value) == Some(Ordering::Less),
            FilterOp::Lte => matches!(
                compare(actual, &self.value),
                Some(Ordering::Less) | Some(Ordering::Equal)
            ),
        }
    }
}

/// Order two JSON values, if they are comparable.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => {
            a.as_f64().and_then(|a| b.as_f64().and_then(|b| a.partial_cmp(&b)))
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> FieldMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("test fixture must be a JSON object"),
        }
    }

    #[test]
    fn test_empty_names_rejected() {
        assert!(CollectionRef::new("").is_err());

        let animals = CollectionRef::new("animals").unwrap();
        assert!(animals.doc("").is_err());
        assert!(animals.doc("wombat").is_ok());
    }

    #[test]
    fn test_document_path() {
        let doc = CollectionRef::new("animals").unwrap().doc("wombat").unwrap();
        assert_eq!(doc.path(), "animals/wombat");
        assert_eq!(doc.collection_name(), "animals");
        assert_eq!(doc.id(), "wombat");
    }

    #[test]
    fn test_unfiltered_query_matches_everything() {
        let query = CollectionRef::new("animals").unwrap().query();
        assert!(query.matches(&fields(json!({"n": 1}))));
        assert!(query.matches(&fields(json!({}))));
    }

    #[test]
    fn test_filter_eq() {
        let filter = Filter::eq("name", json!("wombat"));
        assert!(filter.matches(&fields(json!({"name": "wombat"}))));
        assert!(!filter.matches(&fields(json!({"name": "quokka"}))));
        assert!(!filter.matches(&fields(json!({"age": 3}))));
    }

    #[test]
    fn test_filter_numeric_ordering() {
        let filter = Filter::gt("age", json!(2));
        assert!(filter.matches(&fields(json!({"age": 3}))));
        assert!(!filter.matches(&fields(json!({"age": 2}))));
        assert!(!filter.matches(&fields(json!({"age": 1}))));

        let filter = Filter::lte("age", json!(2.5));
        assert!(filter.matches(&fields(json!({"age": 2}))));
        assert!(!filter.matches(&fields(json!({"age": 3}))));
    }

    #[test]
    fn test_filter_string_ordering() {
        let filter = Filter::gte("name", json!("m"));
        assert!(filter.matches(&fields(json!({"name": "wombat"}))));
        assert!(!filter.matches(&fields(json!({"name": "dingo"}))));
    }

    #[test]
    fn test_ordering_across_types_matches_nothing() {
        let filter = Filter::gt("age", json!("2"));
        assert!(!filter.matches(&fields(json!({"age": 3}))));
    }
}
