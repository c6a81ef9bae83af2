//! References to collections, documents and queries.

use std::fmt;

use serde_json::Value;

/// A named top-level collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionRef {
    name: String,
}

impl CollectionRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.name
    }

    pub fn doc(&self, id: impl Into<String>) -> DocumentRef {
        DocumentRef {
            collection: self.clone(),
            id: id.into(),
        }
    }

    /// Unfiltered, unordered query over the whole collection.
    pub fn query(&self) -> Query {
        Query::new(self.clone())
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// One document, addressed as `collection/id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentRef {
    collection: CollectionRef,
    id: String,
}

impl DocumentRef {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        CollectionRef::new(collection).doc(id)
    }

    /// Parse `collection/id`. Nested paths are not supported.
    pub fn from_path(path: &str) -> Option<Self> {
        let (collection, id) = path.trim_matches('/').split_once('/')?;
        if collection.is_empty() || id.is_empty() || id.contains('/') {
            return None;
        }
        Some(Self::new(collection, id))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn collection(&self) -> &CollectionRef {
        &self.collection
    }

    pub fn path(&self) -> String {
        format!("{}/{}", self.collection.name, self.id)
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection.name, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// `field == value`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

/// Equality filters over one collection, with at most one ordering.
///
/// Ordering by a field excludes documents that lack it.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    collection: CollectionRef,
    filters: Vec<FieldFilter>,
    order_by: Option<OrderBy>,
}

impl Query {
    pub fn new(collection: CollectionRef) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order_by: None,
        }
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Sets the ordering, replacing any earlier one.
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn collection(&self) -> &CollectionRef {
        &self.collection
    }

    pub fn filters(&self) -> &[FieldFilter] {
        &self.filters
    }

    pub fn ordering(&self) -> Option<&OrderBy> {
        self.order_by.as_ref()
    }

    /// Path reported when a listen on this query is denied.
    pub fn path(&self) -> &str {
        self.collection.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_paths() {
        let doc = CollectionRef::new("users").doc("u1");
        assert_eq!(doc.path(), "users/u1");
        assert_eq!(doc.to_string(), "users/u1");
        assert_eq!(DocumentRef::from_path("/users/u1"), Some(doc));
        assert_eq!(DocumentRef::from_path("users"), None);
        assert_eq!(DocumentRef::from_path("users/u1/notes/n1"), None);
    }

    #[test]
    fn query_builder() {
        let query = CollectionRef::new("shift_reports")
            .query()
            .where_eq("residentId", "res1")
            .order_by("date", Direction::Ascending)
            .order_by("date", Direction::Descending);
        assert_eq!(query.path(), "shift_reports");
        assert_eq!(query.filters()[0].value, json!("res1"));
        assert_eq!(query.ordering().unwrap().direction, Direction::Descending);
    }
}
