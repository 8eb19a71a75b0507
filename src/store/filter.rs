//! Structured predicates and field updates for store calls.

use serde_json::Value;

/// Key/value predicate over a document: equality checks composed with
/// logical AND/OR. An empty `And` matches every document.
#[derive(Clone, Debug)]
pub enum Filter {
    Eq(String, Value),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    /// Matches every document.
    #[must_use]
    pub fn all() -> Self {
        Filter::And(Vec::new())
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    #[must_use]
    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    #[must_use]
    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    pub(crate) fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::Eq(field, value) => doc.get(field) == Some(value),
            Filter::And(filters) => filters.iter().all(|filter| filter.matches(doc)),
            Filter::Or(filters) => filters.iter().any(|filter| filter.matches(doc)),
        }
    }
}

/// Ordered list of `field = value` assignments applied by `update_one` and
/// `update_many`.
#[derive(Clone, Debug, Default)]
pub struct Update {
    sets: Vec<(String, Value)>,
}

impl Update {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.sets.push((field.into(), value.into()));
        self
    }

    pub(crate) fn apply(&self, doc: &mut Value) {
        if let Value::Object(map) = doc {
            for (field, value) in &self.sets {
                map.insert(field.clone(), value.clone());
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn eq_matches_field_value() {
        let doc = json!({"email": "a@b.com", "verified": false});
        assert!(Filter::eq("email", "a@b.com").matches(&doc));
        assert!(!Filter::eq("email", "x@y.com").matches(&doc));
        assert!(!Filter::eq("missing", "a@b.com").matches(&doc));
    }

    #[test]
    fn and_requires_every_predicate() {
        let doc = json!({"email": "a@b.com", "verified": true});
        let filter = Filter::and(vec![
            Filter::eq("email", "a@b.com"),
            Filter::eq("verified", true),
        ]);
        assert!(filter.matches(&doc));

        let filter = Filter::and(vec![
            Filter::eq("email", "a@b.com"),
            Filter::eq("verified", false),
        ]);
        assert!(!filter.matches(&doc));
    }

    #[test]
    fn or_requires_any_predicate() {
        let doc = json!({"purpose": "email-verify"});
        let filter = Filter::or(vec![
            Filter::eq("purpose", "password-reset"),
            Filter::eq("purpose", "email-verify"),
        ]);
        assert!(filter.matches(&doc));
    }

    #[test]
    fn empty_and_matches_everything() {
        assert!(Filter::all().matches(&json!({"anything": 1})));
    }

    #[test]
    fn update_sets_fields_in_order() {
        let mut doc = json!({"verified": false, "updated_at": "then"});
        Update::new()
            .set("verified", true)
            .set("updated_at", "now")
            .apply(&mut doc);
        assert_eq!(doc, json!({"verified": true, "updated_at": "now"}));
    }
}
