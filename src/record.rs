use std::collections::{BTreeMap, BTreeSet};

use crate::core::Value;

/// Caller-supplied bundle of table, column and value metadata for one
/// row. Constructed fresh per save call and discarded after the writer
/// returns; no descriptor outlives a single call.
///
/// The `values` map IS the live state of the record: the update path
/// reads changed-column values from it at write time, so a caller that
/// mutates a value after marking it changed gets the later value
/// persisted.
#[derive(Debug, Clone)]
pub struct RecordDescriptor {
    table_name: String,
    primary_key: String,
    is_new: bool,
    values: BTreeMap<String, Value>,
    changed: BTreeSet<String>,
    /// Original primary-key value, captured when the key itself is
    /// reassigned. The UPDATE predicate must use this, not the new key,
    /// or the row will not be found.
    primary_key_before_change: Option<Value>,
}

impl RecordDescriptor {
    /// Descriptor for a row that does not exist in the table yet.
    pub fn new_record(table_name: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            primary_key: primary_key.into(),
            is_new: true,
            values: BTreeMap::new(),
            changed: BTreeSet::new(),
            primary_key_before_change: None,
        }
    }

    /// Descriptor for a row already present in the table.
    pub fn existing(table_name: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            is_new: false,
            ..Self::new_record(table_name, primary_key)
        }
    }

    /// Set a column value without marking it dirty.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    /// Set a column value and mark it dirty. Inserting into both the
    /// value map and the changed set keeps the `changed ⊆ values`
    /// invariant by construction.
    pub fn set_changed(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        let column = column.into();
        self.values.insert(column.clone(), value.into());
        self.changed.insert(column);
        self
    }

    /// Mark an already-present column dirty. A name with no stored value
    /// is ignored, preserving the subset invariant.
    pub fn mark_changed(&mut self, column: &str) {
        debug_assert!(
            self.values.contains_key(column),
            "mark_changed on column '{column}' with no value"
        );
        if self.values.contains_key(column) {
            self.changed.insert(column.to_string());
        }
    }

    /// Reassign the primary key, remembering the original value for the
    /// update predicate.
    pub fn rekey(&mut self, new_key: impl Into<Value>) {
        if self.primary_key_before_change.is_none() {
            self.primary_key_before_change = self.values.get(&self.primary_key).cloned();
        }
        let pk = self.primary_key.clone();
        self.values.insert(pk.clone(), new_key.into());
        self.changed.insert(pk);
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn value(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn changed(&self) -> &BTreeSet<String> {
        &self.changed
    }

    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Key value the update WHERE predicate should use: the pre-change
    /// original when the key was reassigned, the current value otherwise.
    pub fn predicate_key(&self) -> Option<&Value> {
        self.primary_key_before_change
            .as_ref()
            .or_else(|| self.values.get(&self.primary_key))
    }

    /// Called by the writer after a successful insert. Stores the
    /// assigned key (if the backend generated one) and flips the record
    /// to persisted state.
    pub fn mark_persisted(&mut self, assigned_key: Option<Value>) {
        if let Some(key) = assigned_key {
            self.values.insert(self.primary_key.clone(), key);
        }
        self.is_new = false;
        self.changed.clear();
        self.primary_key_before_change = None;
    }
}

/// Uniqueness target for upsert semantics on the insert path. Supplied
/// per call, never persisted.
#[derive(Debug, Clone)]
pub struct ConflictPolicy {
    pub columns: Vec<String>,
    /// Raw SQL index predicate appended as `ON CONFLICT (..) WHERE ..`,
    /// for partial unique indexes.
    pub filter: Option<String>,
}

impl ConflictPolicy {
    pub fn on<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

/// Outcome of one write. Transient return value with no identity of its
/// own.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteResult {
    pub rows_affected: u64,
    /// Present only when the backend generated the key during insert.
    pub assigned_primary_key: Option<Value>,
}

impl WriteResult {
    pub fn unchanged() -> Self {
        Self {
            rows_affected: 0,
            assigned_primary_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_is_subset_of_values() {
        let record = RecordDescriptor::new_record("fakes", "id")
            .set("id", 1i64)
            .set_changed("name", "test");
        assert!(record
            .changed()
            .iter()
            .all(|c| record.value(c).is_some()));
    }

    #[test]
    fn test_rekey_keeps_original_for_predicate() {
        let mut record = RecordDescriptor::existing("fakes", "id").set("id", 1i64);
        record.rekey(2i64);
        assert_eq!(record.predicate_key(), Some(&Value::Integer(1)));
        assert_eq!(record.value("id"), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_mark_persisted_stores_generated_key() {
        let mut record = RecordDescriptor::new_record("fakes", "id").set_changed("name", "test");
        record.mark_persisted(Some(Value::Integer(7)));
        assert!(!record.is_new());
        assert!(!record.has_changes());
        assert_eq!(record.value("id"), Some(&Value::Integer(7)));
    }
}
