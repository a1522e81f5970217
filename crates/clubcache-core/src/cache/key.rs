//! Cache key derivation.
//!
//! A key is `<entity>:<encoding>` where the encoding is a canonical JSON
//! rendering of `{filters, limit, offset, order_by}` with object keys sorted
//! at every depth. Entity names may not contain the separator, so the first
//! `:` in a key always ends the entity name.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::Entity;
use crate::error::{QueryError, QueryResult};

pub const KEY_SEPARATOR: char = ':';

/// Sort column and direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// The logical shape of a query: everything that distinguishes one result
/// set from another.
///
/// Filter values are serialized as they are added. A value that cannot be
/// serialized is remembered and reported when the key is built, so builder
/// chains stay infallible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryShape {
    filters: BTreeMap<String, Value>,
    order_by: Option<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
    invalid: Option<String>,
}

impl QueryShape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter<V: Serialize + ?Sized>(mut self, field: &str, value: &V) -> Self {
        if self.invalid.is_some() {
            return self;
        }
        if field.is_empty() {
            self.invalid = Some("filter field name is empty".to_string());
            return self;
        }
        match serde_json::to_value(value) {
            Ok(value) => {
                self.filters.insert(field.to_string(), value);
            }
            Err(e) => {
                self.invalid = Some(format!("filter `{}` is not serializable: {}", field, e));
            }
        }
        self
    }

    /// Adds the filter only when a value is present.
    pub fn filter_opt<V: Serialize>(self, field: &str, value: Option<&V>) -> Self {
        match value {
            Some(value) => self.filter(field, value),
            None => self,
        }
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn build_key(&self, entity: Entity) -> QueryResult<String> {
        build_key(entity.name(), self)
    }

    fn canonical(&self) -> QueryResult<String> {
        if let Some(reason) = &self.invalid {
            return Err(QueryError::invalid_shape(reason.clone()));
        }
        let mut tuple = serde_json::Map::new();
        tuple.insert(
            "filters".to_string(),
            Value::Object(self.filters.clone().into_iter().collect()),
        );
        tuple.insert("limit".to_string(), self.limit.into());
        tuple.insert("offset".to_string(), self.offset.into());
        let order = serde_json::to_value(&self.order_by)
            .map_err(|e| QueryError::invalid_shape(format!("ordering: {}", e)))?;
        tuple.insert("order_by".to_string(), order);

        let mut out = String::new();
        write_canonical(&Value::Object(tuple), &mut out);
        Ok(out)
    }
}

/// Derive the cache key for `shape` under `entity_name`.
pub fn build_key(entity_name: &str, shape: &QueryShape) -> QueryResult<String> {
    if entity_name.is_empty() {
        return Err(QueryError::invalid_shape("entity name is empty"));
    }
    if entity_name.contains(KEY_SEPARATOR) {
        return Err(QueryError::invalid_shape(format!(
            "entity name `{}` contains the key separator `{}`",
            entity_name, KEY_SEPARATOR
        )));
    }
    Ok(format!("{}{}{}", entity_name, KEY_SEPARATOR, shape.canonical()?))
}

// Sorted explicitly instead of relying on serde_json's map ordering, which
// changes when the `preserve_order` feature is enabled anywhere in the build.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut fields: Vec<(&String, &Value)> = map.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (name, field)) in fields.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(name, out);
                out.push(':');
                write_canonical(field, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::String(s) => write_string(s, out),
        // Null, Bool and Number already render canonically
        other => {
            let _ = write!(out, "{}", other);
        }
    }
}

fn write_string(s: &str, out: &mut String) {
    // Display on a JSON string value escapes it exactly as the encoder would
    let _ = write!(out, "{}", Value::String(s.to_string()));
}
