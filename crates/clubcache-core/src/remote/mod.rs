//! Remote data store boundary.
//!
//! The cache only needs one capability from the hosted data service: fetch
//! the rows of a table matching some filters, ordered and paginated, with
//! related rows embedded. [`RemoteStore`] is that capability; [`RestRemote`]
//! implements it over HTTP.

pub mod error;
#[cfg(test)]
pub(crate) mod fake;
pub mod rest;

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use crate::cache::OrderBy;
pub use error::RemoteError;
pub use rest::RestRemote;

pub trait RemoteStore: Send + Sync {
    /// Fetch matching rows as JSON objects.
    fn select(
        &self,
        request: &SelectRequest,
    ) -> impl Future<Output = Result<Vec<Value>, RemoteError>> + Send;

    /// Count matching rows. Ordering and pagination are ignored.
    fn count(&self, request: &SelectRequest) -> impl Future<Output = Result<u64, RemoteError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Is,
    Ilike,
    In,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Is => "is",
            FilterOp::Ilike => "ilike",
            FilterOp::In => "in",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    /// Render as a `(column, "op.value")` query pair.
    pub fn to_query_pair(&self) -> (String, String) {
        let rendered = match (&self.op, &self.value) {
            (FilterOp::In, Value::Array(items)) => {
                let items: Vec<String> = items.iter().map(render_list_item).collect();
                format!("({})", items.join(","))
            }
            _ => render_scalar(&self.value),
        };
        (self.column.clone(), format!("{}.{}", self.op.as_str(), rendered))
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// Reserved characters inside an `in.(...)` list need the item quoted
fn render_list_item(value: &Value) -> String {
    let raw = render_scalar(value);
    if raw.contains(&[',', '(', ')', '"'][..]) {
        format!("\"{}\"", raw.replace('"', "\\\""))
    } else {
        raw
    }
}

/// One logical "fetch rows of table T" request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectRequest {
    pub table: String,
    /// Column list, including embedded related tables,
    /// e.g. `*,category:categories(id,name)`.
    pub columns: String,
    pub filters: Vec<Filter>,
    pub order: Option<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl SelectRequest {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
            offset: None,
        }
    }

    pub fn columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = columns.into();
        self
    }

    pub fn filter(mut self, column: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Eq, value)
    }

    /// `eq` filter when a value is present.
    pub fn eq_opt<V: Into<Value>>(self, column: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.eq(column, value),
            None => self,
        }
    }

    pub fn order(mut self, order: OrderBy) -> Self {
        self.order = Some(order);
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

    pub fn find_filter(&self, column: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.column == column)
    }

    /// Query string pairs in PostgREST form.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.columns.clone())];
        pairs.extend(self.filters.iter().map(Filter::to_query_pair));
        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            pairs.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset".to_string(), offset.to_string()));
        }
        pairs
    }

    /// Pairs for a count request: same filters, no ordering or paging.
    pub fn count_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.columns.clone())];
        pairs.extend(self.filters.iter().map(Filter::to_query_pair));
        pairs
    }
}
