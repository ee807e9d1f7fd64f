// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Canonical cache keys for aggregation queries
//!
//! The key is a structural serialization of the query, not a digest:
//!
//! ```text
//! key        := source ';' metrics dims timedims filter filter sorting paging
//! metrics    := '{' (column_id ';' metricext?)* '}'
//! metricext  := '{' alias ';' args '}'
//! dims       := '{' (alias ';' args)* '}'
//! timedims   := '{' (alias ';' GRAIN ';' args)* '}'
//! args       := '{' (key ';' name ';' value)* '}'
//! filter     := ';' | expr
//! expr       := '{' 'P;' path OPERATOR ';' value* '}'
//! value      := kind ';' len ';' text ';'
//!             | '{' 'A;' expr expr '}' | '{' 'O;' expr expr '}' | '{' 'N;' expr '}'
//! path       := '{' ('{' type ';' fieldtype ';' field ';' '}')* '}'
//! sorting    := ';' | '{' scope ';' (path order ';')* '}'
//! paging     := ';' | '{' offset ';' limit ';' ('1'|'0') ';' '}'
//! ```
//!
//! Metrics and sort paths keep caller order. Dimensions, time dimensions and
//! argument maps are sorted. Values carry a kind tag (`N`, `B`, `I`, `F`,
//! `S`, `T`, `L`) and their UTF-8 byte length, so `300` and `"300"` differ
//! and no value can forge a structural boundary.

use super::{Arguments, Query, Sorting};
use crate::filter::{FilterExpression, FilterPredicate, FilterVisitor};
use crate::path::Path;
use crate::query::Pagination;
use crate::value::Value;
use std::borrow::Cow;
use std::fmt::Write;

const ESTIMATED_KEY_SIZE: usize = 128;

const DELIMITER: char = ';';
const GROUP_BEGIN: char = '{';
const GROUP_END: char = '}';

/// Stateless cache key extraction
pub struct QueryKeyExtractor;

impl QueryKeyExtractor {
    /// Canonical key for `query`
    pub fn extract_key(query: &Query) -> String {
        let mut writer = KeyWriter::with_capacity(ESTIMATED_KEY_SIZE);
        writer.source(query);
        writer.metrics(query);
        writer.dimensions(query);
        writer.time_dimensions(query);
        writer.filter(query.where_filter.as_ref());
        writer.filter(query.having_filter.as_ref());
        writer.sorting(query.sorting.as_ref());
        writer.pagination(query.pagination.as_ref());

        log::trace!("Extracted cache key: {}", writer.buf);
        writer.buf
    }

    /// Key for a single filter expression, as embedded in a query key
    pub fn filter_key(expression: &FilterExpression) -> String {
        let mut writer = KeyWriter::with_capacity(ESTIMATED_KEY_SIZE);
        expression.accept(&mut writer);
        writer.buf
    }

    /// Per-section key fragments, for diagnostics
    pub fn explain_key(query: &Query) -> KeyExplanation {
        KeyExplanation {
            source: fragment(|w| w.source(query)),
            metrics: fragment(|w| w.metrics(query)),
            dimensions: fragment(|w| w.dimensions(query)),
            time_dimensions: fragment(|w| w.time_dimensions(query)),
            where_filter: fragment(|w| w.filter(query.where_filter.as_ref())),
            having_filter: fragment(|w| w.filter(query.having_filter.as_ref())),
            sorting: fragment(|w| w.sorting(query.sorting.as_ref())),
            pagination: fragment(|w| w.pagination(query.pagination.as_ref())),
        }
    }
}

fn fragment(write: impl FnOnce(&mut KeyWriter)) -> String {
    let mut writer = KeyWriter::with_capacity(32);
    write(&mut writer);
    writer.buf
}

/// Key fragments by query section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyExplanation {
    pub source: String,
    pub metrics: String,
    pub dimensions: String,
    pub time_dimensions: String,
    pub where_filter: String,
    pub having_filter: String,
    pub sorting: String,
    pub pagination: String,
}

impl KeyExplanation {
    pub fn sections(&self) -> [(&'static str, &str); 8] {
        [
            ("source", self.source.as_str()),
            ("metrics", self.metrics.as_str()),
            ("dimensions", self.dimensions.as_str()),
            ("time dimensions", self.time_dimensions.as_str()),
            ("where", self.where_filter.as_str()),
            ("having", self.having_filter.as_str()),
            ("sorting", self.sorting.as_str()),
            ("pagination", self.pagination.as_str()),
        ]
    }

    /// Full key; equal to [`QueryKeyExtractor::extract_key`]
    pub fn key(&self) -> String {
        self.sections().iter().map(|(_, fragment)| *fragment).collect()
    }
}

struct KeyWriter {
    buf: String,
}

impl KeyWriter {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: String::with_capacity(capacity),
        }
    }

    fn field(&mut self, text: &str) {
        self.buf.push_str(text);
        self.buf.push(DELIMITER);
    }

    fn begin(&mut self) {
        self.buf.push(GROUP_BEGIN);
    }

    fn end(&mut self) {
        self.buf.push(GROUP_END);
    }

    fn empty(&mut self) {
        self.buf.push(DELIMITER);
    }

    /// `len;text;`
    fn prefixed(&mut self, text: &str) {
        // Writing to a String cannot fail
        let _ = write!(self.buf, "{}{}", text.len(), DELIMITER);
        self.field(text);
    }

    /// `kind;len;text;`
    fn value(&mut self, value: &Value) {
        self.field(value_kind(value));
        self.prefixed(&value_text(value));
    }

    fn source(&mut self, query: &Query) {
        self.field(&query.table.id);
    }

    fn metrics(&mut self, query: &Query) {
        self.begin();
        for metric in &query.metrics {
            self.field(&metric.column_id);
            if metric.alias != metric.name() || !metric.arguments.is_empty() {
                self.begin();
                self.field(&metric.alias);
                self.arguments(&metric.arguments);
                self.end();
            }
        }
        self.end();
    }

    fn dimensions(&mut self, query: &Query) {
        let fragments = query
            .dimensions
            .iter()
            .map(|dimension| {
                let mut writer = KeyWriter::with_capacity(32);
                writer.field(&dimension.alias);
                writer.arguments(&dimension.arguments);
                (dimension.alias.as_str(), writer.buf)
            })
            .collect();
        self.sorted_group(fragments);
    }

    fn time_dimensions(&mut self, query: &Query) {
        let fragments = query
            .time_dimensions
            .iter()
            .map(|dimension| {
                let mut writer = KeyWriter::with_capacity(32);
                writer.field(&dimension.alias);
                writer.field(dimension.grain.as_str());
                writer.arguments(&dimension.arguments);
                (dimension.alias.as_str(), writer.buf)
            })
            .collect();
        self.sorted_group(fragments);
    }

    /// Emit fragments sorted by alias, then by fragment for equal aliases
    fn sorted_group(&mut self, mut fragments: Vec<(&str, String)>) {
        fragments.sort();
        self.begin();
        for (_, fragment) in fragments {
            self.buf.push_str(&fragment);
        }
        self.end();
    }

    fn arguments(&mut self, arguments: &Arguments) {
        self.begin();
        // BTreeMap iterates in key order
        for (key, argument) in arguments {
            self.field(key);
            self.field(&argument.name);
            self.value(&argument.value);
        }
        self.end();
    }

    fn filter(&mut self, expression: Option<&FilterExpression>) {
        match expression {
            Some(expression) => expression.accept(self),
            None => self.empty(),
        }
    }

    fn path(&mut self, path: &Path) {
        self.begin();
        for element in path.elements() {
            self.begin();
            self.field(element.source_type().as_str());
            self.field(element.field_type().as_str());
            self.field(element.field_name());
            self.end();
        }
        self.end();
    }

    fn sorting(&mut self, sorting: Option<&Sorting>) {
        let Some(sorting) = sorting else {
            self.empty();
            return;
        };
        self.begin();
        self.field(sorting.scope().as_str());
        for rule in sorting.rules() {
            self.path(&rule.path);
            self.field(rule.order.as_str());
        }
        self.end();
    }

    fn pagination(&mut self, pagination: Option<&Pagination>) {
        let Some(pagination) = pagination else {
            self.empty();
            return;
        };
        self.begin();
        self.field(&pagination.offset.to_string());
        self.field(&pagination.limit.to_string());
        self.field(if pagination.return_totals { "1" } else { "0" });
        self.end();
    }
}

impl FilterVisitor<()> for KeyWriter {
    fn visit_predicate(&mut self, predicate: &FilterPredicate) {
        self.begin();
        self.field("P");
        self.path(predicate.path());
        self.field(predicate.operator().canonical());
        for value in predicate.values() {
            self.value(value);
        }
        self.end();
    }

    fn visit_and(&mut self, left: &FilterExpression, right: &FilterExpression) {
        self.begin();
        self.field("A");
        left.accept(self);
        right.accept(self);
        self.end();
    }

    fn visit_or(&mut self, left: &FilterExpression, right: &FilterExpression) {
        self.begin();
        self.field("O");
        left.accept(self);
        right.accept(self);
        self.end();
    }

    fn visit_not(&mut self, negated: &FilterExpression) {
        self.begin();
        self.field("N");
        negated.accept(self);
        self.end();
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "N",
        Value::Boolean(_) => "B",
        Value::Integer(_) => "I",
        Value::Number(_) => "F",
        Value::String(_) => "S",
        Value::DateTime(_) => "T",
        Value::List(_) => "L",
    }
}

/// String form of a value inside a key
///
/// Scalars use their display form. List items are written as tagged,
/// length-prefixed values so that `["a, b"]` and `["a", "b"]` stay distinct.
fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        Value::List(items) => {
            let mut writer = KeyWriter::with_capacity(16);
            writer.buf.push('[');
            for item in items {
                writer.value(item);
            }
            writer.buf.push(']');
            Cow::Owned(writer.buf)
        }
        other => Cow::Owned(other.to_string()),
    }
}
