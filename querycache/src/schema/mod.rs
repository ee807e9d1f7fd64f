// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Static type identifiers
//!
//! Type names are emitted verbatim into cache keys and used as sort keys, so
//! they are resolved once when the schema is bound and never looked up at
//! request time. Primitive field types are compile-time constants; entity
//! types are bound through [`TypeRegistry`].

pub mod registry;

pub use registry::{FieldKind, TypeRegistry};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Errors raised while binding or resolving schema names
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Unknown field '{field}' on entity {entity}")]
    UnknownField { entity: String, field: String },

    #[error("Invalid type name: {0:?}")]
    InvalidTypeName(String),

    #[error("Invalid field name: {0:?}")]
    InvalidFieldName(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Path must contain at least one element")]
    EmptyPath,
}

/// Characters reserved by the cache-key grammar
pub(crate) const RESERVED_CHARS: [char; 3] = [';', '{', '}'];

/// Check that an identifier can be emitted into a cache key without escaping
pub(crate) fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| RESERVED_CHARS.contains(&c) || c.is_control() || c.is_whitespace())
}

/// Canonical name of a source or field type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeName(Cow<'static, str>);

impl TypeName {
    pub const STRING: TypeName = TypeName(Cow::Borrowed("string"));
    pub const LONG: TypeName = TypeName(Cow::Borrowed("long"));
    pub const INT: TypeName = TypeName(Cow::Borrowed("int"));
    pub const DOUBLE: TypeName = TypeName(Cow::Borrowed("double"));
    pub const BOOLEAN: TypeName = TypeName(Cow::Borrowed("boolean"));
    pub const DECIMAL: TypeName = TypeName(Cow::Borrowed("decimal"));
    pub const DATE: TypeName = TypeName(Cow::Borrowed("date"));
    pub const TIME: TypeName = TypeName(Cow::Borrowed("time"));
    pub const COLLECTION: TypeName = TypeName(Cow::Borrowed("collection"));

    /// Create a type name, rejecting names that would corrupt a cache key
    pub fn new(name: impl Into<String>) -> Result<Self, SchemaError> {
        let name = name.into();
        if !is_valid_identifier(&name) {
            return Err(SchemaError::InvalidTypeName(name));
        }
        Ok(TypeName(Cow::Owned(name)))
    }

    /// Look up one of the built-in primitive type names
    pub fn primitive(name: &str) -> Option<TypeName> {
        PRIMITIVES.get(name).cloned()
    }

    pub fn is_primitive(&self) -> bool {
        PRIMITIVES.contains_key(self.as_str())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

static PRIMITIVES: Lazy<HashMap<&'static str, TypeName>> = Lazy::new(|| {
    [
        TypeName::STRING,
        TypeName::LONG,
        TypeName::INT,
        TypeName::DOUBLE,
        TypeName::BOOLEAN,
        TypeName::DECIMAL,
        TypeName::DATE,
        TypeName::TIME,
        TypeName::COLLECTION,
    ]
    .into_iter()
    .map(|ty| match ty.0 {
        Cow::Borrowed(name) => (name, ty),
        // Constants are always borrowed
        Cow::Owned(_) => unreachable!(),
    })
    .collect()
});

impl TryFrom<String> for TypeName {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match TypeName::primitive(&value) {
            Some(primitive) => Ok(primitive),
            None => TypeName::new(value),
        }
    }
}

impl From<TypeName> for String {
    fn from(value: TypeName) -> Self {
        value.0.into_owned()
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
