// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Navigation paths through the entity graph

use crate::schema::{is_valid_identifier, SchemaError, TypeName};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One navigation step: the field `field_name` of `source_type`, whose type is `field_type`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPathElement")]
pub struct PathElement {
    source_type: TypeName,
    field_type: TypeName,
    field_name: String,
}

#[derive(Deserialize)]
struct RawPathElement {
    source_type: TypeName,
    field_type: TypeName,
    field_name: String,
}

impl TryFrom<RawPathElement> for PathElement {
    type Error = SchemaError;

    fn try_from(raw: RawPathElement) -> Result<Self, Self::Error> {
        PathElement::new(raw.source_type, raw.field_type, raw.field_name)
    }
}

impl PathElement {
    pub fn new(
        source_type: TypeName,
        field_type: TypeName,
        field_name: impl Into<String>,
    ) -> Result<Self, SchemaError> {
        let field_name = field_name.into();
        if !is_valid_identifier(&field_name) {
            return Err(SchemaError::InvalidFieldName(field_name));
        }
        Ok(Self {
            source_type,
            field_type,
            field_name,
        })
    }

    pub fn source_type(&self) -> &TypeName {
        &self.source_type
    }

    pub fn field_type(&self) -> &TypeName {
        &self.field_type
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }
}

/// Ordered, non-empty sequence of path elements
///
/// Element order is significant for equality, hashing and key output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<PathElement>", into = "Vec<PathElement>")]
pub struct Path {
    elements: Vec<PathElement>,
}

impl Path {
    pub fn new(elements: Vec<PathElement>) -> Result<Self, SchemaError> {
        if elements.is_empty() {
            return Err(SchemaError::EmptyPath);
        }
        Ok(Self { elements })
    }

    /// Single-element path to an attribute
    pub fn attribute(
        source_type: TypeName,
        field_type: TypeName,
        field_name: impl Into<String>,
    ) -> Result<Self, SchemaError> {
        Ok(Self {
            elements: vec![PathElement::new(source_type, field_type, field_name)?],
        })
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    // A constructed path always has at least one element
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn last_element(&self) -> &PathElement {
        // Non-empty by construction
        &self.elements[self.elements.len() - 1]
    }

    pub fn root_type(&self) -> &TypeName {
        &self.elements[0].source_type
    }

    /// Dotted field names, e.g. `author.books.title`
    pub fn field_path(&self) -> String {
        self.elements
            .iter()
            .map(|e| e.field_name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// New path with `element` navigated before this one
    pub fn scoped_by(&self, element: PathElement) -> Path {
        let mut elements = Vec::with_capacity(self.elements.len() + 1);
        elements.push(element);
        elements.extend(self.elements.iter().cloned());
        Path { elements }
    }
}

impl TryFrom<Vec<PathElement>> for Path {
    type Error = SchemaError;

    fn try_from(elements: Vec<PathElement>) -> Result<Self, Self::Error> {
        Path::new(elements)
    }
}

impl From<Path> for Vec<PathElement> {
    fn from(path: Path) -> Self {
        path.elements
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root_type())?;
        for element in &self.elements {
            write!(f, ".{}", element.field_name)?;
        }
        Ok(())
    }
}
