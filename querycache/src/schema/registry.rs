// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Entity registry bound once at startup
//!
//! Stores the attribute and relationship layout of every entity so that
//! dotted field paths can be resolved into [`Path`] values without any
//! request-time reflection.

use super::{is_valid_identifier, SchemaError, TypeName};
use crate::path::{Path, PathElement};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of a field declared on an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Scalar attribute with a primitive or entity-valued type
    Attribute(TypeName),
    /// Navigation to another entity
    Relationship { target: TypeName, to_many: bool },
}

impl FieldKind {
    /// Type emitted as the field type of a path element
    pub fn field_type(&self) -> &TypeName {
        match self {
            FieldKind::Attribute(ty) => ty,
            FieldKind::Relationship { target, .. } => target,
        }
    }

    pub fn is_to_many(&self) -> bool {
        matches!(self, FieldKind::Relationship { to_many: true, .. })
    }
}

#[derive(Debug, Clone, Default)]
struct EntityBinding {
    fields: BTreeMap<String, FieldKind>,
}

/// Registry of bound entity types
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    entities: BTreeMap<TypeName, EntityBinding>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an entity type. Binding an existing entity again is a no-op.
    pub fn bind_entity(&mut self, name: &str) -> Result<TypeName, SchemaError> {
        let ty = TypeName::new(name)?;
        self.entities.entry(ty.clone()).or_default();
        log::debug!("Bound entity {}", ty);
        Ok(ty)
    }

    /// Declare an attribute on a bound entity
    pub fn bind_attribute(
        &mut self,
        entity: &TypeName,
        field: &str,
        field_type: TypeName,
    ) -> Result<(), SchemaError> {
        self.bind_field(entity, field, FieldKind::Attribute(field_type))
    }

    /// Declare a relationship to another bound entity
    pub fn bind_relationship(
        &mut self,
        entity: &TypeName,
        field: &str,
        target: &TypeName,
        to_many: bool,
    ) -> Result<(), SchemaError> {
        if !self.entities.contains_key(target) {
            return Err(SchemaError::UnknownEntity(target.to_string()));
        }
        self.bind_field(
            entity,
            field,
            FieldKind::Relationship {
                target: target.clone(),
                to_many,
            },
        )
    }

    fn bind_field(
        &mut self,
        entity: &TypeName,
        field: &str,
        kind: FieldKind,
    ) -> Result<(), SchemaError> {
        if !is_valid_identifier(field) || field.contains('.') {
            return Err(SchemaError::InvalidFieldName(field.to_string()));
        }
        let binding = self
            .entities
            .get_mut(entity)
            .ok_or_else(|| SchemaError::UnknownEntity(entity.to_string()))?;
        binding.fields.insert(field.to_string(), kind);
        Ok(())
    }

    /// Look up an entity type by name
    pub fn entity(&self, name: &str) -> Option<&TypeName> {
        self.entities.keys().find(|ty| ty.as_str() == name)
    }

    pub fn contains_entity(&self, entity: &TypeName) -> bool {
        self.entities.contains_key(entity)
    }

    /// Kind of a field on an entity
    pub fn field_kind(&self, entity: &TypeName, field: &str) -> Result<&FieldKind, SchemaError> {
        let binding = self
            .entities
            .get(entity)
            .ok_or_else(|| SchemaError::UnknownEntity(entity.to_string()))?;
        binding
            .fields
            .get(field)
            .ok_or_else(|| SchemaError::UnknownField {
                entity: entity.to_string(),
                field: field.to_string(),
            })
    }

    /// Field names declared on an entity, in name order
    pub fn fields(&self, entity: &TypeName) -> Result<Vec<&str>, SchemaError> {
        self.entities
            .get(entity)
            .map(|binding| binding.fields.keys().map(String::as_str).collect())
            .ok_or_else(|| SchemaError::UnknownEntity(entity.to_string()))
    }

    /// Resolve a dotted field path such as `author.books.title` starting at `root`
    pub fn resolve_path(&self, root: &TypeName, dotted: &str) -> Result<Path, SchemaError> {
        if dotted.is_empty() {
            return Err(SchemaError::EmptyPath);
        }

        let mut elements = Vec::new();
        let mut current = root.clone();
        let mut segments = dotted.split('.').peekable();

        while let Some(field) = segments.next() {
            if field.is_empty() {
                return Err(SchemaError::InvalidPath(dotted.to_string()));
            }
            let kind = self.field_kind(&current, field)?;
            let next = kind.field_type().clone();

            if segments.peek().is_some() && !matches!(kind, FieldKind::Relationship { .. }) {
                // Only relationships can be navigated through
                return Err(SchemaError::InvalidPath(dotted.to_string()));
            }

            elements.push(PathElement::new(current, next.clone(), field)?);
            current = next;
        }

        Path::new(elements)
    }

    /// Whether navigating `path` crosses a to-many relationship
    pub fn path_crosses_to_many(&self, path: &Path) -> bool {
        path.elements().iter().any(|element| {
            self.field_kind(element.source_type(), element.field_name())
                .map(FieldKind::is_to_many)
                .unwrap_or(false)
        })
    }
}
