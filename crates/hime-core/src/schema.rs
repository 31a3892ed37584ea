//! Set of enabled input schemas. Never empty once constructed.

use crate::config::{Configuration, RimeConfiguration};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("schema selection must not be empty")]
    Empty,
    #[error("at least one input schema must remain selected")]
    LastSchemaRemoval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaToggle {
    Added,
    Removed,
}

/// Insertion-ordered, duplicate-free, non-empty list of schema ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSelection {
    schemas: Vec<String>,
}

impl SchemaSelection {
    pub fn new<I, S>(schemas: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selected: Vec<String> = Vec::new();
        for schema in schemas {
            let schema = schema.into();
            if !selected.contains(&schema) {
                selected.push(schema);
            }
        }
        if selected.is_empty() {
            return Err(SchemaError::Empty);
        }
        Ok(Self { schemas: selected })
    }

    pub fn from_configuration(configuration: &Configuration) -> Result<Self, SchemaError> {
        Self::new(configuration.selected_schemas().unwrap_or_default().iter().cloned())
    }

    /// Add `schema` if absent, otherwise remove it unless it is the last one.
    pub fn toggle(&mut self, schema: &str) -> Result<SchemaToggle, SchemaError> {
        match self.schemas.iter().position(|s| s == schema) {
            None => {
                self.schemas.push(schema.to_string());
                Ok(SchemaToggle::Added)
            }
            Some(_) if self.schemas.len() == 1 => Err(SchemaError::LastSchemaRemoval),
            Some(pos) => {
                self.schemas.remove(pos);
                Ok(SchemaToggle::Removed)
            }
        }
    }

    pub fn contains(&self, schema: &str) -> bool {
        self.schemas.iter().any(|s| s == schema)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.schemas.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.schemas.clone()
    }

    /// Configuration patch writing this selection back to the store.
    pub fn to_patch(&self) -> Configuration {
        Configuration {
            rime: Some(RimeConfiguration {
                selected_schemas: Some(self.to_vec()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}
