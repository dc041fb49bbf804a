//! Field dictionary loading and logical type classification.
//!
//! The dictionary is a YAML mapping of field name to `{type: <declaration>}`
//! where the declaration is free text written by whoever exported the
//! inventory (`float64`, `object (stored as Python list)`, `date`, ...).
//! Each declaration is classified exactly once into a [`LogicalType`]; the
//! rest of the crate only ever switches on that enum.

use std::{fmt, path::Path};

use anyhow::{Context, Result};
use serde::Serialize;
use thiserror::Error;

use crate::yaml_provider::{self, YamlValue};

const NUMBER_MARKERS: &[&str] = &["float", "int64", "int32", "integer", "number", "numeric"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LogicalType {
    String,
    Number,
    Date,
    List,
    Mapping,
}

impl LogicalType {
    /// Classifies a type declaration by substring, checked in the order
    /// list, dictionary, number, date. Anything else is a plain string.
    pub fn classify(declaration: &str) -> Self {
        let lowered = declaration.to_ascii_lowercase();
        if lowered.contains("list") {
            LogicalType::List
        } else if lowered.contains("dictionary") {
            LogicalType::Mapping
        } else if NUMBER_MARKERS.iter().any(|marker| lowered.contains(marker)) {
            LogicalType::Number
        } else if lowered.contains("date") {
            LogicalType::Date
        } else {
            LogicalType::String
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalType::String => "string",
            LogicalType::Number => "number",
            LogicalType::Date => "date",
            LogicalType::List => "list",
            LogicalType::Mapping => "mapping",
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema document must be a mapping of field names, found {0}")]
    NotAMapping(&'static str),
    #[error("schema field names must be strings")]
    NonStringFieldName,
    #[error("field '{0}' must be a mapping with a 'type' key")]
    FieldNotAMapping(String),
    #[error("field '{0}' is missing its 'type' key")]
    MissingType(String),
    #[error("field '{0}' has a non-string 'type' declaration")]
    TypeNotString(String),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaField {
    pub name: String,
    pub declaration: String,
    pub logical_type: LogicalType,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, declaration: impl Into<String>) -> Self {
        let declaration = declaration.into();
        Self {
            name: name.into(),
            logical_type: LogicalType::classify(&declaration),
            declaration,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub fields: Vec<SchemaField>,
}

impl Schema {
    pub fn load(path: &Path) -> Result<Self> {
        let document = yaml_provider::load_document(path)?;
        Schema::from_document(&document)
            .with_context(|| format!("Parsing schema dictionary {path:?}"))
    }

    pub fn parse_str(text: &str) -> Result<Self, SchemaError> {
        let document: YamlValue = serde_yaml::from_str(text)?;
        Schema::from_document(&document)
    }

    pub fn from_document(document: &YamlValue) -> Result<Self, SchemaError> {
        let mapping = document
            .as_mapping()
            .ok_or_else(|| SchemaError::NotAMapping(yaml_provider::describe(document)))?;
        let mut fields = Vec::with_capacity(mapping.len());
        for (key, details) in mapping {
            let name = key.as_str().ok_or(SchemaError::NonStringFieldName)?;
            let details = details
                .as_mapping()
                .ok_or_else(|| SchemaError::FieldNotAMapping(name.to_string()))?;
            let declaration = details
                .get("type")
                .ok_or_else(|| SchemaError::MissingType(name.to_string()))?
                .as_str()
                .ok_or_else(|| SchemaError::TypeNotString(name.to_string()))?;
            fields.push(SchemaField::new(name, declaration));
        }
        Ok(Schema { fields })
    }

    /// Layout of the card export used when converting without a dictionary.
    pub fn card_defaults() -> Self {
        const LIST_FIELDS: &[&str] = &[
            "types",
            "subtypes",
            "abilities",
            "attacks",
            "weaknesses",
            "retreatCost",
            "resistances",
            "nationalPokedexNumbers",
            "rules",
        ];
        const NUMBER_FIELDS: &[&str] = &["hp", "level", "convertedRetreatCost", "owned"];

        let mut fields = LIST_FIELDS
            .iter()
            .map(|name| SchemaField::new(*name, "object (stored as Python list)"))
            .collect::<Vec<_>>();
        fields.push(SchemaField::new(
            "legalities",
            "object (stored as Python dictionary)",
        ));
        fields.extend(
            NUMBER_FIELDS
                .iter()
                .map(|name| SchemaField::new(*name, "float64")),
        );
        Schema { fields }
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn logical_type(&self, name: &str) -> Option<LogicalType> {
        self.field(name).map(|field| field.logical_type)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_follows_declaration_precedence() {
        assert_eq!(
            LogicalType::classify("object (stored as Python list)"),
            LogicalType::List
        );
        assert_eq!(
            LogicalType::classify("object (stored as Python dictionary)"),
            LogicalType::Mapping
        );
        assert_eq!(LogicalType::classify("float64"), LogicalType::Number);
        assert_eq!(LogicalType::classify("Int64"), LogicalType::Number);
        assert_eq!(LogicalType::classify("date"), LogicalType::Date);
        assert_eq!(LogicalType::classify("datetime64[ns]"), LogicalType::Date);
        assert_eq!(LogicalType::classify("object"), LogicalType::String);
        assert_eq!(LogicalType::classify("string"), LogicalType::String);
        // list wins over date when both appear
        assert_eq!(
            LogicalType::classify("list of release dates"),
            LogicalType::List
        );
    }

    #[test]
    fn parse_str_preserves_document_order() {
        let schema = Schema::parse_str(
            "name:\n  type: object\nhp:\n  type: float64\nsubtypes:\n  type: object (stored as Python list)\n",
        )
        .unwrap();
        assert_eq!(schema.field_names(), vec!["name", "hp", "subtypes"]);
        assert_eq!(schema.logical_type("hp"), Some(LogicalType::Number));
        assert_eq!(schema.logical_type("subtypes"), Some(LogicalType::List));
        assert_eq!(schema.logical_type("unknown"), None);
    }

    #[test]
    fn parse_str_rejects_malformed_documents() {
        assert!(matches!(
            Schema::parse_str("- name\n- hp\n"),
            Err(SchemaError::NotAMapping("a sequence"))
        ));
        assert!(matches!(
            Schema::parse_str("hp: float64\n"),
            Err(SchemaError::FieldNotAMapping(name)) if name == "hp"
        ));
        assert!(matches!(
            Schema::parse_str("hp:\n  description: points\n"),
            Err(SchemaError::MissingType(name)) if name == "hp"
        ));
        assert!(matches!(
            Schema::parse_str("hp:\n  type: [1]\n"),
            Err(SchemaError::TypeNotString(name)) if name == "hp"
        ));
        assert!(matches!(
            Schema::parse_str("hp: [\n"),
            Err(SchemaError::Yaml(_))
        ));
    }

    #[test]
    fn card_defaults_cover_structured_fields() {
        let schema = Schema::card_defaults();
        assert_eq!(schema.logical_type("attacks"), Some(LogicalType::List));
        assert_eq!(schema.logical_type("legalities"), Some(LogicalType::Mapping));
        assert_eq!(schema.logical_type("hp"), Some(LogicalType::Number));
        assert_eq!(schema.logical_type("name"), None);
    }
}
