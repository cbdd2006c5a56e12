// ABOUTME: Minimal JSON Schema builder for MCP tool input declarations
// ABOUTME: Object schemas with typed properties, enumerations, and required lists
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! Input schema types for tool declarations
//!
//! Every tool advertises an object schema; properties are flat (string,
//! integer, boolean) which keeps arguments LLM-friendly. Nesting lives on
//! the GraphQL side, not in tool inputs.

use serde_json::{json, Map, Value};

/// One property of a tool's input object
#[derive(Debug, Clone)]
pub struct PropertySchema {
    /// JSON Schema type ("string", "integer", "boolean")
    pub property_type: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Closed set of accepted values, if any
    pub enum_values: Option<&'static [&'static str]>,
}

impl PropertySchema {
    /// A string property
    #[must_use]
    pub const fn string(description: &'static str) -> Self {
        Self {
            property_type: "string",
            description,
            enum_values: None,
        }
    }

    /// An integer property
    #[must_use]
    pub const fn integer(description: &'static str) -> Self {
        Self {
            property_type: "integer",
            description,
            enum_values: None,
        }
    }

    /// A boolean property
    #[must_use]
    pub const fn boolean(description: &'static str) -> Self {
        Self {
            property_type: "boolean",
            description,
            enum_values: None,
        }
    }

    /// A string property restricted to an enumerated set
    #[must_use]
    pub const fn enumerated(
        description: &'static str,
        values: &'static [&'static str],
    ) -> Self {
        Self {
            property_type: "string",
            description,
            enum_values: Some(values),
        }
    }

    fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("type".to_owned(), json!(self.property_type));
        object.insert("description".to_owned(), json!(self.description));
        if let Some(values) = self.enum_values {
            object.insert("enum".to_owned(), json!(values));
        }
        Value::Object(object)
    }
}

/// An object input schema
#[derive(Debug, Clone, Default)]
pub struct JsonSchema {
    properties: Vec<(&'static str, PropertySchema)>,
    required: Vec<&'static str>,
}

impl JsonSchema {
    /// Empty object schema (tool takes no arguments)
    #[must_use]
    pub fn object() -> Self {
        Self::default()
    }

    /// Add a required property
    #[must_use]
    pub fn required(mut self, name: &'static str, property: PropertySchema) -> Self {
        self.properties.push((name, property));
        self.required.push(name);
        self
    }

    /// Add an optional property
    #[must_use]
    pub fn optional(mut self, name: &'static str, property: PropertySchema) -> Self {
        self.properties.push((name, property));
        self
    }

    /// Render as a JSON Schema value for `tools/list`
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut properties = Map::new();
        for (name, property) in &self.properties {
            properties.insert((*name).to_owned(), property.to_value());
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn schema_renders_properties_and_required() {
        let schema = JsonSchema::object()
            .required("id", PropertySchema::string("Record id"))
            .optional("limit", PropertySchema::integer("Page size"))
            .optional(
                "status",
                PropertySchema::enumerated("Task status", &["TODO", "DONE"]),
            )
            .to_value();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["id"]));
        assert_eq!(schema["properties"]["limit"]["type"], "integer");
        assert_eq!(schema["properties"]["status"]["enum"], json!(["TODO", "DONE"]));
    }
}
