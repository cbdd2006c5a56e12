// ABOUTME: MCP tools for notes: create, list, and full-text search
// ABOUTME: Thin translations over the note mutations and filtered queries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # Note Tools

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::crm::{CrmOperation, TwentyClient};
use crate::errors::AppResult;

use super::{
    connection_nodes, nested_str, optional_str, page_size, required_str, JsonSchema, McpTool,
    PropertySchema,
};

fn note_line(node: &Value) -> String {
    let title = nested_str(node, &["title"]).unwrap_or("(untitled)");
    let id = nested_str(node, &["id"]).unwrap_or("?");
    let created = nested_str(node, &["createdAt"])
        .map(|date| format!(", created {date}"))
        .unwrap_or_default();
    format!("- {title}{created} (id: {id})")
}

/// Create a note
pub struct CreateNoteTool;

#[async_trait]
impl McpTool for CreateNoteTool {
    fn name(&self) -> &'static str {
        "create_note"
    }

    fn description(&self) -> &'static str {
        "Create a new note with a title and body text"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object()
            .required("title", PropertySchema::string("Note title"))
            .optional("body", PropertySchema::string("Note body text"))
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let title = required_str(args, "title")?;

        let mut note = Map::new();
        note.insert("title".to_owned(), json!(title));
        if let Some(body) = optional_str(args, "body") {
            note.insert("body".to_owned(), json!(body));
        }

        let data = client
            .execute(&CrmOperation::CreateNote {
                data: Value::Object(note),
            })
            .await?;

        Ok(format!(
            "Created note {} (id: {})",
            nested_str(&data["createNote"], &["title"]).unwrap_or(""),
            nested_str(&data["createNote"], &["id"]).unwrap_or("?"),
        ))
    }
}

/// List notes, most recently updated first
pub struct ListNotesTool;

#[async_trait]
impl McpTool for ListNotesTool {
    fn name(&self) -> &'static str {
        "list_notes"
    }

    fn description(&self) -> &'static str {
        "List notes in the CRM, most recently updated first"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object()
            .optional("limit", PropertySchema::integer("Maximum results (default 20)"))
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let data = client
            .execute(&CrmOperation::ListNotes {
                first: page_size(args),
            })
            .await?;

        let nodes = connection_nodes(&data, "notes");
        if nodes.is_empty() {
            return Ok("No notes in the CRM yet".to_owned());
        }

        let mut lines = vec![format!("{} notes:", nodes.len())];
        lines.extend(nodes.iter().map(|node| note_line(node)));
        Ok(lines.join("\n"))
    }
}

/// Search notes by title or body substring
pub struct SearchNotesTool;

#[async_trait]
impl McpTool for SearchNotesTool {
    fn name(&self) -> &'static str {
        "search_notes"
    }

    fn description(&self) -> &'static str {
        "Search notes by title or body substring, case-insensitively"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object()
            .required("query", PropertySchema::string("Search text"))
            .optional("limit", PropertySchema::integer("Maximum results (default 20)"))
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let query = required_str(args, "query")?;

        let data = client
            .execute(&CrmOperation::SearchNotes {
                query: query.to_owned(),
                first: page_size(args),
            })
            .await?;

        let nodes = connection_nodes(&data, "notes");
        if nodes.is_empty() {
            return Ok(format!("No notes matched \"{query}\""));
        }

        let mut lines = vec![format!("{} notes matched \"{query}\":", nodes.len())];
        lines.extend(nodes.iter().map(|node| note_line(node)));
        Ok(lines.join("\n"))
    }
}
