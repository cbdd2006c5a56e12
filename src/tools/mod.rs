// ABOUTME: MCP tool trait, argument helpers, and the registry of CRM tools
// ABOUTME: Converts every tool failure into a normal, inspectable tool result
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # Tool Registry
//!
//! Each tool is a pure translation unit: validate flat structured input,
//! invoke one upstream GraphQL operation (occasionally two root fields for
//! composite reads), and format the nested response into readable text.
//! Tool calls never raise through the protocol layer: every failure is
//! caught at the registry boundary and returned as a normal result whose
//! text starts with `Error`.

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::crm::TwentyClient;
use crate::errors::{AppError, AppResult};
use crate::mcp::protocol::{CallToolResult, ToolDescriptor};

/// Tool implementations for activity feeds and relationship summaries
pub mod activity;
/// Tool implementations for company records
pub mod companies;
/// Tool implementations for notes
pub mod notes;
/// Tool implementations for opportunities and pipeline views
pub mod opportunities;
/// Tool implementations for people records
pub mod people;
/// Input schema builder types
pub mod schema;
/// Tool implementations for tasks
pub mod tasks;

pub use schema::{JsonSchema, PropertySchema};

/// Default page size for list and search tools
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Upper bound on caller-supplied page sizes
pub const MAX_PAGE_SIZE: u32 = 100;

/// One callable MCP tool
#[async_trait]
pub trait McpTool: Send + Sync {
    /// Tool name as advertised to clients
    fn name(&self) -> &'static str;

    /// One-line description for `tools/list`
    fn description(&self) -> &'static str;

    /// Input schema for `tools/list`
    fn input_schema(&self) -> JsonSchema;

    /// Execute the tool and produce the human-readable text payload.
    ///
    /// # Errors
    /// Returns an error for invalid arguments or upstream failures; the
    /// registry converts it into an error-flavored tool result.
    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String>;
}

/// The complete, immutable set of tools served over MCP
pub struct ToolRegistry {
    tools: Vec<Box<dyn McpTool>>,
}

impl ToolRegistry {
    /// Build the full registry of CRM tools
    #[must_use]
    pub fn new() -> Self {
        let tools: Vec<Box<dyn McpTool>> = vec![
            Box::new(people::CreatePersonTool),
            Box::new(people::UpdatePersonTool),
            Box::new(people::GetPersonTool),
            Box::new(people::SearchPeopleTool),
            Box::new(people::ListPeopleTool),
            Box::new(people::DeletePersonTool),
            Box::new(companies::CreateCompanyTool),
            Box::new(companies::UpdateCompanyTool),
            Box::new(companies::GetCompanyTool),
            Box::new(companies::SearchCompaniesTool),
            Box::new(companies::ListCompaniesTool),
            Box::new(companies::DeleteCompanyTool),
            Box::new(opportunities::CreateOpportunityTool),
            Box::new(opportunities::UpdateOpportunityTool),
            Box::new(opportunities::GetOpportunityTool),
            Box::new(opportunities::ListOpportunitiesTool),
            Box::new(opportunities::OpportunitiesByStageTool),
            Box::new(tasks::CreateTaskTool),
            Box::new(tasks::UpdateTaskTool),
            Box::new(tasks::GetTaskTool),
            Box::new(tasks::ListTasksTool),
            Box::new(tasks::CompleteTaskTool),
            Box::new(notes::CreateNoteTool),
            Box::new(notes::ListNotesTool),
            Box::new(notes::SearchNotesTool),
            Box::new(activity::RecentActivityTool),
            Box::new(activity::PersonRelationsTool),
            Box::new(activity::CompanyRelationsTool),
            Box::new(activity::OrphanedRecordsTool),
        ];
        Self { tools }
    }

    /// Number of registered tools
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty (it never is in production)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool descriptors for `tools/list`
    #[must_use]
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .map(|tool| ToolDescriptor {
                name: tool.name(),
                description: tool.description(),
                input_schema: tool.input_schema().to_value(),
            })
            .collect()
    }

    /// Whether a tool with the given name exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|tool| tool.name() == name)
    }

    /// Invoke a tool by name. Always returns a result: unknown tools and
    /// failing calls become error-flavored results, never exceptions.
    pub async fn call(&self, name: &str, args: &Value, client: &TwentyClient) -> CallToolResult {
        let Some(tool) = self.tools.iter().find(|tool| tool.name() == name) else {
            return CallToolResult::error(format!("Error calling {name}: unknown tool"));
        };

        match tool.call(args, client).await {
            Ok(text) => CallToolResult::text(text),
            Err(e) => {
                warn!(tool = name, error = %e, "Tool call failed");
                CallToolResult::error(format!("Error calling {name}: {}", e.message))
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Argument extraction helpers shared by the tool implementations
// ============================================================================

/// Extract a required non-empty string argument
pub(crate) fn required_str<'a>(args: &'a Value, field: &str) -> AppResult<&'a str> {
    args.get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::invalid_argument(format!("Missing required argument: {field}")))
}

/// Extract an optional string argument, treating empty strings as absent
pub(crate) fn optional_str<'a>(args: &'a Value, field: &str) -> Option<&'a str> {
    args.get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

/// Extract the page-size argument, clamped to [1, `MAX_PAGE_SIZE`]
pub(crate) fn page_size(args: &Value) -> u32 {
    args.get("limit")
        .and_then(Value::as_u64)
        .map_or(DEFAULT_PAGE_SIZE, |raw| {
            u32::try_from(raw).unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
        })
}

/// Iterate the nodes of a GraphQL connection (`edges[].node`)
pub(crate) fn connection_nodes<'a>(data: &'a Value, field: &str) -> Vec<&'a Value> {
    data.get(field)
        .and_then(|connection| connection.get("edges"))
        .and_then(Value::as_array)
        .map(|edges| {
            edges
                .iter()
                .filter_map(|edge| edge.get("node"))
                .collect()
        })
        .unwrap_or_default()
}

/// Read a nested string field, e.g. `name.firstName`
pub(crate) fn nested_str<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = value;
    for segment in path {
        current = current.get(segment)?;
    }
    current.as_str()
}
