// ABOUTME: MCP tools for activity feeds, relationship summaries, and orphan detection
// ABOUTME: Client-side post-processing over composite upstream reads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # Activity and Relationship Tools
//!
//! These tools are composite reads: one query fetching several root fields,
//! merged and summarized client-side. Orphan detection is nothing more than
//! filtering on an absent foreign key.

use async_trait::async_trait;
use serde_json::Value;

use crate::crm::{CrmOperation, TwentyClient};
use crate::errors::AppResult;

use super::{
    connection_nodes, nested_str, page_size, required_str, JsonSchema, McpTool, PropertySchema,
};

/// Recently updated tasks and notes, newest first
pub struct RecentActivityTool;

#[async_trait]
impl McpTool for RecentActivityTool {
    fn name(&self) -> &'static str {
        "get_recent_activity"
    }

    fn description(&self) -> &'static str {
        "Show recently updated tasks and notes across the CRM, newest first"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object().optional(
            "limit",
            PropertySchema::integer("Maximum entries per record type (default 20)"),
        )
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let data = client
            .execute(&CrmOperation::RecentActivity {
                first: page_size(args),
            })
            .await?;

        // Merge both feeds and re-sort by update time client-side.
        let mut entries: Vec<(String, String)> = Vec::new();
        for node in connection_nodes(&data, "tasks") {
            let updated = nested_str(node, &["updatedAt"]).unwrap_or("").to_owned();
            entries.push((
                updated.clone(),
                format!(
                    "task: {} [{}] (updated {updated})",
                    nested_str(node, &["title"]).unwrap_or("(untitled)"),
                    nested_str(node, &["status"]).unwrap_or("?"),
                ),
            ));
        }
        for node in connection_nodes(&data, "notes") {
            let updated = nested_str(node, &["updatedAt"]).unwrap_or("").to_owned();
            entries.push((
                updated.clone(),
                format!(
                    "note: {} (updated {updated})",
                    nested_str(node, &["title"]).unwrap_or("(untitled)"),
                ),
            ));
        }

        if entries.is_empty() {
            return Ok("No recent activity".to_owned());
        }

        entries.sort_by(|a, b| b.0.cmp(&a.0));
        let mut lines = vec![format!("{} recent updates:", entries.len())];
        lines.extend(entries.into_iter().map(|(_, line)| format!("- {line}")));
        Ok(lines.join("\n"))
    }
}

/// Relationship summary for one person
pub struct PersonRelationsTool;

#[async_trait]
impl McpTool for PersonRelationsTool {
    fn name(&self) -> &'static str {
        "get_person_relationships"
    }

    fn description(&self) -> &'static str {
        "Summarize a person's CRM relationships: their company link and the opportunities naming them"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object().required("id", PropertySchema::string("Person id"))
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let id = required_str(args, "id")?;

        let data = client
            .execute(&CrmOperation::PersonRelations { id: id.to_owned() })
            .await?;

        let person = &data["person"];
        if person.is_null() {
            return Ok(format!("No person found with id {id}"));
        }

        let mut lines = vec![format!(
            "Relationships for {} {}:",
            nested_str(person, &["name", "firstName"]).unwrap_or(""),
            nested_str(person, &["name", "lastName"]).unwrap_or(""),
        )];

        match nested_str(person, &["companyId"]) {
            Some(company_id) => lines.push(format!("Company: {company_id}")),
            None => lines.push("Company: none (orphaned contact)".to_owned()),
        }

        let opportunities = connection_nodes(&data, "opportunities");
        if opportunities.is_empty() {
            lines.push("Opportunities: none".to_owned());
        } else {
            lines.push(format!(
                "Opportunities ({}) where this person is the point of contact:",
                opportunities.len()
            ));
            for node in opportunities {
                lines.push(format!(
                    "- {} [{}]",
                    nested_str(node, &["name"]).unwrap_or("(unnamed)"),
                    nested_str(node, &["stage"]).unwrap_or("?"),
                ));
            }
        }

        Ok(lines.join("\n"))
    }
}

/// Relationship summary for one company
pub struct CompanyRelationsTool;

#[async_trait]
impl McpTool for CompanyRelationsTool {
    fn name(&self) -> &'static str {
        "get_company_relationships"
    }

    fn description(&self) -> &'static str {
        "Summarize a company's CRM relationships: its people and opportunities"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object().required("id", PropertySchema::string("Company id"))
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let id = required_str(args, "id")?;

        let data = client
            .execute(&CrmOperation::CompanyRelations { id: id.to_owned() })
            .await?;

        let company = &data["company"];
        if company.is_null() {
            return Ok(format!("No company found with id {id}"));
        }

        let mut lines = vec![format!(
            "Relationships for {}:",
            nested_str(company, &["name"]).unwrap_or("(unnamed)"),
        )];

        let people = connection_nodes(&data, "people");
        if people.is_empty() {
            lines.push("People: none".to_owned());
        } else {
            lines.push(format!("People ({}):", people.len()));
            for node in people {
                lines.push(format!(
                    "- {} {}{}",
                    nested_str(node, &["name", "firstName"]).unwrap_or(""),
                    nested_str(node, &["name", "lastName"]).unwrap_or(""),
                    nested_str(node, &["jobTitle"])
                        .map(|title| format!(", {title}"))
                        .unwrap_or_default(),
                ));
            }
        }

        let opportunities = connection_nodes(&data, "opportunities");
        if opportunities.is_empty() {
            lines.push("Opportunities: none".to_owned());
        } else {
            lines.push(format!("Opportunities ({}):", opportunities.len()));
            for node in opportunities {
                lines.push(format!(
                    "- {} [{}]",
                    nested_str(node, &["name"]).unwrap_or("(unnamed)"),
                    nested_str(node, &["stage"]).unwrap_or("?"),
                ));
            }
        }

        Ok(lines.join("\n"))
    }
}

/// People with no associated company
pub struct OrphanedRecordsTool;

#[async_trait]
impl McpTool for OrphanedRecordsTool {
    fn name(&self) -> &'static str {
        "find_orphaned_records"
    }

    fn description(&self) -> &'static str {
        "Find people with no associated company (orphaned contact records)"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object()
            .optional("limit", PropertySchema::integer("Maximum results (default 20)"))
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let data = client
            .execute(&CrmOperation::OrphanedPeople {
                first: page_size(args),
            })
            .await?;

        let nodes = connection_nodes(&data, "people");
        if nodes.is_empty() {
            return Ok("No orphaned people found; every contact has a company".to_owned());
        }

        let mut lines = vec![format!("{} people without a company:", nodes.len())];
        for node in nodes {
            lines.push(format!(
                "- {} {} <{}> (id: {})",
                nested_str(node, &["name", "firstName"]).unwrap_or(""),
                nested_str(node, &["name", "lastName"]).unwrap_or(""),
                nested_str(node, &["emails", "primaryEmail"]).unwrap_or("no email"),
                nested_str(node, &["id"]).unwrap_or("?"),
            ));
        }
        Ok(lines.join("\n"))
    }
}
