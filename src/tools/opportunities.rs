// ABOUTME: MCP tools for opportunities: CRUD plus the stage-grouped pipeline summary
// ABOUTME: Amounts travel as micros upstream and render as currency units in results
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # Opportunity Tools

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::crm::{CrmOperation, TwentyClient};
use crate::errors::AppResult;

use super::{
    connection_nodes, nested_str, optional_str, page_size, required_str, JsonSchema, McpTool,
    PropertySchema,
};

/// Pipeline stages accepted by create/update tools
const STAGES: &[&str] = &["NEW", "SCREENING", "MEETING", "PROPOSAL", "CUSTOMER"];

const MICROS_PER_UNIT: f64 = 1_000_000.0;

fn amount_units(node: &Value) -> Option<(f64, String)> {
    let amount = node.get("amount")?;
    let micros = amount.get("amountMicros").and_then(Value::as_f64)?;
    let currency = amount
        .get("currencyCode")
        .and_then(Value::as_str)
        .unwrap_or("USD")
        .to_owned();
    Some((micros / MICROS_PER_UNIT, currency))
}

fn opportunity_line(node: &Value) -> String {
    let name = nested_str(node, &["name"]).unwrap_or("(unnamed)");
    let stage = nested_str(node, &["stage"]).unwrap_or("?");
    let id = nested_str(node, &["id"]).unwrap_or("?");
    let amount = amount_units(node)
        .map(|(units, currency)| format!(", {units:.2} {currency}"))
        .unwrap_or_default();
    let close = nested_str(node, &["closeDate"])
        .map(|date| format!(", closes {date}"))
        .unwrap_or_default();
    format!("- {name} [{stage}]{amount}{close} (id: {id})")
}

fn opportunity_data(args: &Value) -> Value {
    let mut data = Map::new();

    if let Some(name) = optional_str(args, "name") {
        data.insert("name".to_owned(), json!(name));
    }
    if let Some(stage) = optional_str(args, "stage") {
        data.insert("stage".to_owned(), json!(stage));
    }
    if let Some(amount) = args.get("amount").and_then(Value::as_f64) {
        data.insert(
            "amount".to_owned(),
            json!({
                "amountMicros": (amount * MICROS_PER_UNIT).round(),
                "currencyCode": optional_str(args, "currency").unwrap_or("USD"),
            }),
        );
    }
    if let Some(close_date) = optional_str(args, "close_date") {
        data.insert("closeDate".to_owned(), json!(close_date));
    }
    if let Some(company_id) = optional_str(args, "company_id") {
        data.insert("companyId".to_owned(), json!(company_id));
    }
    if let Some(contact_id) = optional_str(args, "point_of_contact_id") {
        data.insert("pointOfContactId".to_owned(), json!(contact_id));
    }

    Value::Object(data)
}

/// Create an opportunity
pub struct CreateOpportunityTool;

#[async_trait]
impl McpTool for CreateOpportunityTool {
    fn name(&self) -> &'static str {
        "create_opportunity"
    }

    fn description(&self) -> &'static str {
        "Create a new sales opportunity with stage, amount, and company/contact links"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object()
            .required("name", PropertySchema::string("Opportunity name"))
            .optional("stage", PropertySchema::enumerated("Pipeline stage", STAGES))
            .optional("amount", PropertySchema::integer("Deal amount in currency units"))
            .optional("currency", PropertySchema::string("ISO currency code (default USD)"))
            .optional("close_date", PropertySchema::string("Expected close date (ISO 8601)"))
            .optional("company_id", PropertySchema::string("Associated company id"))
            .optional(
                "point_of_contact_id",
                PropertySchema::string("Associated person id"),
            )
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        required_str(args, "name")?;

        let data = client
            .execute(&CrmOperation::CreateOpportunity {
                data: opportunity_data(args),
            })
            .await?;

        let created = &data["createOpportunity"];
        Ok(format!(
            "Created opportunity {} [{}] (id: {})",
            nested_str(created, &["name"]).unwrap_or(""),
            nested_str(created, &["stage"]).unwrap_or("NEW"),
            nested_str(created, &["id"]).unwrap_or("?"),
        ))
    }
}

/// Update fields on an opportunity
pub struct UpdateOpportunityTool;

#[async_trait]
impl McpTool for UpdateOpportunityTool {
    fn name(&self) -> &'static str {
        "update_opportunity"
    }

    fn description(&self) -> &'static str {
        "Update fields on an existing opportunity, including moving it between stages"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object()
            .required("id", PropertySchema::string("Opportunity id"))
            .optional("name", PropertySchema::string("Opportunity name"))
            .optional("stage", PropertySchema::enumerated("Pipeline stage", STAGES))
            .optional("amount", PropertySchema::integer("Deal amount in currency units"))
            .optional("currency", PropertySchema::string("ISO currency code (default USD)"))
            .optional("close_date", PropertySchema::string("Expected close date (ISO 8601)"))
            .optional("company_id", PropertySchema::string("Associated company id"))
            .optional(
                "point_of_contact_id",
                PropertySchema::string("Associated person id"),
            )
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let id = required_str(args, "id")?;

        let data = client
            .execute(&CrmOperation::UpdateOpportunity {
                id: id.to_owned(),
                data: opportunity_data(args),
            })
            .await?;

        let updated = &data["updateOpportunity"];
        Ok(format!(
            "Updated opportunity {} [{}] (id: {id})",
            nested_str(updated, &["name"]).unwrap_or(""),
            nested_str(updated, &["stage"]).unwrap_or("?"),
        ))
    }
}

/// Fetch one opportunity by id
pub struct GetOpportunityTool;

#[async_trait]
impl McpTool for GetOpportunityTool {
    fn name(&self) -> &'static str {
        "get_opportunity"
    }

    fn description(&self) -> &'static str {
        "Fetch a single opportunity by id with stage, amount, and associations"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object().required("id", PropertySchema::string("Opportunity id"))
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let id = required_str(args, "id")?;

        let data = client
            .execute(&CrmOperation::GetOpportunity { id: id.to_owned() })
            .await?;

        let opportunity = &data["opportunity"];
        if opportunity.is_null() {
            return Ok(format!("No opportunity found with id {id}"));
        }

        let mut lines = vec![format!(
            "{} [{}]",
            nested_str(opportunity, &["name"]).unwrap_or("(unnamed)"),
            nested_str(opportunity, &["stage"]).unwrap_or("?"),
        )];
        if let Some((units, currency)) = amount_units(opportunity) {
            lines.push(format!("Amount: {units:.2} {currency}"));
        }
        if let Some(close) = nested_str(opportunity, &["closeDate"]) {
            lines.push(format!("Close date: {close}"));
        }
        if let Some(company_id) = nested_str(opportunity, &["companyId"]) {
            lines.push(format!("Company id: {company_id}"));
        }
        if let Some(contact_id) = nested_str(opportunity, &["pointOfContactId"]) {
            lines.push(format!("Point of contact id: {contact_id}"));
        }
        lines.push(format!("Id: {id}"));

        Ok(lines.join("\n"))
    }
}

/// List opportunities, most recently updated first
pub struct ListOpportunitiesTool;

#[async_trait]
impl McpTool for ListOpportunitiesTool {
    fn name(&self) -> &'static str {
        "list_opportunities"
    }

    fn description(&self) -> &'static str {
        "List opportunities in the CRM, most recently updated first"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object()
            .optional("limit", PropertySchema::integer("Maximum results (default 20)"))
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let data = client
            .execute(&CrmOperation::ListOpportunities {
                first: page_size(args),
            })
            .await?;

        let nodes = connection_nodes(&data, "opportunities");
        if nodes.is_empty() {
            return Ok("No opportunities in the CRM yet".to_owned());
        }

        let mut lines = vec![format!("{} opportunities:", nodes.len())];
        lines.extend(nodes.iter().map(|node| opportunity_line(node)));
        Ok(lines.join("\n"))
    }
}

/// Pipeline summary: opportunities grouped by stage with totals
pub struct OpportunitiesByStageTool;

#[async_trait]
impl McpTool for OpportunitiesByStageTool {
    fn name(&self) -> &'static str {
        "opportunities_by_stage"
    }

    fn description(&self) -> &'static str {
        "Summarize the pipeline: opportunities grouped by stage with counts and totals"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object().optional(
            "limit",
            PropertySchema::integer("Maximum opportunities to aggregate (default 20)"),
        )
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let data = client
            .execute(&CrmOperation::ListOpportunities {
                first: page_size(args),
            })
            .await?;

        let nodes = connection_nodes(&data, "opportunities");
        if nodes.is_empty() {
            return Ok("No opportunities to summarize".to_owned());
        }

        // Group client-side; the upstream API has no aggregation surface.
        let mut stages: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
        for node in &nodes {
            let stage = nested_str(node, &["stage"]).unwrap_or("UNKNOWN");
            let entry = stages.entry(stage).or_insert((0, 0.0));
            entry.0 += 1;
            if let Some((units, _)) = amount_units(node) {
                entry.1 += units;
            }
        }

        let mut lines = vec![format!(
            "Pipeline summary over {} opportunities:",
            nodes.len()
        )];
        for (stage, (count, total)) in &stages {
            lines.push(format!("- {stage}: {count} opportunities, {total:.2} total"));
        }
        Ok(lines.join("\n"))
    }
}
