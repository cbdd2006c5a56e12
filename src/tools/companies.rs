// ABOUTME: MCP tools for company records: create, update, get, search, list, delete
// ABOUTME: Translates flat arguments into nested Twenty company mutations and queries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # Company Tools

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::crm::{CrmOperation, TwentyClient};
use crate::errors::AppResult;

use super::{
    connection_nodes, nested_str, optional_str, page_size, required_str, JsonSchema, McpTool,
    PropertySchema,
};

fn company_line(node: &Value) -> String {
    let name = nested_str(node, &["name"]).unwrap_or("(unnamed)");
    let domain = nested_str(node, &["domainName", "primaryLinkUrl"]).unwrap_or("no domain");
    let id = nested_str(node, &["id"]).unwrap_or("?");
    let employees = node
        .get("employees")
        .and_then(Value::as_u64)
        .map(|count| format!(", {count} employees"))
        .unwrap_or_default();
    format!("- {name} ({domain}){employees} (id: {id})")
}

fn company_data(args: &Value) -> Value {
    let mut data = Map::new();

    if let Some(name) = optional_str(args, "name") {
        data.insert("name".to_owned(), json!(name));
    }
    if let Some(domain) = optional_str(args, "domain") {
        data.insert("domainName".to_owned(), json!({ "primaryLinkUrl": domain }));
    }
    if let Some(employees) = args.get("employees").and_then(Value::as_u64) {
        data.insert("employees".to_owned(), json!(employees));
    }
    if let Some(city) = optional_str(args, "city") {
        data.insert("address".to_owned(), json!({ "addressCity": city }));
    }
    if let Some(icp) = args.get("ideal_customer_profile").and_then(Value::as_bool) {
        data.insert("idealCustomerProfile".to_owned(), json!(icp));
    }

    Value::Object(data)
}

/// Create a company record
pub struct CreateCompanyTool;

#[async_trait]
impl McpTool for CreateCompanyTool {
    fn name(&self) -> &'static str {
        "create_company"
    }

    fn description(&self) -> &'static str {
        "Create a new company in the CRM with name, domain, and size details"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object()
            .required("name", PropertySchema::string("Company name"))
            .optional("domain", PropertySchema::string("Primary website URL"))
            .optional("employees", PropertySchema::integer("Employee count"))
            .optional("city", PropertySchema::string("Headquarters city"))
            .optional(
                "ideal_customer_profile",
                PropertySchema::boolean("Whether the company fits the ideal customer profile"),
            )
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        required_str(args, "name")?;

        let data = client
            .execute(&CrmOperation::CreateCompany {
                data: company_data(args),
            })
            .await?;

        let created = &data["createCompany"];
        Ok(format!(
            "Created company {} (id: {})",
            nested_str(created, &["name"]).unwrap_or(""),
            nested_str(created, &["id"]).unwrap_or("?"),
        ))
    }
}

/// Update fields on an existing company
pub struct UpdateCompanyTool;

#[async_trait]
impl McpTool for UpdateCompanyTool {
    fn name(&self) -> &'static str {
        "update_company"
    }

    fn description(&self) -> &'static str {
        "Update fields on an existing company; only the provided fields change"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object()
            .required("id", PropertySchema::string("Company id"))
            .optional("name", PropertySchema::string("Company name"))
            .optional("domain", PropertySchema::string("Primary website URL"))
            .optional("employees", PropertySchema::integer("Employee count"))
            .optional("city", PropertySchema::string("Headquarters city"))
            .optional(
                "ideal_customer_profile",
                PropertySchema::boolean("Whether the company fits the ideal customer profile"),
            )
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let id = required_str(args, "id")?;

        let data = client
            .execute(&CrmOperation::UpdateCompany {
                id: id.to_owned(),
                data: company_data(args),
            })
            .await?;

        Ok(format!(
            "Updated company {} (id: {id})",
            nested_str(&data["updateCompany"], &["name"]).unwrap_or(""),
        ))
    }
}

/// Fetch one company by id
pub struct GetCompanyTool;

#[async_trait]
impl McpTool for GetCompanyTool {
    fn name(&self) -> &'static str {
        "get_company"
    }

    fn description(&self) -> &'static str {
        "Fetch a single company by id with domain, size, and address details"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object().required("id", PropertySchema::string("Company id"))
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let id = required_str(args, "id")?;

        let data = client
            .execute(&CrmOperation::GetCompany { id: id.to_owned() })
            .await?;

        let company = &data["company"];
        if company.is_null() {
            return Ok(format!("No company found with id {id}"));
        }

        let mut lines = vec![nested_str(company, &["name"]).unwrap_or("(unnamed)").to_owned()];
        if let Some(domain) = nested_str(company, &["domainName", "primaryLinkUrl"]) {
            lines.push(format!("Domain: {domain}"));
        }
        if let Some(employees) = company.get("employees").and_then(Value::as_u64) {
            lines.push(format!("Employees: {employees}"));
        }
        if let Some(city) = nested_str(company, &["address", "addressCity"]) {
            lines.push(format!("City: {city}"));
        }
        if let Some(icp) = company.get("idealCustomerProfile").and_then(Value::as_bool) {
            lines.push(format!("Ideal customer profile: {icp}"));
        }
        lines.push(format!("Id: {id}"));

        Ok(lines.join("\n"))
    }
}

/// Search companies by name or domain substring
pub struct SearchCompaniesTool;

#[async_trait]
impl McpTool for SearchCompaniesTool {
    fn name(&self) -> &'static str {
        "search_companies"
    }

    fn description(&self) -> &'static str {
        "Search companies by name or domain substring, case-insensitively"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object()
            .required("query", PropertySchema::string("Search text"))
            .optional("limit", PropertySchema::integer("Maximum results (default 20)"))
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let query = required_str(args, "query")?;

        let data = client
            .execute(&CrmOperation::SearchCompanies {
                query: query.to_owned(),
                first: page_size(args),
            })
            .await?;

        let nodes = connection_nodes(&data, "companies");
        if nodes.is_empty() {
            return Ok(format!("No companies matched \"{query}\""));
        }

        let mut lines = vec![format!("{} companies matched \"{query}\":", nodes.len())];
        lines.extend(nodes.iter().map(|node| company_line(node)));
        Ok(lines.join("\n"))
    }
}

/// List companies, most recently updated first
pub struct ListCompaniesTool;

#[async_trait]
impl McpTool for ListCompaniesTool {
    fn name(&self) -> &'static str {
        "list_companies"
    }

    fn description(&self) -> &'static str {
        "List companies in the CRM, most recently updated first"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object()
            .optional("limit", PropertySchema::integer("Maximum results (default 20)"))
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let data = client
            .execute(&CrmOperation::ListCompanies {
                first: page_size(args),
            })
            .await?;

        let nodes = connection_nodes(&data, "companies");
        if nodes.is_empty() {
            return Ok("No companies in the CRM yet".to_owned());
        }

        let mut lines = vec![format!("{} companies:", nodes.len())];
        lines.extend(nodes.iter().map(|node| company_line(node)));
        Ok(lines.join("\n"))
    }
}

/// Delete a company by id
pub struct DeleteCompanyTool;

#[async_trait]
impl McpTool for DeleteCompanyTool {
    fn name(&self) -> &'static str {
        "delete_company"
    }

    fn description(&self) -> &'static str {
        "Delete a company from the CRM by id"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object().required("id", PropertySchema::string("Company id"))
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let id = required_str(args, "id")?;

        client
            .execute(&CrmOperation::DeleteCompany { id: id.to_owned() })
            .await?;

        Ok(format!("Deleted company {id}"))
    }
}
