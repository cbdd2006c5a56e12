// ABOUTME: MCP tools for person records: create, update, get, search, list, delete
// ABOUTME: Translates flat arguments into nested Twenty person mutations and queries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # People Tools

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::crm::{CrmOperation, TwentyClient};
use crate::errors::AppResult;

use super::{
    connection_nodes, nested_str, optional_str, page_size, required_str, JsonSchema, McpTool,
    PropertySchema,
};

/// Render one person node as a summary line
fn person_line(node: &Value) -> String {
    let first = nested_str(node, &["name", "firstName"]).unwrap_or("");
    let last = nested_str(node, &["name", "lastName"]).unwrap_or("");
    let email = nested_str(node, &["emails", "primaryEmail"]).unwrap_or("no email");
    let id = nested_str(node, &["id"]).unwrap_or("?");
    let job = nested_str(node, &["jobTitle"])
        .map(|title| format!(", {title}"))
        .unwrap_or_default();
    format!("- {first} {last} <{email}>{job} (id: {id})")
}

/// Build the nested person input object from flat tool arguments
fn person_data(args: &Value) -> Value {
    let mut data = Map::new();

    let first = optional_str(args, "first_name");
    let last = optional_str(args, "last_name");
    if first.is_some() || last.is_some() {
        data.insert(
            "name".to_owned(),
            json!({
                "firstName": first.unwrap_or(""),
                "lastName": last.unwrap_or(""),
            }),
        );
    }
    if let Some(email) = optional_str(args, "email") {
        data.insert("emails".to_owned(), json!({ "primaryEmail": email }));
    }
    if let Some(phone) = optional_str(args, "phone") {
        data.insert("phones".to_owned(), json!({ "primaryPhoneNumber": phone }));
    }
    if let Some(job_title) = optional_str(args, "job_title") {
        data.insert("jobTitle".to_owned(), json!(job_title));
    }
    if let Some(city) = optional_str(args, "city") {
        data.insert("city".to_owned(), json!(city));
    }
    if let Some(company_id) = optional_str(args, "company_id") {
        data.insert("companyId".to_owned(), json!(company_id));
    }

    Value::Object(data)
}

/// Create a person record
pub struct CreatePersonTool;

#[async_trait]
impl McpTool for CreatePersonTool {
    fn name(&self) -> &'static str {
        "create_person"
    }

    fn description(&self) -> &'static str {
        "Create a new person (contact) in the CRM with name, email, phone, and company association"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object()
            .required("first_name", PropertySchema::string("First name"))
            .required("last_name", PropertySchema::string("Last name"))
            .optional("email", PropertySchema::string("Primary email address"))
            .optional("phone", PropertySchema::string("Primary phone number"))
            .optional("job_title", PropertySchema::string("Job title"))
            .optional("city", PropertySchema::string("City"))
            .optional("company_id", PropertySchema::string("Id of the employing company"))
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        required_str(args, "first_name")?;
        required_str(args, "last_name")?;

        let data = client
            .execute(&CrmOperation::CreatePerson {
                data: person_data(args),
            })
            .await?;

        let created = &data["createPerson"];
        Ok(format!(
            "Created person {} {} (id: {})",
            nested_str(created, &["name", "firstName"]).unwrap_or(""),
            nested_str(created, &["name", "lastName"]).unwrap_or(""),
            nested_str(created, &["id"]).unwrap_or("?"),
        ))
    }
}

/// Update fields on an existing person
pub struct UpdatePersonTool;

#[async_trait]
impl McpTool for UpdatePersonTool {
    fn name(&self) -> &'static str {
        "update_person"
    }

    fn description(&self) -> &'static str {
        "Update fields on an existing person; only the provided fields change"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object()
            .required("id", PropertySchema::string("Person id"))
            .optional("first_name", PropertySchema::string("First name"))
            .optional("last_name", PropertySchema::string("Last name"))
            .optional("email", PropertySchema::string("Primary email address"))
            .optional("phone", PropertySchema::string("Primary phone number"))
            .optional("job_title", PropertySchema::string("Job title"))
            .optional("city", PropertySchema::string("City"))
            .optional("company_id", PropertySchema::string("Id of the employing company"))
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let id = required_str(args, "id")?;

        let data = client
            .execute(&CrmOperation::UpdatePerson {
                id: id.to_owned(),
                data: person_data(args),
            })
            .await?;

        let updated = &data["updatePerson"];
        Ok(format!(
            "Updated person {} {} (id: {id})",
            nested_str(updated, &["name", "firstName"]).unwrap_or(""),
            nested_str(updated, &["name", "lastName"]).unwrap_or(""),
        ))
    }
}

/// Fetch one person by id
pub struct GetPersonTool;

#[async_trait]
impl McpTool for GetPersonTool {
    fn name(&self) -> &'static str {
        "get_person"
    }

    fn description(&self) -> &'static str {
        "Fetch a single person by id with contact details and company association"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object().required("id", PropertySchema::string("Person id"))
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let id = required_str(args, "id")?;

        let data = client
            .execute(&CrmOperation::GetPerson { id: id.to_owned() })
            .await?;

        let person = &data["person"];
        if person.is_null() {
            return Ok(format!("No person found with id {id}"));
        }

        let mut lines = vec![format!(
            "{} {}",
            nested_str(person, &["name", "firstName"]).unwrap_or(""),
            nested_str(person, &["name", "lastName"]).unwrap_or(""),
        )];
        if let Some(email) = nested_str(person, &["emails", "primaryEmail"]) {
            lines.push(format!("Email: {email}"));
        }
        if let Some(phone) = nested_str(person, &["phones", "primaryPhoneNumber"]) {
            lines.push(format!("Phone: {phone}"));
        }
        if let Some(job) = nested_str(person, &["jobTitle"]) {
            lines.push(format!("Job title: {job}"));
        }
        if let Some(city) = nested_str(person, &["city"]) {
            lines.push(format!("City: {city}"));
        }
        if let Some(company_id) = nested_str(person, &["companyId"]) {
            lines.push(format!("Company id: {company_id}"));
        }
        lines.push(format!("Id: {id}"));

        Ok(lines.join("\n"))
    }
}

/// Search people by name or email substring
pub struct SearchPeopleTool;

#[async_trait]
impl McpTool for SearchPeopleTool {
    fn name(&self) -> &'static str {
        "search_people"
    }

    fn description(&self) -> &'static str {
        "Search people by name or email substring, case-insensitively"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object()
            .required("query", PropertySchema::string("Search text"))
            .optional("limit", PropertySchema::integer("Maximum results (default 20)"))
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let query = required_str(args, "query")?;

        let data = client
            .execute(&CrmOperation::SearchPeople {
                query: query.to_owned(),
                first: page_size(args),
            })
            .await?;

        let nodes = connection_nodes(&data, "people");
        if nodes.is_empty() {
            return Ok(format!("No people matched \"{query}\""));
        }

        let mut lines = vec![format!("{} people matched \"{query}\":", nodes.len())];
        lines.extend(nodes.iter().map(|node| person_line(node)));
        Ok(lines.join("\n"))
    }
}

/// List people, most recently updated first
pub struct ListPeopleTool;

#[async_trait]
impl McpTool for ListPeopleTool {
    fn name(&self) -> &'static str {
        "list_people"
    }

    fn description(&self) -> &'static str {
        "List people in the CRM, most recently updated first"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object()
            .optional("limit", PropertySchema::integer("Maximum results (default 20)"))
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let data = client
            .execute(&CrmOperation::ListPeople {
                first: page_size(args),
            })
            .await?;

        let nodes = connection_nodes(&data, "people");
        if nodes.is_empty() {
            return Ok("No people in the CRM yet".to_owned());
        }

        let mut lines = vec![format!("{} people:", nodes.len())];
        lines.extend(nodes.iter().map(|node| person_line(node)));
        Ok(lines.join("\n"))
    }
}

/// Delete a person by id
pub struct DeletePersonTool;

#[async_trait]
impl McpTool for DeletePersonTool {
    fn name(&self) -> &'static str {
        "delete_person"
    }

    fn description(&self) -> &'static str {
        "Delete a person from the CRM by id"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object().required("id", PropertySchema::string("Person id"))
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let id = required_str(args, "id")?;

        client
            .execute(&CrmOperation::DeletePerson { id: id.to_owned() })
            .await?;

        Ok(format!("Deleted person {id}"))
    }
}
