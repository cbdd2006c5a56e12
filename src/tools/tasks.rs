// ABOUTME: MCP tools for tasks: create, update, get, list, and completion
// ABOUTME: Status transitions ride the same update mutation as field edits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # Task Tools

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::crm::{CrmOperation, TwentyClient};
use crate::errors::AppResult;

use super::{
    connection_nodes, nested_str, optional_str, page_size, required_str, JsonSchema, McpTool,
    PropertySchema,
};

/// Task statuses accepted by create/update/list tools
const STATUSES: &[&str] = &["TODO", "IN_PROGRESS", "DONE"];

fn task_line(node: &Value) -> String {
    let title = nested_str(node, &["title"]).unwrap_or("(untitled)");
    let status = nested_str(node, &["status"]).unwrap_or("?");
    let id = nested_str(node, &["id"]).unwrap_or("?");
    let due = nested_str(node, &["dueAt"])
        .map(|date| format!(", due {date}"))
        .unwrap_or_default();
    format!("- {title} [{status}]{due} (id: {id})")
}

fn task_data(args: &Value) -> Value {
    let mut data = Map::new();

    if let Some(title) = optional_str(args, "title") {
        data.insert("title".to_owned(), json!(title));
    }
    if let Some(body) = optional_str(args, "body") {
        data.insert("body".to_owned(), json!(body));
    }
    if let Some(status) = optional_str(args, "status") {
        data.insert("status".to_owned(), json!(status));
    }
    if let Some(due_at) = optional_str(args, "due_at") {
        data.insert("dueAt".to_owned(), json!(due_at));
    }
    if let Some(assignee_id) = optional_str(args, "assignee_id") {
        data.insert("assigneeId".to_owned(), json!(assignee_id));
    }

    Value::Object(data)
}

/// Create a task
pub struct CreateTaskTool;

#[async_trait]
impl McpTool for CreateTaskTool {
    fn name(&self) -> &'static str {
        "create_task"
    }

    fn description(&self) -> &'static str {
        "Create a new task with title, body, status, due date, and assignee"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object()
            .required("title", PropertySchema::string("Task title"))
            .optional("body", PropertySchema::string("Task body text"))
            .optional("status", PropertySchema::enumerated("Task status", STATUSES))
            .optional("due_at", PropertySchema::string("Due date (ISO 8601)"))
            .optional("assignee_id", PropertySchema::string("Assignee member id"))
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        required_str(args, "title")?;

        let data = client
            .execute(&CrmOperation::CreateTask {
                data: task_data(args),
            })
            .await?;

        let created = &data["createTask"];
        Ok(format!(
            "Created task {} [{}] (id: {})",
            nested_str(created, &["title"]).unwrap_or(""),
            nested_str(created, &["status"]).unwrap_or("TODO"),
            nested_str(created, &["id"]).unwrap_or("?"),
        ))
    }
}

/// Update fields on a task
pub struct UpdateTaskTool;

#[async_trait]
impl McpTool for UpdateTaskTool {
    fn name(&self) -> &'static str {
        "update_task"
    }

    fn description(&self) -> &'static str {
        "Update fields on an existing task; only the provided fields change"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object()
            .required("id", PropertySchema::string("Task id"))
            .optional("title", PropertySchema::string("Task title"))
            .optional("body", PropertySchema::string("Task body text"))
            .optional("status", PropertySchema::enumerated("Task status", STATUSES))
            .optional("due_at", PropertySchema::string("Due date (ISO 8601)"))
            .optional("assignee_id", PropertySchema::string("Assignee member id"))
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let id = required_str(args, "id")?;

        let data = client
            .execute(&CrmOperation::UpdateTask {
                id: id.to_owned(),
                data: task_data(args),
            })
            .await?;

        let updated = &data["updateTask"];
        Ok(format!(
            "Updated task {} [{}] (id: {id})",
            nested_str(updated, &["title"]).unwrap_or(""),
            nested_str(updated, &["status"]).unwrap_or("?"),
        ))
    }
}

/// Fetch one task by id
pub struct GetTaskTool;

#[async_trait]
impl McpTool for GetTaskTool {
    fn name(&self) -> &'static str {
        "get_task"
    }

    fn description(&self) -> &'static str {
        "Fetch a single task by id with status, due date, and body"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object().required("id", PropertySchema::string("Task id"))
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let id = required_str(args, "id")?;

        let data = client
            .execute(&CrmOperation::GetTask { id: id.to_owned() })
            .await?;

        let task = &data["task"];
        if task.is_null() {
            return Ok(format!("No task found with id {id}"));
        }

        let mut lines = vec![format!(
            "{} [{}]",
            nested_str(task, &["title"]).unwrap_or("(untitled)"),
            nested_str(task, &["status"]).unwrap_or("?"),
        )];
        if let Some(due) = nested_str(task, &["dueAt"]) {
            lines.push(format!("Due: {due}"));
        }
        if let Some(assignee) = nested_str(task, &["assigneeId"]) {
            lines.push(format!("Assignee id: {assignee}"));
        }
        if let Some(body) = nested_str(task, &["body"]) {
            lines.push(format!("Body: {body}"));
        }
        lines.push(format!("Id: {id}"));

        Ok(lines.join("\n"))
    }
}

/// List tasks, optionally filtered by status
pub struct ListTasksTool;

#[async_trait]
impl McpTool for ListTasksTool {
    fn name(&self) -> &'static str {
        "list_tasks"
    }

    fn description(&self) -> &'static str {
        "List tasks ordered by due date, optionally filtered by status"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object()
            .optional("status", PropertySchema::enumerated("Filter by status", STATUSES))
            .optional("limit", PropertySchema::integer("Maximum results (default 20)"))
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let status = optional_str(args, "status").map(str::to_owned);

        let data = client
            .execute(&CrmOperation::ListTasks {
                first: page_size(args),
                status: status.clone(),
            })
            .await?;

        let nodes = connection_nodes(&data, "tasks");
        if nodes.is_empty() {
            return Ok(status.map_or_else(
                || "No tasks in the CRM yet".to_owned(),
                |status| format!("No tasks with status {status}"),
            ));
        }

        let mut lines = vec![format!("{} tasks:", nodes.len())];
        lines.extend(nodes.iter().map(|node| task_line(node)));
        Ok(lines.join("\n"))
    }
}

/// Mark a task as done
pub struct CompleteTaskTool;

#[async_trait]
impl McpTool for CompleteTaskTool {
    fn name(&self) -> &'static str {
        "complete_task"
    }

    fn description(&self) -> &'static str {
        "Mark a task as done by id"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object().required("id", PropertySchema::string("Task id"))
    }

    async fn call(&self, args: &Value, client: &TwentyClient) -> AppResult<String> {
        let id = required_str(args, "id")?;

        let data = client
            .execute(&CrmOperation::UpdateTask {
                id: id.to_owned(),
                data: json!({ "status": "DONE" }),
            })
            .await?;

        Ok(format!(
            "Completed task {} (id: {id})",
            nested_str(&data["updateTask"], &["title"]).unwrap_or(""),
        ))
    }
}
