// ABOUTME: Typed GraphQL operation builders for the supported Twenty CRM calls
// ABOUTME: Constant query text per operation; user input travels only through variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # CRM Operations
//!
//! The closed set of upstream GraphQL operations this server performs, as a
//! tagged enum. Each variant renders a constant query string plus typed
//! variables, so a shape mismatch is a compile-time or review-time problem
//! rather than a runtime upstream error, and no user input is ever spliced
//! into query text.

use serde_json::{json, Value};

/// A ready-to-send GraphQL request
#[derive(Debug, Clone)]
pub struct GraphQlRequest {
    /// Constant operation text
    pub query: &'static str,
    /// JSON variables object
    pub variables: Value,
}

/// Every upstream operation the adapter can perform
#[derive(Debug, Clone)]
pub enum CrmOperation {
    /// Create a person record
    CreatePerson {
        /// `PersonCreateInput` object
        data: Value,
    },
    /// Update fields on a person
    UpdatePerson {
        /// Person id
        id: String,
        /// `PersonUpdateInput` object
        data: Value,
    },
    /// Delete a person
    DeletePerson {
        /// Person id
        id: String,
    },
    /// Fetch one person by id
    GetPerson {
        /// Person id
        id: String,
    },
    /// List people, most recently updated first
    ListPeople {
        /// Page size
        first: u32,
    },
    /// Search people by name or email substring
    SearchPeople {
        /// Case-insensitive needle
        query: String,
        /// Page size
        first: u32,
    },
    /// Create a company record
    CreateCompany {
        /// `CompanyCreateInput` object
        data: Value,
    },
    /// Update fields on a company
    UpdateCompany {
        /// Company id
        id: String,
        /// `CompanyUpdateInput` object
        data: Value,
    },
    /// Delete a company
    DeleteCompany {
        /// Company id
        id: String,
    },
    /// Fetch one company by id
    GetCompany {
        /// Company id
        id: String,
    },
    /// List companies, most recently updated first
    ListCompanies {
        /// Page size
        first: u32,
    },
    /// Search companies by name or domain substring
    SearchCompanies {
        /// Case-insensitive needle
        query: String,
        /// Page size
        first: u32,
    },
    /// Create an opportunity
    CreateOpportunity {
        /// `OpportunityCreateInput` object
        data: Value,
    },
    /// Update fields on an opportunity
    UpdateOpportunity {
        /// Opportunity id
        id: String,
        /// `OpportunityUpdateInput` object
        data: Value,
    },
    /// Fetch one opportunity by id
    GetOpportunity {
        /// Opportunity id
        id: String,
    },
    /// List opportunities, most recently updated first
    ListOpportunities {
        /// Page size
        first: u32,
    },
    /// Create a task
    CreateTask {
        /// `TaskCreateInput` object
        data: Value,
    },
    /// Update fields on a task (also used to mark completion)
    UpdateTask {
        /// Task id
        id: String,
        /// `TaskUpdateInput` object
        data: Value,
    },
    /// Fetch one task by id
    GetTask {
        /// Task id
        id: String,
    },
    /// List tasks, optionally filtered by status
    ListTasks {
        /// Page size
        first: u32,
        /// Status filter (`TODO`, `IN_PROGRESS`, `DONE`)
        status: Option<String>,
    },
    /// Create a note
    CreateNote {
        /// `NoteCreateInput` object
        data: Value,
    },
    /// List notes, most recently updated first
    ListNotes {
        /// Page size
        first: u32,
    },
    /// Search notes by title or body substring
    SearchNotes {
        /// Case-insensitive needle
        query: String,
        /// Page size
        first: u32,
    },
    /// Composite read: a person plus the opportunities naming them
    PersonRelations {
        /// Person id
        id: String,
    },
    /// Composite read: a company plus its people and opportunities
    CompanyRelations {
        /// Company id
        id: String,
    },
    /// People with no associated company (orphaned records)
    OrphanedPeople {
        /// Page size
        first: u32,
    },
    /// Recently updated tasks and notes, newest first
    RecentActivity {
        /// Page size per object type
        first: u32,
    },
}

impl CrmOperation {
    /// Operation name used in logs and error messages
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreatePerson { .. } => "createPerson",
            Self::UpdatePerson { .. } => "updatePerson",
            Self::DeletePerson { .. } => "deletePerson",
            Self::GetPerson { .. } => "person",
            Self::ListPeople { .. } => "people",
            Self::SearchPeople { .. } => "searchPeople",
            Self::CreateCompany { .. } => "createCompany",
            Self::UpdateCompany { .. } => "updateCompany",
            Self::DeleteCompany { .. } => "deleteCompany",
            Self::GetCompany { .. } => "company",
            Self::ListCompanies { .. } => "companies",
            Self::SearchCompanies { .. } => "searchCompanies",
            Self::CreateOpportunity { .. } => "createOpportunity",
            Self::UpdateOpportunity { .. } => "updateOpportunity",
            Self::GetOpportunity { .. } => "opportunity",
            Self::ListOpportunities { .. } => "opportunities",
            Self::CreateTask { .. } => "createTask",
            Self::UpdateTask { .. } => "updateTask",
            Self::GetTask { .. } => "task",
            Self::ListTasks { .. } => "tasks",
            Self::CreateNote { .. } => "createNote",
            Self::ListNotes { .. } => "notes",
            Self::SearchNotes { .. } => "searchNotes",
            Self::PersonRelations { .. } => "personRelations",
            Self::CompanyRelations { .. } => "companyRelations",
            Self::OrphanedPeople { .. } => "orphanedPeople",
            Self::RecentActivity { .. } => "recentActivity",
        }
    }

    /// Render the constant query text and variables for this operation
    #[must_use]
    pub fn request(&self) -> GraphQlRequest {
        match self {
            Self::CreatePerson { data } => GraphQlRequest {
                query: "mutation CreatePerson($data: PersonCreateInput!) { \
                    createPerson(data: $data) { id name { firstName lastName } emails { primaryEmail } createdAt } }",
                variables: json!({ "data": data }),
            },
            Self::UpdatePerson { id, data } => GraphQlRequest {
                query: "mutation UpdatePerson($id: UUID!, $data: PersonUpdateInput!) { \
                    updatePerson(id: $id, data: $data) { id name { firstName lastName } emails { primaryEmail } updatedAt } }",
                variables: json!({ "id": id, "data": data }),
            },
            Self::DeletePerson { id } => GraphQlRequest {
                query: "mutation DeletePerson($id: UUID!) { deletePerson(id: $id) { id } }",
                variables: json!({ "id": id }),
            },
            Self::GetPerson { id } => GraphQlRequest {
                query: "query GetPerson($id: UUID!) { \
                    person(filter: { id: { eq: $id } }) { \
                    id name { firstName lastName } emails { primaryEmail } \
                    phones { primaryPhoneNumber } jobTitle city companyId createdAt updatedAt } }",
                variables: json!({ "id": id }),
            },
            Self::ListPeople { first } => GraphQlRequest {
                query: "query ListPeople($first: Int!) { \
                    people(orderBy: [{ updatedAt: DescNullsLast }], first: $first) { \
                    edges { node { id name { firstName lastName } emails { primaryEmail } \
                    phones { primaryPhoneNumber } jobTitle city companyId createdAt updatedAt } } } }",
                variables: json!({ "first": first }),
            },
            Self::SearchPeople { query, first } => GraphQlRequest {
                query: "query SearchPeople($needle: String!, $first: Int!) { \
                    people(filter: { or: [ \
                    { name: { firstName: { ilike: $needle } } }, \
                    { name: { lastName: { ilike: $needle } } }, \
                    { emails: { primaryEmail: { ilike: $needle } } } ] }, first: $first) { \
                    edges { node { id name { firstName lastName } emails { primaryEmail } \
                    phones { primaryPhoneNumber } jobTitle city companyId createdAt updatedAt } } } }",
                variables: json!({ "needle": format!("%{query}%"), "first": first }),
            },
            Self::CreateCompany { data } => GraphQlRequest {
                query: "mutation CreateCompany($data: CompanyCreateInput!) { \
                    createCompany(data: $data) { id name domainName { primaryLinkUrl } createdAt } }",
                variables: json!({ "data": data }),
            },
            Self::UpdateCompany { id, data } => GraphQlRequest {
                query: "mutation UpdateCompany($id: UUID!, $data: CompanyUpdateInput!) { \
                    updateCompany(id: $id, data: $data) { id name domainName { primaryLinkUrl } updatedAt } }",
                variables: json!({ "id": id, "data": data }),
            },
            Self::DeleteCompany { id } => GraphQlRequest {
                query: "mutation DeleteCompany($id: UUID!) { deleteCompany(id: $id) { id } }",
                variables: json!({ "id": id }),
            },
            Self::GetCompany { id } => GraphQlRequest {
                query: "query GetCompany($id: UUID!) { \
                    company(filter: { id: { eq: $id } }) { \
                    id name domainName { primaryLinkUrl } employees \
                    address { addressCity addressCountry } idealCustomerProfile createdAt updatedAt } }",
                variables: json!({ "id": id }),
            },
            Self::ListCompanies { first } => GraphQlRequest {
                query: "query ListCompanies($first: Int!) { \
                    companies(orderBy: [{ updatedAt: DescNullsLast }], first: $first) { \
                    edges { node { id name domainName { primaryLinkUrl } employees \
                    address { addressCity addressCountry } idealCustomerProfile createdAt updatedAt } } } }",
                variables: json!({ "first": first }),
            },
            Self::SearchCompanies { query, first } => GraphQlRequest {
                query: "query SearchCompanies($needle: String!, $first: Int!) { \
                    companies(filter: { or: [ \
                    { name: { ilike: $needle } }, \
                    { domainName: { primaryLinkUrl: { ilike: $needle } } } ] }, first: $first) { \
                    edges { node { id name domainName { primaryLinkUrl } employees \
                    address { addressCity addressCountry } idealCustomerProfile createdAt updatedAt } } } }",
                variables: json!({ "needle": format!("%{query}%"), "first": first }),
            },
            Self::CreateOpportunity { data } => GraphQlRequest {
                query: "mutation CreateOpportunity($data: OpportunityCreateInput!) { \
                    createOpportunity(data: $data) { id name stage amount { amountMicros currencyCode } createdAt } }",
                variables: json!({ "data": data }),
            },
            Self::UpdateOpportunity { id, data } => GraphQlRequest {
                query: "mutation UpdateOpportunity($id: UUID!, $data: OpportunityUpdateInput!) { \
                    updateOpportunity(id: $id, data: $data) { id name stage amount { amountMicros currencyCode } updatedAt } }",
                variables: json!({ "id": id, "data": data }),
            },
            Self::GetOpportunity { id } => GraphQlRequest {
                query: "query GetOpportunity($id: UUID!) { \
                    opportunity(filter: { id: { eq: $id } }) { \
                    id name stage amount { amountMicros currencyCode } closeDate \
                    companyId pointOfContactId createdAt updatedAt } }",
                variables: json!({ "id": id }),
            },
            Self::ListOpportunities { first } => GraphQlRequest {
                query: "query ListOpportunities($first: Int!) { \
                    opportunities(orderBy: [{ updatedAt: DescNullsLast }], first: $first) { \
                    edges { node { id name stage amount { amountMicros currencyCode } closeDate \
                    companyId pointOfContactId createdAt updatedAt } } } }",
                variables: json!({ "first": first }),
            },
            Self::CreateTask { data } => GraphQlRequest {
                query: "mutation CreateTask($data: TaskCreateInput!) { \
                    createTask(data: $data) { id title body status dueAt createdAt } }",
                variables: json!({ "data": data }),
            },
            Self::UpdateTask { id, data } => GraphQlRequest {
                query: "mutation UpdateTask($id: UUID!, $data: TaskUpdateInput!) { \
                    updateTask(id: $id, data: $data) { id title body status dueAt updatedAt } }",
                variables: json!({ "id": id, "data": data }),
            },
            Self::GetTask { id } => GraphQlRequest {
                query: "query GetTask($id: UUID!) { \
                    task(filter: { id: { eq: $id } }) { \
                    id title body status dueAt assigneeId createdAt updatedAt } }",
                variables: json!({ "id": id }),
            },
            Self::ListTasks { first, status } => match status {
                Some(status) => GraphQlRequest {
                    query: "query ListTasks($first: Int!, $status: TaskStatusEnum!) { \
                        tasks(filter: { status: { eq: $status } }, \
                        orderBy: [{ dueAt: AscNullsLast }], first: $first) { \
                        edges { node { id title body status dueAt assigneeId createdAt updatedAt } } } }",
                    variables: json!({ "first": first, "status": status }),
                },
                None => GraphQlRequest {
                    query: "query ListTasks($first: Int!) { \
                        tasks(orderBy: [{ dueAt: AscNullsLast }], first: $first) { \
                        edges { node { id title body status dueAt assigneeId createdAt updatedAt } } } }",
                    variables: json!({ "first": first }),
                },
            },
            Self::CreateNote { data } => GraphQlRequest {
                query: "mutation CreateNote($data: NoteCreateInput!) { \
                    createNote(data: $data) { id title body createdAt } }",
                variables: json!({ "data": data }),
            },
            Self::ListNotes { first } => GraphQlRequest {
                query: "query ListNotes($first: Int!) { \
                    notes(orderBy: [{ updatedAt: DescNullsLast }], first: $first) { \
                    edges { node { id title body createdAt updatedAt } } } }",
                variables: json!({ "first": first }),
            },
            Self::SearchNotes { query, first } => GraphQlRequest {
                query: "query SearchNotes($needle: String!, $first: Int!) { \
                    notes(filter: { or: [ \
                    { title: { ilike: $needle } }, \
                    { body: { ilike: $needle } } ] }, first: $first) { \
                    edges { node { id title body createdAt updatedAt } } } }",
                variables: json!({ "needle": format!("%{query}%"), "first": first }),
            },
            Self::PersonRelations { id } => GraphQlRequest {
                query: "query PersonRelations($id: UUID!) { \
                    person(filter: { id: { eq: $id } }) { \
                    id name { firstName lastName } emails { primaryEmail } jobTitle companyId } \
                    opportunities(filter: { pointOfContactId: { eq: $id } }, first: 50) { \
                    edges { node { id name stage amount { amountMicros currencyCode } closeDate } } } }",
                variables: json!({ "id": id }),
            },
            Self::CompanyRelations { id } => GraphQlRequest {
                query: "query CompanyRelations($id: UUID!) { \
                    company(filter: { id: { eq: $id } }) { \
                    id name domainName { primaryLinkUrl } employees } \
                    people(filter: { companyId: { eq: $id } }, first: 50) { \
                    edges { node { id name { firstName lastName } jobTitle emails { primaryEmail } } } } \
                    opportunities(filter: { companyId: { eq: $id } }, first: 50) { \
                    edges { node { id name stage amount { amountMicros currencyCode } closeDate } } } }",
                variables: json!({ "id": id }),
            },
            Self::OrphanedPeople { first } => GraphQlRequest {
                query: "query OrphanedPeople($first: Int!) { \
                    people(filter: { companyId: { is: NULL } }, first: $first) { \
                    edges { node { id name { firstName lastName } emails { primaryEmail } createdAt } } } }",
                variables: json!({ "first": first }),
            },
            Self::RecentActivity { first } => GraphQlRequest {
                query: "query RecentActivity($first: Int!) { \
                    tasks(orderBy: [{ updatedAt: DescNullsLast }], first: $first) { \
                    edges { node { id title status dueAt updatedAt } } } \
                    notes(orderBy: [{ updatedAt: DescNullsLast }], first: $first) { \
                    edges { node { id title updatedAt } } } }",
                variables: json!({ "first": first }),
            },
        }
    }
}
