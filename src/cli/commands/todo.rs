use crate::cli::api_client::ApiClient;
use crate::cli::commands::{CountResponse, require_force};
use crate::cli::error::CliResult;
use crate::cli::utils::{apply_table_style, ensure_json_object, format_optional, patch_body};
use serde::{Deserialize, Serialize};
use tabled::{Table, Tabled};

/// Todo attributes sent on create, update and replace.
///
/// Unset attributes are omitted from the request body.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_complete: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone)]
#[serde(default, rename_all = "camelCase")]
pub struct Todo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: Option<String>,
    pub desc: Option<String>,
    pub is_complete: Option<bool>,
}

#[derive(Tabled)]
struct TodoDisplay {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Description")]
    desc: String,
    #[tabled(rename = "Done")]
    done: String,
}

fn format_done(is_complete: Option<bool>) -> &'static str {
    match is_complete {
        Some(true) => "✓",
        Some(false) => "✗",
        None => "-",
    }
}

impl From<&Todo> for TodoDisplay {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
            title: format_optional(todo.title.as_deref(), 40),
            desc: format_optional(todo.desc.as_deref(), 50),
            done: format_done(todo.is_complete).to_string(),
        }
    }
}

/// List todos with an optional JSON filter
pub async fn list_todos(
    api_client: &ApiClient,
    filter: Option<&str>,
    format: &str,
) -> CliResult<String> {
    let mut request = api_client.get("/todos");
    if let Some(f) = filter {
        ensure_json_object("filter", f)?;
        request = request.query(&[("filter", f)]);
    }

    let todos: Vec<Todo> = ApiClient::handle_response(request.send().await?).await?;

    match format {
        "json" => Ok(serde_json::to_string_pretty(&todos)?),
        _ => Ok(format_table(&todos)),
    }
}

fn format_table(todos: &[Todo]) -> String {
    if todos.is_empty() {
        return "No todos found.".to_string();
    }

    let display: Vec<TodoDisplay> = todos.iter().map(|t| t.into()).collect();
    let mut table = Table::new(display);
    apply_table_style(&mut table);
    table.to_string()
}

/// Get a single todo by ID
pub async fn get_todo(api_client: &ApiClient, id: i64, format: &str) -> CliResult<String> {
    let response = api_client.get(&format!("/todos/{}", id)).send().await?;
    let todo: Todo = ApiClient::handle_response(response).await?;

    match format {
        "json" => Ok(serde_json::to_string_pretty(&todo)?),
        _ => Ok(format_todo_detail(&todo)),
    }
}

fn format_todo_detail(todo: &Todo) -> String {
    use tabled::builder::Builder;

    let mut builder = Builder::default();

    if let Some(id) = todo.id {
        builder.push_record(["Todo ID", &id.to_string()]);
    }
    builder.push_record(["Title", todo.title.as_deref().unwrap_or("-")]);
    if let Some(desc) = &todo.desc {
        builder.push_record(["Description", desc]);
    }
    builder.push_record(["Done", format_done(todo.is_complete)]);

    let mut table = builder.build();
    apply_table_style(&mut table);
    table.to_string()
}

/// Count todos matching an optional JSON predicate
pub async fn count_todos(api_client: &ApiClient, predicate: Option<&str>) -> CliResult<String> {
    let mut request = api_client.get("/todos/count");
    if let Some(w) = predicate {
        ensure_json_object("where", w)?;
        request = request.query(&[("where", w)]);
    }

    let count: CountResponse = ApiClient::handle_response(request.send().await?).await?;
    Ok(count.count.to_string())
}

/// Create a new todo; the id is chosen by the caller
pub async fn create_todo(api_client: &ApiClient, fields: TodoFields) -> CliResult<String> {
    let response = api_client.post("/todos").json(&fields).send().await?;

    let todo: Todo = ApiClient::handle_response(response).await?;
    Ok(format!(
        "✓ Created todo: {} ({})",
        todo.title.as_deref().unwrap_or("(untitled)"),
        todo.id.unwrap_or_default()
    ))
}

/// Update an existing todo (PATCH semantics - only updates provided fields)
pub async fn update_todo(
    api_client: &ApiClient,
    id: i64,
    fields: TodoFields,
    clear: &[String],
) -> CliResult<String> {
    let response = api_client
        .patch(&format!("/todos/{}", id))
        .json(&patch_body(&fields, clear)?)
        .send()
        .await?;

    ApiClient::handle_empty_response(response).await?;
    Ok(format!("✓ Updated todo: {}", id))
}

/// Apply the same update to every todo matching a JSON predicate
pub async fn update_all_todos(
    api_client: &ApiClient,
    predicate: Option<&str>,
    fields: TodoFields,
    clear: &[String],
) -> CliResult<String> {
    let mut request = api_client.patch("/todos").json(&patch_body(&fields, clear)?);
    if let Some(w) = predicate {
        ensure_json_object("where", w)?;
        request = request.query(&[("where", w)]);
    }

    let count: CountResponse = ApiClient::handle_response(request.send().await?).await?;
    Ok(format!("✓ Updated {} todo(s)", count.count))
}

/// Replace every attribute of a todo; omitted attributes are cleared
pub async fn replace_todo(
    api_client: &ApiClient,
    id: i64,
    fields: TodoFields,
) -> CliResult<String> {
    let response = api_client
        .put(&format!("/todos/{}", id))
        .json(&fields)
        .send()
        .await?;

    ApiClient::handle_empty_response(response).await?;
    Ok(format!("✓ Replaced todo: {}", id))
}

/// Delete a todo (requires --force flag for safety)
pub async fn delete_todo(api_client: &ApiClient, id: i64, force: bool) -> CliResult<String> {
    require_force(force)?;

    let response = api_client.delete(&format!("/todos/{}", id)).send().await?;

    ApiClient::handle_empty_response(response).await?;
    Ok(format!("✓ Deleted todo: {}", id))
}
