use crate::cli::api_client::ApiClient;
use crate::cli::commands::{CountResponse, require_force};
use crate::cli::error::CliResult;
use crate::cli::utils::{apply_table_style, ensure_json_object, format_optional, patch_body};
use serde::{Deserialize, Serialize};
use tabled::{Table, Tabled};

/// Teacher attributes sent on create, update and replace.
///
/// Unset attributes are omitted from the request body.
#[derive(Debug, Default, Serialize)]
pub struct TeacherFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Teacher {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
}

#[derive(Tabled)]
struct TeacherDisplay {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Subject")]
    subject: String,
}

impl From<&Teacher> for TeacherDisplay {
    fn from(teacher: &Teacher) -> Self {
        Self {
            id: teacher
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
            name: format_optional(teacher.name.as_deref(), 30),
            email: format_optional(teacher.email.as_deref(), 40),
            subject: format_optional(teacher.subject.as_deref(), 30),
        }
    }
}

fn label(teacher: &Teacher) -> &str {
    teacher.name.as_deref().unwrap_or("(unnamed)")
}

/// List teachers with an optional JSON filter
pub async fn list_teachers(
    api_client: &ApiClient,
    filter: Option<&str>,
    format: &str,
) -> CliResult<String> {
    let mut request = api_client.get("/teachers");
    if let Some(f) = filter {
        ensure_json_object("filter", f)?;
        request = request.query(&[("filter", f)]);
    }

    let teachers: Vec<Teacher> = ApiClient::handle_response(request.send().await?).await?;

    match format {
        "json" => Ok(serde_json::to_string_pretty(&teachers)?),
        _ => Ok(format_table(&teachers)),
    }
}

fn format_table(teachers: &[Teacher]) -> String {
    if teachers.is_empty() {
        return "No teachers found.".to_string();
    }

    let display: Vec<TeacherDisplay> = teachers.iter().map(|t| t.into()).collect();
    let mut table = Table::new(display);
    apply_table_style(&mut table);
    table.to_string()
}

/// Get a single teacher by ID
pub async fn get_teacher(api_client: &ApiClient, id: i64, format: &str) -> CliResult<String> {
    let response = api_client.get(&format!("/teachers/{}", id)).send().await?;
    let teacher: Teacher = ApiClient::handle_response(response).await?;

    match format {
        "json" => Ok(serde_json::to_string_pretty(&teacher)?),
        _ => Ok(format_teacher_detail(&teacher)),
    }
}

fn format_teacher_detail(teacher: &Teacher) -> String {
    use tabled::builder::Builder;

    let mut builder = Builder::default();

    if let Some(id) = teacher.id {
        builder.push_record(["Teacher ID", &id.to_string()]);
    }
    builder.push_record(["Name", teacher.name.as_deref().unwrap_or("-")]);
    builder.push_record(["Email", teacher.email.as_deref().unwrap_or("-")]);
    builder.push_record(["Subject", teacher.subject.as_deref().unwrap_or("-")]);

    let mut table = builder.build();
    apply_table_style(&mut table);
    table.to_string()
}

/// Count teachers matching an optional JSON predicate
pub async fn count_teachers(api_client: &ApiClient, predicate: Option<&str>) -> CliResult<String> {
    let mut request = api_client.get("/teachers/count");
    if let Some(w) = predicate {
        ensure_json_object("where", w)?;
        request = request.query(&[("where", w)]);
    }

    let count: CountResponse = ApiClient::handle_response(request.send().await?).await?;
    Ok(count.count.to_string())
}

/// Create a new teacher
pub async fn create_teacher(api_client: &ApiClient, fields: TeacherFields) -> CliResult<String> {
    let response = api_client.post("/teachers").json(&fields).send().await?;

    let teacher: Teacher = ApiClient::handle_response(response).await?;
    Ok(format!(
        "✓ Created teacher: {} ({})",
        label(&teacher),
        teacher.id.unwrap_or_default()
    ))
}

/// Update an existing teacher (PATCH semantics - only updates provided fields)
pub async fn update_teacher(
    api_client: &ApiClient,
    id: i64,
    fields: TeacherFields,
    clear: &[String],
) -> CliResult<String> {
    let response = api_client
        .patch(&format!("/teachers/{}", id))
        .json(&patch_body(&fields, clear)?)
        .send()
        .await?;

    ApiClient::handle_empty_response(response).await?;
    Ok(format!("✓ Updated teacher: {}", id))
}

/// Apply the same update to every teacher matching a JSON predicate
pub async fn update_all_teachers(
    api_client: &ApiClient,
    predicate: Option<&str>,
    fields: TeacherFields,
    clear: &[String],
) -> CliResult<String> {
    let mut request = api_client.patch("/teachers").json(&patch_body(&fields, clear)?);
    if let Some(w) = predicate {
        ensure_json_object("where", w)?;
        request = request.query(&[("where", w)]);
    }

    let count: CountResponse = ApiClient::handle_response(request.send().await?).await?;
    Ok(format!("✓ Updated {} teacher(s)", count.count))
}

/// Replace every attribute of a teacher; omitted attributes are cleared
pub async fn replace_teacher(
    api_client: &ApiClient,
    id: i64,
    fields: TeacherFields,
) -> CliResult<String> {
    let response = api_client
        .put(&format!("/teachers/{}", id))
        .json(&fields)
        .send()
        .await?;

    ApiClient::handle_empty_response(response).await?;
    Ok(format!("✓ Replaced teacher: {}", id))
}

/// Delete a teacher (requires --force flag for safety)
pub async fn delete_teacher(api_client: &ApiClient, id: i64, force: bool) -> CliResult<String> {
    require_force(force)?;

    let response = api_client
        .delete(&format!("/teachers/{}", id))
        .send()
        .await?;

    ApiClient::handle_empty_response(response).await?;
    Ok(format!("✓ Deleted teacher: {}", id))
}
