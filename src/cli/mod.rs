pub mod api_client;
mod commands;
pub mod error;
mod utils;


use clap::{Args, Parser, Subcommand};

use commands::teacher::{self, TeacherFields};
use commands::todo::{self, TodoFields};
use error::CliResult;

#[derive(Parser)]
#[command(name = "classroom")]
#[command(author, version, about = "Classroom management CLI", long_about = None)]
pub struct Cli {
    /// Override the API URL (default: CLASSROOM_API_URL env or http://localhost:3000)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Teacher management commands
    Teacher {
        #[command(subcommand)]
        command: TeacherCommands,
    },
    /// Todo management commands
    Todo {
        #[command(subcommand)]
        command: TodoCommands,
    },
}

#[derive(Args)]
struct TeacherArgs {
    /// Teacher name
    #[arg(long)]
    name: Option<String>,
    /// Email address
    #[arg(long)]
    email: Option<String>,
    /// Subject taught
    #[arg(long)]
    subject: Option<String>,
}

impl From<TeacherArgs> for TeacherFields {
    fn from(args: TeacherArgs) -> Self {
        Self {
            name: args.name,
            email: args.email,
            subject: args.subject,
        }
    }
}

#[derive(Subcommand)]
enum TeacherCommands {
    /// List teachers
    List {
        /// JSON filter, e.g. '{"where": {"subject": "Mathematics"}, "order": "name"}'
        #[arg(long)]
        filter: Option<String>,
        /// Output format (table or json)
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show a teacher
    Get {
        id: i64,
        /// Output format (table or json)
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Count teachers
    Count {
        /// JSON predicate
        #[arg(long = "where")]
        predicate: Option<String>,
    },
    /// Create a teacher
    Create {
        #[command(flatten)]
        fields: TeacherArgs,
    },
    /// Update the given attributes of a teacher
    Update {
        id: i64,
        #[command(flatten)]
        fields: TeacherArgs,
        /// Clear an attribute (repeatable)
        #[arg(long, value_name = "ATTRIBUTE", value_parser = ["name", "email", "subject"])]
        clear: Vec<String>,
    },
    /// Update every teacher matching a predicate
    UpdateAll {
        /// JSON predicate (all teachers when omitted)
        #[arg(long = "where")]
        predicate: Option<String>,
        #[command(flatten)]
        fields: TeacherArgs,
        /// Clear an attribute (repeatable)
        #[arg(long, value_name = "ATTRIBUTE", value_parser = ["name", "email", "subject"])]
        clear: Vec<String>,
    },
    /// Replace a teacher; omitted attributes are cleared
    Replace {
        id: i64,
        #[command(flatten)]
        fields: TeacherArgs,
    },
    /// Delete a teacher
    Delete {
        id: i64,
        /// Confirm deletion
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct TodoArgs {
    /// Todo title
    #[arg(long)]
    title: Option<String>,
    /// Longer description
    #[arg(long)]
    desc: Option<String>,
    /// Completion state (true or false)
    #[arg(long)]
    complete: Option<bool>,
}

impl TodoArgs {
    fn into_fields(self, id: Option<i64>) -> TodoFields {
        TodoFields {
            id,
            title: self.title,
            desc: self.desc,
            is_complete: self.complete,
        }
    }
}

#[derive(Subcommand)]
enum TodoCommands {
    /// List todos
    List {
        /// JSON filter, e.g. '{"where": {"isComplete": false}, "limit": 10}'
        #[arg(long)]
        filter: Option<String>,
        /// Output format (table or json)
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show a todo
    Get {
        id: i64,
        /// Output format (table or json)
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Count todos
    Count {
        /// JSON predicate
        #[arg(long = "where")]
        predicate: Option<String>,
    },
    /// Create a todo with the given id
    Create {
        id: i64,
        #[command(flatten)]
        fields: TodoArgs,
    },
    /// Update the given attributes of a todo
    Update {
        id: i64,
        #[command(flatten)]
        fields: TodoArgs,
        /// Clear an attribute (repeatable)
        #[arg(long, value_name = "ATTRIBUTE", value_parser = ["title", "desc", "isComplete"])]
        clear: Vec<String>,
    },
    /// Update every todo matching a predicate
    UpdateAll {
        /// JSON predicate (all todos when omitted)
        #[arg(long = "where")]
        predicate: Option<String>,
        #[command(flatten)]
        fields: TodoArgs,
        /// Clear an attribute (repeatable)
        #[arg(long, value_name = "ATTRIBUTE", value_parser = ["title", "desc", "isComplete"])]
        clear: Vec<String>,
    },
    /// Replace a todo; omitted attributes are cleared
    Replace {
        id: i64,
        #[command(flatten)]
        fields: TodoArgs,
    },
    /// Delete a todo
    Delete {
        id: i64,
        /// Confirm deletion
        #[arg(long)]
        force: bool,
    },
}

async fn run_teacher(
    api_client: &api_client::ApiClient,
    command: TeacherCommands,
) -> CliResult<String> {
    match command {
        TeacherCommands::List { filter, format } => {
            teacher::list_teachers(api_client, filter.as_deref(), &format).await
        }
        TeacherCommands::Get { id, format } => teacher::get_teacher(api_client, id, &format).await,
        TeacherCommands::Count { predicate } => {
            teacher::count_teachers(api_client, predicate.as_deref()).await
        }
        TeacherCommands::Create { fields } => {
            teacher::create_teacher(api_client, fields.into()).await
        }
        TeacherCommands::Update { id, fields, clear } => {
            teacher::update_teacher(api_client, id, fields.into(), &clear).await
        }
        TeacherCommands::UpdateAll {
            predicate,
            fields,
            clear,
        } => {
            teacher::update_all_teachers(api_client, predicate.as_deref(), fields.into(), &clear)
                .await
        }
        TeacherCommands::Replace { id, fields } => {
            teacher::replace_teacher(api_client, id, fields.into()).await
        }
        TeacherCommands::Delete { id, force } => {
            teacher::delete_teacher(api_client, id, force).await
        }
    }
}

async fn run_todo(api_client: &api_client::ApiClient, command: TodoCommands) -> CliResult<String> {
    match command {
        TodoCommands::List { filter, format } => {
            todo::list_todos(api_client, filter.as_deref(), &format).await
        }
        TodoCommands::Get { id, format } => todo::get_todo(api_client, id, &format).await,
        TodoCommands::Count { predicate } => {
            todo::count_todos(api_client, predicate.as_deref()).await
        }
        TodoCommands::Create { id, fields } => {
            todo::create_todo(api_client, fields.into_fields(Some(id))).await
        }
        TodoCommands::Update { id, fields, clear } => {
            todo::update_todo(api_client, id, fields.into_fields(None), &clear).await
        }
        TodoCommands::UpdateAll {
            predicate,
            fields,
            clear,
        } => {
            todo::update_all_todos(
                api_client,
                predicate.as_deref(),
                fields.into_fields(None),
                &clear,
            )
            .await
        }
        TodoCommands::Replace { id, fields } => {
            todo::replace_todo(api_client, id, fields.into_fields(None)).await
        }
        TodoCommands::Delete { id, force } => todo::delete_todo(api_client, id, force).await,
    }
}

pub async fn run() -> miette::Result<()> {
    // reqwest is built without a bundled crypto provider
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    let api_client = api_client::ApiClient::new(cli.api_url);

    let output = match cli.command {
        Some(Commands::Teacher { command }) => run_teacher(&api_client, command).await?,
        Some(Commands::Todo { command }) => run_todo(&api_client, command).await?,
        None => {
            // Show help when no command provided
            let _ = Cli::parse_from(["classroom", "--help"]);
            return Ok(());
        }
    };

    println!("{}", output);
    Ok(())
}
