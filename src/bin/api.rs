//! Classroom API server binary.
//!
//! This binary creates the concrete database implementation and passes it
//! to the API server. The API layer remains agnostic of the storage backend.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;
use classroom::api::{self, ApiError, Config};
use classroom::db::{Database, DbError, SqliteDatabase};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
enum BinaryError {
    #[error("Database error: {0}")]
    #[diagnostic(code(classroom::binary::database))]
    Database(#[from] DbError),

    #[error("Failed to create data directory: {0}")]
    #[diagnostic(code(classroom::binary::io))]
    Io(#[from] std::io::Error),

    #[error("API server error: {0}")]
    #[diagnostic(code(classroom::binary::api))]
    Api(#[from] ApiError),
}

#[derive(Parser)]
#[command(name = "classroom-api")]
#[command(author, version, about = "Classroom API server", long_about = None)]
struct Cli {
    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Database file path (defaults to CLASSROOM_DB or ~/.local/share/classroom/classroom.db)
    #[arg(long)]
    db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    serve(Cli::parse()).await?;
    Ok(())
}

async fn serve(cli: Cli) -> Result<(), BinaryError> {
    let mut config = Config::new().with_host(cli.host).with_port(cli.port);
    if let Some(db) = cli.db {
        config = config.with_db_path(db);
    }

    println!("Opening database at {:?}", config.db_path);

    // Ensure parent directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = SqliteDatabase::open(&config.db_path).await?;

    // Run migrations before starting the server
    db.migrate().await?;
    println!("Database migrations complete");

    // Pass the abstract Database to the API layer
    api::run(config, db).await?;

    Ok(())
}
