pub mod teacher;
pub mod todo;

use serde::Deserialize;

use crate::cli::error::{CliError, CliResult};

/// Body of count and bulk update responses
#[derive(Debug, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

/// Destructive commands refuse to run without --force.
pub(crate) fn require_force(force: bool) -> CliResult<()> {
    if force {
        Ok(())
    } else {
        Err(CliError::InvalidInput {
            message: "Delete operation requires --force flag. This action is destructive and cannot be undone.".to_string(),
            help: None,
        })
    }
}
