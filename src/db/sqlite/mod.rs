//! SQLite implementation of the database traits.
//!
//! This module provides a SQLx-backed implementation of the repository
//! traits defined in the parent module.

mod connection;
mod crud;
mod helpers;

#[cfg(test)]
mod teacher_test;

pub use connection::SqliteDatabase;
pub use crud::{SqliteCrudRepository, SqliteTeacherRepository, SqliteTodoRepository};
