//! Database abstraction layer.
//!
//! This module provides trait-based abstractions for data access,
//! allowing different storage backends to be swapped without changing
//! the HTTP handlers.
//!
//! # Architecture
//!
//! - `error`: Storage-agnostic error types
//! - `models`: Model declarations (Teacher, Todo) and operation payloads
//! - `filter`: Where/Filter query descriptions
//! - `repository`: Trait definitions for data access
//! - `sqlite`: SQLx-backed implementation

mod error;
mod filter;
mod models;
mod repository;
pub mod sqlite;


pub use error::{DbError, DbResult};
pub use filter::*;
pub use models::*;
pub use repository::*;
pub use sqlite::SqliteDatabase;
