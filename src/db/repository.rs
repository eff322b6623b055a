//! Repository traits for data access abstraction.
//!
//! These traits define the contract for data access, allowing different
//! storage backends to be swapped without changing the HTTP layer.

use std::future::Future;

use crate::db::{
    Count, DbResult, Entity, Filter, FilterExcludingWhere, Patch, Teacher, Todo, Where,
};

/// Standard CRUD operation set for one model type.
///
/// Identifiers are integers for every model in this crate.
pub trait CrudRepository<E: Entity> {
    /// Insert a record and return it as stored.
    ///
    /// The id may be omitted only when the model's id is generated by the
    /// data source.
    fn create(&self, entity: &E) -> impl Future<Output = DbResult<E>> + Send;

    /// Get all records matching an optional filter.
    fn find(&self, filter: Option<&Filter>) -> impl Future<Output = DbResult<Vec<E>>> + Send;

    /// Count records matching an optional predicate.
    fn count(&self, predicate: Option<&Where>) -> impl Future<Output = DbResult<Count>> + Send;

    /// Apply a partial update to every record matching an optional predicate.
    fn update_all(
        &self,
        patch: &Patch<E>,
        predicate: Option<&Where>,
    ) -> impl Future<Output = DbResult<Count>> + Send;

    /// Get a record by id.
    fn find_by_id(
        &self,
        id: i64,
        filter: Option<&FilterExcludingWhere>,
    ) -> impl Future<Output = DbResult<E>> + Send;

    /// Merge a partial update into an existing record.
    fn update_by_id(&self, id: i64, patch: &Patch<E>) -> impl Future<Output = DbResult<()>> + Send;

    /// Overwrite every attribute of an existing record.
    fn replace_by_id(&self, id: i64, entity: &E) -> impl Future<Output = DbResult<()>> + Send;

    /// Delete a record by id.
    fn delete_by_id(&self, id: i64) -> impl Future<Output = DbResult<()>> + Send;
}

/// Combined database interface.
///
/// Repositories are exposed through associated types, avoiding dynamic dispatch.
pub trait Database: Send + Sync {
    type Teachers<'a>: CrudRepository<Teacher> + Send + Sync
    where
        Self: 'a;
    type Todos<'a>: CrudRepository<Todo> + Send + Sync
    where
        Self: 'a;

    /// Run pending migrations.
    fn migrate(&self) -> impl Future<Output = DbResult<()>> + Send;

    /// Get the teacher repository.
    fn teachers(&self) -> Self::Teachers<'_>;

    /// Get the todo repository.
    fn todos(&self) -> Self::Todos<'_>;
}
