//! Generic SQLx-backed CRUD repository.
//!
//! One implementation serves every model; the per-model repositories are
//! type aliases and add no behaviour of their own.

use std::marker::PhantomData;

use serde_json::Value;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::helpers::{
    SqlValue, bind_values, build_limit_offset_clause, build_order_clause, build_set_clause,
    build_where_clause, decode_row, map_sqlx_error, select_columns, sql_value,
};
use crate::db::{
    Count, CrudRepository, DbError, DbResult, Entity, Filter, FilterExcludingWhere, Patch,
    Teacher, Todo, Where,
};

/// SQLx-backed repository for any model.
pub struct SqliteCrudRepository<'a, E> {
    pub(crate) pool: &'a SqlitePool,
    _entity: PhantomData<E>,
}

/// SQLx-backed teacher repository.
pub type SqliteTeacherRepository<'a> = SqliteCrudRepository<'a, Teacher>;

/// SQLx-backed todo repository.
pub type SqliteTodoRepository<'a> = SqliteCrudRepository<'a, Todo>;

impl<'a, E: Entity> SqliteCrudRepository<'a, E> {
    pub(crate) fn new(pool: &'a SqlitePool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    async fn exists(&self, id: i64) -> DbResult<bool> {
        let sql = format!(
            "SELECT 1 FROM {} WHERE {} = ?",
            E::TABLE,
            E::id_property().column
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| map_sqlx_error(E::NAME, Some(id), e))?;
        Ok(row.is_some())
    }

    /// Column values for every non-id property, null where absent.
    fn attribute_values(entity: &E) -> DbResult<Vec<(&'static str, SqlValue)>> {
        let record = entity.to_record()?;
        E::PROPERTIES
            .iter()
            .filter(|p| !p.id)
            .map(|p| {
                let value = record.get(p.name).unwrap_or(&Value::Null);
                p.check(E::NAME, value)?;
                let bound = sql_value(p.kind, value).unwrap_or(SqlValue::Null);
                Ok((p.column, bound))
            })
            .collect()
    }
}

impl<'a, E: Entity> CrudRepository<E> for SqliteCrudRepository<'a, E> {
    async fn create(&self, entity: &E) -> DbResult<E> {
        let id = entity.id();
        if id.is_none() && !E::ID_GENERATED {
            return Err(DbError::validation(format!(
                "{}.{} is required",
                E::NAME,
                E::id_property().name
            )));
        }

        let mut columns = Vec::new();
        let mut values = Vec::new();
        if let Some(id) = id {
            columns.push(E::id_property().column);
            values.push(SqlValue::Integer(id));
        }
        for (column, value) in Self::attribute_values(entity)? {
            columns.push(column);
            values.push(value);
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            E::TABLE,
            columns.join(", "),
            vec!["?"; columns.len()].join(", ")
        );

        let result = bind_values(sqlx::query(&sql), &values)
            .execute(self.pool)
            .await
            .map_err(|e| map_sqlx_error(E::NAME, id, e))?;

        let id = id.unwrap_or_else(|| result.last_insert_rowid());
        debug!(entity = E::NAME, id, "created");

        self.find_by_id(id, None).await
    }

    async fn find(&self, filter: Option<&Filter>) -> DbResult<Vec<E>> {
        let default_filter = Filter::default();
        let filter = filter.unwrap_or(&default_filter);
        filter.validate::<E>()?;

        let (where_clause, values) = build_where_clause::<E>(filter.r#where.as_ref())?;
        let order_clause = build_order_clause::<E>(&filter.order_by::<E>()?);
        let limit_clause = build_limit_offset_clause(filter.limit, filter.skip);

        let sql = format!(
            "SELECT {} FROM {} {} {}{}",
            select_columns::<E>(),
            E::TABLE,
            where_clause,
            order_clause,
            limit_clause
        );

        let rows = bind_values(sqlx::query(&sql), &values)
            .fetch_all(self.pool)
            .await
            .map_err(|e| map_sqlx_error(E::NAME, None, e))?;

        rows.iter().map(decode_row::<E>).collect()
    }

    async fn count(&self, predicate: Option<&Where>) -> DbResult<Count> {
        let (where_clause, values) = build_where_clause::<E>(predicate)?;
        let sql = format!("SELECT COUNT(*) FROM {} {}", E::TABLE, where_clause);

        let row = bind_values(sqlx::query(&sql), &values)
            .fetch_one(self.pool)
            .await
            .map_err(|e| map_sqlx_error(E::NAME, None, e))?;

        let total: i64 = row.try_get(0).map_err(|e| DbError::Database {
            message: e.to_string(),
        })?;

        Ok(Count {
            count: total as u64,
        })
    }

    async fn update_all(&self, patch: &Patch<E>, predicate: Option<&Where>) -> DbResult<Count> {
        if patch.contains(E::id_property().name) {
            return Err(DbError::validation(format!(
                "{}.{} cannot be updated in bulk",
                E::NAME,
                E::id_property().name
            )));
        }
        if patch.is_empty() {
            return self.count(predicate).await;
        }

        let (set_clause, mut values) = build_set_clause(patch)?;
        let (where_clause, where_values) = build_where_clause::<E>(predicate)?;
        values.extend(where_values);

        let sql = format!("UPDATE {} SET {} {}", E::TABLE, set_clause, where_clause);

        let result = bind_values(sqlx::query(&sql), &values)
            .execute(self.pool)
            .await
            .map_err(|e| map_sqlx_error(E::NAME, None, e))?;

        debug!(entity = E::NAME, rows = result.rows_affected(), "bulk updated");

        Ok(Count {
            count: result.rows_affected(),
        })
    }

    async fn find_by_id(&self, id: i64, filter: Option<&FilterExcludingWhere>) -> DbResult<E> {
        if let Some(filter) = filter {
            filter.validate::<E>()?;
        }

        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?",
            select_columns::<E>(),
            E::TABLE,
            E::id_property().column
        );

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| map_sqlx_error(E::NAME, Some(id), e))?;

        let row = row.ok_or_else(|| DbError::not_found(E::NAME, id))?;
        decode_row::<E>(&row)
    }

    async fn update_by_id(&self, id: i64, patch: &Patch<E>) -> DbResult<()> {
        if let Some(patch_id) = patch.id()
            && patch_id != id
        {
            return Err(DbError::validation(format!(
                "{}.{} cannot be changed from {} to {}",
                E::NAME,
                E::id_property().name,
                id,
                patch_id
            )));
        }

        let patch = patch.clone().without_id();
        if patch.is_empty() {
            return if self.exists(id).await? {
                Ok(())
            } else {
                Err(DbError::not_found(E::NAME, id))
            };
        }

        let (set_clause, mut values) = build_set_clause(&patch)?;
        values.push(SqlValue::Integer(id));

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            E::TABLE,
            set_clause,
            E::id_property().column
        );

        let result = bind_values(sqlx::query(&sql), &values)
            .execute(self.pool)
            .await
            .map_err(|e| map_sqlx_error(E::NAME, Some(id), e))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(E::NAME, id));
        }

        debug!(entity = E::NAME, id, "updated");
        Ok(())
    }

    async fn replace_by_id(&self, id: i64, entity: &E) -> DbResult<()> {
        if let Some(body_id) = entity.id()
            && body_id != id
        {
            return Err(DbError::validation(format!(
                "{}.{} cannot be changed from {} to {}",
                E::NAME,
                E::id_property().name,
                id,
                body_id
            )));
        }

        let attributes = Self::attribute_values(entity)?;
        let assignments = attributes
            .iter()
            .map(|(column, _)| format!("{} = ?", column))
            .collect::<Vec<_>>()
            .join(", ");
        let mut values: Vec<SqlValue> = attributes.into_iter().map(|(_, v)| v).collect();
        values.push(SqlValue::Integer(id));

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            E::TABLE,
            assignments,
            E::id_property().column
        );

        let result = bind_values(sqlx::query(&sql), &values)
            .execute(self.pool)
            .await
            .map_err(|e| map_sqlx_error(E::NAME, Some(id), e))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(E::NAME, id));
        }

        debug!(entity = E::NAME, id, "replaced");
        Ok(())
    }

    async fn delete_by_id(&self, id: i64) -> DbResult<()> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            E::TABLE,
            E::id_property().column
        );

        let result = sqlx::query(&sql)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| map_sqlx_error(E::NAME, Some(id), e))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(E::NAME, id));
        }

        debug!(entity = E::NAME, id, "deleted");
        Ok(())
    }
}
