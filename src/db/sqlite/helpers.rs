//! Shared helper functions for SQLite repositories.

use serde_json::{Map, Value};
use sqlx::error::ErrorKind;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite};

use crate::db::filter::unknown_property;
use crate::db::{DbError, DbResult, Entity, OrderBy, Patch, Property, PropertyType, SortOrder, Where};

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Text(String),
    Boolean(bool),
}

/// Convert a JSON value for a column of the given type.
/// Returns None when the value does not fit the type.
pub fn sql_value(kind: PropertyType, value: &Value) -> Option<SqlValue> {
    if value.is_null() {
        return Some(SqlValue::Null);
    }
    match kind {
        PropertyType::Integer => value.as_i64().map(SqlValue::Integer),
        PropertyType::Text => value.as_str().map(|s| SqlValue::Text(s.to_string())),
        PropertyType::Boolean => value.as_bool().map(SqlValue::Boolean),
    }
}

/// Bind values to placeholders in order.
pub fn bind_values<'q>(mut query: SqliteQuery<'q>, values: &[SqlValue]) -> SqliteQuery<'q> {
    for value in values {
        query = match value {
            SqlValue::Null => query.bind(None::<i64>),
            SqlValue::Integer(i) => query.bind(*i),
            SqlValue::Text(s) => query.bind(s.clone()),
            SqlValue::Boolean(b) => query.bind(*b),
        };
    }
    query
}

/// Comma-separated column list for SELECT.
pub fn select_columns<E: Entity>() -> String {
    E::PROPERTIES
        .iter()
        .map(|p| p.column)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Decode a row selected with [`select_columns`] into a model.
pub fn decode_row<E: Entity>(row: &SqliteRow) -> DbResult<E> {
    let mut record = Map::new();
    for property in E::PROPERTIES {
        let value = match property.kind {
            PropertyType::Integer => row
                .try_get::<Option<i64>, _>(property.column)
                .map(|v| v.map(Value::from)),
            PropertyType::Text => row
                .try_get::<Option<String>, _>(property.column)
                .map(|v| v.map(Value::from)),
            PropertyType::Boolean => row
                .try_get::<Option<bool>, _>(property.column)
                .map(|v| v.map(Value::from)),
        }
        .map_err(|e| DbError::Database {
            message: e.to_string(),
        })?;
        record.insert(property.name.to_string(), value.unwrap_or(Value::Null));
    }
    E::from_record(record)
}

/// Map a driver error to a storage-agnostic one.
pub fn map_sqlx_error(entity_type: &str, id: Option<i64>, e: sqlx::Error) -> DbError {
    match &e {
        sqlx::Error::Database(db) => match db.kind() {
            ErrorKind::UniqueViolation => DbError::AlreadyExists {
                entity_type: entity_type.to_string(),
                id: id.map(|i| i.to_string()).unwrap_or_default(),
            },
            ErrorKind::ForeignKeyViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation => DbError::Constraint {
                message: db.message().to_string(),
            },
            _ => DbError::Database {
                message: e.to_string(),
            },
        },
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            DbError::Connection {
                message: e.to_string(),
            }
        }
        _ => DbError::Database {
            message: e.to_string(),
        },
    }
}

/// Build `SET col = ?, ...` from a validated patch.
pub fn build_set_clause<E: Entity>(patch: &Patch<E>) -> DbResult<(String, Vec<SqlValue>)> {
    let mut assignments = Vec::new();
    let mut values = Vec::new();
    for (property, value) in patch.assignments() {
        let bound = sql_value(property.kind, value).ok_or_else(|| {
            DbError::validation(format!("Invalid value for {}.{}", E::NAME, property.name))
        })?;
        assignments.push(format!("{} = ?", property.column));
        values.push(bound);
    }
    Ok((assignments.join(", "), values))
}

/// Build a `WHERE ...` clause from an optional predicate.
/// Returns an empty string when there is nothing to filter on.
pub fn build_where_clause<E: Entity>(
    predicate: Option<&Where>,
) -> DbResult<(String, Vec<SqlValue>)> {
    let mut values = Vec::new();
    let sql = match predicate {
        Some(w) if !w.is_empty() => format!("WHERE {}", condition::<E>(&w.0, &mut values)?),
        _ => String::new(),
    };
    Ok((sql, values))
}

fn condition<E: Entity>(map: &Map<String, Value>, values: &mut Vec<SqlValue>) -> DbResult<String> {
    let mut parts = Vec::new();

    for (key, value) in map {
        match key.as_str() {
            "and" | "or" => {
                let items = value.as_array().ok_or_else(|| {
                    DbError::invalid(
                        format!("'{}' expects an array of conditions", key),
                        r#"Example: {"or": [{"id": 1}, {"id": 2}]}"#,
                    )
                })?;
                let mut nested = Vec::new();
                for item in items {
                    let obj = item.as_object().ok_or_else(|| {
                        DbError::invalid(
                            format!("'{}' entries must be objects", key),
                            r#"Example: {"and": [{"title": "a"}]}"#,
                        )
                    })?;
                    if !obj.is_empty() {
                        nested.push(format!("({})", condition::<E>(obj, values)?));
                    }
                }
                if !nested.is_empty() {
                    let joiner = if key == "and" { " AND " } else { " OR " };
                    parts.push(format!("({})", nested.join(joiner)));
                }
            }
            name => {
                let property =
                    E::property(name).ok_or_else(|| unknown_property::<E>("where", name))?;
                parts.push(comparison::<E>(property, value, values)?);
            }
        }
    }

    if parts.is_empty() {
        Ok("1 = 1".to_string())
    } else {
        Ok(parts.join(" AND "))
    }
}

fn comparison<E: Entity>(
    property: &Property,
    value: &Value,
    values: &mut Vec<SqlValue>,
) -> DbResult<String> {
    match value {
        Value::Object(ops) => {
            if ops.is_empty() {
                return Err(DbError::invalid(
                    format!("Empty condition for '{}'", property.name),
                    r#"Example: {"id": {"gt": 10}}"#,
                ));
            }
            let parts = ops
                .iter()
                .map(|(op, operand)| operator::<E>(property, op, operand, values))
                .collect::<DbResult<Vec<_>>>()?;
            Ok(parts.join(" AND "))
        }
        other => operator::<E>(property, "eq", other, values),
    }
}

fn operator<E: Entity>(
    property: &Property,
    op: &str,
    operand: &Value,
    values: &mut Vec<SqlValue>,
) -> DbResult<String> {
    let column = property.column;

    let sql = match op {
        "eq" if operand.is_null() => format!("{} IS NULL", column),
        "neq" if operand.is_null() => format!("{} IS NOT NULL", column),
        "eq" | "neq" | "gt" | "gte" | "lt" | "lte" => {
            let symbol = match op {
                "eq" => "=",
                "neq" => "!=",
                "gt" => ">",
                "gte" => ">=",
                "lt" => "<",
                _ => "<=",
            };
            values.push(operand_value::<E>(property, operand)?);
            format!("{} {} ?", column, symbol)
        }
        "inq" | "nin" => {
            let items = operand
                .as_array()
                .ok_or_else(|| array_expected::<E>(property, op))?;
            if items.is_empty() {
                // Nothing is in an empty set.
                return Ok(if op == "inq" { "0 = 1" } else { "1 = 1" }.to_string());
            }
            for item in items {
                values.push(operand_value::<E>(property, item)?);
            }
            let placeholders = vec!["?"; items.len()].join(", ");
            let keyword = if op == "inq" { "IN" } else { "NOT IN" };
            format!("{} {} ({})", column, keyword, placeholders)
        }
        "between" => {
            let bounds = operand
                .as_array()
                .filter(|a| a.len() == 2)
                .ok_or_else(|| {
                    DbError::invalid(
                        format!("'between' on '{}' expects two values", property.name),
                        r#"Example: {"id": {"between": [1, 10]}}"#,
                    )
                })?;
            values.push(operand_value::<E>(property, &bounds[0])?);
            values.push(operand_value::<E>(property, &bounds[1])?);
            format!("{} BETWEEN ? AND ?", column)
        }
        "like" | "nlike" | "ilike" | "nilike" => {
            let pattern = operand.as_str().ok_or_else(|| {
                DbError::invalid(
                    format!("'{}' on '{}' expects a string pattern", op, property.name),
                    r#"Example: {"title": {"like": "%milk%"}}"#,
                )
            })?;
            values.push(SqlValue::Text(pattern.to_string()));
            match op {
                "like" => format!("{} LIKE ?", column),
                "nlike" => format!("{} NOT LIKE ?", column),
                "ilike" => format!("LOWER({}) LIKE LOWER(?)", column),
                _ => format!("LOWER({}) NOT LIKE LOWER(?)", column),
            }
        }
        "exists" => match operand.as_bool() {
            Some(true) => format!("{} IS NOT NULL", column),
            Some(false) => format!("{} IS NULL", column),
            None => {
                return Err(DbError::invalid(
                    format!("'exists' on '{}' expects a boolean", property.name),
                    r#"Example: {"desc": {"exists": true}}"#,
                ));
            }
        },
        other => {
            return Err(DbError::invalid(
                format!("Unknown operator '{}' for '{}'", other, property.name),
                "Supported: eq, neq, gt, gte, lt, lte, inq, nin, between, like, nlike, ilike, nilike, exists",
            ));
        }
    };

    Ok(sql)
}

fn operand_value<E: Entity>(property: &Property, operand: &Value) -> DbResult<SqlValue> {
    sql_value(property.kind, operand).ok_or_else(|| {
        DbError::invalid(
            format!(
                "Invalid value {} for {}.{} in where",
                operand,
                E::NAME,
                property.name
            ),
            format!("'{}' holds {:?} values", property.name, property.kind),
        )
    })
}

fn array_expected<E: Entity>(property: &Property, op: &str) -> DbError {
    DbError::invalid(
        format!("'{}' on {}.{} expects an array", op, E::NAME, property.name),
        r#"Example: {"id": {"inq": [1, 2, 3]}}"#,
    )
}

/// Build ORDER BY clause. Falls back to the id column ascending.
pub fn build_order_clause<E: Entity>(order: &[OrderBy]) -> String {
    if order.is_empty() {
        return format!("ORDER BY {} ASC", E::id_property().column);
    }

    let terms = order
        .iter()
        .map(|o| {
            let direction = match o.direction {
                SortOrder::Asc => "ASC",
                SortOrder::Desc => "DESC",
            };
            format!("{} {}", o.property.column, direction)
        })
        .collect::<Vec<_>>();

    format!("ORDER BY {}", terms.join(", "))
}

/// Build LIMIT/OFFSET clause. A limit of 0 means no limit.
/// Note: SQL requires LIMIT when using OFFSET. If skip is provided without limit,
/// we use LIMIT -1 (SQLite's "no limit" value).
pub fn build_limit_offset_clause(limit: Option<u64>, skip: Option<u64>) -> String {
    let mut clause = String::new();

    let limit = limit.filter(|l| *l > 0);
    let offset = skip.filter(|s| *s > 0);

    if let Some(limit) = limit {
        clause.push_str(&format!(" LIMIT {}", limit));
    } else if offset.is_some() {
        clause.push_str(" LIMIT -1");
    }

    if let Some(offset) = offset {
        clause.push_str(&format!(" OFFSET {}", offset));
    }

    clause
}
