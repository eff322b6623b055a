//! Domain models for the classroom database.
//!
//! Models are passive records. Each one implements [`Entity`], which declares
//! the attribute names, primitive types and column mapping that the generic
//! repository uses for SQL generation, filter validation and row decoding.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::db::{DbError, DbResult};

// =============================================================================
// Model Declarations
// =============================================================================

/// Primitive type of a model attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    Integer,
    Text,
    Boolean,
}

impl PropertyType {
    fn name(self) -> &'static str {
        match self {
            PropertyType::Integer => "number",
            PropertyType::Text => "string",
            PropertyType::Boolean => "boolean",
        }
    }

    /// Whether `value` is an acceptable non-null value for this type.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            PropertyType::Integer => value.as_i64().is_some(),
            PropertyType::Text => value.is_string(),
            PropertyType::Boolean => value.is_boolean(),
        }
    }
}

/// One declared attribute of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Property {
    /// JSON property name.
    pub name: &'static str,
    /// SQL column name.
    pub column: &'static str,
    pub kind: PropertyType,
    /// Marks the unique identifier.
    pub id: bool,
}

impl Property {
    pub const fn id(name: &'static str, column: &'static str) -> Self {
        Self {
            name,
            column,
            kind: PropertyType::Integer,
            id: true,
        }
    }

    pub const fn new(name: &'static str, column: &'static str, kind: PropertyType) -> Self {
        Self {
            name,
            column,
            kind,
            id: false,
        }
    }

    /// Check a JSON value against the declared type. `null` is allowed for
    /// every attribute except the identifier.
    pub fn check(&self, entity: &str, value: &Value) -> DbResult<()> {
        if value.is_null() && !self.id {
            return Ok(());
        }
        if self.kind.accepts(value) {
            return Ok(());
        }
        Err(DbError::validation(format!(
            "{}.{} must be a {}, got {}",
            entity,
            self.name,
            self.kind.name(),
            value
        )))
    }
}

/// A record type stored through the generic repository.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    /// Model name used in error messages.
    const NAME: &'static str;
    const TABLE: &'static str;
    const PROPERTIES: &'static [Property];
    /// Whether the data source assigns the identifier on insert.
    const ID_GENERATED: bool;
    /// Navigational relations that may be requested through `include`.
    const RELATIONS: &'static [&'static str];

    fn id(&self) -> Option<i64>;

    /// Look up an attribute by its JSON name.
    fn property(name: &str) -> Option<&'static Property> {
        Self::PROPERTIES.iter().find(|p| p.name == name)
    }

    /// The identifier attribute.
    fn id_property() -> &'static Property {
        Self::PROPERTIES
            .iter()
            .find(|p| p.id)
            .unwrap_or(&Self::PROPERTIES[0])
    }

    /// Attribute names joined for help messages.
    fn property_names() -> String {
        Self::PROPERTIES
            .iter()
            .map(|p| p.name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Serialize into a JSON object keyed by property name.
    fn to_record(&self) -> DbResult<Map<String, Value>> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(DbError::Database {
                message: format!("{} serialized to non-object: {}", Self::NAME, other),
            }),
            Err(e) => Err(DbError::Database {
                message: e.to_string(),
            }),
        }
    }

    /// Build from a JSON object keyed by property name.
    fn from_record(record: Map<String, Value>) -> DbResult<Self> {
        serde_json::from_value(Value::Object(record)).map_err(|e| DbError::Database {
            message: format!("Failed to decode {}: {}", Self::NAME, e),
        })
    }
}

// =============================================================================
// Records
// =============================================================================

/// A teacher. The identifier is assigned by the data source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Teacher {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
}

impl Entity for Teacher {
    const NAME: &'static str = "Teacher";
    const TABLE: &'static str = "teacher";
    const PROPERTIES: &'static [Property] = &[
        Property::id("id", "id"),
        Property::new("name", "name", PropertyType::Text),
        Property::new("email", "email", PropertyType::Text),
        Property::new("subject", "subject", PropertyType::Text),
    ];
    const ID_GENERATED: bool = true;
    const RELATIONS: &'static [&'static str] = &[];

    fn id(&self) -> Option<i64> {
        self.id
    }
}

/// A todo item. The caller supplies the identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Todo {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub desc: Option<String>,
    pub is_complete: Option<bool>,
}

impl Entity for Todo {
    const NAME: &'static str = "Todo";
    const TABLE: &'static str = "todo";
    const PROPERTIES: &'static [Property] = &[
        Property::id("id", "id"),
        Property::new("title", "title", PropertyType::Text),
        Property::new("desc", "description", PropertyType::Text),
        Property::new("isComplete", "is_complete", PropertyType::Boolean),
    ];
    const ID_GENERATED: bool = false;
    const RELATIONS: &'static [&'static str] = &[];

    fn id(&self) -> Option<i64> {
        self.id
    }
}

// =============================================================================
// Operation Payloads
// =============================================================================

/// A validated partial attribute payload for one model.
///
/// Keys are JSON property names; an explicit `null` clears the attribute.
#[derive(Debug)]
pub struct Patch<E> {
    values: Map<String, Value>,
    _entity: PhantomData<E>,
}

impl<E> Clone for Patch<E> {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Patch<E> {
    /// Validate a JSON object against the model declaration.
    pub fn from_json(values: Map<String, Value>) -> DbResult<Self> {
        for (key, value) in &values {
            let property = E::property(key).ok_or_else(|| {
                DbError::validation(format!("Unknown property '{}' for {}", key, E::NAME))
            })?;
            property.check(E::NAME, value)?;
        }
        Ok(Self {
            values,
            _entity: PhantomData,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Identifier carried in the payload, if any.
    pub fn id(&self) -> Option<i64> {
        self.values
            .get(E::id_property().name)
            .and_then(Value::as_i64)
    }

    /// Drop the identifier from the payload.
    pub fn without_id(mut self) -> Self {
        self.values.remove(E::id_property().name);
        self
    }

    /// Declared properties paired with their new values, in declaration order.
    pub(crate) fn assignments(&self) -> impl Iterator<Item = (&'static Property, &Value)> {
        E::PROPERTIES
            .iter()
            .filter_map(|p| self.values.get(p.name).map(|v| (p, v)))
    }
}

/// Number of records matched by a count or bulk update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Count {
    pub count: u64,
}
