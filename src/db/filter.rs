//! Structured query descriptions passed to read and update operations.
//!
//! The JSON shape follows the LoopBack query language:
//!
//! ```json
//! {
//!   "where": {"isComplete": false, "title": {"like": "%milk%"}},
//!   "fields": {"id": true, "title": true},
//!   "order": ["title ASC", "id DESC"],
//!   "limit": 10,
//!   "skip": 20
//! }
//! ```
//!
//! Values here are only parsed. Property names are checked against the model
//! with [`Filter::validate`]; predicates are checked when they are translated
//! to SQL.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::db::{DbError, DbResult, Entity, Property};

/// A boolean condition over model attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Where(pub Map<String, Value>);

impl Where {
    /// Parse a where object from its JSON text form (the `?where=` query value).
    pub fn parse(json: &str) -> DbResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            DbError::invalid(
                format!("Invalid where clause: {}", e),
                r#"Expected a JSON object such as {"title": "Buy milk"}"#,
            )
        })
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Value> for Where {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Where(map),
            _ => Where::default(),
        }
    }
}

/// Sort direction for an `order` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// A validated `order` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub property: &'static Property,
    pub direction: SortOrder,
}

/// Field selection: `{"title": true}` or `["title"]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Fields {
    List(Vec<String>),
    Flags(BTreeMap<String, bool>),
}

/// Property names kept in a response after field selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection(Vec<&'static str>);

impl Selection {
    pub fn names(&self) -> &[&'static str] {
        &self.0
    }

    /// Remove every key that is not selected from a serialized record.
    pub fn apply(&self, record: Value) -> Value {
        match record {
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .filter(|(k, _)| self.0.contains(&k.as_str()))
                    .collect(),
            ),
            other => other,
        }
    }
}

impl Fields {
    /// Resolve against a model, keeping declaration order.
    ///
    /// With the flag form, any `true` switches to include-only mode;
    /// otherwise the `false` entries are excluded.
    pub fn selection<E: Entity>(&self) -> DbResult<Selection> {
        let named: Vec<(&str, bool)> = match self {
            Fields::List(names) => names.iter().map(|n| (n.as_str(), true)).collect(),
            Fields::Flags(flags) => flags.iter().map(|(n, f)| (n.as_str(), *f)).collect(),
        };

        for (name, _) in &named {
            if E::property(name).is_none() {
                return Err(unknown_property::<E>("fields", name));
            }
        }

        let include_only = named.iter().any(|(_, flag)| *flag);
        let selected = E::PROPERTIES
            .iter()
            .map(|p| p.name)
            .filter(|name| {
                let flag = named.iter().find(|(n, _)| n == name).map(|(_, f)| *f);
                if include_only {
                    flag == Some(true)
                } else {
                    flag != Some(false)
                }
            })
            .collect();

        Ok(Selection(selected))
    }
}

/// Relation inclusion: `"posts"` or `{"relation": "posts", "scope": {...}}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Include {
    Relation(String),
    Scoped {
        relation: String,
        #[serde(default)]
        scope: Option<Value>,
    },
}

impl Include {
    pub fn relation(&self) -> &str {
        match self {
            Include::Relation(name) => name,
            Include::Scoped { relation, .. } => relation,
        }
    }
}

/// Query for `find`: predicate, field selection, ordering, pagination and
/// relation inclusion.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Filter {
    #[serde(default)]
    pub r#where: Option<Where>,
    #[serde(default)]
    pub fields: Option<Fields>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub order: Vec<String>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default, alias = "offset")]
    pub skip: Option<u64>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub include: Vec<Include>,
}

impl Filter {
    /// Parse a filter from its JSON text form (the `?filter=` query value).
    pub fn parse(json: &str) -> DbResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            DbError::invalid(
                format!("Invalid filter: {}", e),
                "Supported keys: where, fields, order, limit, skip, offset, include",
            )
        })
    }

    pub fn with_where(mut self, predicate: Where) -> Self {
        self.r#where = Some(predicate);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn with_order(mut self, order: &str) -> Self {
        self.order.push(order.to_string());
        self
    }

    /// Check paging, fields, order and include against the model.
    pub fn validate<E: Entity>(&self) -> DbResult<()> {
        check_page("limit", self.limit)?;
        check_page("skip", self.skip)?;
        if let Some(fields) = &self.fields {
            fields.selection::<E>()?;
        }
        self.order_by::<E>()?;
        check_includes::<E>(&self.include)
    }

    /// Parse `order` entries of the form `"prop"`, `"prop ASC"` or `"prop DESC"`.
    pub fn order_by<E: Entity>(&self) -> DbResult<Vec<OrderBy>> {
        self.order
            .iter()
            .map(|entry| {
                let mut parts = entry.split_whitespace();
                let name = parts.next().unwrap_or_default();
                let direction = match parts.next().map(str::to_ascii_uppercase).as_deref() {
                    None | Some("ASC") => SortOrder::Asc,
                    Some("DESC") => SortOrder::Desc,
                    Some(other) => {
                        return Err(DbError::invalid(
                            format!("Invalid sort direction '{}' in order '{}'", other, entry),
                            "Use ASC or DESC",
                        ));
                    }
                };
                if parts.next().is_some() {
                    return Err(DbError::invalid(
                        format!("Invalid order '{}'", entry),
                        "Expected \"<property> [ASC|DESC]\"",
                    ));
                }
                let property =
                    E::property(name).ok_or_else(|| unknown_property::<E>("order", name))?;
                Ok(OrderBy {
                    property,
                    direction,
                })
            })
            .collect()
    }
}

/// Filter for single-record reads; a predicate is not accepted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterExcludingWhere {
    #[serde(default)]
    pub fields: Option<Fields>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub include: Vec<Include>,
}

impl FilterExcludingWhere {
    pub fn parse(json: &str) -> DbResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            DbError::invalid(
                format!("Invalid filter: {}", e),
                "Supported keys: fields, include",
            )
        })
    }

    pub fn validate<E: Entity>(&self) -> DbResult<()> {
        if let Some(fields) = &self.fields {
            fields.selection::<E>()?;
        }
        check_includes::<E>(&self.include)
    }
}

/// SQLite integers are signed 64-bit.
fn check_page(key: &str, value: Option<u64>) -> DbResult<()> {
    match value {
        Some(v) if v > i64::MAX as u64 => Err(DbError::invalid(
            format!("Invalid {} {}: exceeds {}", key, v, i64::MAX),
            format!("'{}' must be between 0 and {}", key, i64::MAX),
        )),
        _ => Ok(()),
    }
}

fn check_includes<E: Entity>(include: &[Include]) -> DbResult<()> {
    for item in include {
        let relation = item.relation();
        if !E::RELATIONS.contains(&relation) {
            return Err(DbError::invalid(
                format!("Relation '{}' is not defined for {} model", relation, E::NAME),
                if E::RELATIONS.is_empty() {
                    format!("{} declares no relations", E::NAME)
                } else {
                    format!("Known relations: {}", E::RELATIONS.join(", "))
                },
            ));
        }
    }
    Ok(())
}

pub(crate) fn unknown_property<E: Entity>(context: &str, name: &str) -> DbError {
    DbError::invalid(
        format!("Unknown property '{}' in {} for {}", name, context, E::NAME),
        format!("Use one of: {}", E::property_names()),
    )
}

/// Accept either a single value or an array of values.
fn one_or_many<'de, T, D>(de: D) -> Result<Vec<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match Option::<OneOrMany<T>>::deserialize(de)? {
        None => Vec::new(),
        Some(OneOrMany::Many(items)) => items,
        Some(OneOrMany::One(item)) => vec![item],
    })
}
