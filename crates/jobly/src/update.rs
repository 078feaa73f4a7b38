//! Partial-update SET clause builder.
//!
//! Turns an arbitrary subset of an entity's public fields into a
//! `"col"=$1, "col2"=$2` fragment. The builder knows nothing about the table
//! or its identity column; callers append `WHERE <identity> = $n` using
//! [`Fragment::next_index`].
//!
//! ```ignore
//! use jobly::update::{FieldMap, UpdatePayload, build_set_clause};
//!
//! const FIELDS: FieldMap = FieldMap::new(&[("numEmployees", "num_employees")]);
//!
//! let payload = UpdatePayload::new().with("numEmployees", 5).with("name", "X");
//! let set = build_set_clause(payload, &FIELDS)?;
//! assert_eq!(set.sql(), r#""num_employees"=$1, "name"=$2"#);
//! ```

use crate::error::{JoblyError, JoblyResult};
use crate::fragment::{Fragment, Placeholders};
use crate::ident::Ident;
use crate::value::Value;
use indexmap::IndexMap;

/// Public field name → store column name.
///
/// Fields missing from the map pass through unchanged.
#[derive(Debug, Clone, Copy)]
pub struct FieldMap(&'static [(&'static str, &'static str)]);

impl FieldMap {
    pub const EMPTY: FieldMap = FieldMap(&[]);

    pub const fn new(pairs: &'static [(&'static str, &'static str)]) -> Self {
        Self(pairs)
    }

    /// Resolve a public field name to its column.
    pub fn resolve<'a>(&self, field: &'a str) -> &'a str {
        self.0
            .iter()
            .find(|(public, _)| *public == field)
            .map_or(field, |(_, column)| *column)
    }
}

/// New values for a subset of an entity's fields.
///
/// Iteration order is insertion order, which fixes placeholder order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdatePayload {
    fields: IndexMap<String, Value>,
}

impl UpdatePayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a payload from a JSON object body.
    pub fn from_json(body: serde_json::Map<String, serde_json::Value>) -> JoblyResult<Self> {
        let fields = body
            .into_iter()
            .map(|(field, json)| {
                let value = Value::from_json(&field, json)?;
                Ok((field, value))
            })
            .collect::<JoblyResult<IndexMap<_, _>>>()?;
        Ok(Self { fields })
    }

    /// Set a field (consuming version).
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Set a field. Replacing an existing field keeps its position.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields.get_mut(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Build a SET fragment numbered from `$1`.
pub fn build_set_clause(payload: UpdatePayload, field_map: &FieldMap) -> JoblyResult<Fragment> {
    build_set_clause_from(payload, field_map, 1)
}

/// Build a SET fragment numbered from `$first_index`.
///
/// Fails with `Validation("no data")` when the payload is empty.
pub fn build_set_clause_from(
    payload: UpdatePayload,
    field_map: &FieldMap,
    first_index: usize,
) -> JoblyResult<Fragment> {
    if payload.is_empty() {
        return Err(JoblyError::validation("no data"));
    }

    let mut placeholders = Placeholders::starting_at(first_index);
    let mut sql = String::new();
    let mut values = Vec::with_capacity(payload.len());

    for (i, (field, value)) in payload.fields.into_iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        Ident::quoted(field_map.resolve(&field))?.write_sql(&mut sql);
        sql.push('=');
        placeholders.push_next(&mut sql);
        values.push(value);
    }

    Ok(Fragment::new(sql, values, first_index))
}
