//! Entity repositories.
//!
//! Every operation is a single statement run on any [`GenericClient`], so a
//! caller may pass a pooled connection or an open transaction.
//!
//! [`GenericClient`]: crate::GenericClient

mod company;
mod job;
mod user;

pub use company::{Company, CompanyDetail};
pub use job::{Job, JobDetail, JobSummary, NewJob};
pub use user::{NewUser, User, UserDetail};

use crate::error::{JoblyError, JoblyResult};
use crate::update::UpdatePayload;
use crate::value::Value;

/// Shape a public field accepts in an update payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    OptionalText,
    /// An INTEGER column: `i32` range, or null.
    OptionalInt,
    /// Integer or float, or null.
    OptionalNumber,
}

impl FieldKind {
    fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (FieldKind::Text | FieldKind::OptionalText, Value::Text(_)) => true,
            (FieldKind::OptionalInt, Value::Int(i)) => i32::try_from(*i).is_ok(),
            (FieldKind::OptionalNumber, Value::Int(_) | Value::Float(_)) => true,
            (
                FieldKind::OptionalText | FieldKind::OptionalInt | FieldKind::OptionalNumber,
                Value::Null,
            ) => true,
            _ => false,
        }
    }
}

/// A field that may be targeted by a partial update.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub kind: FieldKind,
}

impl FieldRule {
    pub const fn new(field: &'static str, kind: FieldKind) -> Self {
        Self { field, kind }
    }
}

/// Reject fields that are not updatable (identities included) and values of the wrong shape.
pub(crate) fn check_payload(
    payload: &UpdatePayload,
    rules: &[FieldRule],
    entity: &str,
) -> JoblyResult<()> {
    for (field, value) in payload.iter() {
        let Some(rule) = rules.iter().find(|r| r.field == field) else {
            return Err(JoblyError::validation(format!(
                "{entity} field '{field}' cannot be updated"
            )));
        };
        if !rule.kind.accepts(value) {
            return Err(JoblyError::validation(format!(
                "{entity} field '{field}' expects {:?}",
                rule.kind
            )));
        }
    }
    Ok(())
}

/// `SELECT ... FROM ... [WHERE ...] ORDER BY ...` without doubled spaces.
pub(crate) fn select_sql(columns: &str, table: &str, where_sql: &str, order_by: &str) -> String {
    let mut sql = format!("SELECT {columns} FROM {table}");
    if !where_sql.is_empty() {
        sql.push(' ');
        sql.push_str(where_sql);
    }
    sql.push_str(" ORDER BY ");
    sql.push_str(order_by);
    sql
}

/// Hashing seam for stored passwords.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> JoblyResult<String>;

    fn verify(&self, password: &str, hashed: &str) -> JoblyResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &[FieldRule] = &[
        FieldRule::new("name", FieldKind::Text),
        FieldRule::new("numEmployees", FieldKind::OptionalInt),
        FieldRule::new("equity", FieldKind::OptionalNumber),
    ];

    #[test]
    fn identity_and_unknown_fields_are_rejected() {
        let payload = UpdatePayload::new().with("handle", "new-handle");
        let err = check_payload(&payload, RULES, "company").unwrap_err();
        assert!(err.is_validation());
        assert!(check_payload(&UpdatePayload::new().with("nope", 1), RULES, "company").is_err());
    }

    #[test]
    fn value_shapes_are_checked() {
        assert!(check_payload(&UpdatePayload::new().with("numEmployees", "ten"), RULES, "c").is_err());
        assert!(check_payload(&UpdatePayload::new().with("name", Value::Null), RULES, "c").is_err());
        assert!(check_payload(&UpdatePayload::new().with("numEmployees", Value::Null), RULES, "c").is_ok());
        assert!(check_payload(&UpdatePayload::new().with("equity", 0.5), RULES, "c").is_ok());
    }

    #[test]
    fn integers_must_fit_the_column() {
        let too_big = UpdatePayload::new().with("numEmployees", 3_000_000_000_i64);
        assert!(check_payload(&too_big, RULES, "c").unwrap_err().is_validation());
        let too_small = UpdatePayload::new().with("numEmployees", i64::from(i32::MIN) - 1);
        assert!(check_payload(&too_small, RULES, "c").is_err());
        let max = UpdatePayload::new().with("numEmployees", i32::MAX);
        assert!(check_payload(&max, RULES, "c").is_ok());
    }

    #[test]
    fn empty_payload_passes_through_to_the_builder() {
        assert!(check_payload(&UpdatePayload::new(), RULES, "c").is_ok());
    }

    #[test]
    fn select_sql_omits_empty_where() {
        assert_eq!(
            select_sql("a, b", "t", "", "a"),
            "SELECT a, b FROM t ORDER BY a"
        );
        assert_eq!(
            select_sql("a", "t", "WHERE a = $1", "a"),
            "SELECT a FROM t WHERE a = $1 ORDER BY a"
        );
    }
}
