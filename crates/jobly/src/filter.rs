//! Dynamic filter (WHERE clause) composition.
//!
//! Each entity declares a fixed, ordered list of [`PredicateSpec`]s naming
//! the optional criteria it understands. [`build_where`] turns whichever of
//! those criteria are present into one `WHERE a AND b ...` fragment.
//!
//! ```ignore
//! use jobly::filter::{FilterCriteria, PredicateSpec, build_where};
//!
//! const SPECS: &[PredicateSpec] = &[
//!     PredicateSpec::min("minEmployees", "num_employees"),
//!     PredicateSpec::max("maxEmployees", "num_employees"),
//! ];
//!
//! let criteria = FilterCriteria::new().with("minEmployees", 3).with("maxEmployees", 5);
//! let clause = build_where(&criteria, SPECS)?;
//! assert_eq!(clause.sql(), "WHERE num_employees >= $1 AND num_employees <= $2");
//! ```

use crate::error::{JoblyError, JoblyResult};
use crate::fragment::{Fragment, Placeholders};
use crate::ident::Ident;
use crate::value::Value;
use std::collections::BTreeMap;

/// How a criterion binds to a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// `column = $n`
    Equals(&'static str),
    /// `column ILIKE $n`, bound as `%value%`
    Substring(&'static str),
    /// `column >= $n`
    Min(&'static str),
    /// `column <= $n`
    Max(&'static str),
    /// A fixed SQL literal emitted when the flag is true; binds nothing.
    Flag(&'static str),
}

/// A criterion key and the predicate it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredicateSpec {
    pub key: &'static str,
    pub predicate: Predicate,
}

impl PredicateSpec {
    pub const fn equals(key: &'static str, column: &'static str) -> Self {
        Self {
            key,
            predicate: Predicate::Equals(column),
        }
    }

    pub const fn substring(key: &'static str, column: &'static str) -> Self {
        Self {
            key,
            predicate: Predicate::Substring(column),
        }
    }

    pub const fn min(key: &'static str, column: &'static str) -> Self {
        Self {
            key,
            predicate: Predicate::Min(column),
        }
    }

    pub const fn max(key: &'static str, column: &'static str) -> Self {
        Self {
            key,
            predicate: Predicate::Max(column),
        }
    }

    pub const fn flag(key: &'static str, literal: &'static str) -> Self {
        Self {
            key,
            predicate: Predicate::Flag(literal),
        }
    }
}

/// A raw criterion value, before coercion to the predicate's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criterion {
    Text(String),
    Int(i64),
    Bool(bool),
}

impl From<&str> for Criterion {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Criterion {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Criterion {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Criterion {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<bool> for Criterion {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// The set of criteria present on a search call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    values: BTreeMap<String, Criterion>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect criteria from decoded query-string pairs (all values are text).
    pub fn from_query_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), Criterion::Text(v.into())))
            .collect();
        Self { values }
    }

    /// Set a criterion (consuming version).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Criterion>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Criterion>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Criterion> {
        self.values.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Compose a `WHERE ...` fragment numbered from `$1`.
pub fn build_where(criteria: &FilterCriteria, specs: &[PredicateSpec]) -> JoblyResult<Fragment> {
    build_where_from(criteria, specs, 1)
}

/// Compose a `WHERE ...` fragment numbered from `$first_index`.
///
/// All criteria are coerced and range-checked before any SQL is written, so
/// a failing call never yields a partial fragment. An empty fragment means
/// no criterion applied and the caller omits the WHERE clause.
pub fn build_where_from(
    criteria: &FilterCriteria,
    specs: &[PredicateSpec],
    first_index: usize,
) -> JoblyResult<Fragment> {
    if let Some(unknown) = criteria
        .values
        .keys()
        .find(|key| !specs.iter().any(|spec| spec.key == key.as_str()))
    {
        return Err(JoblyError::validation(format!("unknown filter: {unknown}")));
    }

    let resolved = specs
        .iter()
        .filter_map(|spec| {
            criteria
                .get(spec.key)
                .map(|raw| resolve(spec, raw).map(|bound| (spec, bound)))
        })
        .collect::<JoblyResult<Vec<_>>>()?;

    check_ranges(&resolved)?;

    let mut placeholders = Placeholders::starting_at(first_index);
    let mut sql = String::new();
    let mut values = Vec::new();

    for (_, bound) in resolved {
        let clause_start = if sql.is_empty() { "WHERE " } else { " AND " };
        match bound {
            Bound::Skip => {}
            Bound::Literal(literal) => {
                sql.push_str(clause_start);
                sql.push_str(literal);
            }
            Bound::Compare {
                column,
                operator,
                value,
            } => {
                sql.push_str(clause_start);
                Ident::parse(column)?.write_sql(&mut sql);
                sql.push(' ');
                sql.push_str(operator);
                sql.push(' ');
                placeholders.push_next(&mut sql);
                values.push(value);
            }
        }
    }

    Ok(Fragment::new(sql, values, first_index))
}

/// A criterion after coercion.
#[derive(Debug)]
enum Bound {
    Compare {
        column: &'static str,
        operator: &'static str,
        value: Value,
    },
    Literal(&'static str),
    Skip,
}

fn resolve(spec: &PredicateSpec, raw: &Criterion) -> JoblyResult<Bound> {
    let compare = |column, operator, value| Bound::Compare {
        column,
        operator,
        value,
    };
    Ok(match spec.predicate {
        Predicate::Equals(column) => compare(column, "=", Value::Text(coerce_text(spec.key, raw)?)),
        Predicate::Substring(column) => {
            let text = coerce_text(spec.key, raw)?;
            compare(column, "ILIKE", Value::Text(format!("%{}%", escape_like(&text))))
        }
        Predicate::Min(column) => compare(column, ">=", Value::Int(coerce_int(spec.key, raw)?)),
        Predicate::Max(column) => compare(column, "<=", Value::Int(coerce_int(spec.key, raw)?)),
        Predicate::Flag(literal) => {
            if coerce_bool(spec.key, raw)? {
                Bound::Literal(literal)
            } else {
                Bound::Skip
            }
        }
    })
}

fn bound_int(bound: &Bound) -> Option<i64> {
    match bound {
        Bound::Compare {
            value: Value::Int(i),
            ..
        } => Some(*i),
        _ => None,
    }
}

/// Reject any min bound greater than the max bound on the same column.
fn check_ranges(resolved: &[(&PredicateSpec, Bound)]) -> JoblyResult<()> {
    for (min_spec, min_bound) in resolved {
        let (Predicate::Min(column), Some(min)) = (min_spec.predicate, bound_int(min_bound)) else {
            continue;
        };
        for (max_spec, max_bound) in resolved {
            let (Predicate::Max(max_column), Some(max)) = (max_spec.predicate, bound_int(max_bound))
            else {
                continue;
            };
            if max_column == column && min > max {
                return Err(JoblyError::validation(format!(
                    "{} cannot be greater than {}",
                    min_spec.key, max_spec.key
                )));
            }
        }
    }
    Ok(())
}

fn coerce_text(key: &str, raw: &Criterion) -> JoblyResult<String> {
    match raw {
        Criterion::Text(s) => Ok(s.clone()),
        Criterion::Int(i) => Ok(i.to_string()),
        Criterion::Bool(_) => Err(JoblyError::validation(format!("{key} must be text"))),
    }
}

/// Numeric criteria compare against INTEGER columns, so they must fit in an `i32`.
fn coerce_int(key: &str, raw: &Criterion) -> JoblyResult<i64> {
    let not_an_integer = || JoblyError::validation(format!("{key} must be an integer"));
    let value = match raw {
        Criterion::Int(i) => *i,
        Criterion::Text(s) => s.trim().parse().map_err(|_| not_an_integer())?,
        Criterion::Bool(_) => return Err(not_an_integer()),
    };
    i32::try_from(value)
        .map(i64::from)
        .map_err(|_| JoblyError::validation(format!("{key} is out of range")))
}

/// Escape `LIKE` metacharacters so user text matches literally.
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn coerce_bool(key: &str, raw: &Criterion) -> JoblyResult<bool> {
    match raw {
        Criterion::Bool(b) => Ok(*b),
        Criterion::Text(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Criterion::Text(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(JoblyError::validation(format!("{key} must be true or false"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::placeholder_indices;

    const COMPANY: &[PredicateSpec] = &[
        PredicateSpec::substring("name", "name"),
        PredicateSpec::min("minEmployees", "num_employees"),
        PredicateSpec::max("maxEmployees", "num_employees"),
    ];

    const JOB: &[PredicateSpec] = &[
        PredicateSpec::substring("title", "title"),
        PredicateSpec::min("minSalary", "salary"),
        PredicateSpec::flag("hasEquity", "equity > 0"),
        PredicateSpec::equals("companyHandle", "company_handle"),
    ];

    #[test]
    fn no_criteria_yields_empty_fragment() {
        let clause = build_where(&FilterCriteria::new(), COMPANY).unwrap();
        assert!(clause.is_empty());
        assert_eq!(clause.sql(), "");
        assert!(clause.values().is_empty());
    }

    #[test]
    fn single_min_bound() {
        let criteria = FilterCriteria::new().with("minEmployees", 3);
        let clause = build_where(&criteria, COMPANY).unwrap();
        assert_eq!(clause.sql(), "WHERE num_employees >= $1");
        assert_eq!(clause.values(), &[Value::Int(3)]);
    }

    #[test]
    fn min_and_max_bounds() {
        let criteria = FilterCriteria::new().with("minEmployees", 3).with("maxEmployees", 5);
        let clause = build_where(&criteria, COMPANY).unwrap();
        assert_eq!(
            clause.sql(),
            "WHERE num_employees >= $1 AND num_employees <= $2"
        );
        assert_eq!(clause.values(), &[Value::Int(3), Value::Int(5)]);
    }

    #[test]
    fn min_greater_than_max_is_rejected() {
        let criteria = FilterCriteria::new().with("minEmployees", 5).with("maxEmployees", 1);
        let err = build_where(&criteria, COMPANY).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn equal_bounds_are_allowed() {
        let criteria = FilterCriteria::new().with("minEmployees", 4).with("maxEmployees", 4);
        assert!(build_where(&criteria, COMPANY).is_ok());
    }

    #[test]
    fn substring_wraps_value_in_wildcards() {
        let criteria = FilterCriteria::new().with("name", "net");
        let clause = build_where(&criteria, COMPANY).unwrap();
        assert_eq!(clause.sql(), "WHERE name ILIKE $1");
        assert_eq!(clause.values(), &[Value::Text("%net%".into())]);
    }

    #[test]
    fn substring_escapes_like_metacharacters() {
        let criteria = FilterCriteria::new().with("name", r"100%_a\b");
        let clause = build_where(&criteria, COMPANY).unwrap();
        assert_eq!(clause.values(), &[Value::Text(r"%100\%\_a\\b%".into())]);
    }

    #[test]
    fn bounds_outside_integer_columns_are_rejected() {
        let criteria = FilterCriteria::new().with("minEmployees", 3_000_000_000_i64);
        assert!(build_where(&criteria, COMPANY).unwrap_err().is_validation());
        let criteria = FilterCriteria::from_query_pairs([("maxEmployees", "99999999999")]);
        assert!(build_where(&criteria, COMPANY).unwrap_err().is_validation());
        let criteria = FilterCriteria::new().with("minSalary", i64::from(i32::MAX));
        assert!(build_where(&criteria, JOB).is_ok());
    }

    #[test]
    fn order_follows_specs_not_supply_order() {
        let a = FilterCriteria::new()
            .with("maxEmployees", 9)
            .with("name", "c")
            .with("minEmployees", 1);
        let b = FilterCriteria::new()
            .with("minEmployees", 1)
            .with("maxEmployees", 9)
            .with("name", "c");
        let ca = build_where(&a, COMPANY).unwrap();
        let cb = build_where(&b, COMPANY).unwrap();
        assert_eq!(ca, cb);
        assert_eq!(
            ca.sql(),
            "WHERE name ILIKE $1 AND num_employees >= $2 AND num_employees <= $3"
        );
    }

    #[test]
    fn flag_binds_no_value() {
        let criteria = FilterCriteria::new().with("hasEquity", true);
        let clause = build_where(&criteria, JOB).unwrap();
        assert_eq!(clause.sql(), "WHERE equity > 0");
        assert!(clause.values().is_empty());
    }

    #[test]
    fn flag_does_not_consume_a_placeholder() {
        let criteria = FilterCriteria::new()
            .with("title", "eng")
            .with("hasEquity", true)
            .with("companyHandle", "c1")
            .with("minSalary", 1000);
        let clause = build_where(&criteria, JOB).unwrap();
        assert_eq!(
            clause.sql(),
            "WHERE title ILIKE $1 AND salary >= $2 AND equity > 0 AND company_handle = $3"
        );
        assert_eq!(placeholder_indices(clause.sql()), vec![1, 2, 3]);
        assert_eq!(clause.values().len(), 3);
    }

    #[test]
    fn false_flag_is_skipped() {
        let criteria = FilterCriteria::new().with("hasEquity", false).with("minSalary", 5);
        let clause = build_where(&criteria, JOB).unwrap();
        assert_eq!(clause.sql(), "WHERE salary >= $1");
    }

    #[test]
    fn false_flag_alone_yields_empty_fragment() {
        let criteria = FilterCriteria::new().with("hasEquity", "false");
        let clause = build_where(&criteria, JOB).unwrap();
        assert!(clause.is_empty());
    }

    #[test]
    fn query_string_values_are_coerced() {
        let criteria = FilterCriteria::from_query_pairs([
            ("minSalary", "100"),
            ("hasEquity", "TRUE"),
        ]);
        let clause = build_where(&criteria, JOB).unwrap();
        assert_eq!(clause.sql(), "WHERE salary >= $1 AND equity > 0");
        assert_eq!(clause.values(), &[Value::Int(100)]);
    }

    #[test]
    fn non_numeric_bound_is_rejected() {
        let criteria = FilterCriteria::from_query_pairs([("minEmployees", "lots")]);
        assert!(build_where(&criteria, COMPANY).unwrap_err().is_validation());
    }

    #[test]
    fn non_boolean_flag_is_rejected() {
        let criteria = FilterCriteria::from_query_pairs([("hasEquity", "maybe")]);
        assert!(build_where(&criteria, JOB).unwrap_err().is_validation());
    }

    #[test]
    fn unknown_criterion_is_rejected() {
        let criteria = FilterCriteria::new().with("salary", 5);
        assert!(build_where(&criteria, COMPANY).unwrap_err().is_validation());
    }

    #[test]
    fn numbering_can_continue_from_earlier_fragment() {
        let criteria = FilterCriteria::new().with("minEmployees", 3).with("maxEmployees", 5);
        let clause = build_where_from(&criteria, COMPANY, 3).unwrap();
        assert_eq!(
            clause.sql(),
            "WHERE num_employees >= $3 AND num_employees <= $4"
        );
        assert_eq!(clause.next_index(), 5);
    }
}
