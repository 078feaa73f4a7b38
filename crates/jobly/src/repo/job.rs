use super::{Company, FieldKind, FieldRule, check_payload, select_sql};
use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::filter::{FilterCriteria, PredicateSpec, build_where};
use crate::query::query;
use crate::row::{FromRow, RowExt};
use crate::update::{FieldMap, UpdatePayload, build_set_clause};
use crate::value::Value;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

const COLUMNS: &str = "id, title, salary, equity, company_handle";

/// Titles repeat; `id` breaks ties.
const ORDER_BY: &str = "title, id";

const UPDATABLE: &[FieldRule] = &[
    FieldRule::new("title", FieldKind::Text),
    FieldRule::new("salary", FieldKind::OptionalInt),
    FieldRule::new("equity", FieldKind::OptionalNumber),
];

const FILTERS: &[PredicateSpec] = &[
    PredicateSpec::substring("title", "title"),
    PredicateSpec::min("minSalary", "salary"),
    PredicateSpec::flag("hasEquity", "equity > 0"),
    PredicateSpec::equals("companyHandle", "company_handle"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

/// Attributes of a job to be posted; the id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

/// A job as listed under its company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
}

/// A job with its company in place of the handle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobDetail {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company: Company,
}

impl FromRow for Job {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            title: row.try_get_column("title")?,
            salary: row.try_get_column("salary")?,
            equity: row.try_get_column("equity")?,
            company_handle: row.try_get_column("company_handle")?,
        })
    }
}

impl FromRow for JobSummary {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            title: row.try_get_column("title")?,
            salary: row.try_get_column("salary")?,
            equity: row.try_get_column("equity")?,
        })
    }
}

fn check_equity(equity: Option<Decimal>) -> JoblyResult<()> {
    match equity {
        Some(e) if e < Decimal::ZERO || e > Decimal::ONE => Err(JoblyError::validation(
            format!("equity must be between 0 and 1, got {e}"),
        )),
        _ => Ok(()),
    }
}

fn check_salary(salary: Option<i64>) -> JoblyResult<()> {
    match salary {
        Some(s) if s < 0 => Err(JoblyError::validation("salary must not be negative")),
        _ => Ok(()),
    }
}

fn check_update_values(payload: &UpdatePayload) -> JoblyResult<()> {
    match payload.get("equity") {
        Some(Value::Int(i)) => check_equity(Some(Decimal::from(*i)))?,
        Some(Value::Float(f)) => {
            let equity = Decimal::try_from(*f)
                .map_err(|_| JoblyError::validation(format!("equity {f} is not a decimal")))?;
            check_equity(Some(equity))?;
        }
        _ => {}
    }
    if let Some(Value::Int(salary)) = payload.get("salary") {
        check_salary(Some(*salary))?;
    }
    Ok(())
}

impl Job {
    /// Post a job. An unknown company is `NotFound`.
    pub async fn create(conn: &impl GenericClient, job: &NewJob) -> JoblyResult<Job> {
        check_equity(job.equity)?;
        check_salary(job.salary.map(i64::from))?;
        query(format!(
            "INSERT INTO jobs (title, salary, equity, company_handle) \
             VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
        ))
        .tag("jobs.create")
        .bind(job.title.clone())
        .bind(job.salary)
        .bind(job.equity)
        .bind(job.company_handle.clone())
        .fetch_one_as(conn)
        .await
    }

    /// Jobs matching `criteria`, ordered by title then id.
    ///
    /// Criteria: `title` (case-insensitive substring), `minSalary`,
    /// `hasEquity` (only jobs with non-zero equity when true), `companyHandle`.
    pub async fn find_all(
        conn: &impl GenericClient,
        criteria: &FilterCriteria,
    ) -> JoblyResult<Vec<Job>> {
        let filter = build_where(criteria, FILTERS)?;
        query(select_sql(COLUMNS, "jobs", filter.sql(), ORDER_BY))
            .tag("jobs.find_all")
            .bind_fragment(filter)
            .fetch_all_as(conn)
            .await
    }

    pub async fn get(conn: &impl GenericClient, id: i32) -> JoblyResult<JobDetail> {
        let job: Job = query(format!("SELECT {COLUMNS} FROM jobs WHERE id = $1"))
            .tag("jobs.get")
            .bind(id)
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("no job: {id}")))?;

        let company: Company = query(
            "SELECT handle, name, num_employees, description, logo_url \
             FROM companies WHERE handle = $1",
        )
        .tag("jobs.get.company")
        .bind(job.company_handle.clone())
        .fetch_one_as(conn)
        .await?;

        Ok(JobDetail {
            id: job.id,
            title: job.title,
            salary: job.salary,
            equity: job.equity,
            company,
        })
    }

    /// Apply a partial update. Neither `id` nor `companyHandle` is updatable.
    pub async fn update(
        conn: &impl GenericClient,
        id: i32,
        payload: UpdatePayload,
    ) -> JoblyResult<Job> {
        check_payload(&payload, UPDATABLE, "job")?;
        check_update_values(&payload)?;
        let set = build_set_clause(payload, &FieldMap::EMPTY)?;
        let sql = format!(
            "UPDATE jobs SET {} WHERE id = ${} RETURNING {COLUMNS}",
            set.sql(),
            set.next_index()
        );
        query(sql)
            .tag("jobs.update")
            .bind_fragment(set)
            .bind(id)
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("no job: {id}")))
    }

    pub async fn remove(conn: &impl GenericClient, id: i32) -> JoblyResult<()> {
        query("DELETE FROM jobs WHERE id = $1 RETURNING id")
            .tag("jobs.remove")
            .bind(id)
            .fetch_opt(conn)
            .await?
            .map(|_| ())
            .ok_or_else(|| JoblyError::not_found(format!("no job: {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_equity_adds_no_value() {
        let criteria = FilterCriteria::new()
            .with("hasEquity", true)
            .with("minSalary", 100);
        let filter = build_where(&criteria, FILTERS).unwrap();
        assert_eq!(filter.sql(), "WHERE salary >= $1 AND equity > 0");
        assert_eq!(filter.values(), &[Value::Int(100)]);
    }

    #[test]
    fn company_handle_filter_binds_equality() {
        let criteria = FilterCriteria::new().with("companyHandle", "c1");
        let filter = build_where(&criteria, FILTERS).unwrap();
        assert_eq!(filter.sql(), "WHERE company_handle = $1");
    }

    #[test]
    fn company_handle_is_not_updatable() {
        let payload = UpdatePayload::new().with("companyHandle", "c2");
        assert!(check_payload(&payload, UPDATABLE, "job").unwrap_err().is_validation());
        let payload = UpdatePayload::new().with("id", 7);
        assert!(check_payload(&payload, UPDATABLE, "job").is_err());
    }

    #[test]
    fn equity_must_be_a_fraction() {
        assert!(check_equity(Some(Decimal::new(5, 1))).is_ok());
        assert!(check_equity(Some(Decimal::ONE)).is_ok());
        assert!(check_equity(Some(Decimal::new(11, 1))).is_err());
        assert!(check_equity(None).is_ok());
        assert!(check_update_values(&UpdatePayload::new().with("equity", 1.5)).is_err());
        assert!(check_update_values(&UpdatePayload::new().with("equity", 0.25)).is_ok());
        assert!(check_update_values(&UpdatePayload::new().with("salary", -1)).is_err());
    }
}
