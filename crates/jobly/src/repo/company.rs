use super::{FieldKind, FieldRule, JobSummary, check_payload, select_sql};
use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::filter::{FilterCriteria, PredicateSpec, build_where};
use crate::query::query;
use crate::row::{FromRow, RowExt};
use crate::update::{FieldMap, UpdatePayload, build_set_clause};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

const COLUMNS: &str = "handle, name, num_employees, description, logo_url";

const FIELDS: FieldMap = FieldMap::new(&[("numEmployees", "num_employees"), ("logoUrl", "logo_url")]);

const UPDATABLE: &[FieldRule] = &[
    FieldRule::new("name", FieldKind::Text),
    FieldRule::new("description", FieldKind::Text),
    FieldRule::new("numEmployees", FieldKind::OptionalInt),
    FieldRule::new("logoUrl", FieldKind::OptionalText),
];

const FILTERS: &[PredicateSpec] = &[
    PredicateSpec::substring("name", "name"),
    PredicateSpec::min("minEmployees", "num_employees"),
    PredicateSpec::max("maxEmployees", "num_employees"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub num_employees: Option<i32>,
    pub description: String,
    pub logo_url: Option<String>,
}

/// A company with the jobs it posts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub jobs: Vec<JobSummary>,
}

impl FromRow for Company {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            handle: row.try_get_column("handle")?,
            name: row.try_get_column("name")?,
            num_employees: row.try_get_column("num_employees")?,
            description: row.try_get_column("description")?,
            logo_url: row.try_get_column("logo_url")?,
        })
    }
}

impl Company {
    /// Insert a company. A taken handle (or name) is a conflict.
    pub async fn create(conn: &impl GenericClient, company: &Company) -> JoblyResult<Company> {
        query(format!(
            "INSERT INTO companies ({COLUMNS}) VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT DO NOTHING RETURNING {COLUMNS}"
        ))
        .tag("companies.create")
        .bind(company.handle.clone())
        .bind(company.name.clone())
        .bind(company.num_employees)
        .bind(company.description.clone())
        .bind(company.logo_url.clone())
        .fetch_opt_as(conn)
        .await?
        .ok_or_else(|| JoblyError::conflict(format!("duplicate company: {}", company.handle)))
    }

    /// Companies matching `criteria`, ordered by name.
    ///
    /// Criteria: `name` (case-insensitive substring), `minEmployees`, `maxEmployees`.
    pub async fn find_all(
        conn: &impl GenericClient,
        criteria: &FilterCriteria,
    ) -> JoblyResult<Vec<Company>> {
        let filter = build_where(criteria, FILTERS)?;
        query(select_sql(COLUMNS, "companies", filter.sql(), "name"))
            .tag("companies.find_all")
            .bind_fragment(filter)
            .fetch_all_as(conn)
            .await
    }

    pub async fn get(conn: &impl GenericClient, handle: &str) -> JoblyResult<CompanyDetail> {
        let company: Company = query(format!("SELECT {COLUMNS} FROM companies WHERE handle = $1"))
            .tag("companies.get")
            .bind(handle.to_string())
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("no company: {handle}")))?;

        let jobs = query(
            "SELECT id, title, salary, equity FROM jobs WHERE company_handle = $1 ORDER BY id",
        )
        .tag("companies.get.jobs")
        .bind(handle.to_string())
        .fetch_all_as(conn)
        .await?;

        Ok(CompanyDetail { company, jobs })
    }

    /// Apply a partial update; `handle` itself is not updatable.
    pub async fn update(
        conn: &impl GenericClient,
        handle: &str,
        payload: UpdatePayload,
    ) -> JoblyResult<Company> {
        check_payload(&payload, UPDATABLE, "company")?;
        let set = build_set_clause(payload, &FIELDS)?;
        let sql = format!(
            "UPDATE companies SET {} WHERE handle = ${} RETURNING {COLUMNS}",
            set.sql(),
            set.next_index()
        );
        query(sql)
            .tag("companies.update")
            .bind_fragment(set)
            .bind(handle.to_string())
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("no company: {handle}")))
    }

    pub async fn remove(conn: &impl GenericClient, handle: &str) -> JoblyResult<()> {
        query("DELETE FROM companies WHERE handle = $1 RETURNING handle")
            .tag("companies.remove")
            .bind(handle.to_string())
            .fetch_opt(conn)
            .await?
            .map(|_| ())
            .ok_or_else(|| JoblyError::not_found(format!("no company: {handle}")))
    }
}
