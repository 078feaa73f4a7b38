//! # jobly
//!
//! Data core for a job-board API backed by PostgreSQL.
//!
//! ## Features
//!
//! - **Partial updates**: [`update::build_set_clause`] turns any subset of an
//!   entity's fields into a `"col"=$n` SET fragment
//! - **Dynamic filters**: [`filter::build_where`] composes optional search
//!   criteria into one `WHERE ... AND ...` fragment with contiguous placeholders
//! - **Guard chains**: [`auth::evaluate`] runs ordered, short-circuiting
//!   authorization checks against a verified identity
//! - **Repositories**: [`Company`], [`Job`] and [`User`] operations run on any
//!   [`GenericClient`], so a transaction can be passed anywhere
//!
//! ```ignore
//! use jobly::{AppConfig, Company, FilterCriteria, create_pool};
//!
//! let config = AppConfig::from_env()?;
//! let pool = create_pool(&config)?;
//! let client = pool.get().await?;
//!
//! let criteria = FilterCriteria::new().with("minEmployees", 10).with("name", "net");
//! let companies = Company::find_all(&client, &criteria).await?;
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod fragment;
pub mod ident;
pub mod query;
pub mod repo;
pub mod row;
pub mod update;
pub mod value;

pub use auth::{CallContext, Decision, DenialKind, Guard, Identity, TokenService, evaluate};
pub use client::GenericClient;
pub use config::AppConfig;
pub use error::{JoblyError, JoblyResult};
pub use filter::{Criterion, FilterCriteria, PredicateSpec};
pub use fragment::Fragment;
pub use query::{Query, query};
pub use repo::{
    Company, CompanyDetail, Job, JobDetail, JobSummary, NewJob, NewUser, PasswordHasher, User,
    UserDetail,
};
pub use row::{FromRow, RowExt};
pub use update::{FieldMap, UpdatePayload};
pub use value::Value;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_manager_config, create_pool_with_tls};
