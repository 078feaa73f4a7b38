//! Connection pool utilities

use crate::config::AppConfig;
use crate::error::{JoblyError, JoblyResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, PoolBuilder, RecyclingMethod};
use tokio_postgres::NoTls;
use tokio_postgres::Socket;
use tokio_postgres::tls::{MakeTlsConnect, TlsConnect};

/// Create a `NoTls` connection pool sized from the configuration.
///
/// ```ignore
/// let config = jobly::AppConfig::from_env()?;
/// let pool = jobly::create_pool(&config)?;
/// let client = pool.get().await?;
/// let companies = Company::find_all(&client, &FilterCriteria::new()).await?;
/// ```
pub fn create_pool(config: &AppConfig) -> JoblyResult<Pool> {
    create_pool_with_tls(config, NoTls)
}

/// Create a connection pool using a custom TLS connector.
pub fn create_pool_with_tls<T>(config: &AppConfig, tls: T) -> JoblyResult<Pool>
where
    T: MakeTlsConnect<Socket> + Clone + Sync + Send + 'static,
    T::Stream: Sync + Send,
    T::TlsConnect: Sync + Send,
    <T::TlsConnect as TlsConnect<Socket>>::Future: Send,
{
    let max_size = config.pool_max_size;
    create_pool_with_manager_config(&config.database_url, tls, default_manager_config(), |b| {
        b.max_size(max_size)
    })
}

/// Create a connection pool with an injected `ManagerConfig` and `PoolBuilder` tuning.
pub fn create_pool_with_manager_config<T>(
    database_url: &str,
    tls: T,
    manager_config: ManagerConfig,
    configure_pool: impl FnOnce(PoolBuilder) -> PoolBuilder,
) -> JoblyResult<Pool>
where
    T: MakeTlsConnect<Socket> + Clone + Sync + Send + 'static,
    T::Stream: Sync + Send,
    T::TlsConnect: Sync + Send,
    <T::TlsConnect as TlsConnect<Socket>>::Future: Send,
{
    let pg_config: tokio_postgres::Config = database_url
        .parse()
        .map_err(|e: tokio_postgres::Error| JoblyError::Connection(e.to_string()))?;

    let mgr = Manager::from_config(pg_config, tls, manager_config);
    let pool = configure_pool(Pool::builder(mgr))
        .build()
        .map_err(|e| JoblyError::Pool(e.to_string()))?;
    tracing::debug!(target: "jobly.pool", max_size = pool.status().max_size, "pool created");
    Ok(pool)
}

fn default_manager_config() -> ManagerConfig {
    ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_url_is_a_connection_error() {
        let config = AppConfig::new().database_url("not a url at all ::");
        let err = create_pool(&config).unwrap_err();
        assert!(matches!(err, JoblyError::Connection(_)));
    }

    #[test]
    fn pool_size_comes_from_config() {
        let config = AppConfig::new()
            .database_url("postgres://jobly@localhost/jobly")
            .pool_max_size(3);
        let pool = create_pool(&config).unwrap();
        assert_eq!(pool.status().max_size, 3);
    }
}
