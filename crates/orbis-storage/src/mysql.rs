use async_trait::async_trait;
use jiff::Timestamp;
use orbis_core::error::{Result, StorageError};
use orbis_core::{
    Catalog, CatalogTransaction, CountryFilter, CountryRecord, GdpRank, NewCountry, SortOrder,
};
use sqlx::mysql::{MySqlPoolOptions, MySqlRow};
use sqlx::{MySql, MySqlPool, QueryBuilder, Row, Transaction};
use tracing::debug;

const SCHEMA: &str = include_str!("../ddl/mysql/countries.sql");

const SELECT_COUNTRY: &str = r#"
    SELECT name, capital, region, population, currency_code, exchange_rate,
           estimated_gdp, flag_url,
           CAST(UNIX_TIMESTAMP(last_refreshed_at) AS SIGNED) AS last_refreshed_at
    FROM countries
"#;

const UPSERT_COUNTRY: &str = r#"
    INSERT INTO countries
        (name, capital, region, population, currency_code, exchange_rate, estimated_gdp, flag_url)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?) AS incoming
    ON DUPLICATE KEY UPDATE
        capital = incoming.capital,
        region = incoming.region,
        population = incoming.population,
        currency_code = incoming.currency_code,
        exchange_rate = incoming.exchange_rate,
        estimated_gdp = incoming.estimated_gdp,
        flag_url = incoming.flag_url,
        last_refreshed_at = CURRENT_TIMESTAMP
"#;

/// MySQL implementation of the catalog contract.
///
/// `name` carries a unique index and is the upsert key. `last_refreshed_at`
/// is maintained by MySQL. A `NULL` estimate sorts below every number, which
/// is MySQL's native `ORDER BY` behaviour.
#[derive(Debug, Clone)]
pub struct MySqlCatalog {
    pool: MySqlPool,
}

impl MySqlCatalog {
    /// Creates a catalog from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a catalog by opening a new MySQL connection pool of at most
    /// `max_connections` connections.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `countries` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        debug!("countries table is ready");
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn order_by(sort: SortOrder) -> &'static str {
    match sort {
        SortOrder::GdpAsc => "estimated_gdp ASC",
        SortOrder::GdpDesc => "estimated_gdp DESC",
        SortOrder::NameAsc => "name ASC",
        SortOrder::NameDesc => "name DESC",
        SortOrder::PopulationAsc => "population ASC",
        SortOrder::PopulationDesc => "population DESC",
    }
}

fn parse_refreshed_at(seconds: i64) -> Result<Timestamp> {
    Timestamp::from_second(seconds).map_err(|e| {
        StorageError::InvalidData(format!(
            "invalid last_refreshed_at timestamp '{}': {e}",
            seconds
        ))
    })
}

fn country_from_row(row: &MySqlRow) -> Result<CountryRecord> {
    let refreshed_at: i64 = row.try_get("last_refreshed_at").map_err(map_sqlx_error)?;

    Ok(CountryRecord {
        name: row.try_get("name").map_err(map_sqlx_error)?,
        capital: row.try_get("capital").map_err(map_sqlx_error)?,
        region: row.try_get("region").map_err(map_sqlx_error)?,
        population: row.try_get("population").map_err(map_sqlx_error)?,
        currency_code: row.try_get("currency_code").map_err(map_sqlx_error)?,
        exchange_rate: row.try_get("exchange_rate").map_err(map_sqlx_error)?,
        estimated_gdp: row.try_get("estimated_gdp").map_err(map_sqlx_error)?,
        flag_url: row.try_get("flag_url").map_err(map_sqlx_error)?,
        last_refreshed_at: parse_refreshed_at(refreshed_at)?,
    })
}

fn count_from_row(row: &MySqlRow) -> Result<u64> {
    let total: i64 = row.try_get("total").map_err(map_sqlx_error)?;
    u64::try_from(total)
        .map_err(|e| StorageError::InvalidData(format!("invalid row count '{}': {e}", total)))
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl Catalog for MySqlCatalog {
    type Transaction = MySqlTransaction;

    async fn begin(&self) -> Result<MySqlTransaction> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(MySqlTransaction { tx })
    }

    async fn list(
        &self,
        filter: &CountryFilter,
        sort: Option<SortOrder>,
    ) -> Result<Vec<CountryRecord>> {
        let mut query = QueryBuilder::<MySql>::new(SELECT_COUNTRY);
        let mut separator = " WHERE ";

        if let Some(region) = &filter.region {
            query.push(separator).push("region = ").push_bind(region.clone());
            separator = " AND ";
        }
        if let Some(currency) = &filter.currency {
            query
                .push(separator)
                .push("currency_code = ")
                .push_bind(currency.clone());
        }
        if let Some(sort) = sort {
            query.push(" ORDER BY ").push(order_by(sort));
        }

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(country_from_row).collect()
    }

    async fn get(&self, name: &str) -> Result<Option<CountryRecord>> {
        let sql = format!("{SELECT_COUNTRY} WHERE name = ? LIMIT 1");
        let row = sqlx::query(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(country_from_row).transpose()
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM countries
            WHERE name = ?
            "#,
        )
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM countries")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        count_from_row(&row)
    }
}

/// A MySQL transaction holding one pooled connection.
///
/// Dropping it without committing rolls back.
pub struct MySqlTransaction {
    tx: Transaction<'static, MySql>,
}

#[async_trait]
impl CatalogTransaction for MySqlTransaction {
    async fn upsert(&mut self, record: &NewCountry) -> Result<()> {
        sqlx::query(UPSERT_COUNTRY)
            .bind(&record.name)
            .bind(&record.capital)
            .bind(&record.region)
            .bind(record.population)
            .bind(&record.currency_code)
            .bind(record.exchange_rate)
            .bind(record.estimated_gdp)
            .bind(&record.flag_url)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn count(&mut self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM countries")
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        count_from_row(&row)
    }

    async fn top_by_gdp(&mut self, limit: usize) -> Result<Vec<GdpRank>> {
        let rows = sqlx::query(
            r#"
            SELECT name, estimated_gdp
            FROM countries
            ORDER BY estimated_gdp DESC
            LIMIT ?
            "#,
        )
        .bind(limit as u64)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| {
                Ok(GdpRank {
                    name: row.try_get("name").map_err(map_sqlx_error)?,
                    estimated_gdp: row.try_get("estimated_gdp").map_err(map_sqlx_error)?,
                })
            })
            .collect()
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await.map_err(map_sqlx_error)
    }
}
