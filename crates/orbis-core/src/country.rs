use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A country as persisted in the catalog.
///
/// `name` is the natural key. `last_refreshed_at` is maintained by the
/// storage backend on every insert or update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: u64,
    pub currency_code: Option<String>,
    /// Rate of `currency_code` against the base currency of the rate table.
    pub exchange_rate: Option<f64>,
    /// Derived estimate, `None` when no usable exchange rate was available.
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
    pub last_refreshed_at: Timestamp,
}

/// A normalized record produced by one refresh, ready to be upserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCountry {
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: u64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
}

impl NewCountry {
    /// Materializes the stored form of this record at the given write time.
    pub fn into_record(self, refreshed_at: Timestamp) -> CountryRecord {
        CountryRecord {
            name: self.name,
            capital: self.capital,
            region: self.region,
            population: self.population,
            currency_code: self.currency_code,
            exchange_rate: self.exchange_rate,
            estimated_gdp: self.estimated_gdp,
            flag_url: self.flag_url,
            last_refreshed_at: refreshed_at,
        }
    }
}

/// One row of the "top by estimated GDP" read-back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GdpRank {
    pub name: String,
    pub estimated_gdp: Option<f64>,
}

impl From<&CountryRecord> for GdpRank {
    fn from(record: &CountryRecord) -> Self {
        Self {
            name: record.name.clone(),
            estimated_gdp: record.estimated_gdp,
        }
    }
}
