use std::collections::HashMap;

use orbis_core::NewCountry;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::estimate::GdpEstimator;

const MAX_CURRENCY_CODE_LEN: usize = 10;

/// Why a source entry was left out of a refresh batch.
///
/// Never surfaced to callers; the batch continues without the entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationSkipped {
    #[error("entry has no name")]
    MissingName,
    #[error("entry '{0}' has no population")]
    MissingPopulation(String),
    #[error("entry is malformed: {0}")]
    Malformed(String),
}

#[derive(Debug, Deserialize)]
struct RawCountry {
    name: Option<String>,
    capital: Option<String>,
    region: Option<String>,
    population: Option<u64>,
    flag: Option<String>,
    currencies: Option<Vec<RawCurrency>>,
}

#[derive(Debug, Deserialize)]
struct RawCurrency {
    code: Option<String>,
}

/// The records of one refresh, with the number of entries that were skipped.
#[derive(Debug, Clone, Default)]
pub struct TransformedBatch {
    pub records: Vec<NewCountry>,
    pub skipped: usize,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn first_currency_code(currencies: Option<Vec<RawCurrency>>) -> Option<String> {
    let code = non_empty(currencies?.into_iter().next()?.code)?;
    if code.chars().count() > MAX_CURRENCY_CODE_LEN {
        debug!(code, "ignoring overlong currency code");
        return None;
    }
    Some(code)
}

/// Maps one raw country entry to a normalized record.
///
/// Only the first listed currency is considered. The estimate is computed
/// only when that currency has a finite, positive rate in `rates`;
/// otherwise both `exchange_rate` and `estimated_gdp` are `None`.
pub fn transform(
    entry: &Value,
    rates: &HashMap<String, f64>,
    estimator: &GdpEstimator,
) -> Result<NewCountry, ValidationSkipped> {
    let raw = RawCountry::deserialize(entry)
        .map_err(|e| ValidationSkipped::Malformed(e.to_string()))?;

    let name = non_empty(raw.name).ok_or(ValidationSkipped::MissingName)?;
    let population = raw
        .population
        .ok_or_else(|| ValidationSkipped::MissingPopulation(name.clone()))?;

    let currency_code = first_currency_code(raw.currencies);
    let exchange_rate = currency_code
        .as_ref()
        .and_then(|code| rates.get(code))
        .copied()
        .filter(|rate| rate.is_finite() && *rate > 0.0);
    let estimated_gdp = exchange_rate.map(|rate| estimator.estimate(population, rate));

    Ok(NewCountry {
        name,
        capital: non_empty(raw.capital),
        region: non_empty(raw.region),
        population,
        currency_code,
        exchange_rate,
        estimated_gdp,
        flag_url: non_empty(raw.flag),
    })
}

/// Transforms every entry, logging and dropping the ones that fail validation.
pub fn transform_batch(
    entries: &[Value],
    rates: &HashMap<String, f64>,
    estimator: &GdpEstimator,
) -> TransformedBatch {
    let mut batch = TransformedBatch {
        records: Vec::with_capacity(entries.len()),
        skipped: 0,
    };

    for (index, entry) in entries.iter().enumerate() {
        match transform(entry, rates, estimator) {
            Ok(record) => batch.records.push(record),
            Err(reason) => {
                warn!(index, %reason, "skipping country entry");
                batch.skipped += 1;
            }
        }
    }

    batch
}
