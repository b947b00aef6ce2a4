use std::fmt::{Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

/// Equality filters applied by [`crate::Catalog::list`].
///
/// Both fields compare case-insensitively after Unicode lower-casing, the
/// same rule the storage backends apply to country names. `None` means
/// "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryFilter {
    pub region: Option<String>,
    pub currency: Option<String>,
}

impl CountryFilter {
    pub fn matches(&self, region: Option<&str>, currency: Option<&str>) -> bool {
        fn eq(wanted: Option<&String>, actual: Option<&str>) -> bool {
            match wanted {
                None => true,
                Some(wanted) => {
                    actual.is_some_and(|actual| actual.to_lowercase() == wanted.to_lowercase())
                }
            }
        }

        eq(self.region.as_ref(), region) && eq(self.currency.as_ref(), currency)
    }
}

/// Supported orderings for listing countries.
///
/// A missing estimate orders below every number, so it comes first for
/// [`SortOrder::GdpAsc`] and last for [`SortOrder::GdpDesc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    GdpAsc,
    GdpDesc,
    NameAsc,
    NameDesc,
    PopulationAsc,
    PopulationDesc,
}

#[derive(Debug, Clone, Error)]
#[error("unknown sort order: {0}")]
pub struct UnknownSortOrder(pub String);

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::GdpAsc => "gdp_asc",
            SortOrder::GdpDesc => "gdp_desc",
            SortOrder::NameAsc => "name_asc",
            SortOrder::NameDesc => "name_desc",
            SortOrder::PopulationAsc => "population_asc",
            SortOrder::PopulationDesc => "population_desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = UnknownSortOrder;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "gdp_asc" => Ok(SortOrder::GdpAsc),
            "gdp_desc" => Ok(SortOrder::GdpDesc),
            "name_asc" => Ok(SortOrder::NameAsc),
            "name_desc" => Ok(SortOrder::NameDesc),
            "population_asc" => Ok(SortOrder::PopulationAsc),
            "population_desc" => Ok(SortOrder::PopulationDesc),
            other => Err(UnknownSortOrder(other.to_string())),
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
