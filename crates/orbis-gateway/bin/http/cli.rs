use clap::{Parser, ValueEnum};
use orbis_catalog::estimate::{DEFAULT_MULTIPLIER_MAX, DEFAULT_MULTIPLIER_MIN};
use orbis_catalog::fetcher::{DEFAULT_COUNTRIES_URL, DEFAULT_RATES_URL};
use orbis_telemetry::LogFormat;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const LISTEN_ADDR_ENV: &str = "ORBIS_LISTEN_ADDR";
pub const STORAGE_BACKEND_ENV: &str = "ORBIS_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "ORBIS_MYSQL_DSN";
pub const MYSQL_MAX_CONNECTIONS_ENV: &str = "ORBIS_MYSQL_MAX_CONNECTIONS";
pub const COUNTRIES_URL_ENV: &str = "ORBIS_COUNTRIES_URL";
pub const RATES_URL_ENV: &str = "ORBIS_RATES_URL";
pub const FETCH_TIMEOUT_SECS_ENV: &str = "ORBIS_FETCH_TIMEOUT_SECS";
pub const CACHE_DIR_ENV: &str = "ORBIS_CACHE_DIR";
pub const GDP_MULTIPLIER_MIN_ENV: &str = "ORBIS_GDP_MULTIPLIER_MIN";
pub const GDP_MULTIPLIER_MAX_ENV: &str = "ORBIS_GDP_MULTIPLIER_MAX";
pub const REFRESH_DEADLINE_SECS_ENV: &str = "ORBIS_REFRESH_DEADLINE_SECS";
pub const LOG_FORMAT_ENV: &str = "ORBIS_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MYSQL_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CACHE_DIR: &str = "cache";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "orbis-gateway")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(long, env = MYSQL_MAX_CONNECTIONS_ENV, default_value_t = DEFAULT_MYSQL_MAX_CONNECTIONS)]
    pub mysql_max_connections: u32,

    #[arg(long, env = COUNTRIES_URL_ENV, default_value = DEFAULT_COUNTRIES_URL)]
    pub countries_url: String,

    #[arg(long, env = RATES_URL_ENV, default_value = DEFAULT_RATES_URL)]
    pub rates_url: String,

    /// Per-request timeout for each upstream source.
    #[arg(long, env = FETCH_TIMEOUT_SECS_ENV, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    pub fetch_timeout_secs: u64,

    /// Directory holding the summary image.
    #[arg(long, env = CACHE_DIR_ENV, default_value = DEFAULT_CACHE_DIR)]
    pub cache_dir: PathBuf,

    #[arg(long, env = GDP_MULTIPLIER_MIN_ENV, default_value_t = DEFAULT_MULTIPLIER_MIN)]
    pub gdp_multiplier_min: f64,

    #[arg(long, env = GDP_MULTIPLIER_MAX_ENV, default_value_t = DEFAULT_MULTIPLIER_MAX)]
    pub gdp_multiplier_max: f64,

    /// Overall time limit for a refresh. Unlimited when unset.
    #[arg(long, env = REFRESH_DEADLINE_SECS_ENV)]
    pub refresh_deadline_secs: Option<u64>,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}
