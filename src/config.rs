use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://storefront.db?mode=rwc";
pub const DEFAULT_LOG_FILTER: &str = "storefront=info,tower_http=info";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Seed the catalog when no categories exist yet.
    pub seed_catalog: bool,
    /// JSON seed file; the bundled catalog is used when unset.
    pub catalog_seed_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value,
            })?,
            None => 3000,
        };
        let seed_catalog = match lookup("SEED_CATALOG") {
            Some(value) => parse_bool("SEED_CATALOG", value)?,
            None => true,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            seed_catalog,
            catalog_seed_path: lookup("CATALOG_SEED_PATH")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(name: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { name, value }),
    }
}
