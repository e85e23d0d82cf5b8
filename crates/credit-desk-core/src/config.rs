//! Runtime configuration: defaults, then an optional YAML file, then
//! `CREDIT_DESK_*` environment overrides, merged with the `config` crate.

use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::CreditDeskError;
use crate::store::FIRST_COMPANY_ID;
use crate::types::CompanyId;
use crate::CreditDeskResult;

pub const CONFIG_ENV: &str = "CREDIT_DESK_CONFIG";

/// Environment prefix. Nested keys use `__`, so `generator.base_url` is
/// `CREDIT_DESK_GENERATOR__BASE_URL`.
pub const ENV_PREFIX: &str = "CREDIT_DESK";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub base_url: String,
    /// Upper bound on a single generator round trip.
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".into(),
            timeout_secs: 60,
        }
    }
}

/// Home-page listing window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub first_company_id: CompanyId,
    pub page_size: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            first_company_id: FIRST_COMPANY_ID,
            page_size: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    pub database_path: PathBuf,
    pub listen_addr: String,
    pub static_dir: Option<PathBuf>,
    pub generator: GeneratorConfig,
    pub listing: ListingConfig,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("credit_desk.sqlite"),
            listen_addr: "127.0.0.1:3000".into(),
            static_dir: None,
            generator: GeneratorConfig::default(),
            listing: ListingConfig::default(),
        }
    }
}

impl DeskConfig {
    /// Load from `path` (or `$CREDIT_DESK_CONFIG`) and apply environment
    /// overrides.
    pub fn load(path: Option<&Path>) -> CreditDeskResult<Self> {
        let from_env = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let mut builder = Config::builder();
        if let Some(file) = path.map(Path::to_path_buf).or(from_env) {
            builder = builder.add_source(File::from(file).format(FileFormat::Yaml));
        }
        Self::build(builder.add_source(environment(None)))
    }

    pub fn from_yaml_str(contents: &str) -> CreditDeskResult<Self> {
        Self::build(Config::builder().add_source(File::from_str(contents, FileFormat::Yaml)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> CreditDeskResult<Self> {
        let config: DeskConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn socket_addr(&self) -> CreditDeskResult<SocketAddr> {
        self.listen_addr.parse().map_err(|_| {
            CreditDeskError::invalid(
                "listen_addr",
                format!("'{}' is not a socket address", self.listen_addr),
            )
        })
    }

    pub fn validate(&self) -> CreditDeskResult<()> {
        if self.generator.timeout_secs == 0 {
            return Err(CreditDeskError::invalid(
                "generator.timeout_secs",
                "Timeout must be at least one second",
            ));
        }
        if !self.generator.base_url.starts_with("http://")
            && !self.generator.base_url.starts_with("https://")
        {
            return Err(CreditDeskError::invalid(
                "generator.base_url",
                format!("'{}' is not an http(s) URL", self.generator.base_url),
            ));
        }
        if self.listing.page_size == 0 {
            return Err(CreditDeskError::invalid(
                "listing.page_size",
                "Page size must be positive",
            ));
        }
        Ok(())
    }
}

/// `CREDIT_DESK_*` variables, read from the process unless `vars` is given.
fn environment(vars: Option<::config::Map<String, String>>) -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .source(vars)
}
