use serde::Deserialize;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Defaults read from the optional `cli.toml` config file.
///
/// The file only supplies fallbacks; command-line flags always win. A
/// missing file is the same as an empty one.
#[derive(Debug, Default)]
pub struct CliConfig {
    data: RawConfig,
}

impl CliConfig {
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = explicit.or_else(default_config_path);
        let data = match path {
            Some(config_path) if config_path.exists() => read_file(&config_path)?,
            _ => RawConfig::default(),
        };
        Ok(Self { data })
    }

    pub fn default_db_path(&self) -> Option<&PathBuf> {
        self.data.database.default_path.as_ref()
    }

    pub fn server_host(&self) -> Option<IpAddr> {
        self.data.server.host
    }

    pub fn server_port(&self) -> Option<u16> {
        self.data.server.port
    }

    pub fn guest_dir(&self) -> Option<&PathBuf> {
        self.data.guest.dir.as_ref()
    }
}

fn read_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    database: DatabaseSection,
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    guest: GuestSection,
}

#[derive(Debug, Default, Deserialize)]
struct DatabaseSection {
    #[serde(rename = "default")]
    default_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSection {
    host: Option<IpAddr>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct GuestSection {
    dir: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read CLI config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse CLI config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("dungeoneer").join("cli.toml"))
}
