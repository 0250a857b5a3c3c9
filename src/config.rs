//! Connection settings loaded from `cloudphotorc`.
//!
//! The file lives at `~/.config/cloudphoto/cloudphotorc` unless `--config`
//! points elsewhere. It is written once by `cloudphoto init` and read by every
//! other command. The format is INI with a single `[DEFAULT]` section and
//! unquoted values:
//!
//! ```ini
//! [DEFAULT]
//! bucket = my-photos
//! aws_access_key_id = YCAJE...
//! aws_secret_access_key = YCM...
//! region = ru-central1
//! endpoint_url = https://storage.yandexcloud.net
//! ```
//!
//! All five keys are required and must be non-empty. A missing key is
//! reported by name before any request reaches the object store. Other keys
//! in the section are ignored with a warning.

use ini::{Ini, WriteOption};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Region used by `init` when none is given.
pub const DEFAULT_REGION: &str = "ru-central1";
/// Endpoint used by `init` when none is given.
pub const DEFAULT_ENDPOINT: &str = "https://storage.yandexcloud.net";

/// Location of the config file relative to the home directory.
const CONFIG_RELATIVE_PATH: &str = ".config/cloudphoto/cloudphotorc";

/// The section holding every setting.
const SECTION: &str = "DEFAULT";

/// Keys in the order `save` writes them.
const KEYS: [&str; 5] = [
    "bucket",
    "aws_access_key_id",
    "aws_secret_access_key",
    "region",
    "endpoint_url",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config file parse error: {0}")]
    Ini(#[from] ini::ParseError),
    #[error("config key '{0}' is missing or empty")]
    MissingKey(&'static str),
    #[error("cannot determine home directory")]
    NoHomeDir,
}

/// The five settings every command except `init` needs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub bucket: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub region: String,
    pub endpoint_url: String,
}

// Keeps the secret key out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bucket", &self.bucket)
            .field("aws_access_key_id", &self.aws_access_key_id)
            .field("aws_secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

impl Config {
    /// Settings for a new bucket with the default region and endpoint.
    pub fn new(access_key_id: &str, secret_access_key: &str, bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            aws_access_key_id: access_key_id.to_string(),
            aws_secret_access_key: secret_access_key.to_string(),
            region: DEFAULT_REGION.to_string(),
            endpoint_url: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Check that every key is present and non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.entries().iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(ConfigError::MissingKey(*name)),
            None => Ok(()),
        }
    }

    /// `(key, value)` pairs in file order.
    fn entries(&self) -> [(&'static str, &str); 5] {
        [
            (KEYS[0], self.bucket.as_str()),
            (KEYS[1], self.aws_access_key_id.as_str()),
            (KEYS[2], self.aws_secret_access_key.as_str()),
            (KEYS[3], self.region.as_str()),
            (KEYS[4], self.endpoint_url.as_str()),
        ]
    }
}

/// `~/.config/cloudphoto/cloudphotorc`.
pub fn default_path() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_RELATIVE_PATH))
        .ok_or(ConfigError::NoHomeDir)
}

/// Parse config text and validate the result.
pub fn parse(content: &str) -> Result<Config, ConfigError> {
    let ini = Ini::load_from_str(content)?;
    if let Some(section) = ini.section(Some(SECTION)) {
        for (key, _) in section.iter() {
            if !KEYS.contains(&key) {
                warn!(key, "Ignoring unknown config key");
            }
        }
    }

    let get = |key: &str| {
        ini.get_from(Some(SECTION), key)
            .unwrap_or_default()
            .trim()
            .to_string()
    };
    let config = Config {
        bucket: get("bucket"),
        aws_access_key_id: get("aws_access_key_id"),
        aws_secret_access_key: get("aws_secret_access_key"),
        region: get("region"),
        endpoint_url: get("endpoint_url"),
    };
    config.validate()?;
    Ok(config)
}

/// Read and validate the config file at `path`.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content)
}

/// Validate `config` and write it to `path`, creating parent directories.
///
/// Lines are written as `key = value`, one per setting.
pub fn save(path: &Path, config: &Config) -> Result<(), ConfigError> {
    config.validate()?;
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut ini = Ini::new();
    for (key, value) in config.entries() {
        ini.with_section(Some(SECTION)).set(key, value);
    }
    let mut content = Vec::new();
    let option = WriteOption {
        kv_separator: " = ",
        ..WriteOption::default()
    };
    ini.write_to_opt(&mut content, option).map_err(io_err)?;
    fs::write(path, content).map_err(io_err)
}
