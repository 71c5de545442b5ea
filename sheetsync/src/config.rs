use crate::pipeline::SyncJob;
use chrono::{DateTime, Utc};
use collector::HostEndpoint;
use serde::Deserialize;
use sheets::Credential;
use sheets::google::DEFAULT_API_URL;
use std::fs::File;
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),
    #[error("listener port cannot be 0")]
    InvalidPort,
    #[error("invalid sheets API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct HostConfig {
    pub url: Url,
    pub name: Option<String>,
}

/// Target spreadsheet documents, one per dataset.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Documents {
    #[serde(default)]
    pub bridging: String,
    #[serde(default)]
    pub insurance: String,
    #[serde(default)]
    pub registry: String,
}

impl Documents {
    /// Name of the first document without an identifier.
    pub fn missing(&self) -> Option<&'static str> {
        [
            ("documents.bridging", &self.bridging),
            ("documents.insurance", &self.insurance),
            ("documents.registry", &self.registry),
        ]
        .into_iter()
        .find(|(_, id)| id.trim().is_empty())
        .map(|(name, _)| name)
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct CredentialConfig {
    pub access_token: Option<String>,
    /// Environment variable holding the token, read once at startup.
    pub access_token_env: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl CredentialConfig {
    pub fn resolve(&self) -> Result<Credential, ConfigError> {
        let token = match (&self.access_token, &self.access_token_env) {
            (Some(token), _) if !token.is_empty() => token.clone(),
            (_, Some(var)) => std::env::var(var).map_err(|_| {
                ConfigError::ConfigurationMissing(format!(
                    "credential: environment variable {var} is not set"
                ))
            })?,
            _ => String::new(),
        };

        let credential = Credential::new(token);
        if !credential.is_present() {
            return Err(ConfigError::ConfigurationMissing(
                "credential.access_token".to_string(),
            ));
        }

        Ok(match self.expires_at {
            Some(expires_at) => credential.with_expiry(expires_at),
            None => credential,
        })
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

fn default_level() -> String {
    "info".into()
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    pub sentry_dsn: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_level(),
            sentry_dsn: None,
        }
    }
}

fn default_prefix() -> String {
    "sheetsync".into()
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub hosts: Vec<HostConfig>,
    #[serde(default)]
    pub documents: Documents,
    #[serde(default)]
    pub credential: CredentialConfig,
    /// Spreadsheets collection endpoint of the Sheets API
    pub sheets_api_url: Option<Url>,
    /// Per-request deadline for host fetches. No deadline when unset.
    pub source_timeout_secs: Option<u64>,
    #[serde(default)]
    pub listener: Listener,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub metrics: Option<MetricsConfig>,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }

    /// Checks that everything a run needs is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listener.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        if self.hosts.is_empty() {
            return Err(ConfigError::ConfigurationMissing("hosts".to_string()));
        }

        if let Some(name) = self.documents.missing() {
            return Err(ConfigError::ConfigurationMissing(name.to_string()));
        }

        self.credential.resolve()?;
        self.api_url()?;
        Ok(())
    }

    pub fn api_url(&self) -> Result<Url, ConfigError> {
        match &self.sheets_api_url {
            Some(url) => Ok(url.clone()),
            None => Ok(Url::parse(DEFAULT_API_URL)?),
        }
    }

    /// The run parameters, with the credential resolved.
    pub fn sync_job(&self) -> Result<SyncJob, ConfigError> {
        Ok(SyncJob {
            hosts: self.host_endpoints(),
            documents: self.documents.clone(),
            credential: self.credential.resolve()?,
        })
    }

    pub fn host_endpoints(&self) -> Vec<HostEndpoint> {
        self.hosts
            .iter()
            .map(|host| HostEndpoint::new(host.url.clone(), host.name.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    const FULL_CONFIG: &str = r#"
hosts:
  - url: http://localhost:3001
    name: app
  - url: http://localhost:3002
documents:
  bridging: doc-bridging
  insurance: doc-bpjs
  registry: doc-sehat
credential:
  access_token: ya29.token
  expires_at: 2024-05-20T12:00:00Z
source_timeout_secs: 30
listener:
  host: 0.0.0.0
  port: 8080
logging:
  level: debug
metrics:
  statsd_host: 127.0.0.1
  statsd_port: 8125
"#;

    #[test]
    fn test_load_config() {
        let tmp = write_tmp_file(FULL_CONFIG);
        let config = Config::from_file(tmp.path()).expect("load config");
        config.validate().expect("valid config");

        let hosts = config.host_endpoints();
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[0].name(), "app");
        assert_eq!(hosts[1].name(), "localhost:3002");

        assert_eq!(config.documents.insurance, "doc-bpjs");
        assert_eq!(config.api_url().unwrap().as_str(), DEFAULT_API_URL);
        assert_eq!(config.source_timeout_secs, Some(30));
        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.metrics.as_ref().unwrap().prefix, "sheetsync");

        let job = config.sync_job().unwrap();
        assert_eq!(job.hosts, hosts);
        assert!(job.credential.is_present());
    }

    #[test]
    fn test_defaults() {
        let config: Config = serde_yaml::from_str(
            r#"
hosts: [{url: "http://10.0.0.2:8080"}]
documents: {bridging: a, insurance: b, registry: c}
credential: {access_token: t}
"#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.listener, Listener::default());
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.source_timeout_secs, None);
        assert!(config.metrics.is_none());
    }

    #[test]
    fn test_missing_configuration() {
        let base: Config = serde_yaml::from_str(FULL_CONFIG).unwrap();

        let mut config = base.clone();
        config.hosts.clear();
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::ConfigurationMissing(field) if field == "hosts"
        ));

        let mut config = base.clone();
        config.documents.registry = "".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::ConfigurationMissing(field) if field == "documents.registry"
        ));

        let mut config = base.clone();
        config.credential = CredentialConfig::default();
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::ConfigurationMissing(_)
        ));

        let mut config = base.clone();
        config.credential.access_token = None;
        config.credential.access_token_env = Some("SHEETSYNC_TEST_UNSET_TOKEN".to_string());
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::ConfigurationMissing(_)
        ));

        let mut config = base;
        config.listener.port = 0;
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::InvalidPort
        ));
    }

    #[test]
    fn test_deserialization_errors() {
        // Invalid URL
        assert!(serde_yaml::from_str::<Config>("hosts: [{url: not-a-url}]").is_err());

        // Invalid port type
        assert!(
            serde_yaml::from_str::<Config>("listener: {host: 0.0.0.0, port: not_a_number}")
                .is_err()
        );

        // Invalid expiry timestamp
        assert!(serde_yaml::from_str::<Config>("credential: {expires_at: tomorrow}").is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Config::from_file(std::path::Path::new("/nonexistent/sheetsync.yaml")),
            Err(ConfigError::LoadError(_))
        ));
    }
}
