//! Environment configuration for nctl.
//!
//! Values are resolved in this order (later wins):
//! 1. Built-in defaults
//! 2. Environment file (`.env` in the working directory, or `--env <file>`;
//!    dotenv, JSON, TOML or YAML)
//! 3. Process environment variables
//!
//! Keys are case-insensitive. Validation runs over the merged key/value map
//! and reports every violated field at once.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, FieldError, FieldErrors, Result};

/// Environment file read when no explicit path is given.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Host the tunnel forwards to when `HOST` is not set.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Keys understood by [`EnvConfig`]. Anything else is ignored.
pub const ENV_KEYS: &[&str] = &[
    "port",
    "host",
    "ngrok_auth",
    "ngrok_config",
    "distribution_id",
    "distribution_config",
    "debug",
    "log_json",
    "aws_profile_name",
    "aws_access_key_id",
    "aws_secret_access_key",
    "aws_default_region",
];

/// Suffixes accepted for a distribution template.
const TEMPLATE_SUFFIXES: &[&str] = &["json", "toml", "yaml", "yml"];

/// Merged key/value pairs, keys lowercased.
pub type EnvVars = BTreeMap<String, String>;

/// A string that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw secret. Only hand this to the provider that needs it.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString(***)")
    }
}

/// Which distribution a run works against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DistributionTarget {
    /// Update an existing distribution. `ignored_config` holds a template
    /// path that was supplied alongside the id and will not be used.
    Existing {
        id: String,
        ignored_config: Option<PathBuf>,
    },
    /// Create a new distribution from a JSON, TOML or YAML template.
    Create { config: PathBuf },
}

/// How the AWS client authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AwsAuth {
    Keys {
        access_key_id: String,
        secret_access_key: SecretString,
    },
    Profile(String),
    DefaultChain,
}

/// AWS settings taken from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsSettings {
    pub auth: AwsAuth,
    pub region: Option<String>,
}

/// Validated configuration snapshot. Built once per process.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub port: u16,
    pub host: String,
    pub ngrok_auth: SecretString,
    pub ngrok_config: Option<PathBuf>,
    pub distribution: DistributionTarget,
    pub debug: bool,
    pub log_json: bool,
    pub aws: AwsSettings,
}

impl EnvConfig {
    /// Validate a merged key/value map into a config.
    ///
    /// All violations are collected before returning, so the caller sees
    /// every bad field in one go.
    pub fn from_vars(vars: &EnvVars) -> Result<Self> {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };
        let mut errors = Vec::new();

        let ngrok_auth = get("ngrok_auth").map(SecretString::new);
        if ngrok_auth.is_none() {
            errors.push(FieldError::new("ngrok_auth", "tunnel auth token is required"));
        }

        let port = match get("port") {
            None => {
                errors.push(FieldError::new("port", "is required"));
                None
            }
            Some(raw) => match raw.parse::<u16>() {
                Ok(0) => {
                    errors.push(FieldError::new("port", "must be a positive integer"));
                    None
                }
                Ok(port) => Some(port),
                Err(_) => {
                    errors.push(FieldError::new(
                        "port",
                        format!("must be an integer between 1 and 65535 (got {raw:?})"),
                    ));
                    None
                }
            },
        };

        let host = get("host").unwrap_or(DEFAULT_HOST).to_string();

        let ngrok_config = get("ngrok_config").map(PathBuf::from);
        if let Some(path) = &ngrok_config {
            if !path.is_file() {
                errors.push(FieldError::new(
                    "ngrok_config",
                    format!("file not found: {}", path.display()),
                ));
            }
        }

        let distribution_id = get("distribution_id").map(str::to_string);
        let distribution_config = get("distribution_config").map(PathBuf::from);
        if let Some(path) = &distribution_config {
            if !has_template_suffix(path) {
                errors.push(FieldError::new(
                    "distribution_config",
                    "config file can only be JSON, TOML or YAML",
                ));
            } else if !path.is_file() {
                errors.push(FieldError::new(
                    "distribution_config",
                    format!("file not found: {}", path.display()),
                ));
            }
        }
        let distribution = match (distribution_id, distribution_config) {
            (Some(id), ignored_config) => Some(DistributionTarget::Existing { id, ignored_config }),
            (None, Some(config)) => Some(DistributionTarget::Create { config }),
            (None, None) => {
                errors.push(FieldError::new(
                    "distribution_id",
                    "any one of 'distribution_id' or 'distribution_config' is required",
                ));
                None
            }
        };

        let debug = parse_flag(get("debug"), "debug", &mut errors);
        let log_json = parse_flag(get("log_json"), "log_json", &mut errors);

        let aws = aws_settings(
            get("aws_profile_name"),
            get("aws_access_key_id"),
            get("aws_secret_access_key"),
            get("aws_default_region"),
            &mut errors,
        );

        match (port, ngrok_auth, distribution) {
            (Some(port), Some(ngrok_auth), Some(distribution)) if errors.is_empty() => Ok(Self {
                port,
                host,
                ngrok_auth,
                ngrok_config,
                distribution,
                debug,
                log_json,
                aws,
            }),
            _ => Err(ConfigError::Invalid(FieldErrors(errors))),
        }
    }

    /// Distribution id, when one was supplied.
    pub fn distribution_id(&self) -> Option<&str> {
        match &self.distribution {
            DistributionTarget::Existing { id, .. } => Some(id),
            DistributionTarget::Create { .. } => None,
        }
    }

    /// Local address the tunnel forwards to.
    pub fn upstream(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn has_template_suffix(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| TEMPLATE_SUFFIXES.contains(&ext.to_ascii_lowercase().as_str()))
}

fn parse_flag(raw: Option<&str>, field: &'static str, errors: &mut Vec<FieldError>) -> bool {
    let Some(raw) = raw else {
        return false;
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            errors.push(FieldError::new(
                field,
                format!("must be a boolean (got {raw:?})"),
            ));
            false
        }
    }
}

fn aws_settings(
    profile: Option<&str>,
    access_key_id: Option<&str>,
    secret_access_key: Option<&str>,
    region: Option<&str>,
    errors: &mut Vec<FieldError>,
) -> AwsSettings {
    let auth = match (access_key_id, secret_access_key) {
        (Some(id), Some(secret)) => {
            if profile.is_some() {
                errors.push(FieldError::new(
                    "aws_profile_name",
                    "cannot be combined with 'aws_access_key_id'/'aws_secret_access_key'",
                ));
            }
            AwsAuth::Keys {
                access_key_id: id.to_string(),
                secret_access_key: SecretString::new(secret),
            }
        }
        (Some(_), None) => {
            errors.push(FieldError::new(
                "aws_secret_access_key",
                "is required when 'aws_access_key_id' is set",
            ));
            AwsAuth::DefaultChain
        }
        (None, Some(_)) => {
            errors.push(FieldError::new(
                "aws_access_key_id",
                "is required when 'aws_secret_access_key' is set",
            ));
            AwsAuth::DefaultChain
        }
        (None, None) => profile.map_or(AwsAuth::DefaultChain, |p| AwsAuth::Profile(p.to_string())),
    };
    AwsSettings {
        auth,
        region: region.map(str::to_string),
    }
}

/// Load and validate the configuration.
///
/// With `env_file` unset, `./.env` is read when it exists; otherwise only the
/// process environment is used.
pub fn load_env(env_file: Option<&Path>) -> Result<EnvConfig> {
    EnvConfig::from_vars(&collect_vars(env_file)?)
}

/// Read the env file (if any) and overlay the process environment, without
/// validating anything.
pub fn collect_vars(env_file: Option<&Path>) -> Result<EnvVars> {
    collect_vars_in(Path::new("."), env_file, std::env::vars())
}

/// [`collect_vars`] with an explicit directory for the default `.env` file
/// and an explicit overlay source.
pub fn collect_vars_in<I>(
    base_dir: &Path,
    env_file: Option<&Path>,
    process_env: I,
) -> Result<EnvVars>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut vars = match env_file {
        Some(path) => read_env_file(path)?,
        None => {
            let default = base_dir.join(DEFAULT_ENV_FILE);
            if default.is_file() {
                read_env_file(&default)?
            } else {
                EnvVars::new()
            }
        }
    };
    overlay_env(&mut vars, process_env);
    Ok(vars)
}

/// Overlay known keys from `source` onto `vars`, lowercasing keys.
pub fn overlay_env<I>(vars: &mut EnvVars, source: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in source {
        let key = key.to_ascii_lowercase();
        if ENV_KEYS.contains(&key.as_str()) {
            vars.insert(key, value);
        }
    }
}

/// Read an environment file, picking the parser from its suffix.
pub fn read_env_file(path: &Path) -> Result<EnvVars> {
    if !path.is_file() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let raw = match ext.as_deref() {
        None | Some("env" | "txt" | "text") => read_dotenv(path)?,
        Some("json") => read_json(path)?,
        Some("toml") => read_toml(path)?,
        Some("yaml" | "yml") => read_yaml(path)?,
        Some(_) => {
            return Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };
    let mut vars = EnvVars::new();
    overlay_env(&mut vars, raw);
    Ok(vars)
}

fn read_dotenv(path: &Path) -> Result<Vec<(String, String)>> {
    let parse_err = |e: dotenvy::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };
    dotenvy::from_path_iter(path)
        .map_err(parse_err)?
        .map(|item| item.map_err(parse_err))
        .collect()
}

fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json(path: &Path) -> Result<Vec<(String, String)>> {
    let content = read_to_string(path)?;
    let map: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(map
        .into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                serde_json::Value::Null => return None,
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            Some((key, value))
        })
        .collect())
}

fn read_toml(path: &Path) -> Result<Vec<(String, String)>> {
    let content = read_to_string(path)?;
    let table: toml::Table = toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(table
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                toml::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}

/// Top-level scalars of a YAML mapping. Nulls and nested values are skipped.
fn read_yaml(path: &Path) -> Result<Vec<(String, String)>> {
    let parse_err = |e: ::config::ConfigError| ConfigError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };
    let table = ::config::Config::builder()
        .add_source(::config::File::from(path).format(::config::FileFormat::Yaml))
        .build()
        .and_then(|c| ::config::Source::collect(&c))
        .map_err(parse_err)?;
    Ok(table
        .into_iter()
        .filter_map(|(key, value)| value.into_string().ok().map(|value| (key, value)))
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> EnvVars {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn field_names(err: &ConfigError) -> Vec<&'static str> {
        err.fields().iter().map(|f| f.field).collect()
    }

    #[test]
    fn minimal_config_applies_defaults() {
        let config = EnvConfig::from_vars(&vars(&[
            ("port", "8080"),
            ("ngrok_auth", "token"),
            ("distribution_id", "E123"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.host, DEFAULT_HOST);
        assert!(!config.debug);
        assert!(!config.log_json);
        assert_eq!(config.distribution_id(), Some("E123"));
        assert_eq!(config.aws.auth, AwsAuth::DefaultChain);
        assert_eq!(config.upstream(), "127.0.0.1:8080");
    }

    #[test]
    fn missing_auth_token_is_reported() {
        let err = EnvConfig::from_vars(&vars(&[("port", "8080"), ("distribution_id", "E123")]))
            .unwrap_err();
        assert_eq!(field_names(&err), vec!["ngrok_auth"]);
    }

    #[test]
    fn blank_auth_token_counts_as_missing() {
        let err = EnvConfig::from_vars(&vars(&[
            ("port", "8080"),
            ("ngrok_auth", "   "),
            ("distribution_id", "E123"),
        ]))
        .unwrap_err();
        assert_eq!(field_names(&err), vec!["ngrok_auth"]);
    }

    #[test]
    fn missing_distribution_id_and_config_is_reported() {
        let err =
            EnvConfig::from_vars(&vars(&[("port", "8080"), ("ngrok_auth", "token")])).unwrap_err();
        assert_eq!(field_names(&err), vec!["distribution_id"]);
    }

    #[test]
    fn every_violation_is_reported_together() {
        let err = EnvConfig::from_vars(&vars(&[
            ("port", "0"),
            ("debug", "maybe"),
            ("aws_access_key_id", "AKIA"),
        ]))
        .unwrap_err();
        assert_eq!(
            field_names(&err),
            vec![
                "ngrok_auth",
                "port",
                "distribution_id",
                "debug",
                "aws_secret_access_key"
            ]
        );
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        let err = EnvConfig::from_vars(&vars(&[
            ("port", "http"),
            ("ngrok_auth", "token"),
            ("distribution_id", "E123"),
        ]))
        .unwrap_err();
        assert_eq!(field_names(&err), vec!["port"]);
        assert!(err.fields()[0].message.contains("\"http\""));
    }

    #[test]
    fn flags_accept_common_spellings() {
        for (raw, expected) in [("TRUE", true), ("1", true), ("on", true), ("no", false)] {
            let config = EnvConfig::from_vars(&vars(&[
                ("port", "80"),
                ("ngrok_auth", "token"),
                ("distribution_id", "E123"),
                ("debug", raw),
            ]))
            .unwrap();
            assert_eq!(config.debug, expected, "debug={raw}");
        }
    }

    #[test]
    fn template_must_be_json_toml_or_yaml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("dist.ini");
        std::fs::write(&path, "origins = none").unwrap();

        let err = EnvConfig::from_vars(&vars(&[
            ("port", "80"),
            ("ngrok_auth", "token"),
            ("distribution_config", path.to_str().unwrap()),
        ]))
        .unwrap_err();
        assert_eq!(field_names(&err), vec!["distribution_config"]);
    }

    #[test]
    fn template_without_id_selects_create() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("dist.json");
        std::fs::write(&path, "{}").unwrap();

        let config = EnvConfig::from_vars(&vars(&[
            ("port", "80"),
            ("ngrok_auth", "token"),
            ("distribution_config", path.to_str().unwrap()),
        ]))
        .unwrap();
        assert_eq!(config.distribution, DistributionTarget::Create { config: path });
        assert_eq!(config.distribution_id(), None);
    }

    #[test]
    fn id_wins_over_template() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("dist.toml");
        std::fs::write(&path, "").unwrap();

        let config = EnvConfig::from_vars(&vars(&[
            ("port", "80"),
            ("ngrok_auth", "token"),
            ("distribution_id", "E123"),
            ("distribution_config", path.to_str().unwrap()),
        ]))
        .unwrap();
        assert_eq!(
            config.distribution,
            DistributionTarget::Existing {
                id: "E123".into(),
                ignored_config: Some(path),
            }
        );
    }

    #[test]
    fn missing_ngrok_config_file_is_rejected() {
        let err = EnvConfig::from_vars(&vars(&[
            ("port", "80"),
            ("ngrok_auth", "token"),
            ("distribution_id", "E123"),
            ("ngrok_config", "/definitely/not/here/ngrok.yml"),
        ]))
        .unwrap_err();
        assert_eq!(field_names(&err), vec!["ngrok_config"]);
    }

    #[test]
    fn aws_profile_and_keys_conflict() {
        let err = EnvConfig::from_vars(&vars(&[
            ("port", "80"),
            ("ngrok_auth", "token"),
            ("distribution_id", "E123"),
            ("aws_profile_name", "dev"),
            ("aws_access_key_id", "AKIA"),
            ("aws_secret_access_key", "secret"),
        ]))
        .unwrap_err();
        assert_eq!(field_names(&err), vec!["aws_profile_name"]);
    }

    #[test]
    fn aws_profile_alone_is_used() {
        let config = EnvConfig::from_vars(&vars(&[
            ("port", "80"),
            ("ngrok_auth", "token"),
            ("distribution_id", "E123"),
            ("aws_profile_name", "dev"),
            ("aws_default_region", "us-east-1"),
        ]))
        .unwrap();
        assert_eq!(config.aws.auth, AwsAuth::Profile("dev".into()));
        assert_eq!(config.aws.region.as_deref(), Some("us-east-1"));
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let config = EnvConfig::from_vars(&vars(&[
            ("port", "80"),
            ("ngrok_auth", "super-secret-token"),
            ("distribution_id", "E123"),
            ("aws_access_key_id", "AKIA"),
            ("aws_secret_access_key", "aws-secret"),
        ]))
        .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret-token"));
        assert!(!rendered.contains("aws-secret"));
        assert_eq!(config.ngrok_auth.expose(), "super-secret-token");
    }

    #[test]
    fn overlay_lowercases_and_filters_keys() {
        let mut merged = vars(&[("port", "80")]);
        overlay_env(
            &mut merged,
            vec![
                ("PORT".to_string(), "9090".to_string()),
                ("NGROK_AUTH".to_string(), "token".to_string()),
                ("PATH".to_string(), "/usr/bin".to_string()),
            ],
        );
        assert_eq!(merged.get("port").map(String::as_str), Some("9090"));
        assert_eq!(merged.get("ngrok_auth").map(String::as_str), Some("token"));
        assert!(!merged.contains_key("path"));
    }

    #[test]
    fn reads_dotenv_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "PORT=8080\nNGROK_AUTH=\"quoted token\"\n# comment\nDISTRIBUTION_ID=E123\n",
        )
        .unwrap();

        let loaded = read_env_file(&path).unwrap();
        assert_eq!(loaded.get("port").map(String::as_str), Some("8080"));
        assert_eq!(loaded.get("ngrok_auth").map(String::as_str), Some("quoted token"));
        assert_eq!(loaded.get("distribution_id").map(String::as_str), Some("E123"));
    }

    #[test]
    fn reads_json_file_with_numbers_and_bools() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("env.json");
        std::fs::write(
            &path,
            r#"{"PORT": 8080, "DEBUG": true, "NGROK_AUTH": "token", "DISTRIBUTION_ID": null}"#,
        )
        .unwrap();

        let loaded = read_env_file(&path).unwrap();
        assert_eq!(loaded.get("port").map(String::as_str), Some("8080"));
        assert_eq!(loaded.get("debug").map(String::as_str), Some("true"));
        assert!(!loaded.contains_key("distribution_id"));
    }

    #[test]
    fn reads_toml_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("env.toml");
        std::fs::write(
            &path,
            "port = 8080\nngrok_auth = \"token\"\ndistribution_id = \"E123\"\n",
        )
        .unwrap();

        let loaded = read_env_file(&path).unwrap();
        let config = EnvConfig::from_vars(&loaded).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.distribution_id(), Some("E123"));
    }

    #[test]
    fn reads_yaml_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("env.yaml");
        std::fs::write(
            &path,
            "PORT: 8080\nDEBUG: true\nNGROK_AUTH: \"token\"\nDISTRIBUTION_ID: E123\nAWS_PROFILE_NAME: ~\n",
        )
        .unwrap();

        let loaded = read_env_file(&path).unwrap();
        assert_eq!(loaded.get("debug").map(String::as_str), Some("true"));
        assert!(!loaded.contains_key("aws_profile_name"));
        let config = EnvConfig::from_vars(&loaded).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.distribution_id(), Some("E123"));
    }

    #[test]
    fn yml_suffix_is_yaml_too() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("env.yml");
        std::fs::write(&path, "port: 9090\n").unwrap();

        let loaded = read_env_file(&path).unwrap();
        assert_eq!(loaded.get("port").map(String::as_str), Some("9090"));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("env.yaml");
        std::fs::write(&path, "port: [8080\n").unwrap();

        let err = read_env_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "{err:?}");
    }

    #[test]
    fn yaml_template_suffixes_are_accepted() {
        let dir = tempfile::TempDir::new().unwrap();
        let template = dir.path().join("dist.yml");
        std::fs::write(&template, "origins: []\n").unwrap();
        let config = EnvConfig::from_vars(&vars(&[
            ("port", "80"),
            ("ngrok_auth", "token"),
            ("distribution_config", template.to_str().unwrap()),
        ]))
        .unwrap();
        assert_eq!(
            config.distribution,
            DistributionTarget::Create { config: template }
        );
    }

    #[test]
    fn default_env_file_is_picked_up_from_the_base_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_ENV_FILE),
            "PORT=8080\nNGROK_AUTH=from-file\nDISTRIBUTION_ID=E123\n",
        )
        .unwrap();

        let process = vec![("NGROK_AUTH".to_string(), "from-process".to_string())];
        let collected = collect_vars_in(dir.path(), None, process).unwrap();
        assert_eq!(collected.get("port").map(String::as_str), Some("8080"));
        assert_eq!(collected.get("distribution_id").map(String::as_str), Some("E123"));
        assert_eq!(
            collected.get("ngrok_auth").map(String::as_str),
            Some("from-process")
        );
    }

    #[test]
    fn missing_default_env_file_leaves_only_process_vars() {
        let dir = tempfile::TempDir::new().unwrap();
        let process = vec![("PORT".to_string(), "9090".to_string())];
        let collected = collect_vars_in(dir.path(), None, process).unwrap();
        assert_eq!(collected, vars(&[("port", "9090")]));
    }

    #[test]
    fn unsupported_suffix_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("env.ini");
        std::fs::write(&path, "port=1").unwrap();

        let err = read_env_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
    }

    #[test]
    fn missing_env_file_is_not_found() {
        let err = read_env_file(Path::new("/definitely/not/here.env")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }
}
