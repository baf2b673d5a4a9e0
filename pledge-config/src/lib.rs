//! Loader for workspace configuration with YAML + environment overlays.
//!
//! Sources are merged in order: attached files and inline YAML first, then
//! `PLEDGE__`-prefixed environment variables on top (`__` separates nesting,
//! e.g. `PLEDGE__TWITTER__CONSUMER_KEY`). After merging, every string value
//! has its `${VAR}` placeholders expanded from the process environment.
//!
//! ```yaml
//! database_url: "sqlite://pledge.db"
//! twitter:
//!   consumer_key: "${TWITTER_CONSUMER_KEY}"
//!   consumer_secret: "${TWITTER_CONSUMER_SECRET}"
//! box_view:
//!   api_token: "${BOX_VIEW_API_TOKEN}"
//! http:
//!   timeout_secs: 20
//! log:
//!   format: json
//! ```
use config::{Config, Environment, File};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "PLEDGE";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Source(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct PledgeConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default)]
    pub twitter: Option<TwitterConfig>,
    #[serde(default)]
    pub linkedin: LinkedinConfig,
    #[serde(default)]
    pub box_view: Option<BoxViewConfig>,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub log: LogSection,
}

/// Application (consumer) credentials shared by every linked Twitter identity.
#[derive(Debug, Clone, Deserialize)]
pub struct TwitterConfig {
    pub consumer_key: String,
    pub consumer_secret: String,
    #[serde(default = "default_twitter_endpoint")]
    pub endpoint: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkedinConfig {
    #[serde(default = "default_linkedin_endpoint")]
    pub endpoint: String,
}

impl Default for LinkedinConfig {
    fn default() -> Self {
        Self {
            endpoint: default_linkedin_endpoint(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoxViewConfig {
    pub api_token: String,
    #[serde(default = "default_box_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_session_minutes", deserialize_with = "native_or_text")]
    pub session_duration_minutes: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs", deserialize_with = "native_or_text")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogSection {
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default, deserialize_with = "native_or_text")]
    pub stderr: bool,
    #[serde(default)]
    pub filter: Option<String>,
}

fn default_database_url() -> String {
    "sqlite://pledge.db".into()
}
fn default_twitter_endpoint() -> String {
    "https://api.twitter.com/".into()
}
fn default_linkedin_endpoint() -> String {
    "https://api.linkedin.com/".into()
}
fn default_box_endpoint() -> String {
    "https://view-api.box.com/".into()
}
fn default_session_minutes() -> u32 {
    60
}
fn default_timeout_secs() -> u64 {
    15
}

/// Environment overrides always arrive as strings; YAML gives native values.
fn native_or_text<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Native(T),
        Text(String),
    }

    match Raw::<T>::deserialize(d)? {
        Raw::Native(v) => Ok(v),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

impl PledgeConfig {
    fn check(&self) -> Result<(), LoadError> {
        if self.database_url.trim().is_empty() {
            return Err(LoadError::Invalid("database_url must not be empty".into()));
        }
        if self.http.timeout_secs == 0 {
            return Err(LoadError::Invalid("http.timeout_secs must be positive".into()));
        }
        if let Some(tw) = &self.twitter {
            if tw.consumer_key.trim().is_empty() || tw.consumer_secret.trim().is_empty() {
                return Err(LoadError::Invalid(
                    "twitter consumer key and secret are both required".into(),
                ));
            }
        }
        if let Some(bx) = &self.box_view {
            if bx.api_token.trim().is_empty() {
                return Err(LoadError::Invalid("box_view.api_token must not be empty".into()));
            }
        }
        Ok(())
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct PledgeConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for PledgeConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PledgeConfigLoader {
    /// Start with no files; `PLEDGE__` env overrides are applied last by [`load`](Self::load).
    ///
    /// ```
    /// use pledge_config::PledgeConfigLoader;
    ///
    /// let config = PledgeConfigLoader::new()
    ///     .with_yaml_str("database_url: 'sqlite::memory:'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.database_url, "sqlite::memory:");
    /// assert!(config.twitter.is_none());
    /// assert_eq!(config.http.timeout_secs, 15);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Like [`with_file`](Self::with_file) but silently skipped when the file is
    /// missing, so deployments can rely purely on environment variables.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// ```
    /// use pledge_config::PledgeConfigLoader;
    ///
    /// unsafe { std::env::set_var("DOC_BOX_TOKEN", "injected-from-env"); }
    ///
    /// let config = PledgeConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// box_view:
    ///   api_token: "${DOC_BOX_TOKEN}"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// let bx = config.box_view.expect("box section");
    /// assert_eq!(bx.api_token, "injected-from-env");
    /// assert_eq!(bx.endpoint, "https://view-api.box.com/");
    /// assert_eq!(bx.session_duration_minutes, 60);
    ///
    /// unsafe { std::env::remove_var("DOC_BOX_TOKEN"); }
    /// ```
    pub fn load(self) -> Result<PledgeConfig, LoadError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: PledgeConfig = serde_json::from_value(v)
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        typed.check()?;

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;

    #[test]
    #[serial]
    fn expands_in_nested_sections() {
        temp_env::with_vars([("CK", Some("key")), ("CS", Some("secret"))], || {
            let mut v = json!({
                "twitter": { "consumer_key": "${CK}", "consumer_secret": "$CS" },
                "ports": ["${CK}-1", 42, true, null]
            });
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!({
                    "twitter": { "consumer_key": "key", "consumer_secret": "secret" },
                    "ports": ["key-1", 42, true, null]
                })
            );
        });
    }

    #[test]
    #[serial]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("TOKEN_BASE", Some("abc")),
                ("TOKEN", Some("t-${TOKEN_BASE}")),
            ],
            || {
                let mut v = json!("Bearer ${TOKEN}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("Bearer t-abc"));
            },
        );
    }

    #[test]
    #[serial]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    #[serial]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${PLEDGE_DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${PLEDGE_DOES_NOT_EXIST}"));
    }

    #[test]
    #[serial]
    fn rejects_zero_timeout() {
        let err = PledgeConfigLoader::new()
            .with_yaml_str("http:\n  timeout_secs: 0")
            .load()
            .unwrap_err();
        assert!(matches!(err, LoadError::Invalid(_)));
    }

    #[test]
    #[serial]
    fn rejects_half_configured_twitter() {
        let err = PledgeConfigLoader::new()
            .with_yaml_str("twitter:\n  consumer_key: 'k'\n  consumer_secret: ''")
            .load()
            .unwrap_err();
        assert!(matches!(err, LoadError::Invalid(_)));
    }
}
