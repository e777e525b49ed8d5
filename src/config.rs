use crate::checker::body::BodyFormat;
use crate::checker::response::OffsetEncoding;
use crate::checker::{CheckerClient, DEFAULT_SERVER};
use crate::session::SessionOptions;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_server", alias = "url")]
    pub server: String,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    #[serde(default = "default_loop_guard_ms")]
    pub loop_guard_ms: u64,

    #[serde(default)]
    pub show_loading_indicator: bool,

    #[serde(default = "default_true")]
    pub disable_native_spellcheck: bool,

    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    #[serde(default = "default_true")]
    pub require_replacements: bool,

    #[serde(default = "default_method")]
    pub method: String,

    #[serde(default)]
    pub body_format: BodyFormat,

    #[serde(default)]
    pub offset_encoding: OffsetEncoding,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Provider-specific fields sent with every request, e.g. `disabledCategories`.
    #[serde(default)]
    pub api_options: BTreeMap<String, String>,
}

fn default_server() -> String {
    DEFAULT_SERVER.to_string()
}

fn default_language() -> String {
    "auto".to_string()
}

fn default_cooldown_ms() -> u64 {
    3000
}

fn default_loop_guard_ms() -> u64 {
    100
}

fn default_max_suggestions() -> usize {
    3
}

fn default_method() -> String {
    "POST".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: default_server(),
            language: default_language(),
            cooldown_ms: default_cooldown_ms(),
            loop_guard_ms: default_loop_guard_ms(),
            show_loading_indicator: false,
            disable_native_spellcheck: true,
            max_suggestions: default_max_suggestions(),
            require_replacements: true,
            method: default_method(),
            body_format: BodyFormat::default(),
            offset_encoding: OffsetEncoding::default(),
            headers: BTreeMap::new(),
            api_options: BTreeMap::new(),
        }
    }
}

/// One config file as written: only the keys it sets.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConfigLayer {
    #[serde(alias = "url")]
    pub server: Option<String>,
    pub language: Option<String>,
    pub cooldown_ms: Option<u64>,
    pub loop_guard_ms: Option<u64>,
    pub show_loading_indicator: Option<bool>,
    pub disable_native_spellcheck: Option<bool>,
    pub max_suggestions: Option<usize>,
    pub require_replacements: Option<bool>,
    pub method: Option<String>,
    pub body_format: Option<BodyFormat>,
    pub offset_encoding: Option<OffsetEncoding>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub api_options: BTreeMap<String, String>,
}

impl ConfigLayer {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

impl Config {
    /// Load configuration with priority: CLI args > local config > global config > defaults
    pub fn load(language: Option<String>, server: Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                config = config.merge(ConfigLayer::from_file(&global_path)?);
            }
        }

        let local_path = PathBuf::from(".spellmark.toml");
        if local_path.exists() {
            config = config.merge(ConfigLayer::from_file(&local_path)?);
        }

        if let Some(language) = language {
            config.language = language;
        }
        if let Some(server) = server {
            config.server = server;
        }

        Ok(config)
    }

    /// A single file layered over the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::default().merge(ConfigLayer::from_file(path)?))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Keys set in `layer` win; header and option maps are extended.
    fn merge(mut self, layer: ConfigLayer) -> Self {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }

        set(&mut self.server, layer.server);
        set(&mut self.language, layer.language);
        set(&mut self.cooldown_ms, layer.cooldown_ms);
        set(&mut self.loop_guard_ms, layer.loop_guard_ms);
        set(&mut self.show_loading_indicator, layer.show_loading_indicator);
        set(&mut self.disable_native_spellcheck, layer.disable_native_spellcheck);
        set(&mut self.max_suggestions, layer.max_suggestions);
        set(&mut self.require_replacements, layer.require_replacements);
        set(&mut self.method, layer.method);
        set(&mut self.body_format, layer.body_format);
        set(&mut self.offset_encoding, layer.offset_encoding);
        self.headers.extend(layer.headers);
        self.api_options.extend(layer.api_options);
        self
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            cooldown: Duration::from_millis(self.cooldown_ms),
            loop_guard: Duration::from_millis(self.loop_guard_ms),
            show_loading_indicator: self.show_loading_indicator,
            disable_native_spellcheck: self.disable_native_spellcheck,
            max_suggestions: self.max_suggestions,
        }
    }

    /// A client talking to the configured server over HTTP.
    pub fn client(&self) -> CheckerClient {
        let mut client = CheckerClient::new(self.server.clone())
            .language(self.language.clone())
            .method(self.method.clone())
            .serializer(self.body_format.serializer())
            .offset_encoding(self.offset_encoding)
            .require_replacements(self.require_replacements);
        for (name, value) in &self.headers {
            client = client.header(name.clone(), value.clone());
        }
        for (name, value) in &self.api_options {
            client = client.option(name.clone(), value.clone());
        }
        client
    }

    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "spellmark").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.language, "auto");
        assert_eq!(config.cooldown_ms, 3000);
        assert_eq!(config.loop_guard_ms, 100);
        assert_eq!(config.max_suggestions, 3);
        assert!(config.disable_native_spellcheck);
        assert!(!config.show_loading_indicator);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
url = "http://localhost:8081/v2/check"
language = "de-DE"
body_format = "json"

[api_options]
disabledCategories = "TYPOGRAPHY"
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.server, "http://localhost:8081/v2/check");
        assert_eq!(config.language, "de-DE");
        assert_eq!(config.body_format, BodyFormat::Json);
        assert_eq!(config.cooldown_ms, 3000);
        assert_eq!(config.api_options["disabledCategories"], "TYPOGRAPHY");
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "cooldown_ms = \"soon\"").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_merge_configs() {
        let layer = ConfigLayer {
            language: Some("en-GB".to_string()),
            cooldown_ms: Some(1000),
            show_loading_indicator: Some(true),
            ..Default::default()
        };

        let merged = Config::default().merge(layer);
        assert_eq!(merged.language, "en-GB");
        assert_eq!(merged.cooldown_ms, 1000);
        assert_eq!(merged.server, DEFAULT_SERVER);
        assert!(merged.show_loading_indicator);
    }

    #[test]
    fn test_local_layer_keeps_unset_global_values() {
        let dir = tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let local = dir.path().join("local.toml");
        fs::write(
            &global,
            "show_loading_indicator = true\nrequire_replacements = false\nlanguage = \"fr\"\n",
        )
        .unwrap();
        fs::write(&local, "language = \"de-DE\"\ndisable_native_spellcheck = false\n").unwrap();

        let config = Config::default()
            .merge(ConfigLayer::from_file(&global).unwrap())
            .merge(ConfigLayer::from_file(&local).unwrap());
        assert!(config.show_loading_indicator);
        assert!(!config.require_replacements);
        assert!(!config.disable_native_spellcheck);
        assert_eq!(config.language, "de-DE");
    }

    #[test]
    fn test_local_layer_can_restore_default_value() {
        let global = ConfigLayer {
            language: Some("fr".to_string()),
            show_loading_indicator: Some(true),
            ..Default::default()
        };
        let local = ConfigLayer {
            language: Some("auto".to_string()),
            show_loading_indicator: Some(false),
            ..Default::default()
        };

        let config = Config::default().merge(global).merge(local);
        assert_eq!(config.language, "auto");
        assert!(!config.show_loading_indicator);
    }

    #[test]
    fn test_session_options_and_toml_round_trip() {
        let config = Config {
            cooldown_ms: 1500,
            ..Default::default()
        };
        let options = config.session_options();
        assert_eq!(options.cooldown, Duration::from_millis(1500));
        assert_eq!(options.loop_guard, Duration::from_millis(100));

        let parsed: Config = toml::from_str(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_client_from_config() {
        let mut config = Config {
            server: "http://localhost:8081/v2/check".to_string(),
            language: "en-US".to_string(),
            ..Default::default()
        };
        config
            .api_options
            .insert("level".to_string(), "picky".to_string());

        let request = config.client().build_request("hello");
        assert_eq!(request.url, "http://localhost:8081/v2/check");
        assert_eq!(
            String::from_utf8(request.body).unwrap(),
            "text=hello&language=en-US&level=picky"
        );
    }
}
