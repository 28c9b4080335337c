use crate::error::AppError;
use crate::filter::DEFAULT_QUICK_FILTERS;
use crate::session::SessionSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TASKLOG_CONFIG_PATH";

#[derive(Debug, Clone)]
pub struct Palette {
    pub accent: &'static str,
    pub muted: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub fn accentize(&self, text: &str) -> String {
        if self.accent.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", self.accent, text, self.reset)
        }
    }

    pub fn mutedize(&self, text: &str) -> String {
        if self.muted.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", self.muted, text, self.reset)
        }
    }
}

pub fn palette_for_theme(theme: Option<&str>) -> Palette {
    match theme.map(canonical_theme_name).as_deref() {
        Some("noir") => Palette {
            accent: "\x1b[38;5;208m",
            muted: "\x1b[38;5;250m",
            reset: "\x1b[0m",
        },
        Some("solarized") => Palette {
            accent: "\x1b[38;5;108m",
            muted: "\x1b[38;5;250m",
            reset: "\x1b[0m",
        },
        _ => Palette {
            accent: "",
            muted: "",
            reset: "",
        },
    }
}

pub fn canonical_theme_name(raw: &str) -> String {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    match cleaned.trim_matches('_') {
        "" | "vanilla" | "light" => "default".to_string(),
        "dark" | "dark_mode" | "darkmode" => "noir".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default = "default_quick_filters")]
    pub quick_filters: Vec<u32>,
    #[serde(default)]
    pub prompt_preamble: Option<Vec<String>>,
}

fn default_quick_filters() -> Vec<u32> {
    DEFAULT_QUICK_FILTERS.to_vec()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: None,
            quick_filters: default_quick_filters(),
            prompt_preamble: None,
        }
    }
}

impl Config {
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            quick_filters: self.quick_filters.clone(),
            prompt_preamble: self.prompt_preamble.clone(),
        }
    }

    pub fn palette(&self) -> Palette {
        palette_for_theme(self.theme.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<String>,
    pub quick_filters: Option<Vec<u32>>,
    pub prompt_preamble: Option<Vec<String>>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("tasklog")
            .join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("tasklog")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    validate_quick_filters(&config.quick_filters)
        .map_err(|message| AppError::invalid_data(format!("{}: {}", path.display(), message)))?;
    Ok(normalize_config_theme(config))
}

fn validate_quick_filters(days: &[u32]) -> Result<(), String> {
    if days.contains(&0) {
        return Err("quick_filters must be positive day counts".to_string());
    }
    Ok(())
}

fn normalize_config_theme(mut config: Config) -> Config {
    config.theme = config.theme.map(|name| canonical_theme_name(&name));
    config
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(theme) = overrides.theme.as_ref() {
        merged.theme = Some(canonical_theme_name(theme));
    }
    if let Some(days) = overrides.quick_filters.as_ref() {
        merged.quick_filters = days.clone();
    }
    if let Some(preamble) = overrides.prompt_preamble.as_ref() {
        merged.prompt_preamble = Some(preamble.clone());
    }

    merged
}

/// Parses `3,7,30` into day counts.
pub fn parse_quick_filters(raw: &str) -> Result<Vec<u32>, AppError> {
    let days = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u32>()
                .map_err(|_| AppError::invalid_input(format!("invalid day count '{part}'")))
        })
        .collect::<Result<Vec<u32>, AppError>>()?;
    validate_quick_filters(&days).map_err(AppError::invalid_input)?;
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::{
        Config, ConfigOverrides, canonical_theme_name, load_config_from_path,
        load_config_with_fallback_from_path, merge_overrides, palette_for_theme,
        parse_quick_filters,
    };
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("tasklog-{nanos}-{file_name}"))
    }

    #[test]
    fn load_config_missing_returns_defaults_without_error() {
        let path = temp_path("missing-config.json");
        let result = load_config_with_fallback_from_path(&path);

        assert_eq!(result.config, Config::default());
        assert_eq!(result.config.quick_filters, [3, 7, 30]);
        assert!(result.error.is_none());
    }

    #[test]
    fn load_config_invalid_returns_defaults_and_error() {
        let path = temp_path("invalid-config.json");
        fs::write(&path, "{ invalid json ").unwrap();

        let result = load_config_with_fallback_from_path(&path);
        fs::remove_file(&path).ok();

        assert_eq!(result.config, Config::default());
        assert_eq!(result.error.unwrap().code(), "invalid_data");
    }

    #[test]
    fn load_config_rejects_zero_day_preset() {
        let path = temp_path("zero-days.json");
        fs::write(&path, r#"{ "quick_filters": [0, 7] }"#).unwrap();

        let err = load_config_from_path(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn load_config_reads_valid_file() {
        let path = temp_path("valid-config.json");
        let content = serde_json::json!({
            "theme": "Dark Mode",
            "quick_filters": [1, 14],
            "prompt_preamble": ["Polish this weekly report."]
        });
        fs::write(&path, serde_json::to_string(&content).unwrap()).unwrap();

        let loaded = load_config_from_path(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.theme.as_deref(), Some("noir"));
        assert_eq!(loaded.quick_filters, [1, 14]);
        let settings = loaded.session_settings();
        assert_eq!(
            settings.prompt_preamble,
            Some(vec!["Polish this weekly report.".to_string()])
        );
    }

    #[test]
    fn merge_overrides_replaces_only_given_fields() {
        let base = Config {
            theme: Some("default".into()),
            quick_filters: vec![3, 7, 30],
            prompt_preamble: Some(vec!["base".into()]),
        };
        let overrides = ConfigOverrides {
            theme: Some("Solarized".into()),
            quick_filters: Some(vec![5]),
            prompt_preamble: None,
        };

        let merged = merge_overrides(&base, &overrides);

        assert_eq!(merged.theme.as_deref(), Some("solarized"));
        assert_eq!(merged.quick_filters, [5]);
        assert_eq!(merged.prompt_preamble, base.prompt_preamble);
        assert_eq!(base.quick_filters, [3, 7, 30]);
    }

    #[test]
    fn merge_overrides_with_empty_overrides_returns_clone() {
        let base = Config::default();
        assert_eq!(merge_overrides(&base, &ConfigOverrides::default()), base);
    }

    #[test]
    fn canonical_theme_name_maps_variants() {
        assert_eq!(canonical_theme_name("Vanilla"), "default");
        assert_eq!(canonical_theme_name("Noir"), "noir");
        assert_eq!(canonical_theme_name("dark-mode"), "noir");
        assert_eq!(canonical_theme_name("  "), "default");
    }

    #[test]
    fn palette_for_theme_returns_palette() {
        assert!(palette_for_theme(Some("vanilla")).accent.is_empty());
        assert_eq!(palette_for_theme(Some("noir")).accent, "\x1b[38;5;208m");
        assert!(palette_for_theme(Some("oceanic")).accent.is_empty());
        assert!(palette_for_theme(None).accent.is_empty());
    }

    #[test]
    fn parse_quick_filters_reads_comma_list() {
        assert_eq!(parse_quick_filters("3, 7,30").unwrap(), [3, 7, 30]);
        assert_eq!(parse_quick_filters("7,x").unwrap_err().code(), "invalid_input");
        assert_eq!(parse_quick_filters("0").unwrap_err().code(), "invalid_input");
    }
}
