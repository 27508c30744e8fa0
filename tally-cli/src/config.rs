use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tally_core::RuleSet;
use tally_finance::{DEFAULT_IGNORED_CATEGORY, DEFAULT_LOOKBACK_MONTHS, RecurrenceThresholds};

use crate::state::{default_config_path, ensure_tally_home};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder holding the statement CSV exports
    pub statements_dir: PathBuf,
    /// Sort every transaction by date before bucketing, instead of keeping
    /// statement row order
    pub chronological: bool,
    /// Category left out of totals, forecasts and recurring detection
    pub ignored_category: String,
    pub forecast: ForecastSection,
    pub recurring: RecurrenceThresholds,
    pub rules: RuleSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSection {
    /// Number of recent months the estimate draws on
    pub lookback: usize,
}

impl Default for ForecastSection {
    fn default() -> Self {
        Self {
            lookback: DEFAULT_LOOKBACK_MONTHS,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            statements_dir: PathBuf::from("Statements"),
            chronological: false,
            ignored_category: DEFAULT_IGNORED_CATEGORY.to_string(),
            forecast: ForecastSection::default(),
            recurring: RecurrenceThresholds::default(),
            rules: RuleSet::default(),
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Parse config text; JSON when `json` is set, TOML otherwise
pub fn parse_config(s: &str, json: bool) -> Result<Config> {
    if json {
        serde_json::from_str(s).context("parse config JSON")
    } else {
        toml::from_str(s).context("parse config TOML")
    }
}

/// Load the config at `path`, or the default location.
///
/// A missing file at the default location yields the built-in config; a
/// missing file that was asked for explicitly is an error.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let (p, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (default_config_path()?, false),
    };

    if !p.exists() {
        if explicit {
            bail!("config not found: {}", p.display());
        }
        tracing::debug!(path = %p.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    let cfg = parse_config(&s, is_json(&p)).with_context(|| format!("in {}", p.display()))?;
    tracing::debug!(path = %p.display(), "loaded config");
    Ok(cfg)
}

pub fn render_config(cfg: &Config, json: bool) -> Result<String> {
    if json {
        serde_json::to_string_pretty(cfg).context("serialize config")
    } else {
        toml::to_string_pretty(cfg).context("serialize config")
    }
}

pub fn save_config(cfg: &Config, path: &Path) -> Result<()> {
    let s = render_config(cfg, is_json(path))?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write the built-in config, leaving an existing file untouched
pub fn init_config(path: Option<&Path>) -> Result<PathBuf> {
    let p = match path {
        Some(p) => p.to_path_buf(),
        None => ensure_tally_home()?.join("config.toml"),
    };
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(p);
    }
    save_config(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_survives_toml() {
        let cfg = Config::default();
        let text = render_config(&cfg, false).unwrap();
        let back = parse_config(&text, false).unwrap();
        assert_eq!(back, cfg);
        // Rule order is declaration order in the written file
        let tesco = text.find("tesco").unwrap();
        let ocado = text.find("Ocado").unwrap();
        assert!(tesco < ocado);
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let text = r#"
            statements_dir = "/data/bank"
            chronological = true

            [recurring]
            max_stability = 0.25

            [rules.categories]
            Pets = ["(?i)pets at home"]
        "#;
        let cfg = parse_config(text, false).unwrap();
        assert_eq!(cfg.statements_dir, PathBuf::from("/data/bank"));
        assert!(cfg.chronological);
        assert_eq!(cfg.recurring.max_stability, 0.25);
        assert_eq!(cfg.recurring.min_occurrences, 3);
        assert_eq!(cfg.forecast.lookback, DEFAULT_LOOKBACK_MONTHS);
        assert_eq!(cfg.rules.categories.len(), 1);
        assert_eq!(cfg.rules.types, RuleSet::default().types);
    }

    #[test]
    fn test_json_config() {
        let text = r#"{"ignored_category": "Skip", "rules": {"genericTypes": ["Cheque"]}}"#;
        let cfg = parse_config(text, true).unwrap();
        assert_eq!(cfg.ignored_category, "Skip");
        assert_eq!(cfg.rules.generic_types, vec!["Cheque".to_string()]);
        assert_eq!(cfg.rules.rules, RuleSet::default().rules);
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        assert!(parse_config("chronological = \"maybe\"", false).is_err());
    }
}
