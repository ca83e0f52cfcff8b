use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::document::CardTemplate;
use crate::layout::{
    candidates_from_json, default_candidates, SizeCandidate, DEFAULT_TABLE_ROWS_PER_PAGE,
};

/// Runtime configuration loaded from environment variables (and `.env`).
/// CLI flags override these values.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub output_dir: PathBuf,
    pub tables_dir: PathBuf,
    /// Custom card template; the built-in one when unset.
    pub template_path: Option<PathBuf>,
    /// Custom line-limit table; the built-in one when unset.
    pub line_limits_path: Option<PathBuf>,
    pub table_rows_per_page: usize,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let table_rows_per_page = match var("CARDS_TABLE_ROWS_PER_PAGE") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .context("CARDS_TABLE_ROWS_PER_PAGE must be a positive integer")?,
            None => DEFAULT_TABLE_ROWS_PER_PAGE,
        };
        if table_rows_per_page == 0 {
            bail!("CARDS_TABLE_ROWS_PER_PAGE must be a positive integer");
        }

        Ok(Config {
            output_dir: var("CARDS_OUTPUT_DIR")
                .unwrap_or_else(|| "output/cards".to_string())
                .into(),
            tables_dir: var("CARDS_TABLES_DIR")
                .unwrap_or_else(|| "resources/tables".to_string())
                .into(),
            template_path: var("CARDS_TEMPLATE").map(PathBuf::from),
            line_limits_path: var("CARDS_LINE_LIMITS").map(PathBuf::from),
            table_rows_per_page,
            rust_log: var("CARDS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn load_template(&self) -> Result<CardTemplate> {
        match &self.template_path {
            Some(path) => CardTemplate::load(path)
                .with_context(|| format!("Failed to load template from {}", path.display())),
            None => CardTemplate::built_in().context("Built-in template is invalid"),
        }
    }

    pub fn load_candidates(&self) -> Result<Vec<SizeCandidate>> {
        let Some(path) = &self.line_limits_path else {
            return Ok(default_candidates());
        };
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read line limits from {}", path.display()))?;
        candidates_from_json(&json)
            .with_context(|| format!("Invalid line limits in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::layout::FontSize;

    fn config_with(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_with(&[]).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("output/cards"));
        assert_eq!(config.tables_dir, PathBuf::from("resources/tables"));
        assert_eq!(config.template_path, None);
        assert_eq!(config.table_rows_per_page, 19);
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_values_read_from_lookup() {
        let config = config_with(&[
            ("CARDS_OUTPUT_DIR", "/tmp/cards"),
            ("CARDS_TABLE_ROWS_PER_PAGE", " 12 "),
            ("CARDS_LOG_LEVEL", "debug"),
            ("CARDS_TEMPLATE", "my_template.json"),
        ])
        .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/cards"));
        assert_eq!(config.table_rows_per_page, 12);
        assert_eq!(config.rust_log, "debug");
        assert_eq!(config.template_path, Some(PathBuf::from("my_template.json")));
    }

    #[test]
    fn test_invalid_row_budget_is_an_error() {
        assert!(config_with(&[("CARDS_TABLE_ROWS_PER_PAGE", "many")]).is_err());
        assert!(config_with(&[("CARDS_TABLE_ROWS_PER_PAGE", "0")]).is_err());
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = config_with(&[("CARDS_OUTPUT_DIR", "  ")]).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("output/cards"));
    }

    // ── Resource loading ────────────────────────────────────────────────────

    #[test]
    fn test_line_limits_loaded_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("limits.json");
        std::fs::write(
            &path,
            r#"{"8": [10, 20, 50], "7": [12, 24, 52], "6.5": [14, 28, 54]}"#,
        )
        .unwrap();
        let config = config_with(&[("CARDS_LINE_LIMITS", path.to_str().unwrap())]).unwrap();

        let candidates = config.load_candidates().unwrap();
        assert_eq!(candidates[0].size, FontSize::Large);
        assert_eq!(candidates[0].first_page_lines, 10);
        assert_eq!(candidates[2].chars_per_line, 54);
    }

    #[test]
    fn test_missing_template_file_is_an_error() {
        let config = config_with(&[("CARDS_TEMPLATE", "/definitely/not/here.json")]).unwrap();
        assert!(config.load_template().is_err());
        assert!(config_with(&[]).unwrap().load_template().is_ok());
    }
}
