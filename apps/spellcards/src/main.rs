mod config;
mod document;
mod errors;
mod generation;
mod layout;
mod markup;
mod models;
mod render;
mod tables;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::document::CardTemplate;
use crate::generation::{BatchReport, CardGenerator};
use crate::models::filter::CardFilter;
use crate::models::record::load_records;
use crate::render::OutputFormat;

#[derive(Parser)]
#[command(name = "spellcards", version, about = "Printable spell cards from a spell spreadsheet")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate cards for the selected spells
    Generate {
        /// JSON array of spreadsheet rows
        #[arg(short, long)]
        input: PathBuf,

        /// Root directory for generated cards (overrides CARDS_OUTPUT_DIR)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Comma-separated classes; a spell matches if any class can learn it
        #[arg(short, long)]
        classes: Option<String>,

        /// Comma-separated spell levels, 0-9
        #[arg(short, long)]
        levels: Option<String>,

        /// Only report how many cards would be generated
        #[arg(long)]
        preview: bool,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Docx)]
        format: OutputFormat,

        /// Directory holding `<spell>_table_<n>.html` files (overrides CARDS_TABLES_DIR)
        #[arg(long)]
        tables_dir: Option<PathBuf>,

        /// Custom JSON card template (overrides CARDS_TEMPLATE)
        #[arg(long)]
        template: Option<PathBuf>,

        /// Write a JSON batch report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print the built-in card template as JSON
    Template {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Generate {
            input,
            output_dir,
            classes,
            levels,
            preview,
            format,
            tables_dir,
            template,
            report,
        } => {
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if let Some(dir) = tables_dir {
                config.tables_dir = dir;
            }
            if template.is_some() {
                config.template_path = template;
            }
            let filter = CardFilter::from_args(classes.as_deref(), levels.as_deref());
            generate(&config, &input, &filter, preview, format, report)
        }
        Commands::Template { output } => {
            let json = CardTemplate::built_in()?.to_json_pretty()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Wrote template to {}", path.display());
                }
                None => println!("{json}"),
            }
            Ok(())
        }
    }
}

fn generate(
    config: &Config,
    input: &Path,
    filter: &CardFilter,
    preview: bool,
    format: OutputFormat,
    report_path: Option<PathBuf>,
) -> Result<()> {
    info!("spellcards v{} reading {}", env!("CARGO_PKG_VERSION"), input.display());

    let rows = load_records(input)
        .with_context(|| format!("Failed to read spell rows from {}", input.display()))?;
    let mut report = BatchReport::new();
    let selection = filter.select(rows);
    for (row, err) in &selection.rejected {
        report.record_rejected(*row, err);
    }
    let items = selection.items;

    if preview {
        info!(
            "Preview: {} card(s) would be generated, {} selected row(s) rejected",
            items.len(),
            report.failures.len()
        );
        return Ok(());
    }
    if items.is_empty() && !report.has_failures() {
        warn!("No spells selected; nothing to generate");
        return Ok(());
    }

    let generator = CardGenerator::new(
        config.load_template()?,
        config.load_candidates()?,
        &config.output_dir,
        &config.tables_dir,
    )
    .with_format(format)
    .with_rows_per_page(config.table_rows_per_page);

    let outcome = generator.run_batch(&items, &mut report);

    if let Some(path) = report_path {
        report
            .write_json(&path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!("Batch report written to {}", path.display());
    }

    outcome.context("Batch aborted")?;
    if report.has_failures() {
        bail!("{} card(s) could not be generated", report.failures.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIGHT_ROW: &str = r#"{
        "Spell Name": "Light", "Level": 0, "School": "Evocation", "Range": "Touch",
        "Duration": "1 hour", "Casting Time": "1 action", "Description": "Glow.",
        "Wizard": "Yes", "Generate Card": true
    }"#;

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.output_dir = dir.join("cards");
        config.tables_dir = dir.join("tables");
        config
    }

    fn write_rows(dir: &Path, rows: &str) -> PathBuf {
        let path = dir.join("spells.json");
        std::fs::write(&path, rows).unwrap();
        path
    }

    // ── Row selection ───────────────────────────────────────────────────────

    #[test]
    fn test_unselected_incomplete_row_does_not_fail_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let input = write_rows(
            dir.path(),
            &format!(r#"[{LIGHT_ROW}, {{"Spell Name": "Draft", "Generate Card": false}}]"#),
        );
        let report_path = dir.path().join("report.json");

        generate(
            &config,
            &input,
            &CardFilter::default(),
            false,
            OutputFormat::Json,
            Some(report_path.clone()),
        )
        .unwrap();

        assert!(config.output_dir.join("level_0").join("Light.json").is_file());
        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(report_path).unwrap()).unwrap();
        assert_eq!(report["failures"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_selected_incomplete_row_is_reported_even_when_nothing_else_is_selected() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let input = write_rows(dir.path(), r#"[{"Spell Name": "Half Done", "Generate Card": true}]"#);
        let report_path = dir.path().join("report.json");

        let result = generate(
            &config,
            &input,
            &CardFilter::default(),
            false,
            OutputFormat::Json,
            Some(report_path.clone()),
        );

        assert!(result.is_err());
        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(report_path).unwrap()).unwrap();
        let failures = report["failures"].as_array().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0]["row"], 1);
    }
}
