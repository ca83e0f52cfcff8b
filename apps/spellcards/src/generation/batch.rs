//! Batch Driver: runs every selected item through import, fit, build and write.
//!
//! Items are processed strictly one after another. A per-item failure is logged and
//! recorded in the report; configuration failures (template, layout) abort the batch.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::document::CardTemplate;
use crate::errors::CardError;
use crate::generation::page_builder::PageBuilder;
use crate::layout::{fit, FontSize, SizeCandidate, DEFAULT_TABLE_ROWS_PER_PAGE};
use crate::models::Item;
use crate::render::{write_document, OutputFormat};
use crate::tables::load_item_tables;

// ────────────────────────────────────────────────────────────────────────────
// Report
// ────────────────────────────────────────────────────────────────────────────

/// One card written to disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedCard {
    pub name: String,
    pub level: u8,
    pub path: PathBuf,
    pub font_size: FontSize,
    pub page_count: usize,
    pub table_count: usize,
}

/// An input row or item that produced no card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardFailure {
    /// Item name, when the row got far enough to have one.
    pub name: Option<String>,
    pub level: Option<u8>,
    /// 1-based input row, for rows rejected during ingestion.
    pub row: Option<usize>,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub generated: Vec<GeneratedCard>,
    pub failures: Vec<CardFailure>,
    /// Names of items whose cards include supplementary tables.
    pub items_with_tables: Vec<String>,
}

impl BatchReport {
    pub fn new() -> Self {
        BatchReport {
            started_at: Utc::now(),
            finished_at: None,
            generated: Vec::new(),
            failures: Vec::new(),
            items_with_tables: Vec::new(),
        }
    }

    /// Records an input row that failed validation before reaching the generator.
    pub fn record_rejected(&mut self, row: usize, err: &CardError) {
        error!("Row {row} rejected: {err}");
        self.failures.push(CardFailure {
            name: None,
            level: None,
            row: Some(row),
            error: err.to_string(),
        });
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn write_json(&self, path: &Path) -> Result<(), CardError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

impl Default for BatchReport {
    fn default() -> Self {
        Self::new()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Generator
// ────────────────────────────────────────────────────────────────────────────

pub struct CardGenerator {
    template: CardTemplate,
    candidates: Vec<SizeCandidate>,
    output_dir: PathBuf,
    tables_dir: PathBuf,
    format: OutputFormat,
    rows_per_page: usize,
}

impl CardGenerator {
    pub fn new(
        template: CardTemplate,
        candidates: Vec<SizeCandidate>,
        output_dir: impl Into<PathBuf>,
        tables_dir: impl Into<PathBuf>,
    ) -> Self {
        CardGenerator {
            template,
            candidates,
            output_dir: output_dir.into(),
            tables_dir: tables_dir.into(),
            format: OutputFormat::default(),
            rows_per_page: DEFAULT_TABLE_ROWS_PER_PAGE,
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_rows_per_page(mut self, rows_per_page: usize) -> Self {
        self.rows_per_page = rows_per_page;
        self
    }

    /// Builds and writes the card for one item.
    pub fn generate(&self, item: &Item) -> Result<GeneratedCard, CardError> {
        let tables = load_item_tables(item, &self.tables_dir)?;
        let plan = fit(&item.description, &self.candidates)?;
        let doc = PageBuilder::new(&self.template, self.rows_per_page).build(item, &plan, &tables)?;

        let path = item.output_path(&self.output_dir, self.format.extension());
        write_document(&doc, self.format, &path)?;

        Ok(GeneratedCard {
            name: item.name.clone(),
            level: item.level,
            path,
            font_size: plan.font_size,
            page_count: doc.page_count(),
            table_count: tables.len(),
        })
    }

    /// Generates every item in order, collecting successes and failures into `report`.
    ///
    /// Returns early with the error when a failure is fatal; cards already written stay
    /// on disk.
    pub fn run_batch(&self, items: &[Item], report: &mut BatchReport) -> Result<(), CardError> {
        let total = items.len();
        for (i, item) in items.iter().enumerate() {
            info!(
                "[{}/{}]: Level {} spell, '{}' - generating...",
                i + 1,
                total,
                item.level,
                item.name
            );
            match self.generate(item) {
                Ok(card) => {
                    info!(
                        "Wrote {} ({} page(s) at {})",
                        card.path.display(),
                        card.page_count,
                        card.font_size
                    );
                    if card.table_count > 0 {
                        report.items_with_tables.push(card.name.clone());
                    }
                    report.generated.push(card);
                }
                Err(err) if err.is_fatal() => {
                    error!("Aborting batch at '{}': {err}", item.name);
                    report.finished_at = Some(Utc::now());
                    return Err(err);
                }
                Err(err) => {
                    error!("Failed to generate '{}': {err}", item.name);
                    report.failures.push(CardFailure {
                        name: Some(item.name.clone()),
                        level: Some(item.level),
                        row: None,
                        error: err.to_string(),
                    });
                }
            }
        }

        report.finished_at = Some(Utc::now());
        info!(
            "Batch finished: {} generated, {} failed",
            report.generated.len(),
            report.failures.len()
        );
        if !report.items_with_tables.is_empty() {
            warn!(
                "The following spells contain tables, check them: {}",
                report.items_with_tables.join(", ")
            );
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
