//! Spreadsheet row ingestion.
//!
//! Rows arrive as JSON objects keyed by the spreadsheet's column headers. Cells may be
//! strings, numbers, booleans or null depending on how the sheet was exported, so each
//! column is read as a loose [`Cell`] and validated into a typed [`Item`] here, at the
//! ingestion boundary.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::errors::CardError;
use crate::models::item::{Applicability, Item, Requirements, School, CLASSES};

/// A single loosely-typed spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl Cell {
    /// Text content, `None` for blank, null or `nan` cells.
    pub fn text(&self) -> Option<String> {
        let value = match self {
            Cell::Null => return None,
            Cell::Bool(b) => b.to_string(),
            Cell::Int(n) => n.to_string(),
            Cell::Float(f) if f.is_nan() => return None,
            Cell::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
            Cell::Float(f) => f.to_string(),
            Cell::Text(s) => s.trim().to_string(),
        };
        if value.is_empty() || value.eq_ignore_ascii_case("nan") {
            None
        } else {
            Some(value)
        }
    }

    fn flag(&self, field: &'static str) -> Result<bool, CardError> {
        match self {
            Cell::Null => Ok(false),
            Cell::Bool(b) => Ok(*b),
            Cell::Int(n) => Ok(*n != 0),
            Cell::Float(f) => Ok(!f.is_nan() && *f != 0.0),
            Cell::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "x" | "1" => Ok(true),
                "false" | "no" | "n" | "0" | "" | "nan" => Ok(false),
                _ => Err(CardError::InvalidField {
                    field,
                    value: s.clone(),
                }),
            },
        }
    }
}

/// One input row as exported from the spell spreadsheet.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpellRecord {
    #[serde(rename = "Spell Name")]
    pub spell_name: Option<Cell>,
    #[serde(rename = "Level")]
    pub level: Option<Cell>,
    #[serde(rename = "School")]
    pub school: Option<Cell>,
    #[serde(rename = "Range")]
    pub range: Option<Cell>,
    #[serde(rename = "Duration")]
    pub duration: Option<Cell>,
    #[serde(rename = "Casting Time")]
    pub casting_time: Option<Cell>,
    #[serde(rename = "Concentration")]
    pub concentration: Option<Cell>,
    #[serde(rename = "Ritual")]
    pub ritual: Option<Cell>,
    #[serde(rename = "Verbal")]
    pub verbal: Option<Cell>,
    #[serde(rename = "Somatic")]
    pub somatic: Option<Cell>,
    #[serde(rename = "Material")]
    pub material: Option<Cell>,
    #[serde(rename = "Has Tables")]
    pub has_tables: Option<Cell>,
    #[serde(rename = "Material Component")]
    pub material_component: Option<Cell>,
    #[serde(rename = "Description")]
    pub description: Option<Cell>,
    #[serde(rename = "Blurb")]
    pub blurb: Option<Cell>,
    #[serde(rename = "Source")]
    pub source: Option<Cell>,
    #[serde(rename = "Generate Card")]
    pub generate_card: Option<Cell>,
    /// Remaining columns, including one per class.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Cell>,
}

fn required(cell: &Option<Cell>, field: &'static str) -> Result<String, CardError> {
    cell.as_ref()
        .and_then(Cell::text)
        .ok_or(CardError::MissingField { field })
}

fn optional(cell: &Option<Cell>) -> Option<String> {
    cell.as_ref().and_then(Cell::text)
}

fn flag(cell: &Option<Cell>, field: &'static str) -> Result<bool, CardError> {
    cell.as_ref().map_or(Ok(false), |c| c.flag(field))
}

fn parse_level(raw: &str) -> Result<u8, CardError> {
    raw.parse::<u8>()
        .ok()
        .filter(|level| *level <= 9)
        .ok_or_else(|| CardError::InvalidField {
            field: "Level",
            value: raw.to_string(),
        })
}

/// Splits the `|`-delimited description column into paragraphs, dropping blank ones.
pub fn split_description(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(str::to_string)
        .collect()
}

/// The columns row selection reads. They are parsed leniently so that a row the user
/// did not select never has to pass full validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowKeys {
    pub generate: bool,
    /// `None` when the level cell is missing or unreadable.
    pub level: Option<u8>,
    pub classes: BTreeMap<String, Applicability>,
}

impl SpellRecord {
    fn class_applicability(&self) -> BTreeMap<String, Applicability> {
        CLASSES
            .iter()
            .filter_map(|class| {
                let cell = self.extra.get(*class)?.text()?;
                Applicability::from_cell(&cell).map(|app| (class.to_string(), app))
            })
            .collect()
    }

    pub fn row_keys(&self) -> RowKeys {
        RowKeys {
            // A garbled flag keeps the row selected so its validation error is reported.
            generate: flag(&self.generate_card, "Generate Card").unwrap_or(true),
            level: optional(&self.level).and_then(|raw| parse_level(&raw).ok()),
            classes: self.class_applicability(),
        }
    }
}

impl TryFrom<SpellRecord> for Item {
    type Error = CardError;

    fn try_from(record: SpellRecord) -> Result<Self, Self::Error> {
        let name = required(&record.spell_name, "Spell Name")?;
        let level = parse_level(&required(&record.level, "Level")?)?;
        let school_name = required(&record.school, "School")?;
        let school = School::from_name(&school_name);
        if school.is_none() {
            warn!(spell = %name, school = %school_name, "Unknown school, using neutral color");
        }

        let description = split_description(&required(&record.description, "Description")?);
        if description.is_empty() {
            return Err(CardError::MissingField {
                field: "Description",
            });
        }

        let classes = record.class_applicability();

        Ok(Item {
            level,
            school,
            school_name,
            range: required(&record.range, "Range")?,
            duration: required(&record.duration, "Duration")?,
            casting_time: required(&record.casting_time, "Casting Time")?,
            requirements: Requirements {
                concentration: flag(&record.concentration, "Concentration")?,
                ritual: flag(&record.ritual, "Ritual")?,
                verbal: flag(&record.verbal, "Verbal")?,
                somatic: flag(&record.somatic, "Somatic")?,
                material: flag(&record.material, "Material")?,
            },
            has_tables: flag(&record.has_tables, "Has Tables")?,
            classes,
            description,
            material_component: optional(&record.material_component),
            blurb: optional(&record.blurb),
            source: optional(&record.source),
            generate: flag(&record.generate_card, "Generate Card")?,
            name,
        })
    }
}

/// A row after validation, keeping its position for error reporting.
#[derive(Debug)]
pub struct IngestedRow {
    /// 1-based row number within the input file.
    pub row: usize,
    pub keys: RowKeys,
    pub item: Result<Item, CardError>,
}

/// Parses a JSON array of spreadsheet rows. Each row is validated independently.
pub fn parse_records(json: &str) -> Result<Vec<IngestedRow>, CardError> {
    let records: Vec<SpellRecord> = serde_json::from_str(json)?;
    Ok(records
        .into_iter()
        .enumerate()
        .map(|(i, record)| IngestedRow {
            row: i + 1,
            keys: record.row_keys(),
            item: Item::try_from(record),
        })
        .collect())
}

pub fn load_records(path: &Path) -> Result<Vec<IngestedRow>, CardError> {
    let json = std::fs::read_to_string(path)?;
    parse_records(&json)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
