//! Row selection for the CLI.
//!
//! Classes are OR-ed together, levels are OR-ed together, and the two groups are AND-ed.
//! Without either filter the spreadsheet's "Generate Card" column decides.
//!
//! Selection runs on the raw row keys, before validation, so an incomplete row that is
//! not selected never counts as a failure.

use tracing::error;

use crate::errors::CardError;
use crate::models::item::{Item, CLASSES};
use crate::models::record::{IngestedRow, RowKeys};

/// The fields a [`CardFilter`] looks at.
pub trait Selectable {
    fn generate(&self) -> bool;
    fn level(&self) -> Option<u8>;
    fn supports(&self, class_name: &str) -> bool;
}

impl Selectable for Item {
    fn generate(&self) -> bool {
        self.generate
    }

    fn level(&self) -> Option<u8> {
        Some(self.level)
    }

    fn supports(&self, class_name: &str) -> bool {
        self.applicability(class_name).is_some()
    }
}

impl Selectable for RowKeys {
    fn generate(&self) -> bool {
        self.generate
    }

    fn level(&self) -> Option<u8> {
        self.level
    }

    fn supports(&self, class_name: &str) -> bool {
        self.classes.contains_key(class_name)
    }
}

/// Rows picked by a filter: the valid items, and the selected rows that failed validation
/// with their 1-based row numbers.
#[derive(Debug, Default)]
pub struct Selection {
    pub items: Vec<Item>,
    pub rejected: Vec<(usize, CardError)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardFilter {
    /// `None` when no valid class was supplied.
    pub classes: Option<Vec<String>>,
    /// `None` when no valid level was supplied.
    pub levels: Option<Vec<u8>>,
}

impl CardFilter {
    /// Builds a filter from the comma-separated CLI arguments. Unknown classes and
    /// out-of-range levels are logged and skipped.
    pub fn from_args(classes: Option<&str>, levels: Option<&str>) -> Self {
        CardFilter {
            classes: classes.and_then(parse_classes),
            levels: levels.and_then(parse_levels),
        }
    }

    pub fn is_active(&self) -> bool {
        self.classes.is_some() || self.levels.is_some()
    }

    pub fn matches(&self, row: &impl Selectable) -> bool {
        if !self.is_active() {
            return row.generate();
        }
        let class_ok = self
            .classes
            .as_ref()
            .map_or(true, |classes| classes.iter().any(|c| row.supports(c)));
        let level_ok = self.levels.as_ref().map_or(true, |levels| {
            row.level().is_some_and(|level| levels.contains(&level))
        });
        class_ok && level_ok
    }

    /// Keeps the selected rows. Rows outside the selection are dropped whether or not
    /// they would validate.
    pub fn select(&self, rows: Vec<IngestedRow>) -> Selection {
        let mut selection = Selection::default();
        for row in rows.into_iter().filter(|row| self.matches(&row.keys)) {
            match row.item {
                Ok(item) => selection.items.push(item),
                Err(err) => selection.rejected.push((row.row, err)),
            }
        }
        selection
    }
}

/// "wIZard" → "Wizard"
fn capitalize(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn parse_classes(raw: &str) -> Option<Vec<String>> {
    let mut valid = Vec::new();
    for class in raw.split(',').map(capitalize).filter(|c| !c.is_empty()) {
        if CLASSES.contains(&class.as_str()) {
            valid.push(class);
        } else {
            error!(
                "Class '{class}' could not be parsed. Skipping. Available classes are: {}",
                CLASSES.join(", ")
            );
        }
    }
    (!valid.is_empty()).then_some(valid)
}

fn parse_levels(raw: &str) -> Option<Vec<u8>> {
    let mut valid = Vec::new();
    for level in raw.split(',').map(str::trim).filter(|l| !l.is_empty()) {
        match level.parse::<u8>() {
            Ok(n) if n <= 9 => valid.push(n),
            _ => error!(
                "Level '{level}' could not be parsed. Levels must be 0-9, inclusive. Skipping"
            ),
        }
    }
    (!valid.is_empty()).then_some(valid)
}
