//! In-memory page model for one card document.
//!
//! A [`PageDocument`] is an ordered list of page sections. Each section is a stack of
//! tagged regions (one bordered, optionally filled box per region) holding paragraphs
//! and tables. The page builder only mutates documents through [`DocumentModel`] plus
//! direct access to a region's blocks; writers in `render` read the model as-is.

pub mod template;

use serde::{Deserialize, Serialize};

use crate::errors::CardError;
use crate::models::HexColor;

pub use template::CardTemplate;

// ────────────────────────────────────────────────────────────────────────────
// Inline content
// ────────────────────────────────────────────────────────────────────────────

/// A piece of text with direct formatting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<HexColor>,
    /// Font size in half-points; `None` inherits the document default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Run {
    pub fn text(text: impl Into<String>) -> Self {
        Run {
            text: text.into(),
            ..Run::default()
        }
    }

    /// A copy of this run's formatting carrying different text.
    pub fn restyled(&self, text: impl Into<String>) -> Self {
        Run {
            text: text.into(),
            ..self.clone()
        }
    }
}

/// Paragraph-level presentation, mapped to fonts and sizes by the writers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphStyle {
    /// Formatting comes from the template's runs.
    #[default]
    Template,
    /// Body text of a card description.
    Description,
    /// Blank separator between description blocks and before tables.
    Spacer,
    /// Text inside a supplementary table.
    TableText,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub runs: Vec<Run>,
    #[serde(default)]
    pub style: ParagraphStyle,
    #[serde(default)]
    pub align: Alignment,
}

impl Paragraph {
    pub fn new(runs: Vec<Run>, style: ParagraphStyle) -> Self {
        Paragraph {
            runs,
            style,
            align: Alignment::Left,
        }
    }

    pub fn spacer() -> Self {
        Paragraph::new(Vec::new(), ParagraphStyle::Spacer)
    }

    /// True when no run carries visible text.
    pub fn is_blank(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tables
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub runs: Vec<Run>,
    /// Grid columns merged into this cell, at least 1.
    pub col_span: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<HexColor>,
}

/// A supplementary table placed inside a region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub cols: usize,
    /// Total width in twips.
    pub width: u32,
    /// Each row's cells; covered grid positions have no entry.
    pub rows: Vec<Vec<TableCell>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

impl Block {
    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Regions and sections
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Top,
    Left,
    Bottom,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorderEdge {
    pub side: Side,
    pub color: HexColor,
    /// Line width in eighths of a point.
    #[serde(default = "default_border_size")]
    pub size: u32,
}

fn default_border_size() -> u32 {
    8
}

/// A tagged box on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub tag: String,
    /// Bold caption printed ahead of the region's text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Fixed row height in twips.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<HexColor>,
    #[serde(default)]
    pub borders: Vec<BorderEdge>,
    /// Dropped from the finished card when left without text.
    #[serde(default)]
    pub removable: bool,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Region {
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.blocks
            .iter()
            .filter_map(Block::as_paragraph)
            .flat_map(|p| p.runs.iter())
    }

    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut Run> {
        self.blocks
            .iter_mut()
            .filter_map(|block| match block {
                Block::Paragraph(p) => Some(p),
                Block::Table(_) => None,
            })
            .flat_map(|p| p.runs.iter_mut())
    }

    /// True when the region holds no table and no visible text.
    pub fn is_blank(&self) -> bool {
        self.blocks.iter().all(|block| match block {
            Block::Paragraph(p) => p.is_blank(),
            Block::Table(_) => false,
        })
    }

    pub fn push_paragraph(&mut self, paragraph: Paragraph) {
        self.blocks.push(Block::Paragraph(paragraph));
    }

    pub fn push_table(&mut self, table: Table) {
        self.blocks.push(Block::Table(table));
    }
}

/// One printed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Template page this section was instantiated from.
    pub name: String,
    pub regions: Vec<Region>,
}

/// Card page size and margins, in twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    /// Width available to supplementary tables.
    pub table_width: u32,
}

impl PageGeometry {
    pub fn content_width(&self) -> u32 {
        self.width.saturating_sub(2 * self.margin)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDocument {
    pub title: String,
    pub geometry: PageGeometry,
    pub sections: Vec<Section>,
}

/// Address of one region within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionHandle {
    pub section: usize,
    pub region: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Mutation interface
// ────────────────────────────────────────────────────────────────────────────

/// Structural edits the page builder performs on a template instance.
pub trait DocumentModel {
    /// First region tagged `tag` in `section`.
    fn find_region(&self, section: usize, tag: &str) -> Option<RegionHandle>;

    /// Appends a copy of `section` after the last page and returns its index.
    fn clone_section(&mut self, section: usize) -> Result<usize, CardError>;

    /// Replaces the region's text, keeping the formatting of its first run.
    fn set_text(&mut self, region: RegionHandle, value: &str) -> Result<(), CardError>;

    /// Sets the color of every border edge of the region, and its fill if it has one.
    fn set_color(&mut self, region: RegionHandle, color: &HexColor) -> Result<(), CardError>;

    fn remove_region(&mut self, region: RegionHandle) -> Result<(), CardError>;

    fn remove_section(&mut self, section: usize) -> Result<(), CardError>;

    /// Rewrites every fill, border and run color equal to `from`. Returns the number of
    /// rewritten values.
    fn replace_color(&mut self, from: &HexColor, to: &HexColor) -> usize;
}

impl PageDocument {
    pub fn region(&self, handle: RegionHandle) -> Result<&Region, CardError> {
        self.sections
            .get(handle.section)
            .and_then(|s| s.regions.get(handle.region))
            .ok_or_else(|| missing_region(handle))
    }

    pub fn region_mut(&mut self, handle: RegionHandle) -> Result<&mut Region, CardError> {
        self.sections
            .get_mut(handle.section)
            .and_then(|s| s.regions.get_mut(handle.region))
            .ok_or_else(|| missing_region(handle))
    }

    /// Like [`DocumentModel::find_region`], but a missing region is a template error.
    pub fn require_region(&self, section: usize, tag: &str) -> Result<RegionHandle, CardError> {
        self.find_region(section, tag).ok_or_else(|| {
            CardError::Template(format!("page {} has no '{tag}' region", section + 1))
        })
    }

    pub fn page_count(&self) -> usize {
        self.sections.len()
    }
}

fn missing_region(handle: RegionHandle) -> CardError {
    CardError::Template(format!(
        "region {} on page {} does not exist",
        handle.region,
        handle.section + 1
    ))
}

fn swap_color(slot: &mut HexColor, from: &HexColor, to: &HexColor) -> usize {
    if slot == from {
        *slot = to.clone();
        1
    } else {
        0
    }
}

impl DocumentModel for PageDocument {
    fn find_region(&self, section: usize, tag: &str) -> Option<RegionHandle> {
        let regions = &self.sections.get(section)?.regions;
        regions
            .iter()
            .position(|r| r.tag == tag)
            .map(|region| RegionHandle { section, region })
    }

    fn clone_section(&mut self, section: usize) -> Result<usize, CardError> {
        let copy = self
            .sections
            .get(section)
            .cloned()
            .ok_or_else(|| CardError::Template(format!("page {} does not exist", section + 1)))?;
        self.sections.push(copy);
        Ok(self.sections.len() - 1)
    }

    fn set_text(&mut self, region: RegionHandle, value: &str) -> Result<(), CardError> {
        let target = self.region_mut(region)?;
        let (run, style, align) = match target.blocks.iter().find_map(Block::as_paragraph) {
            Some(p) => (
                p.runs.first().map(|r| r.restyled(value)).unwrap_or_else(|| Run::text(value)),
                p.style,
                p.align,
            ),
            None => (Run::text(value), ParagraphStyle::Template, Alignment::Left),
        };
        target.blocks = vec![Block::Paragraph(Paragraph {
            runs: vec![run],
            style,
            align,
        })];
        Ok(())
    }

    fn set_color(&mut self, region: RegionHandle, color: &HexColor) -> Result<(), CardError> {
        let target = self.region_mut(region)?;
        for edge in &mut target.borders {
            edge.color = color.clone();
        }
        if target.fill.is_some() {
            target.fill = Some(color.clone());
        }
        Ok(())
    }

    fn remove_region(&mut self, region: RegionHandle) -> Result<(), CardError> {
        self.region(region)?;
        self.sections[region.section].regions.remove(region.region);
        Ok(())
    }

    fn remove_section(&mut self, section: usize) -> Result<(), CardError> {
        if section >= self.sections.len() {
            return Err(CardError::Template(format!(
                "page {} does not exist",
                section + 1
            )));
        }
        self.sections.remove(section);
        Ok(())
    }

    fn replace_color(&mut self, from: &HexColor, to: &HexColor) -> usize {
        let mut replaced = 0;
        for region in self.sections.iter_mut().flat_map(|s| s.regions.iter_mut()) {
            if let Some(fill) = region.fill.as_mut() {
                replaced += swap_color(fill, from, to);
            }
            for edge in &mut region.borders {
                replaced += swap_color(&mut edge.color, from, to);
            }
            for block in &mut region.blocks {
                match block {
                    Block::Paragraph(p) => {
                        for run in &mut p.runs {
                            if let Some(color) = run.color.as_mut() {
                                replaced += swap_color(color, from, to);
                            }
                        }
                    }
                    Block::Table(t) => {
                        for cell in t.rows.iter_mut().flatten() {
                            if let Some(fill) = cell.fill.as_mut() {
                                replaced += swap_color(fill, from, to);
                            }
                            for run in &mut cell.runs {
                                if let Some(color) = run.color.as_mut() {
                                    replaced += swap_color(color, from, to);
                                }
                            }
                        }
                    }
                }
            }
        }
        replaced
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn color(hex: &str) -> HexColor {
        HexColor::parse(hex).unwrap()
    }

    fn sample_doc() -> PageDocument {
        let placeholder = color("ed7d31");
        let header = Region {
            tag: "name".to_string(),
            label: None,
            height: Some(300),
            fill: Some(placeholder.clone()),
            borders: vec![BorderEdge {
                side: Side::Bottom,
                color: placeholder.clone(),
                size: 8,
            }],
            removable: false,
            blocks: vec![Block::Paragraph(Paragraph::new(
                vec![
                    Run {
                        text: "NAME".to_string(),
                        bold: true,
                        color: Some(color("ffffff")),
                        ..Run::default()
                    },
                    Run::text(" trailing"),
                ],
                ParagraphStyle::Template,
            ))],
        };
        let body = Region {
            tag: "description".to_string(),
            label: None,
            height: None,
            fill: None,
            borders: Vec::new(),
            removable: false,
            blocks: vec![Block::Paragraph(Paragraph::new(
                vec![Run {
                    color: Some(placeholder),
                    ..Run::text("x")
                }],
                ParagraphStyle::Template,
            ))],
        };
        PageDocument {
            title: "Test".to_string(),
            geometry: PageGeometry {
                width: 3600,
                height: 5040,
                margin: 144,
                table_width: 3312,
            },
            sections: vec![Section {
                name: "primary".to_string(),
                regions: vec![header, body],
            }],
        }
    }

    #[test]
    fn test_find_region_by_tag() {
        let doc = sample_doc();
        assert_eq!(
            doc.find_region(0, "description"),
            Some(RegionHandle {
                section: 0,
                region: 1
            })
        );
        assert_eq!(doc.find_region(0, "blurb"), None);
        assert_eq!(doc.find_region(3, "name"), None);
        assert!(doc.require_region(0, "blurb").unwrap_err().is_fatal());
    }

    #[test]
    fn test_set_text_keeps_first_run_style() {
        let mut doc = sample_doc();
        let name = doc.find_region(0, "name").unwrap();
        doc.set_text(name, "Fireball").unwrap();
        let runs: Vec<&Run> = doc.region(name).unwrap().runs().collect();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "Fireball");
        assert!(runs[0].bold);
        assert_eq!(runs[0].color, Some(color("ffffff")));
    }

    #[test]
    fn test_replace_color_rewrites_fills_borders_and_runs() {
        let mut doc = sample_doc();
        let replaced = doc.replace_color(&color("ed7d31"), &color("c00000"));
        assert_eq!(replaced, 3);
        let header = &doc.sections[0].regions[0];
        assert_eq!(header.fill, Some(color("c00000")));
        assert_eq!(header.borders[0].color, color("c00000"));
        // Non-placeholder colors are left alone.
        assert_eq!(header.runs().next().unwrap().color, Some(color("ffffff")));
    }

    #[test]
    fn test_set_color_targets_one_region() {
        let mut doc = sample_doc();
        let name = doc.find_region(0, "name").unwrap();
        doc.set_color(name, &color("00b050")).unwrap();
        assert_eq!(doc.sections[0].regions[0].borders[0].color, color("00b050"));
        assert_eq!(doc.sections[0].regions[1].fill, None);
    }

    #[test]
    fn test_clone_and_remove_sections() {
        let mut doc = sample_doc();
        assert_eq!(doc.clone_section(0).unwrap(), 1);
        assert_eq!(doc.page_count(), 2);
        assert!(doc.clone_section(5).is_err());
        doc.remove_section(0).unwrap();
        assert_eq!(doc.page_count(), 1);
        assert!(doc.remove_section(1).is_err());
    }

    #[test]
    fn test_remove_region() {
        let mut doc = sample_doc();
        let name = doc.find_region(0, "name").unwrap();
        doc.remove_region(name).unwrap();
        assert_eq!(doc.sections[0].regions.len(), 1);
        assert_eq!(doc.sections[0].regions[0].tag, "description");
        assert!(doc
            .remove_region(RegionHandle {
                section: 0,
                region: 4
            })
            .is_err());
    }

    #[test]
    fn test_blank_detection_ignores_whitespace_runs() {
        let mut region = sample_doc().sections[0].regions[1].clone();
        assert!(!region.is_blank());
        region.blocks = vec![Block::Paragraph(Paragraph::new(
            vec![Run::text("  ")],
            ParagraphStyle::Description,
        ))];
        assert!(region.is_blank());
        region.push_table(Table::default());
        assert!(!region.is_blank());
    }
}
