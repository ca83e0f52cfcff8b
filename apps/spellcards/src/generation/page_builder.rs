//! Page Builder: fills a template instance with one item's content.
//!
//! Steps, in order:
//! 1. fixed fields on the primary page
//! 2. global swap of the template placeholder color for the school color
//! 3. class grid and requirement markers
//! 4. description blocks, page by page as the layout plan groups them
//! 5. supplementary tables after the description
//! 6. unused pages and empty scaffolding removed
//! 7. page titles, with "(Part n)" once the card spans several pages

use tracing::debug;

use crate::document::template::{CONTINUATION, PRIMARY};
use crate::document::{
    Block, CardTemplate, DocumentModel, PageDocument, Paragraph, ParagraphStyle, RegionHandle,
    Run, Table, TableCell,
};
use crate::errors::CardError;
use crate::layout::{place_tables, LayoutPlan};
use crate::markup::{normalize, StyledRun};
use crate::models::color::{header_text, neutral_text};
use crate::models::item::CLASSES;
use crate::models::{Applicability, HexColor, Item};
use crate::tables::TableGrid;

/// 5.5pt, in half-points.
pub const TABLE_TEXT_SIZE: u32 = 11;

pub struct PageBuilder<'a> {
    template: &'a CardTemplate,
    rows_per_page: usize,
}

impl<'a> PageBuilder<'a> {
    pub fn new(template: &'a CardTemplate, rows_per_page: usize) -> Self {
        PageBuilder {
            template,
            rows_per_page,
        }
    }

    /// Builds the complete card document for `item`.
    pub fn build(
        &self,
        item: &Item,
        plan: &LayoutPlan,
        tables: &[TableGrid],
    ) -> Result<PageDocument, CardError> {
        let color = item.color();
        let mut doc = self.template.instantiate(&item.name);

        fill_fields(&mut doc, item, &color)?;

        let replaced = doc.replace_color(&self.template.placeholder_color, &color);
        debug!("Recolored {replaced} template color slot(s) to {color}");

        color_classes(&mut doc, item, &color)?;
        color_requirements(&mut doc, item, &color, &self.template.inactive_marker_color)?;

        for section in [PRIMARY, CONTINUATION] {
            let handle = doc.require_region(section, "description")?;
            doc.region_mut(handle)?.blocks.clear();
        }
        place_description(&mut doc, item, plan)?;

        let row_counts: Vec<usize> = tables.iter().map(TableGrid::row_count).collect();
        let placement = place_tables(&row_counts, plan.page_count, self.rows_per_page);
        for (grid, &page) in tables.iter().zip(&placement.pages) {
            let handle = description_on_page(&mut doc, page)?;
            let region = doc.region_mut(handle)?;
            region.push_paragraph(Paragraph::spacer());
            region.push_table(to_table(grid, &color, self.template.geometry.table_width));
        }

        let used_pages = placement.total_pages.max(1);
        while doc.page_count() > used_pages {
            doc.remove_section(doc.page_count() - 1)?;
        }
        tidy_scaffolding(&mut doc)?;
        name_pages(&mut doc, &item.name)?;

        Ok(doc)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fixed fields and color coding
// ────────────────────────────────────────────────────────────────────────────

fn fill_fields(doc: &mut PageDocument, item: &Item, color: &HexColor) -> Result<(), CardError> {
    let fields = [
        ("level", item.level.to_string()),
        ("range", item.range.clone()),
        ("duration", item.duration.clone()),
        ("casting_time", item.casting_time.clone()),
        ("material", item.material_component.clone().unwrap_or_default()),
        ("blurb", item.blurb.clone().unwrap_or_default()),
    ];
    for (tag, value) in fields {
        let handle = doc.require_region(PRIMARY, tag)?;
        doc.set_text(handle, &value)?;
    }
    let level = doc.require_region(PRIMARY, "level")?;
    doc.set_color(level, color)
}

/// Colors each class name by whether the item supports it; optional classes are underlined.
fn color_classes(doc: &mut PageDocument, item: &Item, color: &HexColor) -> Result<(), CardError> {
    let handle = doc.require_region(PRIMARY, "classes")?;
    for run in doc.region_mut(handle)?.runs_mut() {
        let name = run.text.trim();
        if !CLASSES.contains(&name) {
            continue;
        }
        match item.applicability(name) {
            Some(applicability) => {
                run.underline = applicability == Applicability::Optional;
                run.color = Some(color.clone());
            }
            None => {
                run.underline = false;
                run.color = Some(neutral_text());
            }
        }
    }
    Ok(())
}

fn color_requirements(
    doc: &mut PageDocument,
    item: &Item,
    color: &HexColor,
    inactive: &HexColor,
) -> Result<(), CardError> {
    let handle = doc.require_region(PRIMARY, "requirements")?;
    let markers = doc
        .region_mut(handle)?
        .runs_mut()
        .filter(|run| !run.text.trim().is_empty());
    for (run, active) in markers.zip(item.requirements.in_order()) {
        run.bold = active;
        run.color = Some(if active { color.clone() } else { inactive.clone() });
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Content placement
// ────────────────────────────────────────────────────────────────────────────

/// The description region of page `page`, cloning continuation pages until it exists.
fn description_on_page(doc: &mut PageDocument, page: usize) -> Result<RegionHandle, CardError> {
    while doc.page_count() <= page {
        let section = doc.clone_section(CONTINUATION)?;
        let handle = doc.require_region(section, "description")?;
        doc.region_mut(handle)?.blocks.clear();
        debug!("Cloned continuation page as page {}", section + 1);
    }
    doc.require_region(page, "description")
}

fn description_runs(runs: Vec<StyledRun>, size: u32) -> Vec<Run> {
    runs.into_iter()
        .map(|r| Run {
            text: r.text,
            bold: r.bold,
            italic: r.italic,
            size: Some(size),
            ..Run::default()
        })
        .collect()
}

fn place_description(
    doc: &mut PageDocument,
    item: &Item,
    plan: &LayoutPlan,
) -> Result<(), CardError> {
    let size = plan.font_size.half_points();
    for (page, group) in plan.page_groups.iter().enumerate() {
        if group.is_empty() {
            continue;
        }
        let handle = description_on_page(doc, page)?;
        let region = doc.region_mut(handle)?;
        for (position, &block) in group.iter().enumerate() {
            let raw = item.description.get(block).ok_or_else(|| {
                CardError::Layout(format!("layout plan refers to missing block {block}"))
            })?;
            if position > 0 {
                region.push_paragraph(Paragraph::spacer());
            }
            region.push_paragraph(Paragraph::new(
                description_runs(normalize(raw), size),
                ParagraphStyle::Description,
            ));
        }
    }
    Ok(())
}

/// Converts an imported grid into a document table. Header cells take the school color
/// as fill with white text; grid gaps become empty cells.
fn to_table(grid: &TableGrid, color: &HexColor, width: u32) -> Table {
    let rows = (0..grid.row_count())
        .map(|row| {
            let mut cells = Vec::new();
            let mut col = 0;
            while col < grid.cols {
                match grid.cell(row, col) {
                    Some(cell) => {
                        let runs = cell
                            .content
                            .iter()
                            .map(|r| Run {
                                text: r.text.clone(),
                                bold: r.bold,
                                italic: r.italic,
                                color: cell.is_header.then(header_text),
                                size: Some(TABLE_TEXT_SIZE),
                                ..Run::default()
                            })
                            .collect();
                        cells.push(TableCell {
                            runs,
                            col_span: cell.col_span,
                            fill: cell.is_header.then(|| color.clone()),
                        });
                        col += cell.col_span.max(1);
                    }
                    None => {
                        cells.push(TableCell {
                            runs: Vec::new(),
                            col_span: 1,
                            fill: None,
                        });
                        col += 1;
                    }
                }
            }
            cells
        })
        .collect();

    Table {
        cols: grid.cols,
        width,
        rows,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Cleanup and titles
// ────────────────────────────────────────────────────────────────────────────

fn is_spacer(block: &Block) -> bool {
    matches!(block, Block::Paragraph(p) if p.style == ParagraphStyle::Spacer)
}

/// Drops blank removable regions, empty description paragraphs and stray spacers.
fn tidy_scaffolding(doc: &mut PageDocument) -> Result<(), CardError> {
    for section in 0..doc.page_count() {
        let region_count = doc.sections[section].regions.len();
        for region in (0..region_count).rev() {
            let handle = RegionHandle { section, region };
            let target = doc.region(handle)?;
            if target.removable && target.is_blank() {
                debug!("Removing empty '{}' region on page {}", target.tag, section + 1);
                doc.remove_region(handle)?;
            }
        }

        let handle = doc.require_region(section, "description")?;
        let blocks = &mut doc.region_mut(handle)?.blocks;
        blocks.retain(|block| match block {
            Block::Paragraph(p) => p.style != ParagraphStyle::Description || !p.is_blank(),
            Block::Table(_) => true,
        });
        blocks.dedup_by(|next, prev| is_spacer(next) && is_spacer(prev));
        while blocks.last().is_some_and(is_spacer) {
            blocks.pop();
        }
        if blocks.first().is_some_and(is_spacer)
            && matches!(blocks.get(1), Some(Block::Paragraph(_)))
        {
            blocks.remove(0);
        }
    }
    Ok(())
}

fn name_pages(doc: &mut PageDocument, name: &str) -> Result<(), CardError> {
    let total = doc.page_count();
    for section in 0..total {
        let title = if total > 1 {
            format!("{name} (Part {})", section + 1)
        } else {
            name.to_string()
        };
        let handle = doc.require_region(section, "name")?;
        doc.set_text(handle, &title)?;
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
