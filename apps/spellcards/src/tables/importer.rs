//! Table Importer: parses a scraped HTML table into a [`TableGrid`].
//!
//! Only the first `<table>` in the source is read. Tables nested inside a cell contribute
//! their text to that cell. `rowspan` is detected and logged but has no structural effect.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::warn;

use crate::errors::CardError;
use crate::markup::decode_entities;
use crate::markup::normalizer::RunBuilder;
use crate::tables::grid::{GridCell, TableGrid};

/// Widest grid a table may span; a card column cannot hold more.
pub const MAX_TABLE_COLUMNS: usize = 64;

#[derive(Debug)]
struct OpenCell {
    col: usize,
    is_header: bool,
    col_span: usize,
    runs: RunBuilder,
}

#[derive(Debug, Default)]
struct ImportState {
    seen_table: bool,
    table_depth: usize,
    rows: Vec<Vec<(usize, GridCell)>>,
    row: Option<Vec<(usize, GridCell)>>,
    next_col: usize,
    cell: Option<OpenCell>,
    bold_depth: usize,
    italic_depth: usize,
}

impl ImportState {
    fn open_row(&mut self) {
        self.close_row();
        self.row = Some(Vec::new());
        self.next_col = 0;
    }

    fn close_row(&mut self) {
        self.close_cell();
        if let Some(row) = self.row.take() {
            self.rows.push(row);
        }
    }

    fn open_cell(&mut self, is_header: bool, col_span: usize) {
        self.close_cell();
        if self.row.is_none() {
            // <td> directly under <table> without an explicit <tr>.
            self.open_row();
        }
        self.cell = Some(OpenCell {
            col: self.next_col,
            is_header,
            col_span,
            runs: RunBuilder::default(),
        });
        self.bold_depth = 0;
        self.italic_depth = 0;
    }

    fn close_cell(&mut self) {
        let Some(cell) = self.cell.take() else {
            return;
        };
        self.next_col = cell.col.saturating_add(cell.col_span);
        if let Some(row) = self.row.as_mut() {
            row.push((
                cell.col,
                GridCell {
                    is_header: cell.is_header,
                    content: cell.runs.finish(),
                    col_span: cell.col_span,
                },
            ));
        }
    }

    fn open_tag(&mut self, tag: &BytesStart<'_>, self_closing: bool, source_name: &str) {
        let name = tag_name(tag.name().as_ref());
        match name.as_str() {
            "table" => {
                self.seen_table = true;
                if !self_closing {
                    self.table_depth += 1;
                }
            }
            _ if self.table_depth == 0 => {}
            "tr" if self.table_depth == 1 => {
                if span_attributes(tag).1 {
                    warn!("Detected unhandled rowspan in {source_name}");
                }
                self.open_row();
            }
            "td" | "th" if self.table_depth == 1 => {
                let (col_span, has_row_span) = span_attributes(tag);
                if has_row_span {
                    warn!("Detected unhandled rowspan in {source_name}");
                }
                self.open_cell(name == "th", col_span);
                if self_closing {
                    self.close_cell();
                }
            }
            "strong" | "b" if !self_closing => self.bold_depth += 1,
            "em" | "i" if !self_closing => self.italic_depth += 1,
            _ => {}
        }
    }

    fn push_text(&mut self, raw: &str) {
        let bold = self.bold_depth > 0;
        let italic = self.italic_depth > 0;
        let Some(cell) = self.cell.as_mut() else {
            return;
        };
        let text = decode_entities(raw);
        // Non-breaking spaces are content, so only ASCII whitespace collapses.
        let collapsed = text
            .split(|c: char| c.is_ascii_whitespace())
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if collapsed.is_empty() {
            return;
        }
        if !cell.runs.is_empty() {
            cell.runs.push(" ", false, false);
        }
        cell.runs.push(&collapsed, bold, italic);
    }
}

fn tag_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).to_ascii_lowercase()
}

/// Reads `colspan` (default 1) and reports whether a `rowspan` attribute is present.
fn span_attributes(tag: &BytesStart<'_>) -> (usize, bool) {
    let mut col_span = 1;
    let mut has_row_span = false;
    for attr in tag.html_attributes().flatten() {
        let key = tag_name(attr.key.as_ref());
        let value = String::from_utf8_lossy(&attr.value);
        match key.as_str() {
            "colspan" => {
                col_span = value.trim().parse::<usize>().ok().filter(|n| *n >= 1).unwrap_or(1)
            }
            "rowspan" => has_row_span = value.trim() != "1",
            _ => {}
        }
    }
    (col_span, has_row_span)
}

/// Parses the first HTML table in `source`. `source_name` is used in logs and errors.
pub fn import_table(source: &str, source_name: &str) -> Result<TableGrid, CardError> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().check_end_names = false;

    let mut state = ImportState::default();

    loop {
        let event = reader.read_event().map_err(|e| CardError::TableImport {
            source_name: source_name.to_string(),
            message: format!("at byte {}: {e}", reader.buffer_position()),
        })?;

        match event {
            Event::Start(tag) => state.open_tag(&tag, false, source_name),
            Event::Empty(tag) => state.open_tag(&tag, true, source_name),
            Event::End(tag) => {
                let name = tag_name(tag.name().as_ref());
                match name.as_str() {
                    "table" if state.table_depth > 0 => {
                        state.table_depth -= 1;
                        if state.table_depth == 0 {
                            state.close_row();
                            break;
                        }
                    }
                    _ if state.table_depth == 0 => {}
                    "tr" if state.table_depth == 1 => state.close_row(),
                    "td" | "th" if state.table_depth == 1 => state.close_cell(),
                    "strong" | "b" => state.bold_depth = state.bold_depth.saturating_sub(1),
                    "em" | "i" => state.italic_depth = state.italic_depth.saturating_sub(1),
                    _ => {}
                }
            }
            Event::Text(text) => {
                if state.table_depth > 0 {
                    state.push_text(&String::from_utf8_lossy(&text));
                }
            }
            Event::CData(data) => {
                if state.table_depth > 0 {
                    state.push_text(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => {
                state.close_row();
                break;
            }
            _ => {}
        }
    }

    if !state.seen_table {
        return Err(CardError::TableImport {
            source_name: source_name.to_string(),
            message: "no <table> element found".to_string(),
        });
    }

    let import_error = |message: String| CardError::TableImport {
        source_name: source_name.to_string(),
        message,
    };
    let widest = state
        .rows
        .iter()
        .filter_map(|row| row.last().map(|(col, cell)| col.saturating_add(cell.col_span)))
        .max()
        .unwrap_or(0);
    if widest > MAX_TABLE_COLUMNS {
        return Err(import_error(format!(
            "a row spans {widest} columns, more than the {MAX_TABLE_COLUMNS} supported"
        )));
    }

    let grid = TableGrid::from_placed_rows(state.rows);
    if grid.row_count() == 0 || grid.cols == 0 {
        return Err(import_error("table has no cells".to_string()));
    }
    for row in 0..grid.row_count() {
        let spanned = grid.row_span_total(row);
        if spanned != grid.cols {
            warn!(
                "Row {row} of {source_name} covers {spanned} of {} columns; gaps render empty",
                grid.cols
            );
        }
    }
    Ok(grid)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::StyledRun;

    fn import(html: &str) -> TableGrid {
        import_table(html, "test.html").unwrap()
    }

    #[test]
    fn test_header_and_data_rows() {
        let grid = import(
            "<table><tr><th>d8</th><th>Effect</th></tr>\
             <tr><td>1</td><td>Nothing happens</td></tr></table>",
        );
        assert_eq!(grid.cols, 2);
        assert_eq!(grid.row_count(), 2);
        assert!(grid.cell(0, 0).unwrap().is_header);
        assert!(!grid.cell(1, 1).unwrap().is_header);
        assert_eq!(
            grid.cell(1, 1).unwrap().content,
            vec![StyledRun::plain("Nothing happens")]
        );
    }

    #[test]
    fn test_colspan_advances_column_without_gaps() {
        let grid = import(
            "<table>\
               <tr><td>a</td><td colspan=\"2\">b</td></tr>\
               <tr><td>c</td><td>d</td><td>e</td></tr>\
             </table>",
        );
        assert_eq!(grid.cols, 3);
        assert_eq!(grid.cell(0, 1).unwrap().col_span, 2);
        assert!(grid.cell(0, 2).is_none());
        assert_eq!(grid.row_span_total(0), 3);
        assert_eq!(
            grid.cell(1, 0).unwrap().content,
            vec![StyledRun::plain("c")]
        );
        assert_eq!(grid.row_span_total(1), 3);
    }

    #[test]
    fn test_emphasis_tracked_per_node() {
        let grid = import(
            "<table><tr><td><strong>Cold.</strong> Frost <em>bites</em></td></tr></table>",
        );
        assert_eq!(
            grid.cell(0, 0).unwrap().content,
            vec![
                StyledRun::bold("Cold."),
                StyledRun::plain(" Frost "),
                StyledRun::new("bites", false, true),
            ]
        );
    }

    #[test]
    fn test_rowspan_is_ignored() {
        let grid = import(
            "<table><tr><td rowspan=\"2\">x</td><td>y</td></tr><tr><td>z</td></tr></table>",
        );
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.cell(0, 0).unwrap().col_span, 1);
        assert_eq!(grid.cell(1, 0).unwrap().content, vec![StyledRun::plain("z")]);
    }

    #[test]
    fn test_html_quirks_tolerated() {
        let grid = import(
            "<html><body><p>Intro</p><table class=wiki-content-table>\
             <tbody><tr><td>5&nbsp;ft<br>cube</td><td colspan=0>q</td></tr></tbody>\
             </table><p>after</p></body></html>",
        );
        assert_eq!(grid.row_count(), 1);
        assert_eq!(
            grid.cell(0, 0).unwrap().content,
            vec![StyledRun::plain("5\u{a0}ft cube")]
        );
        assert_eq!(grid.cell(0, 1).unwrap().col_span, 1);
    }

    #[test]
    fn test_whitespace_only_cells_are_empty() {
        let grid = import("<table><tr><td>\n   </td><td>v</td></tr></table>");
        assert!(grid.cell(0, 0).unwrap().content.is_empty());
    }

    #[test]
    fn test_missing_table_is_an_error() {
        let err = import_table("<p>no table</p>", "empty.html").unwrap_err();
        assert!(matches!(err, CardError::TableImport { .. }));
    }

    // ── Degenerate tables ───────────────────────────────────────────────────

    #[test]
    fn test_oversized_colspan_is_rejected() {
        let err = import_table(
            "<table><tr><td colspan=\"4000000000\">x</td></tr></table>",
            "wide.html",
        )
        .unwrap_err();
        assert!(matches!(err, CardError::TableImport { .. }));
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("4000000000"));
    }

    #[test]
    fn test_spans_accumulating_past_limit_are_rejected() {
        let html = format!(
            "<table><tr><td colspan=\"{MAX_TABLE_COLUMNS}\">a</td><td>b</td></tr></table>"
        );
        assert!(import_table(&html, "wide.html").is_err());

        let html = format!("<table><tr><td colspan=\"{MAX_TABLE_COLUMNS}\">a</td></tr></table>");
        assert_eq!(import(&html).cols, MAX_TABLE_COLUMNS);
    }

    #[test]
    fn test_table_without_cells_is_rejected() {
        for html in ["<table></table>", "<table><tr></tr></table>", "<table/>"] {
            let err = import_table(html, "hollow.html").unwrap_err();
            assert!(
                err.to_string().contains("no cells"),
                "{html} gave {err}"
            );
        }
    }

    #[test]
    fn test_empty_row_beside_real_rows_keeps_width() {
        let grid = import("<table><tr></tr><tr><td>a</td><td>b</td></tr></table>");
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.cols, 2);
        assert!(grid.cell(0, 0).is_none());
    }
}
