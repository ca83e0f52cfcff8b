use serde::{Deserialize, Serialize};

use crate::markup::StyledRun;

/// One populated table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub is_header: bool,
    pub content: Vec<StyledRun>,
    /// Number of grid columns this cell covers, at least 1.
    pub col_span: usize,
}

/// A rectangular cell grid.
///
/// `cells[row][col]` holds the cell that *starts* at that column. Positions covered by
/// a preceding cell's span, and gaps in short rows, are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableGrid {
    pub cols: usize,
    pub cells: Vec<Vec<Option<GridCell>>>,
}

impl TableGrid {
    pub fn row_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&GridCell> {
        self.cells.get(row)?.get(col)?.as_ref()
    }

    /// Sum of column spans placed in `row`.
    pub fn row_span_total(&self, row: usize) -> usize {
        self.cells
            .get(row)
            .map(|cells| cells.iter().flatten().map(|c| c.col_span).sum())
            .unwrap_or(0)
    }

    /// Builds a grid from rows of `(starting column, cell)` pairs.
    pub(crate) fn from_placed_rows(rows: Vec<Vec<(usize, GridCell)>>) -> Self {
        let cols = rows
            .iter()
            .filter_map(|row| row.last().map(|(col, cell)| col + cell.col_span))
            .max()
            .unwrap_or(0);

        let cells = rows
            .into_iter()
            .map(|row| {
                let mut slots: Vec<Option<GridCell>> = vec![None; cols];
                for (col, cell) in row {
                    slots[col] = Some(cell);
                }
                slots
            })
            .collect();

        TableGrid { cols, cells }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(text: &str, span: usize) -> GridCell {
        GridCell {
            is_header: false,
            content: vec![StyledRun::plain(text)],
            col_span: span,
        }
    }

    #[test]
    fn test_width_is_widest_row() {
        let grid = TableGrid::from_placed_rows(vec![
            vec![(0, cell("a", 1)), (1, cell("b", 2))],
            vec![(0, cell("c", 1))],
        ]);
        assert_eq!(grid.cols, 3);
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.row_span_total(0), 3);
        assert_eq!(grid.row_span_total(1), 1);
        assert!(grid.cell(0, 2).is_none());
        assert!(grid.cell(1, 1).is_none());
    }

    #[test]
    fn test_empty_grid() {
        let grid = TableGrid::from_placed_rows(vec![]);
        assert_eq!(grid.cols, 0);
        assert_eq!(grid.row_count(), 0);
    }
}
