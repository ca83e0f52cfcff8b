//! Locates the supplementary table files that belong to one item.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::CardError;
use crate::models::Item;
use crate::tables::grid::TableGrid;
use crate::tables::importer::import_table;

/// `<tables_dir>/<stem>_table_<index>.html`
pub fn table_path(tables_dir: &Path, file_stem: &str, index: usize) -> PathBuf {
    tables_dir.join(format!("{file_stem}_table_{index}.html"))
}

/// Lists table files for `file_stem`, starting at index 0 and stopping at the first gap.
pub fn discover_tables(tables_dir: &Path, file_stem: &str) -> Vec<PathBuf> {
    (0..)
        .map(|index| table_path(tables_dir, file_stem, index))
        .take_while(|path| path.is_file())
        .collect()
}

/// Reads and imports every table attached to `item`.
///
/// Items without the table flag yield nothing. A flagged item with no files on disk is
/// logged and treated as table-free.
pub fn load_item_tables(item: &Item, tables_dir: &Path) -> Result<Vec<TableGrid>, CardError> {
    if !item.has_tables {
        return Ok(Vec::new());
    }

    let paths = discover_tables(tables_dir, &item.file_stem());
    if paths.is_empty() {
        warn!(
            "'{}' is marked as having tables but none were found in {}",
            item.name,
            tables_dir.display()
        );
        return Ok(Vec::new());
    }

    paths
        .iter()
        .map(|path| {
            debug!("Importing table {}", path.display());
            let source = std::fs::read_to_string(path)?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            import_table(&source, &name)
        })
        .collect()
}
