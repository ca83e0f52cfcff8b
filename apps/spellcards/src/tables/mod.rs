pub mod discovery;
pub mod grid;
pub mod importer;

pub use discovery::load_item_tables;
pub use grid::TableGrid;
