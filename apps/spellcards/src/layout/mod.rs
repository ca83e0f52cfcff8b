// Layout fitting: font-size selection, page-break simulation and table placement.

pub mod fitter;
pub mod font_metrics;
pub mod page_fill;
pub mod simulator;

pub use fitter::{fit, LayoutPlan};
pub use font_metrics::{candidates_from_json, default_candidates, FontSize, SizeCandidate};
pub use page_fill::{place_tables, DEFAULT_TABLE_ROWS_PER_PAGE};
