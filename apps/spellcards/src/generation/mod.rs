// Card generation: per-item document assembly and the sequential batch loop.
// Layout decisions come from crate::layout; rendering from crate::render.

pub mod batch;
pub mod page_builder;

pub use batch::{BatchReport, CardGenerator};
