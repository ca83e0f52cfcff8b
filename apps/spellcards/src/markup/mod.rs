// Inline markup handling for description blocks.

pub mod entities;
pub mod normalizer;
pub mod tokenizer;

pub use entities::decode_entities;
pub use normalizer::{normalize, StyledRun};
