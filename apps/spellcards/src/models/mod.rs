pub mod color;
pub mod filter;
pub mod item;
pub mod record;

pub use color::HexColor;
pub use item::{Applicability, Item};
