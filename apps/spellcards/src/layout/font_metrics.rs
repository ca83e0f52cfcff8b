//! Font-size candidates and their page capacity metrics.
//!
//! Capacities are expressed in wrapped lines per page and characters per line, measured
//! empirically against the card template at each size. `default_candidates()` returns
//! the built-in table, largest size first; a replacement table can be loaded from JSON.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CardError;

// ────────────────────────────────────────────────────────────────────────────
// Font sizes
// ────────────────────────────────────────────────────────────────────────────

/// The description font sizes a card may be set in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FontSize {
    /// 8pt
    Large,
    /// 7pt
    Medium,
    /// 6.5pt
    Small,
}

impl FontSize {
    /// Largest first.
    pub const ALL: [FontSize; 3] = [FontSize::Large, FontSize::Medium, FontSize::Small];

    /// Size in half-points, the unit WordprocessingML uses for `w:sz`.
    pub fn half_points(self) -> u32 {
        match self {
            FontSize::Large => 16,
            FontSize::Medium => 14,
            FontSize::Small => 13,
        }
    }

    /// Key used in line-limit tables.
    pub fn key(self) -> &'static str {
        match self {
            FontSize::Large => "8",
            FontSize::Medium => "7",
            FontSize::Small => "6.5",
        }
    }
}

impl fmt::Display for FontSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}pt", self.key())
    }
}

impl FromStr for FontSize {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().trim_end_matches("pt");
        FontSize::ALL
            .into_iter()
            .find(|size| size.key() == key)
            .ok_or_else(|| CardError::Layout(format!("unknown font size '{s}'")))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Capacity table
// ────────────────────────────────────────────────────────────────────────────

/// Page capacity at one font size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeCandidate {
    pub size: FontSize,
    /// Line capacity of the primary page's description region.
    pub first_page_lines: usize,
    /// Line capacity of every continuation page.
    pub later_page_lines: usize,
    pub chars_per_line: usize,
}

impl SizeCandidate {
    pub const fn new(
        size: FontSize,
        first_page_lines: usize,
        later_page_lines: usize,
        chars_per_line: usize,
    ) -> Self {
        SizeCandidate {
            size,
            first_page_lines,
            later_page_lines,
            chars_per_line,
        }
    }
}

const DEFAULT_CANDIDATES: [SizeCandidate; 3] = [
    SizeCandidate::new(FontSize::Large, 13, 26, 54),
    SizeCandidate::new(FontSize::Medium, 17, 28, 55),
    SizeCandidate::new(FontSize::Small, 20, 32, 54),
];

/// The built-in capacity table, largest size first.
pub fn default_candidates() -> Vec<SizeCandidate> {
    DEFAULT_CANDIDATES.to_vec()
}

/// Parses a capacity table of the form `{"8": [13, 26, 54], "7": [...], "6.5": [...]}`.
///
/// Every size must be present exactly once; unknown keys are rejected. The result is
/// ordered largest size first regardless of key order in the file.
pub fn candidates_from_json(json: &str) -> Result<Vec<SizeCandidate>, CardError> {
    let raw: BTreeMap<String, [usize; 3]> = serde_json::from_str(json)
        .map_err(|e| CardError::Layout(format!("unreadable line-limit table: {e}")))?;

    let mut by_size = BTreeMap::new();
    for (key, [first, later, cpl]) in raw {
        let size: FontSize = key.parse()?;
        by_size.insert(size, SizeCandidate::new(size, first, later, cpl));
    }

    FontSize::ALL
        .into_iter()
        .map(|size| {
            by_size.remove(&size).ok_or_else(|| {
                CardError::Layout(format!("line-limit table has no entry for {size}"))
            })
        })
        .collect()
}
