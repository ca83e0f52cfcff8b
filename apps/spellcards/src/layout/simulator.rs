//! Page-break simulation for one font-size candidate.
//!
//! Blocks are laid out greedily in reading order. A block that does not fit in the
//! remaining capacity of the current page moves whole to the next page; blocks are
//! never split. Once a break has happened, every following page uses the continuation
//! capacity.

use serde::{Deserialize, Serialize};

use crate::layout::font_metrics::SizeCandidate;

/// Outcome of simulating one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSimulation {
    pub page_count: usize,
    /// Block indices per page, in order. Always `page_count` entries.
    pub groups: Vec<Vec<usize>>,
}

/// Wrapped lines a block of `chars` characters occupies, plus one line of spacing.
///
/// `chars_per_line` must be non-zero; the fitter validates this before simulating.
pub fn lines_needed(chars: usize, chars_per_line: usize) -> usize {
    chars.div_ceil(chars_per_line) + 1
}

/// Simulates page breaks for blocks of the given character lengths.
pub fn simulate_pages(block_lengths: &[usize], candidate: &SizeCandidate) -> PageSimulation {
    let mut groups: Vec<Vec<usize>> = vec![Vec::new()];
    let mut current = 0usize;
    let mut cap = candidate.first_page_lines;

    for (index, &chars) in block_lengths.iter().enumerate() {
        let lines = lines_needed(chars, candidate.chars_per_line);
        if current + lines > cap {
            groups.push(Vec::new());
            current = 0;
            cap = candidate.later_page_lines;
        }
        current += lines;
        if let Some(page) = groups.last_mut() {
            page.push(index);
        }
    }

    PageSimulation {
        page_count: groups.len(),
        groups,
    }
}
