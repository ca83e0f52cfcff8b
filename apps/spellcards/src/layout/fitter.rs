//! Layout Fitter: chooses the description font size and the page breaks for one card.
//!
//! Candidates are tried largest first. The first size that fits everything on one page
//! wins outright; otherwise the largest size that needs exactly two pages is chosen, and
//! failing that the smallest size, however many pages it needs.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::CardError;
use crate::layout::font_metrics::{FontSize, SizeCandidate};
use crate::layout::simulator::{simulate_pages, PageSimulation};

/// The fitter's decision for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutPlan {
    pub font_size: FontSize,
    pub page_count: usize,
    /// Description block indices per page.
    pub page_groups: Vec<Vec<usize>>,
}

impl LayoutPlan {
    fn from_simulation(size: FontSize, sim: PageSimulation) -> Self {
        LayoutPlan {
            font_size: size,
            page_count: sim.page_count,
            page_groups: sim.groups,
        }
    }
}

/// Fits raw description blocks against `candidates` (ordered largest size first).
///
/// Block length is the raw character count including markup, so tag-heavy blocks are
/// measured conservatively.
pub fn fit<S: AsRef<str>>(
    blocks: &[S],
    candidates: &[SizeCandidate],
) -> Result<LayoutPlan, CardError> {
    if candidates.is_empty() {
        return Err(CardError::Layout("no font-size candidates configured".to_string()));
    }
    if let Some(bad) = candidates.iter().find(|c| c.chars_per_line == 0) {
        return Err(CardError::Layout(format!(
            "chars_per_line is zero for {}",
            bad.size
        )));
    }

    let lengths: Vec<usize> = blocks.iter().map(|b| b.as_ref().chars().count()).collect();

    let mut two_page: Option<LayoutPlan> = None;
    let mut last: Option<LayoutPlan> = None;

    for candidate in candidates {
        let sim = simulate_pages(&lengths, candidate);
        debug!(
            "Font size {}: {} page(s) for {} block(s)",
            candidate.size,
            sim.page_count,
            lengths.len()
        );

        let plan = LayoutPlan::from_simulation(candidate.size, sim);
        if plan.page_count == 1 {
            return Ok(plan);
        }
        if plan.page_count == 2 && two_page.is_none() {
            two_page = Some(plan.clone());
        }
        last = Some(plan);
    }

    two_page
        .or(last)
        .ok_or_else(|| CardError::Layout("no font-size candidates configured".to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font_metrics::default_candidates;
    use crate::layout::simulator::lines_needed;
    use proptest::prelude::*;

    fn blocks(count: usize, len: usize) -> Vec<String> {
        vec!["x".repeat(len); count]
    }

    // ── Selection ───────────────────────────────────────────────────────────

    #[test]
    fn test_short_blocks_fit_at_largest_size() {
        let input = vec!["A".repeat(50), "B".repeat(50), "C".repeat(50)];
        let plan = fit(&input, &default_candidates()).unwrap();
        assert_eq!(plan.font_size, FontSize::Large);
        assert_eq!(plan.page_count, 1);
        assert_eq!(plan.page_groups, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_single_short_block_is_one_page() {
        let plan = fit(&["Light."], &default_candidates()).unwrap();
        assert_eq!((plan.font_size, plan.page_count), (FontSize::Large, 1));
    }

    #[test]
    fn test_one_page_at_smaller_size_beats_two_pages_at_larger() {
        // 6 blocks of 3 lines each: 18 lines. 8pt and 7pt break, 6.5pt (cap 20) fits.
        let plan = fit(&blocks(6, 100), &default_candidates()).unwrap();
        assert_eq!(plan.font_size, FontSize::Small);
        assert_eq!(plan.page_count, 1);
    }

    #[test]
    fn test_largest_two_page_size_preferred_over_smallest() {
        // 14 blocks of 3 lines: 8pt needs 3 pages, 7pt and 6.5pt need 2.
        let plan = fit(&blocks(14, 100), &default_candidates()).unwrap();
        assert_eq!(plan.font_size, FontSize::Medium);
        assert_eq!(plan.page_count, 2);
        assert_eq!(plan.page_groups[0].len(), 5);
        assert_eq!(plan.page_groups[1].len(), 9);
    }

    #[test]
    fn test_smallest_size_used_when_nothing_fits_two_pages() {
        let plan = fit(&blocks(60, 100), &default_candidates()).unwrap();
        assert_eq!(plan.font_size, FontSize::Small);
        assert!(plan.page_count > 2);
        assert_eq!(plan.page_groups.len(), plan.page_count);
    }

    #[test]
    fn test_markup_counts_towards_length() {
        // 52 visible characters but 69 raw: three lines each at 8pt instead of two.
        let raw = format!("<strong>{}</strong>", "y".repeat(52));
        let plan = fit(&vec![raw; 5], &default_candidates()).unwrap();
        assert_eq!(plan.font_size, FontSize::Medium);
    }

    // ── Configuration errors ────────────────────────────────────────────────

    #[test]
    fn test_empty_candidate_list_is_fatal() {
        let err = fit(&["a"], &[]).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_zero_chars_per_line_is_fatal() {
        let err = fit(&["a"], &[SizeCandidate::new(FontSize::Large, 13, 26, 0)]).unwrap_err();
        assert!(matches!(err, CardError::Layout(_)));
    }

    // ── Properties ──────────────────────────────────────────────────────────

    /// Capacity tables where every smaller size is at least as roomy as the larger one.
    fn nested_candidates() -> impl Strategy<Value = Vec<SizeCandidate>> {
        (
            1usize..30,
            1usize..40,
            10usize..80,
            prop::array::uniform3(0usize..6),
            prop::array::uniform3(0usize..6),
        )
            .prop_map(|(first, later, cpl, grow_caps, grow_cpl)| {
                let mut caps = (first, later, cpl);
                FontSize::ALL
                    .into_iter()
                    .enumerate()
                    .map(|(i, size)| {
                        if i > 0 {
                            caps.0 += grow_caps[i];
                            caps.1 += grow_caps[i];
                            caps.2 += grow_cpl[i];
                        }
                        SizeCandidate::new(size, caps.0, caps.1, caps.2)
                    })
                    .collect()
            })
    }

    fn block_lengths() -> impl Strategy<Value = Vec<usize>> {
        prop::collection::vec(0usize..600, 0..40)
    }

    proptest! {
        #[test]
        fn prop_fit_is_deterministic(lengths in block_lengths(), table in nested_candidates()) {
            let input: Vec<String> = lengths.iter().map(|n| "z".repeat(*n)).collect();
            prop_assert_eq!(fit(&input, &table).unwrap(), fit(&input, &table).unwrap());
        }

        #[test]
        fn prop_groups_partition_blocks_in_order(lengths in block_lengths(), table in nested_candidates()) {
            let input: Vec<String> = lengths.iter().map(|n| "z".repeat(*n)).collect();
            let plan = fit(&input, &table).unwrap();
            prop_assert_eq!(plan.page_groups.len(), plan.page_count);
            let flattened: Vec<usize> = plan.page_groups.concat();
            prop_assert_eq!(flattened, (0..input.len()).collect::<Vec<_>>());
        }

        #[test]
        fn prop_larger_size_never_needs_fewer_pages(lengths in block_lengths(), table in nested_candidates()) {
            let counts: Vec<usize> = table
                .iter()
                .map(|c| simulate_pages(&lengths, c).page_count)
                .collect();
            prop_assert!(counts.windows(2).all(|w| w[0] >= w[1]), "{:?}", counts);
        }

        #[test]
        fn prop_pages_respect_capacity(lengths in block_lengths(), table in nested_candidates()) {
            let input: Vec<String> = lengths.iter().map(|n| "z".repeat(*n)).collect();
            let plan = fit(&input, &table).unwrap();
            let candidate = table.iter().find(|c| c.size == plan.font_size).unwrap();
            for (page, group) in plan.page_groups.iter().enumerate() {
                let cap = if page == 0 { candidate.first_page_lines } else { candidate.later_page_lines };
                let used: usize = group
                    .iter()
                    .map(|i| lines_needed(lengths[*i], candidate.chars_per_line))
                    .sum();
                // A single oversized block may overflow the page it sits on.
                prop_assert!(used <= cap || group.len() == 1, "page {} uses {} of {}", page, used, cap);
            }
        }
    }
}
