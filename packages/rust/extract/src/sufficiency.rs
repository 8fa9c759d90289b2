//! Decide whether static markup alone is "good enough".

use sitescope_shared::Section;

/// Returns true when the statically fetched sections carry enough
/// content to skip the rendered fallback.
///
/// Rules, in order:
/// - no sections at all → insufficient
/// - exactly one section holding the whole threshold → insufficient;
///   single-giant-section layouts (table-based pages with no semantic
///   structure) tend to hide richer interactive or paginated content.
///   This is a heuristic, not a correctness guarantee: it can force an
///   unnecessary render on a legitimately simple page.
/// - otherwise, sufficient iff total text length meets the threshold
pub fn is_static_sufficient(sections: &[Section], threshold: usize) -> bool {
    if sections.is_empty() {
        return false;
    }

    let total_len: usize = sections
        .iter()
        .map(|s| s.content.text.chars().count())
        .sum();

    if sections.len() == 1 && total_len >= threshold {
        return false;
    }

    total_len >= threshold
}
