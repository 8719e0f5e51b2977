use std::cmp::Ordering;

use crate::Note;

/// Ascending order: unpinned before pinned, then older before newer.
pub fn compare(a: &Note, b: &Note) -> Ordering {
	a.is_pinned().cmp(&b.is_pinned()).then_with(|| a.modifydate.total_cmp(&b.modifydate))
}

/// Sorts for display: pinned first, then most recently modified. Exact ties keep their relative
/// order.
pub fn sort_notes(notes: &mut [Note]) {
	notes.sort_by(|a, b| compare(b, a));
}
