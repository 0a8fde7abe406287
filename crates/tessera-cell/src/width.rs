//! Monospace display-width measurement for grapheme clusters.
//!
//! Widgets must never hardcode width 1: wide CJK ideographs, most emoji, and
//! a handful of other ranges occupy two terminal columns. This module is the
//! single place that decides, backed by `unicode-width` for the common case
//! with a small heuristic layer for emoji presentation that the crate alone
//! under-reports.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Visual width, in terminal columns, of a single grapheme cluster.
///
/// Always returns 1 or 2; zero-width combining sequences collapse onto
/// their base character rather than reporting 0, since a `Cell` always
/// occupies at least one column.
pub fn cluster_width(cluster: &str) -> u16 {
    if cluster.is_empty() {
        return 1;
    }
    if is_wide_emoji(cluster) {
        return 2;
    }
    match UnicodeWidthStr::width(cluster) {
        0 => 1,
        1 => 1,
        _ => 2,
    }
}

/// Split `text` into grapheme clusters, the unit `ScreenBuffer::set` expects.
pub fn graphemes(text: &str) -> impl Iterator<Item = &str> {
    text.graphemes(true)
}

fn is_wide_emoji(cluster: &str) -> bool {
    let mut chars = cluster.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    is_emoji_scalar(first) || cluster.contains('\u{FE0F}') || cluster.contains('\u{200D}')
}

fn is_emoji_scalar(c: char) -> bool {
    let cp = c as u32;
    matches!(
        cp,
        0x1F300..=0x1FAFF
            | 0x2600..=0x27BF
            | 0x1F1E6..=0x1F1FF // regional indicators (flags)
            | 0x2B00..=0x2BFF
    )
}
