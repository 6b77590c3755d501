//! Frame-merge algorithm shared by the streaming reconcilers.
//!
//! OCR emits the same sentence over and over with small edits: prefix
//! growth ("你" → "你好"), window shifts ("the quick brown" → "quick brown
//! fox"), and recognition corrections ("Helo wor" → "Hello wor").
//! [`merge_frames`] folds each new frame into the working buffer without
//! duplicating overlapping spans.
//!
//! The algorithm is deterministic: given the same `(old, new)` pair it
//! always produces the same output, which is what makes the reconcilers
//! testable as pure state machines.
//!
//! All indexing is in characters, not bytes — the inputs are routinely CJK.

use strsim::normalized_levenshtein;

/// Minimum boundary overlap considered meaningful.
const MIN_OVERLAP: usize = 2;
/// How far back to scan for a suffix/prefix boundary overlap.
const MAX_OVERLAP_SCAN: usize = 20;

/// Merge a new recognition frame into the working buffer.
///
/// Rules, applied in order:
///
/// 1. Empty buffer: the frame replaces it.
/// 2. Similar length (0.6–1.5×) and edit-similarity ≥ 0.5: the frame is a
///    corrected re-read of the same sentence — replace.
/// 3. The frame starts with the buffer (progressive reveal): replace.
/// 4. The buffer appears inside the frame: replace.
/// 5. The longest buffer-suffix that prefixes the frame (2–20 chars) is
///    spliced out: `old + new[overlap..]`.
/// 6. Longest-common-substring fallback: continuation when the match ends
///    the buffer, rewrite when it starts both, prefix-keep otherwise;
///    with no usable match, prefer the frame when it is at least 70 % of
///    the buffer's length, keep the buffer when it is 1.5× longer than
///    the frame, and otherwise take the frame.
pub fn merge_frames(old: &str, new: &str) -> String {
    if old.is_empty() {
        return new.to_string();
    }

    let oc: Vec<char> = old.chars().collect();
    let nc: Vec<char> = new.chars().collect();

    // Corrected re-read of the same sentence: replace, don't concatenate.
    let len_ratio = nc.len() as f64 / oc.len().max(1) as f64;
    if (0.6..=1.5).contains(&len_ratio) && normalized_levenshtein(old, new) >= 0.5 {
        return new.to_string();
    }

    // Progressive reveal.
    if new.starts_with(old) {
        return new.to_string();
    }
    if new.contains(old) {
        return new.to_string();
    }

    // Boundary overlap: a suffix of the buffer equals a prefix of the frame.
    let max_check = oc.len().min(nc.len()).min(MAX_OVERLAP_SCAN);
    for i in (MIN_OVERLAP..=max_check).rev() {
        if oc[oc.len() - i..] == nc[..i] {
            let mut merged = old.to_string();
            merged.extend(nc[i..].iter());
            return merged;
        }
    }

    // Longest common substring decides continuation vs rewrite.
    let (a_start, b_start, size) = longest_common_substring(&oc, &nc);
    if size >= MIN_OVERLAP {
        if a_start + size == oc.len() {
            // Match ends the buffer: the frame continues it.
            let mut merged = old.to_string();
            merged.extend(nc[b_start + size..].iter());
            return merged;
        }
        if a_start == 0 && b_start == 0 {
            // Match covers both starts: full rewrite.
            return new.to_string();
        }
        // Partial overlap in the middle: keep the buffer's prefix, take the
        // frame from there.
        let mut merged: String = oc[..a_start].iter().collect();
        merged.push_str(new);
        return merged;
    }

    // No usable overlap. A substantially-sized frame is a correction; a
    // much shorter one is likely an OCR dropout.
    if nc.len() as f64 > oc.len() as f64 * 0.7 {
        return new.to_string();
    }
    if oc.len() as f64 > nc.len() as f64 * 1.5 {
        return old.to_string();
    }
    new.to_string()
}

/// Longest common substring of two char slices.
///
/// Returns `(a_start, b_start, length)`. Ties resolve to the earliest
/// position in `a`, then in `b`, so the result is deterministic.
fn longest_common_substring(a: &[char], b: &[char]) -> (usize, usize, usize) {
    if a.is_empty() || b.is_empty() {
        return (0, 0, 0);
    }

    let mut best = (0usize, 0usize, 0usize);
    // prev[j] = length of common suffix of a[..i] and b[..j].
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            if a[i - 1] == b[j - 1] {
                curr[j] = prev[j - 1] + 1;
                if curr[j] > best.2 {
                    best = (i - curr[j], j - curr[j], curr[j]);
                }
            } else {
                curr[j] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut curr);
        curr.fill(0);
    }
    best
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // --- idempotence / algebra ---

    #[test]
    fn merge_identity() {
        assert_eq!(merge_frames("hello world", "hello world"), "hello world");
    }

    #[test]
    fn merge_empty_old_returns_new() {
        assert_eq!(merge_frames("", "你好"), "你好");
    }

    #[test]
    fn merge_prefix_growth() {
        assert_eq!(merge_frames("你好", "你好世界"), "你好世界");
    }

    #[test]
    fn merge_containment() {
        assert_eq!(merge_frames("quick brown", "the quick brown fox"), "the quick brown fox");
    }

    // --- corrected re-read ---

    #[test]
    fn merge_ocr_correction_replaces() {
        // Similar length, high similarity: replacement, not concatenation.
        assert_eq!(merge_frames("Helo wor", "Hello wor"), "Hello wor");
    }

    #[test]
    fn merge_cjk_variant_replaces() {
        assert_eq!(merge_frames("今天天气很好", "今天天氣很好"), "今天天氣很好");
    }

    // --- boundary overlap ---

    #[test]
    fn merge_boundary_overlap_splices() {
        assert_eq!(
            merge_frames("the quick brown", "quick brown fox"),
            "the quick brown fox"
        );
    }

    #[test]
    fn merge_boundary_overlap_cjk() {
        assert_eq!(merge_frames("我们今天去", "天去公园玩"), "我们今天去公园玩");
    }

    #[test]
    fn merge_overlap_below_minimum_is_not_spliced() {
        // Single shared character is not treated as an overlap; the longer
        // frame wins as a correction.
        let merged = merge_frames("abcX", "Xdef");
        assert_ne!(merged, "abcXdef");
    }

    // --- fallback preferences ---

    #[test]
    fn merge_unrelated_longer_new_wins() {
        let merged = merge_frames("小心火烛", "completely different text");
        assert_eq!(merged, "completely different text");
    }

    #[test]
    fn merge_unrelated_much_shorter_new_keeps_old() {
        let merged = merge_frames("一二三四五六七八九十", "琴棋");
        assert_eq!(merged, "一二三四五六七八九十");
    }

    // --- longest common substring helper ---

    #[test]
    fn lcs_finds_middle_run() {
        let a: Vec<char> = "xxabcdyy".chars().collect();
        let b: Vec<char> = "zzabcdww".chars().collect();
        assert_eq!(longest_common_substring(&a, &b), (2, 2, 4));
    }

    #[test]
    fn lcs_empty_inputs() {
        let a: Vec<char> = vec![];
        let b: Vec<char> = "ab".chars().collect();
        assert_eq!(longest_common_substring(&a, &b), (0, 0, 0));
    }

    #[test]
    fn lcs_ties_resolve_to_earliest() {
        let a: Vec<char> = "abab".chars().collect();
        let b: Vec<char> = "ab".chars().collect();
        assert_eq!(longest_common_substring(&a, &b), (0, 0, 2));
    }
}
