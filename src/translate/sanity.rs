//! Sanity rules for LLM translation candidates.
//!
//! LLMs fail in characteristic ways on subtitle input: runaway repetition
//! loops, inflated output, or a wall of one repeated CJK phrase. A
//! candidate that trips any rule is treated as a provider failure and the
//! dispatcher falls through to MT. Rejected candidates are never cached.

/// Hard output-length cap, whichever is larger: absolute or 8 × source.
const ABS_MAX_CHARS: usize = 2000;
const REL_MAX_FACTOR: usize = 8;

/// A token repeating this many times anywhere is a loop.
const TOKEN_REPEAT_HARD: usize = 15;
/// A token repeating this often *and* dominating the output is a loop.
const TOKEN_REPEAT_SOFT: usize = 8;
const TOKEN_DOMINANCE: f64 = 0.30;

/// CJK substring lengths scanned for phrase loops.
const CJK_SUB_MIN: usize = 2;
const CJK_SUB_MAX: usize = 8;
/// A short CJK substring repeating this often is a loop.
const CJK_REPEAT: usize = 15;

/// Check a candidate translation against the sanity rules.
///
/// Returns `Err(reason)` naming the violated rule.
pub fn check(source: &str, candidate: &str) -> Result<(), &'static str> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return Err("empty");
    }

    let source_chars = source.chars().count();
    let candidate_chars = trimmed.chars().count();
    if candidate_chars > ABS_MAX_CHARS.max(REL_MAX_FACTOR * source_chars) {
        return Err("excessive length");
    }

    // Whitespace-token repetition.
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    if !tokens.is_empty() {
        let mut counts: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
        for t in &tokens {
            *counts.entry(*t).or_insert(0) += 1;
        }
        let max_count = counts.values().copied().max().unwrap_or(0);
        if max_count >= TOKEN_REPEAT_HARD {
            return Err("token repetition");
        }
        if max_count >= TOKEN_REPEAT_SOFT
            && max_count as f64 >= tokens.len() as f64 * TOKEN_DOMINANCE
        {
            return Err("token dominance");
        }
    }

    // Short CJK phrase loops (no whitespace to tokenize on).
    if cjk_phrase_loops(trimmed) {
        return Err("cjk phrase repetition");
    }

    Ok(())
}

/// Count repetitions of every 2–8 char CJK substring; `true` when any
/// repeats at least [`CJK_REPEAT`] times.
fn cjk_phrase_loops(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() < CJK_SUB_MIN * CJK_REPEAT {
        return false;
    }

    for len in CJK_SUB_MIN..=CJK_SUB_MAX {
        if chars.len() < len * CJK_REPEAT {
            break;
        }
        let mut counts: std::collections::HashMap<String, usize> =
            std::collections::HashMap::new();
        for window in chars.windows(len) {
            if !window.iter().all(|&c| crate::lang::is_cjk_family(c)) {
                continue;
            }
            let key: String = window.iter().collect();
            let n = counts.entry(key).or_insert(0);
            *n += 1;
            if *n >= CJK_REPEAT {
                return true;
            }
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
