//! Near-duplicate detection for interview questions.
//!
//! Both inputs are normalized (lowercase, non-alphanumerics collapsed to single
//! spaces, trimmed) and compared with a character diff ratio:
//! `2 * matched / (len_a + len_b)`. 1.0 means identical after normalization,
//! 0.0 means no characters in common.

use ::similar::TextDiff;

/// Lowercases, replaces every run of non-alphanumeric characters with one space, trims.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }

    out
}

/// Similarity ratio in [0, 1] between two texts after normalization.
pub fn similar(a: &str, b: &str) -> f64 {
    ratio_normalized(&normalize(a), &normalize(b))
}

/// Same as [`similar`] for inputs already passed through [`normalize`].
pub fn ratio_normalized(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    f64::from(TextDiff::from_chars(a, b).ratio())
}

/// Returns the highest ratio between `candidate` and any entry of `history`.
/// All inputs must already be normalized. Blank history entries are ignored.
pub fn closest_match(candidate: &str, history: &[String]) -> Option<f64> {
    history
        .iter()
        .filter(|h| !h.is_empty())
        .map(|h| ratio_normalized(candidate, h))
        .fold(None, |best, r| match best {
            Some(b) if b >= r => Some(b),
            _ => Some(r),
        })
}
