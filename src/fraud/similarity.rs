//! Fuzzy string similarity on a 0–100 scale.
//!
//! All metrics work on a processed form of the input: lowercase, every
//! non-alphanumeric character replaced by a space, whitespace collapsed.

use std::collections::BTreeSet;

/// Lowercase, keep letters and digits, collapse everything else to single spaces.
pub fn process(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn scaled(similarity: f64) -> u8 {
    (similarity * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Normalised Levenshtein similarity of two already processed strings.
/// An empty side scores 0.
pub fn ratio(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    scaled(strsim::normalized_levenshtein(a, b))
}

/// Best [`ratio`] of the shorter string against every same-length window
/// of the longer one. Catches names missing a legal-form suffix.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a = process(a);
    let b = process(b);
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    if short.is_empty() {
        return 0;
    }
    let width = short.chars().count();
    let long: Vec<char> = long.chars().collect();
    if width == long.len() {
        return ratio(&short, &long.iter().collect::<String>());
    }

    let mut best = 0;
    for window in long.windows(width) {
        best = best.max(ratio(&short, &window.iter().collect::<String>()));
        if best == 100 {
            break;
        }
    }
    best
}

fn sorted_tokens(s: &str) -> Vec<String> {
    let mut tokens: Vec<String> = process(s).split(' ').filter(|t| !t.is_empty()).map(String::from).collect();
    tokens.sort();
    tokens
}

/// [`ratio`] after sorting tokens. Catches reordered words.
pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    ratio(&sorted_tokens(a).join(" "), &sorted_tokens(b).join(" "))
}

/// Compares the shared tokens with each side's full token set.
/// Catches extra boilerplate words on either side.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    let ta: BTreeSet<String> = sorted_tokens(a).into_iter().collect();
    let tb: BTreeSet<String> = sorted_tokens(b).into_iter().collect();

    let join = |set: Vec<&String>| set.into_iter().map(String::as_str).collect::<Vec<_>>().join(" ");
    let sect = join(ta.intersection(&tb).collect());
    let diff_ab = join(ta.difference(&tb).collect());
    let diff_ba = join(tb.difference(&ta).collect());

    let combine = |diff: &str| format!("{sect} {diff}").trim().to_string();
    let a_full = combine(&diff_ab);
    let b_full = combine(&diff_ba);

    ratio(&sect, &a_full)
        .max(ratio(&sect, &b_full))
        .max(ratio(&a_full, &b_full))
}
