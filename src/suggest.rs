// ==============================================================================
// String Similarity Utilities
// ==============================================================================
//
// Edit-distance helpers behind the "did you mean" hints in syntax
// diagnostics: a word the parser could not place is compared against the IDL
// keywords.

use crate::grammar::Terminal;

/// Compute the Levenshtein edit distance between two strings, counted in
/// characters.
///
/// Uses the standard dynamic programming algorithm with a two-row buffer.
/// This is sufficient for keywords and identifiers, which are short.
pub(crate) fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let b_len = b_chars.len();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev_row: Vec<usize> = (0..=b_len).collect();
    let mut curr_row = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr_row[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr_row[j + 1] = (prev_row[j] + cost) // substitution
                .min(prev_row[j + 1] + 1) // deletion
                .min(curr_row[j] + 1); // insertion
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }
    prev_row[b_len]
}

/// Maximum edit distance for a suggestion to be considered "close enough."
///
/// For short names (length <= 4), we require distance <= 1 to avoid noisy
/// suggestions. For longer names, we allow distance <= 2.
pub(crate) fn max_edit_distance(name_len: usize) -> usize {
    if name_len <= 4 { 1 } else { 2 }
}

/// The IDL keyword closest to `word`, if one is close enough and `word` is
/// not already a keyword. Ties go to the keyword listed first.
pub(crate) fn suggest_keyword(word: &str) -> Option<&'static str> {
    if Terminal::keyword(word).is_some() {
        return None;
    }
    let limit = max_edit_distance(word.chars().count());
    let mut best: Option<(usize, &'static str)> = None;
    for keyword in Terminal::idl_keywords() {
        let candidate = keyword.text();
        let distance = levenshtein(word, candidate);
        if distance <= limit && best.is_none_or(|(d, _)| distance < d) {
            best = Some((distance, candidate));
        }
    }
    best.map(|(_, keyword)| keyword)
}
