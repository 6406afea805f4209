use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Canonical form for place-name and keyword matching.
///
/// Accents are stripped (NFKD, combining marks dropped) and the text is
/// lowercased. Only ASCII letters and digits survive; every run of anything
/// else, including letters with no ASCII decomposition such as `ß` or `ø`,
/// becomes a single space. The result is either empty or ASCII words joined
/// by single spaces.
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;

    for c in input.nfkd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_space = true;
        }
    }

    out
}

/// Whole-word containment on already normalized text.
pub fn contains_word_sequence(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let padded_haystack = format!(" {} ", haystack);
    let padded_needle = format!(" {} ", needle);
    padded_haystack.contains(&padded_needle)
}
