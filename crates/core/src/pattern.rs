//! Glob matching used by the filter engine and `load_toolset`. `*` matches
//! any sequence, including the empty one; every other character is literal.
//! Matching is anchored over the whole candidate string.

/// Returns true if `pattern` matches `candidate` in full.
pub fn matches(pattern: &str, candidate: &str) -> bool {
    fast_glob::glob_match(pattern, candidate)
}

/// Returns true if any pattern in `patterns` matches `candidate`.
pub fn matches_any<S: AsRef<str>>(patterns: &[S], candidate: &str) -> bool {
    patterns.iter().any(|p| matches(p.as_ref(), candidate))
}
