/// Checks if a candidate string matches an exclude pattern
///
/// Patterns are prefixes: a pattern with no wildcard matches every candidate
/// that starts with it. A `*` inside the pattern matches any run of
/// characters (including none), so the pattern behaves as if it always ended
/// with an implicit `*`.
///
/// # Examples
///
/// ```
/// use scopecrawl::url::matches_pattern;
///
/// // Plain prefix
/// assert!(matches_pattern("/private", "/private/x"));
/// assert!(!matches_pattern("/private", "/public/private"));
///
/// // Wildcard
/// assert!(matches_pattern("/blog/*/drafts", "/blog/2024/drafts/one"));
/// assert!(!matches_pattern("/blog/*/drafts", "/blog/2024/posts"));
/// ```
pub fn matches_pattern(pattern: &str, candidate: &str) -> bool {
    let mut parts = pattern.split('*');

    // The first literal part is anchored at the start
    let first = parts.next().unwrap_or_default();
    let Some(mut rest) = candidate.strip_prefix(first) else {
        return false;
    };

    // Every later literal must appear, in order, somewhere after the previous one
    for part in parts {
        if part.is_empty() {
            continue;
        }
        match rest.find(part) {
            Some(index) => rest = &rest[index + part.len()..],
            None => return false,
        }
    }

    true
}
