//! Minimal glob matching for processed file names.

/// Match `name` against a pattern where `*` stands for any run of
/// characters (including none). No other metacharacters are recognised.
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(head) = parts.next() else {
        return name.is_empty();
    };
    let Some(mut rest) = name.strip_prefix(head) else {
        return false;
    };

    let tail: Vec<&str> = parts.collect();
    let Some((last, middle)) = tail.split_last() else {
        // No `*` at all: the whole name must equal the pattern.
        return rest.is_empty();
    };

    for piece in middle {
        match rest.find(piece) {
            Some(idx) => rest = &rest[idx + piece.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}
