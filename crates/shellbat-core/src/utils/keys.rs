//! Location key comparisons.
//!
//! Location keys are shell parsing names (`C:\Users\me`, `/home/me`,
//! `::{GUID}`). They compare case-insensitively and both separators are
//! accepted when testing parent/child relations.

const SEPARATORS: [char; 2] = ['\\', '/'];

/// Case-insensitive key equality
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    if a.len() == b.len() && a.eq_ignore_ascii_case(b) {
        return true;
    }
    a.to_lowercase() == b.to_lowercase()
}

/// True if `key` is `root` itself or a path below it.
///
/// `C:\Data` matches `C:\Data`, `C:\Data\x.txt` and `C:\Data/sub/y`, but not
/// `C:\DataOther`.
pub fn is_same_or_descendant(key: &str, root: &str) -> bool {
    if root.is_empty() {
        return false;
    }

    if eq_ignore_case(key, root) {
        return true;
    }

    let trimmed = root.trim_end_matches(SEPARATORS);
    let key = key.to_lowercase();
    let trimmed = trimmed.to_lowercase();

    match key.strip_prefix(trimmed.as_str()) {
        Some(rest) => rest.starts_with(SEPARATORS),
        None => false,
    }
}
