//! Windows-style path text helpers.
//!
//! Candidate paths come from kernel events and watcher callbacks as plain
//! strings, and they are compared long after the files may be gone. These
//! helpers work on the text alone, accept both `\` and `/`, and never touch
//! the filesystem.

pub fn is_separator(ch: char) -> bool {
    ch == '\\' || ch == '/'
}

pub fn trim_trailing_separators(path: &str) -> &str {
    let trimmed = path.trim_end_matches(is_separator);
    if trimmed.is_empty() && !path.is_empty() {
        return &path[..1];
    }
    trimmed
}

/// Lowercased comparison key with `\` as the only separator and no trailing
/// separator.
pub fn normalize_key(path: &str) -> String {
    trim_trailing_separators(path.trim())
        .chars()
        .map(|ch| if ch == '/' { '\\' } else { ch })
        .collect::<String>()
        .to_lowercase()
}

pub fn parent_dir(path: &str) -> Option<&str> {
    let trimmed = trim_trailing_separators(path);
    let index = trimmed.rfind(is_separator)?;
    if index == 0 {
        return Some(&trimmed[..1]);
    }
    Some(&trimmed[..index])
}

pub fn file_name(path: &str) -> &str {
    let trimmed = trim_trailing_separators(path);
    match trimmed.rfind(is_separator) {
        Some(index) => &trimmed[index + 1..],
        None => trimmed,
    }
}

/// Lowercased extension without the dot. Dotfiles such as `.config` have none.
pub fn extension(path: &str) -> Option<String> {
    let name = file_name(path);
    let index = name.rfind('.')?;
    if index == 0 || index + 1 == name.len() {
        return None;
    }
    Some(name[index + 1..].to_lowercase())
}

pub fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split(is_separator).filter(|part| !part.is_empty())
}

/// Drive-letter (`C:\`), UNC (`\\server\share`) or, on Unix hosts, an
/// absolute `/` root.
pub fn has_volume_root(path: &str) -> bool {
    let bytes = path.as_bytes();
    if bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && is_separator(char::from(bytes[2]))
    {
        return true;
    }
    if path.starts_with("\\\\") || path.starts_with("//") {
        return path[2..].chars().next().is_some_and(|ch| !is_separator(ch));
    }
    cfg!(not(windows)) && path.starts_with('/')
}

/// Substring search that only counts hits bounded by a non-alphanumeric
/// character or the edge of `haystack` on both sides.
pub fn contains_whole_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, matched)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + matched.len()..].chars().next();
        before.is_none_or(|ch| !ch.is_alphanumeric()) && after.is_none_or(|ch| !ch.is_alphanumeric())
    })
}

/// True when `path` equals `root` or lies below it. Both sides are compared as
/// normalized keys.
pub fn is_under(path: &str, root: &str) -> bool {
    let root_key = normalize_key(root);
    if root_key.is_empty() {
        return false;
    }
    let path_key = normalize_key(path);
    is_key_under(&path_key, &root_key)
}

pub fn is_key_under(path_key: &str, root_key: &str) -> bool {
    match path_key.strip_prefix(root_key) {
        Some("") => true,
        Some(rest) => rest.starts_with('\\') || root_key.ends_with('\\'),
        None => false,
    }
}

#[cfg(test)]
#[path = "../tests/path_text_tests.inc"]
mod path_text_tests;
