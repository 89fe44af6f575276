//! Path-string helpers.
//!
//! HALO stores locations as plain strings that may use either `/` or `\`
//! regardless of the host platform, so these helpers work on text rather
//! than on `std::path::Path`.

const SEPARATORS: [char; 2] = ['/', '\\'];

/// Whether `path` is a network share path (`\\server\share` or `//server/share`)
pub fn is_unc(path: &str) -> bool {
    path.starts_with("\\\\") || path.starts_with("//")
}

/// Whether `path` is a bare drive specifier such as `D:`
fn is_drive(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Strip trailing separators, keeping a bare root (`/`, `D:\`) intact
pub fn trim_separators(dir: &str) -> &str {
    let trimmed = dir.trim_end_matches(SEPARATORS);
    if trimmed.is_empty() {
        dir
    } else if is_drive(trimmed) && dir.len() > trimmed.len() {
        &dir[..trimmed.len() + 1]
    } else {
        trimmed
    }
}

/// Directory part of a location: everything before the last separator.
/// Roots keep their separator, so `D:\a.svs` lives in `D:\`, not `D:`.
pub fn parent_dir(location: &str) -> &str {
    match location.rfind(SEPARATORS) {
        Some(0) => &location[..1],
        Some(idx) if is_drive(&location[..idx]) => &location[..idx + 1],
        Some(idx) => &location[..idx],
        None => "",
    }
}

/// File name part of a location: everything after the last separator
pub fn file_name(location: &str) -> &str {
    match location.rfind(SEPARATORS) {
        Some(idx) => &location[idx + 1..],
        None => location,
    }
}

/// Whether two locations name the same file, whatever separators they use
pub fn same_location(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.chars().zip(b.chars()).all(|(x, y)| {
            x == y || (SEPARATORS.contains(&x) && SEPARATORS.contains(&y))
        })
}

/// Join a directory and a file name with the directory's own separator style
pub fn join(dir: &str, name: &str) -> String {
    let dir = trim_separators(dir);
    let separator = if dir.contains('\\') { '\\' } else { '/' };
    if dir.ends_with(SEPARATORS) {
        format!("{}{}", dir, name)
    } else {
        format!("{}{}{}", dir, separator, name)
    }
}
