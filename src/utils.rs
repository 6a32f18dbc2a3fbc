/// Final `.`-delimited extension of a file name, case-folded.
///
/// A name with no `.` has no extension and yields an empty string.
pub fn extension_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, extension)) => extension.to_lowercase(),
        None => String::new(),
    }
}

/// File name with its final `.`-delimited extension removed.
///
/// A name with no `.` is returned unchanged.
pub fn stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => name,
    }
}

/// Splits a `/`-separated path into its parent folder and leaf name.
///
/// A path with no `/` is all leaf, with an empty parent.
pub fn split_leaf(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((folder, leaf)) => (folder, leaf),
        None => ("", path),
    }
}
