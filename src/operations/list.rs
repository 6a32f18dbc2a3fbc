use std::collections::HashSet;
use std::time::Instant;

use regex::Regex;
use tracing::{debug, warn};

use crate::client::FtpClient;
use crate::operations::release;
use crate::signal::CancelSignal;
use crate::types::{DirEntry, EntryKind, FilterCriteria};
use crate::utils::extension_of;

/// Lists a remote directory and filters the entries.
///
/// Any failure along the way (a triggered signal, a failed connect, a failed
/// fetch) yields an empty result instead of an error. Callers rely on
/// "empty means no match" (notably the existence check), so a broken listing
/// and an empty directory are indistinguishable here; failures are logged at
/// warn level.
///
/// Surviving entries keep the server's order.
pub async fn ls(
    client: &FtpClient,
    signal: &CancelSignal,
    remote_dir: &str,
    criteria: &FilterCriteria,
) -> Vec<DirEntry> {
    let list_time = Instant::now();

    if let Some(reason) = signal.cause() {
        warn!("ls of {:?} skipped: {}", remote_dir, reason);
        return Vec::new();
    }

    let mut conn = match client.connect().await {
        Ok(conn) => conn,
        Err(err) => {
            warn!("ls of {:?} could not connect: {}", remote_dir, err);
            return Vec::new();
        }
    };
    let fetched = conn.list(remote_dir).await;
    release(conn.as_mut()).await;

    let raw = match fetched {
        Ok(raw) => raw,
        Err(err) => {
            warn!("ls of {:?} failed: {}", remote_dir, err);
            return Vec::new();
        }
    };

    let entries = apply_filters(raw, criteria);
    debug!(
        "Listed {:?}: {} entries kept. Time taken {:?}",
        remote_dir,
        entries.len(),
        list_time.elapsed(),
    );
    entries
}

/// Applies the filtering policy to raw directory entries:
/// entries that are neither files nor directories are dropped, the synthetic
/// `.`/`..` entries are dropped, then the extension allow-list (case-folded)
/// and the full-name pattern are applied. Fetch order is preserved.
pub(crate) fn apply_filters(raw: Vec<DirEntry>, criteria: &FilterCriteria) -> Vec<DirEntry> {
    let allowed: HashSet<String> = criteria
        .extensions
        .iter()
        .map(|extension| extension.to_lowercase())
        .collect();

    let pattern = if criteria.pattern.is_empty() {
        None
    } else {
        match Regex::new(&criteria.pattern) {
            Ok(re) => Some(re),
            Err(err) => {
                warn!("Invalid listing pattern {:?}: {}", criteria.pattern, err);
                return Vec::new();
            }
        }
    };

    raw.into_iter()
        .filter(|entry| {
            match entry.kind {
                EntryKind::File => {}
                EntryKind::Directory => {
                    if entry.name == "." || entry.name == ".." {
                        return false;
                    }
                }
                _ => return false,
            }

            // An entry without a "." has no extension and never passes a
            // non-empty allow-list.
            if !allowed.is_empty() && !allowed.contains(&extension_of(&entry.name)) {
                return false;
            }

            if let Some(re) = &pattern {
                if !re.is_match(&entry.name) {
                    return false;
                }
            }

            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, kind: EntryKind) -> DirEntry {
        DirEntry {
            name: name.to_string(),
            kind,
            size: 1000,
            modified: None,
        }
    }

    fn fixture() -> Vec<DirEntry> {
        vec![
            entry("te-st.XML", EntryKind::File),
            entry("testicule.XML.done", EntryKind::File),
            entry("ab-test.json", EntryKind::File),
            entry("test-amant.JSON.done", EntryKind::File),
            entry("ab-test-amant.mp4", EntryKind::File),
            entry("folder", EntryKind::Directory),
            entry("folder-test", EntryKind::Directory),
            entry(".", EntryKind::Directory),
            entry("..", EntryKind::Directory),
            entry("link", EntryKind::Symlink),
        ]
    }

    fn names(entries: &[DirEntry]) -> Vec<&str> {
        entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    #[test]
    fn no_criteria_drops_dot_entries_and_unknown_kinds() {
        let kept = apply_filters(fixture(), &FilterCriteria::default());
        assert_eq!(
            names(&kept),
            vec![
                "te-st.XML",
                "testicule.XML.done",
                "ab-test.json",
                "test-amant.JSON.done",
                "ab-test-amant.mp4",
                "folder",
                "folder-test",
            ]
        );
    }

    #[test]
    fn extension_allow_list_is_case_insensitive() {
        let criteria = FilterCriteria::new(vec!["json".into(), "DONE".into()], "");
        let kept = apply_filters(fixture(), &criteria);
        assert_eq!(
            names(&kept),
            vec!["testicule.XML.done", "ab-test.json", "test-amant.JSON.done"]
        );
    }

    #[test]
    fn allow_list_drops_names_without_extension() {
        let criteria = FilterCriteria::new(vec!["json".into()], "");
        let kept = apply_filters(fixture(), &criteria);
        // "folder" and "folder-test" have no extension at all.
        assert_eq!(names(&kept), vec!["ab-test.json"]);
    }

    #[test]
    fn pattern_matches_the_full_name() {
        let criteria = FilterCriteria::new(Vec::new(), "test");
        let kept = apply_filters(fixture(), &criteria);
        // "te-st.XML" has no literal "test" substring; directories still
        // participate in pattern matching.
        assert_eq!(
            names(&kept),
            vec![
                "testicule.XML.done",
                "ab-test.json",
                "test-amant.JSON.done",
                "ab-test-amant.mp4",
                "folder-test",
            ]
        );
    }

    #[test]
    fn pattern_is_a_regex() {
        let criteria = FilterCriteria::new(Vec::new(), "^ab-.*\\.json$");
        let kept = apply_filters(fixture(), &criteria);
        assert_eq!(names(&kept), vec!["ab-test.json"]);
    }

    #[test]
    fn extension_and_pattern_compose() {
        let criteria = FilterCriteria::new(vec!["done".into()], "amant");
        let kept = apply_filters(fixture(), &criteria);
        assert_eq!(names(&kept), vec!["test-amant.JSON.done"]);
    }

    #[test]
    fn invalid_pattern_matches_nothing() {
        let criteria = FilterCriteria::new(Vec::new(), "(");
        assert!(apply_filters(fixture(), &criteria).is_empty());
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(apply_filters(Vec::new(), &FilterCriteria::default()).is_empty());
    }
}
