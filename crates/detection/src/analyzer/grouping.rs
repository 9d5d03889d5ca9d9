use crate::classifier::blacklist_hit;
use crate::path_text;
use protocol::models::PathCandidate;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::time::SystemTime;

const GENERIC_LEAF_NAMES: &[&str] = &["appdata", "documents", "my games", "saved games"];
const APPDATA_CHILDREN: &[&str] = &["roaming", "local", "locallow"];
const PROFILE_PARENTS: &[&str] = &["users", "home"];

#[derive(Debug, Clone)]
pub(crate) struct FileEntry<'a> {
    pub path: &'a str,
    pub name_lower: String,
    pub latest_at: SystemTime,
}

/// Candidates accumulated under one directory key.
#[derive(Debug, Clone)]
pub(crate) struct DirectoryGroup<'a> {
    pub key: String,
    pub path: String,
    pub name_lower: String,
    pub candidates: Vec<&'a PathCandidate>,
    pub files: BTreeMap<String, FileEntry<'a>>,
    pub latest_at: SystemTime,
}

impl DirectoryGroup<'_> {
    pub fn vote_count(&self) -> usize {
        self.candidates.len()
    }
}

/// Decides which directories may never win: generic roots and blacklisted
/// locations, except anything under the game's own install directory.
#[derive(Debug, Clone)]
pub(crate) struct Exclusions {
    generic_root_keys: HashSet<String>,
    install_root_key: Option<String>,
}

impl Exclusions {
    pub fn new<'p>(
        generic_roots: impl IntoIterator<Item = &'p Path>,
        install_root: Option<&str>,
    ) -> Self {
        Self {
            generic_root_keys: generic_roots
                .into_iter()
                .map(|root| path_text::normalize_key(&root.to_string_lossy()))
                .collect(),
            install_root_key: install_root
                .map(path_text::normalize_key)
                .filter(|key| !key.is_empty()),
        }
    }

    pub fn is_excluded(&self, key: &str) -> bool {
        if self
            .install_root_key
            .as_deref()
            .is_some_and(|root| path_text::is_key_under(key, root))
        {
            return false;
        }
        self.is_generic_root(key) || blacklist_hit(key).is_some()
    }

    pub fn is_generic_root(&self, key: &str) -> bool {
        if self.generic_root_keys.contains(key) {
            return true;
        }
        let parts: Vec<&str> = path_text::components(key).collect();
        let Some(last) = parts.last() else {
            return true;
        };
        if parts.len() == 1 {
            return true;
        }
        let parent = parts[parts.len() - 2];
        GENERIC_LEAF_NAMES.contains(last)
            || (parent == "appdata" && APPDATA_CHILDREN.contains(last))
            || PROFILE_PARENTS.contains(&parent)
    }
}

/// Buckets candidates by containing directory. A candidate whose path is an
/// existing directory counts for that directory itself. Groups come back
/// ordered by key.
pub(crate) fn group_candidates<'a>(
    candidates: &'a [PathCandidate],
    exclusions: &Exclusions,
) -> Vec<DirectoryGroup<'a>> {
    group_candidates_with(candidates, exclusions, |path| Path::new(path).is_dir())
}

/// Grouping with the directory probe supplied by the caller. The probe runs
/// once per distinct path in a pass.
pub(crate) fn group_candidates_with<'a>(
    candidates: &'a [PathCandidate],
    exclusions: &Exclusions,
    mut is_dir: impl FnMut(&str) -> bool,
) -> Vec<DirectoryGroup<'a>> {
    let mut groups: BTreeMap<String, DirectoryGroup<'a>> = BTreeMap::new();
    let mut excluded: HashMap<String, bool> = HashMap::new();
    let mut directories: HashMap<&'a str, bool> = HashMap::new();

    for candidate in candidates {
        let path = candidate.path.trim();
        let path_is_dir = *directories.entry(path).or_insert_with(|| is_dir(path));
        let (directory, file) = if path_is_dir {
            (path_text::trim_trailing_separators(path), None)
        } else {
            let Some(parent) = path_text::parent_dir(path) else {
                continue;
            };
            (parent, Some(path))
        };

        let key = path_text::normalize_key(directory);
        let is_excluded = *excluded
            .entry(key.clone())
            .or_insert_with(|| exclusions.is_excluded(&key));
        if is_excluded {
            continue;
        }

        let group = groups.entry(key.clone()).or_insert_with(|| DirectoryGroup {
            key,
            path: directory.to_string(),
            name_lower: path_text::file_name(directory).to_lowercase(),
            candidates: Vec::new(),
            files: BTreeMap::new(),
            latest_at: candidate.detected_at,
        });
        group.candidates.push(candidate);
        group.latest_at = group.latest_at.max(candidate.detected_at);

        if let Some(file) = file {
            let entry = group
                .files
                .entry(path_text::normalize_key(file))
                .or_insert_with(|| FileEntry {
                    path: file,
                    name_lower: path_text::file_name(file).to_lowercase(),
                    latest_at: candidate.detected_at,
                });
            entry.latest_at = entry.latest_at.max(candidate.detected_at);
        }
    }

    groups.into_values().collect()
}
