use super::grouping::DirectoryGroup;
use crate::path_text;
use crate::similarity::jaro_winkler;
use crate::tables::{
    CHINESE_SAVE_DIR_SUFFIXES, COMMON_SAVE_DIR_FRAGMENTS, KNOWN_GOOD_PATH_FRAGMENTS,
    SAVE_DIR_SUFFIXES, SAVE_FILE_KEYWORDS,
};
use protocol::models::{CandidateSource, FileOperation};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::time::SystemTime;

const RECENCY_BONUSES: [f64; 3] = [30.0, 20.0, 10.0];

const WRITE_BONUS: f64 = 15.0;
const RENAME_BONUS: f64 = 10.0;
const WRITE_AND_RENAME_BONUS: f64 = 40.0;
const FEW_FILES_MAX: usize = 5;
const FEW_FILES_BONUS: f64 = 10.0;
const MANY_FILES_MIN: usize = 20;
const MANY_FILES_PENALTY: f64 = -20.0;

const HUGE_FILE_BYTES: u64 = 100 * 1024 * 1024;
const HUGE_FILE_PENALTY: f64 = -1000.0;
const EMPTY_FILE_PENALTY: f64 = -5.0;
const TYPICAL_FILE_MIN_BYTES: u64 = 1024;
const TYPICAL_FILE_MAX_BYTES: u64 = 50 * 1024 * 1024;
const TYPICAL_FILE_BONUS: f64 = 5.0;
const SAVE_KEYWORD_FILE_BONUS: f64 = 10.0;

const FRAGMENT_BONUS: f64 = 10.0;
const FRAGMENT_BONUS_CAP: f64 = 20.0;
const CHINESE_SUFFIX_BONUS: f64 = 20.0;
const SUFFIX_EXACT_BONUS: f64 = 25.0;
const SUFFIX_CONTAINS_BONUS: f64 = 10.0;
const KNOWN_GOOD_BONUS: f64 = 10.0;

const EXACT_VARIANT_SCORE: f64 = 50.0;
const FUZZY_VARIANT_SCORE: f64 = 40.0;
const BOUNDARY_VARIANT_SCORE: f64 = 25.0;
const FUZZY_THRESHOLD: f64 = 0.8;

const SIMILARITY_THRESHOLD: f64 = 0.8;
const SIMILARITY_TOP_PAIRS: usize = 2;
const SIMILARITY_BONUS: f64 = 30.0;
const SIMILARITY_MAX_FILES: usize = 256;

/// Rank bonus for the three most recent activity times. Groups sharing a
/// timestamp share its rank.
pub(crate) fn recency_bonuses(groups: &[DirectoryGroup<'_>]) -> Vec<f64> {
    let mut ranked: Vec<SystemTime> = groups.iter().map(|group| group.latest_at).collect();
    ranked.sort_unstable_by(|left, right| right.cmp(left));
    ranked.dedup();
    ranked.truncate(RECENCY_BONUSES.len());

    groups
        .iter()
        .map(|group| {
            ranked
                .iter()
                .position(|latest| *latest == group.latest_at)
                .map_or(0.0, |rank| RECENCY_BONUSES[rank])
        })
        .collect()
}

/// Write/rename activity plus the distinct-file-count adjustment.
pub(crate) fn behavior_score(group: &DirectoryGroup<'_>) -> f64 {
    let has_write = group
        .candidates
        .iter()
        .any(|candidate| candidate.operation == FileOperation::Write);
    let has_rename = group
        .candidates
        .iter()
        .any(|candidate| candidate.operation == FileOperation::Rename);
    let mut score = match (has_write, has_rename) {
        (true, true) => WRITE_AND_RENAME_BONUS,
        (true, false) => WRITE_BONUS,
        (false, true) => RENAME_BONUS,
        (false, false) => 0.0,
    };

    let file_count = group.files.len();
    if (1..=FEW_FILES_MAX).contains(&file_count) {
        score += FEW_FILES_BONUS;
    } else if file_count > MANY_FILES_MIN {
        score += MANY_FILES_PENALTY;
    }
    score
}

/// Per distinct file: size sanity from the filesystem when the file still
/// exists, plus a bonus for save-like names.
pub(crate) fn file_quality_score(group: &DirectoryGroup<'_>) -> f64 {
    group
        .files
        .values()
        .map(|file| {
            let size_score = match fs::metadata(file.path) {
                Ok(metadata) if metadata.is_file() => size_score(metadata.len()),
                _ => 0.0,
            };
            let keyword_score = if SAVE_FILE_KEYWORDS
                .iter()
                .any(|keyword| file.name_lower.contains(keyword))
            {
                SAVE_KEYWORD_FILE_BONUS
            } else {
                0.0
            };
            size_score + keyword_score
        })
        .sum()
}

fn size_score(len: u64) -> f64 {
    if len > HUGE_FILE_BYTES {
        HUGE_FILE_PENALTY
    } else if len == 0 {
        EMPTY_FILE_PENALTY
    } else if (TYPICAL_FILE_MIN_BYTES..=TYPICAL_FILE_MAX_BYTES).contains(&len) {
        TYPICAL_FILE_BONUS
    } else {
        0.0
    }
}

pub(crate) fn path_structure_score(group: &DirectoryGroup<'_>) -> f64 {
    let fragments = COMMON_SAVE_DIR_FRAGMENTS
        .iter()
        .filter(|fragment| group.key.contains(*fragment))
        .count();
    let mut score = (fragments as f64 * FRAGMENT_BONUS).min(FRAGMENT_BONUS_CAP);

    let name = group.name_lower.as_str();
    if CHINESE_SAVE_DIR_SUFFIXES
        .iter()
        .any(|suffix| name.ends_with(suffix))
    {
        score += CHINESE_SUFFIX_BONUS;
    }

    if SAVE_DIR_SUFFIXES.contains(&name) {
        score += SUFFIX_EXACT_BONUS;
    } else if SAVE_DIR_SUFFIXES.iter().any(|suffix| name.contains(suffix)) {
        score += SUFFIX_CONTAINS_BONUS;
    }

    score
        + KNOWN_GOOD_PATH_FRAGMENTS
            .iter()
            .filter(|fragment| path_text::contains_whole_word(&group.key, fragment))
            .count() as f64
            * KNOWN_GOOD_BONUS
}

/// Strongest of: the directory name equals a variant, the name is fuzzily
/// close to a core variant, or a variant sits on word boundaries somewhere in
/// the full path.
pub(crate) fn variant_match_score(
    group: &DirectoryGroup<'_>,
    variants: &BTreeSet<String>,
    core: &BTreeSet<String>,
) -> f64 {
    if variants.contains(&group.name_lower) {
        return EXACT_VARIANT_SCORE;
    }
    if core
        .iter()
        .any(|variant| jaro_winkler(&group.name_lower, variant) >= FUZZY_THRESHOLD)
    {
        return FUZZY_VARIANT_SCORE;
    }
    if variants
        .iter()
        .any(|variant| path_text::contains_whole_word(&group.key, variant))
    {
        return BOUNDARY_VARIANT_SCORE;
    }
    0.0
}

pub(crate) fn etw_score(group: &DirectoryGroup<'_>, etw_bonus: f64) -> f64 {
    if group
        .candidates
        .iter()
        .any(|candidate| candidate.source == CandidateSource::KernelTrace)
    {
        etw_bonus
    } else {
        0.0
    }
}

/// Pairs up the most recent distinct files by Jaro-Winkler similarity of
/// their names and keeps the top pairs. A directory holding a strict majority
/// of the pair slots gets the bonus.
pub(crate) fn similarity_bonuses(groups: &[DirectoryGroup<'_>]) -> Vec<f64> {
    let mut files: Vec<(usize, &str, std::time::SystemTime)> = groups
        .iter()
        .enumerate()
        .flat_map(|(index, group)| {
            group
                .files
                .values()
                .map(move |file| (index, file.name_lower.as_str(), file.latest_at))
        })
        .filter(|(_, name, _)| !name.is_empty())
        .collect();
    files.sort_by(|left, right| right.2.cmp(&left.2));
    files.truncate(SIMILARITY_MAX_FILES);

    let mut pairs: Vec<(f64, usize, usize)> = Vec::new();
    for (offset, (left_group, left_name, _)) in files.iter().enumerate() {
        for (right_group, right_name, _) in &files[offset + 1..] {
            let similarity = jaro_winkler(left_name, right_name);
            if similarity >= SIMILARITY_THRESHOLD {
                pairs.push((similarity, *left_group, *right_group));
            }
        }
    }
    pairs.sort_by(|left, right| right.0.partial_cmp(&left.0).unwrap_or(Ordering::Equal));
    pairs.truncate(SIMILARITY_TOP_PAIRS);

    let mut bonuses = vec![0.0; groups.len()];
    let slots = pairs.len() * 2;
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for (_, left, right) in &pairs {
        *counts.entry(*left).or_default() += 1;
        *counts.entry(*right).or_default() += 1;
    }
    for (index, count) in counts {
        if count * 2 > slots {
            bonuses[index] = SIMILARITY_BONUS;
        }
    }
    bonuses
}
