//! Voting analyzer: groups queued candidates by directory, scores every group
//! on independent signals and picks the strongest one above the confidence
//! threshold.

mod grouping;
mod scoring;

use crate::path_text;
use crate::variants::VariantCache;
use grouping::{Exclusions, group_candidates};
use protocol::models::{DetectionOptions, GameIdentity, PathCandidate, ScoreSignals, ScoredDirectory};
use savescout_system::KnownDirs;
use std::cmp::Ordering;

/// Owned by the analysis loop. Keeps the variant cache for the game it last
/// scored.
#[derive(Debug)]
pub struct VotingAnalyzer {
    cache: VariantCache,
    known_dirs: KnownDirs,
}

impl Default for VotingAnalyzer {
    fn default() -> Self {
        Self::with_known_dirs(KnownDirs::from_env())
    }
}

impl VotingAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_known_dirs(known_dirs: KnownDirs) -> Self {
        Self {
            cache: VariantCache::new(),
            known_dirs,
        }
    }

    /// Every eligible directory with its score breakdown, best first. Equal
    /// scores are ordered by normalized key.
    pub fn score_directories(
        &mut self,
        candidates: &[PathCandidate],
        options: &DetectionOptions,
        game: &GameIdentity,
    ) -> Vec<ScoredDirectory> {
        if candidates.is_empty() {
            return Vec::new();
        }
        let (variants, core) = self.cache.prepare(game);
        let exclusions = Exclusions::new(self.known_dirs.generic_roots(), game.install_root());
        let groups = group_candidates(candidates, &exclusions);
        if groups.is_empty() {
            return Vec::new();
        }

        let recency = scoring::recency_bonuses(&groups);
        let similarity = scoring::similarity_bonuses(&groups);

        let mut scored: Vec<(String, ScoredDirectory)> = groups
            .iter()
            .enumerate()
            .map(|(index, group)| {
                let signals = ScoreSignals {
                    recency: recency[index],
                    behavior: scoring::behavior_score(group),
                    file_quality: scoring::file_quality_score(group),
                    path_structure: scoring::path_structure_score(group),
                    variant_match: scoring::variant_match_score(group, &variants, &core),
                    etw: scoring::etw_score(group, options.etw_bonus),
                    similarity: similarity[index],
                };
                let directory = ScoredDirectory {
                    path: group.path.clone(),
                    score: signals.total(),
                    vote_count: group.vote_count(),
                    latest_at: Some(group.latest_at),
                    signals,
                };
                (group.key.clone(), directory)
            })
            .collect();

        scored.sort_by(|(left_key, left), (right_key, right)| {
            right
                .score
                .partial_cmp(&left.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| left_key.cmp(right_key))
        });
        scored.into_iter().map(|(_, directory)| directory).collect()
    }

    /// The winning directory, or `None` when no group has enough votes and a
    /// score at or above the confidence threshold.
    pub fn find_best_save_directory(
        &mut self,
        candidates: &[PathCandidate],
        options: &DetectionOptions,
        game: &GameIdentity,
    ) -> Option<String> {
        let scored = self.score_directories(candidates, options, game);
        let best = scored
            .into_iter()
            .find(|directory| directory.vote_count >= options.min_vote_count)?;

        if best.score < options.confidence_threshold {
            tracing::debug!(
                event = "save_directory_below_threshold",
                path = savescout_logging::sanitize_for_log(&best.path),
                score = best.score,
                threshold = options.confidence_threshold,
                votes = best.vote_count
            );
            return None;
        }

        tracing::info!(
            event = "save_directory_selected",
            path = savescout_logging::sanitize_for_log(&best.path),
            key = path_text::normalize_key(&best.path),
            score = best.score,
            votes = best.vote_count,
            recency = best.signals.recency,
            behavior = best.signals.behavior,
            file_quality = best.signals.file_quality,
            path_structure = best.signals.path_structure,
            variant_match = best.signals.variant_match,
            etw = best.signals.etw,
            similarity = best.signals.similarity
        );
        Some(best.path)
    }
}

#[cfg(test)]
#[path = "../../tests/analyzer_tests.inc"]
mod analyzer_tests;
