use crate::path_text;
use crate::providers::PathFilter;
use crate::tables::{
    BLACKLIST_KEYWORDS, SAVE_DIR_SUFFIXES, SAVE_EXTENSIONS, SAVE_FILE_KEYWORDS,
    STANDARD_LOCATION_TOKENS,
};
use crate::variants::{VariantSet, generate_variants};
use protocol::models::{FileOperation, GameIdentity};
use std::sync::Arc;

const SHORT_VARIANT_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    NoVolumeRoot,
    Blacklisted(&'static str),
    VariantMatch,
    SaveExtension,
    KeywordInStandardLocation,
    SaveDirSuffix,
    NoSignal,
}

impl Verdict {
    pub fn is_accepted(self) -> bool {
        matches!(
            self,
            Self::VariantMatch
                | Self::SaveExtension
                | Self::KeywordInStandardLocation
                | Self::SaveDirSuffix
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoVolumeRoot => "no_volume_root",
            Self::Blacklisted(_) => "blacklisted",
            Self::VariantMatch => "variant_match",
            Self::SaveExtension => "save_extension",
            Self::KeywordInStandardLocation => "keyword_in_standard_location",
            Self::SaveDirSuffix => "save_dir_suffix",
            Self::NoSignal => "no_signal",
        }
    }
}

/// First blacklist entry found as a whole word in a normalized path key.
pub fn blacklist_hit(path_key: &str) -> Option<&'static str> {
    BLACKLIST_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| path_text::contains_whole_word(path_key, keyword))
}

/// Cheap per-event filter run on provider threads. Holds its own variant set
/// so it never shares state with the analyzer.
#[derive(Debug, Clone)]
pub struct PathClassifier {
    variants: VariantSet,
    install_root_key: Option<String>,
}

impl PathClassifier {
    pub fn for_game(game: &GameIdentity) -> Self {
        Self::new(Arc::new(generate_variants(game)), game.install_root())
    }

    pub fn new(variants: VariantSet, install_root: Option<&str>) -> Self {
        Self {
            variants,
            install_root_key: install_root
                .map(path_text::normalize_key)
                .filter(|key| !key.is_empty()),
        }
    }

    pub fn is_candidate_path(&self, path: &str, operation: FileOperation) -> bool {
        self.classify(path, operation).is_accepted()
    }

    pub fn classify(&self, path: &str, operation: FileOperation) -> Verdict {
        let path = path.trim();
        if !path_text::has_volume_root(path) {
            return Verdict::NoVolumeRoot;
        }

        let key = path_text::normalize_key(path);
        let under_install_root = self
            .install_root_key
            .as_deref()
            .is_some_and(|root| path_text::is_key_under(&key, root));
        if !under_install_root {
            if let Some(keyword) = blacklist_hit(&key) {
                return Verdict::Blacklisted(keyword);
            }
        }

        if self.matches_variant(&key) {
            return Verdict::VariantMatch;
        }

        if path_text::extension(path)
            .is_some_and(|extension| SAVE_EXTENSIONS.contains(&extension.as_str()))
        {
            return Verdict::SaveExtension;
        }

        let name = path_text::file_name(path).to_lowercase();
        let has_save_keyword = SAVE_FILE_KEYWORDS
            .iter()
            .any(|keyword| name.contains(keyword));
        let in_standard_location = STANDARD_LOCATION_TOKENS
            .iter()
            .any(|token| key.contains(token));
        if has_save_keyword && in_standard_location {
            return Verdict::KeywordInStandardLocation;
        }

        if operation.is_write_or_rename() {
            let parent_name = path_text::parent_dir(path)
                .map(path_text::file_name)
                .unwrap_or_default()
                .to_lowercase();
            if SAVE_DIR_SUFFIXES
                .iter()
                .any(|suffix| parent_name.ends_with(suffix))
            {
                return Verdict::SaveDirSuffix;
            }
        }

        Verdict::NoSignal
    }

    fn matches_variant(&self, path_key: &str) -> bool {
        self.variants.iter().any(|variant| {
            if variant.chars().count() < SHORT_VARIANT_LEN {
                path_text::contains_whole_word(path_key, variant)
            } else {
                path_key.contains(variant.as_str())
            }
        })
    }

    /// Wraps the classifier as the filter handed to providers.
    pub fn into_filter(self) -> PathFilter {
        let classifier = Arc::new(self);
        Arc::new(move |path: &str, operation: FileOperation| {
            let verdict = classifier.classify(path, operation);
            tracing::trace!(
                event = "candidate_path_classified",
                verdict = verdict.as_str(),
                operation = operation.as_str(),
                path = savescout_logging::sanitize_for_log(path)
            );
            verdict.is_accepted()
        })
    }
}

/// One-shot form of [`PathClassifier::is_candidate_path`] that derives the
/// variant set from `game` on every call.
pub fn is_candidate_path(path: &str, game: &GameIdentity, operation: FileOperation) -> bool {
    PathClassifier::for_game(game).is_candidate_path(path, operation)
}

#[cfg(test)]
#[path = "../tests/classifier_tests.inc"]
mod classifier_tests;
