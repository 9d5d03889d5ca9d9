use std::path::{Path, PathBuf};

/// Per-user directories games commonly write saves under.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownDirs {
    pub user_profile: Option<PathBuf>,
    pub roaming: Option<PathBuf>,
    pub local: Option<PathBuf>,
    pub local_low: Option<PathBuf>,
    pub documents: Option<PathBuf>,
    pub my_games: Option<PathBuf>,
    pub saved_games: Option<PathBuf>,
}

impl KnownDirs {
    /// Resolves the current user's folders through the platform's known-folder
    /// lookup, so redirected Documents folders are honoured.
    pub fn from_env() -> Self {
        Self::resolve(
            dirs::home_dir(),
            dirs::data_dir(),
            dirs::data_local_dir(),
            dirs::document_dir(),
        )
    }

    /// Derives the layout below a profile root the way Windows lays it out.
    pub fn from_profile(user_profile: &Path) -> Self {
        let app_data = user_profile.join("AppData");
        Self::resolve(
            Some(user_profile.to_path_buf()),
            Some(app_data.join("Roaming")),
            Some(app_data.join("Local")),
            Some(user_profile.join("Documents")),
        )
    }

    fn resolve(
        user_profile: Option<PathBuf>,
        roaming: Option<PathBuf>,
        local: Option<PathBuf>,
        documents: Option<PathBuf>,
    ) -> Self {
        let local_low = local
            .as_deref()
            .and_then(Path::parent)
            .map(|app_data| app_data.join("LocalLow"));
        let my_games = documents.as_ref().map(|docs| docs.join("My Games"));
        let saved_games = user_profile.as_ref().map(|home| home.join("Saved Games"));
        Self {
            user_profile,
            roaming,
            local,
            local_low,
            documents,
            my_games,
            saved_games,
        }
    }

    /// Roots too broad to be a save folder themselves.
    pub fn generic_roots(&self) -> Vec<&Path> {
        [
            self.roaming.as_deref(),
            self.local.as_deref(),
            self.local_low.as_deref(),
            self.documents.as_deref(),
            self.my_games.as_deref(),
            self.saved_games.as_deref(),
            self.user_profile.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Bases that game keywords get joined onto when guessing save folders.
    pub fn keyword_bases(&self) -> Vec<&Path> {
        [
            self.roaming.as_deref(),
            self.local.as_deref(),
            self.documents.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[cfg(test)]
#[path = "../tests/known_dirs_tests.inc"]
mod known_dirs_tests;
