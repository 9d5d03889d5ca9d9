use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

const DEFAULT_QUEUE_CAPACITY: usize = 4096;
const DEFAULT_ANALYSIS_INTERVAL_MS: u64 = 2_000;
const DEFAULT_MIN_VOTE_COUNT: usize = 2;
const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 60.0;
const DEFAULT_ETW_BONUS: f64 = 20.0;
const DEFAULT_MAX_DETECTION_SECS: u64 = 600;
const DEFAULT_PROVIDER_RETRY_COUNT: u32 = 30;
const DEFAULT_PROVIDER_RETRY_INTERVAL_MS: u64 = 10_000;
const DEFAULT_ALLOW_ETW: bool = true;

/// Read-only description of the game being detected. Every field is optional;
/// an identity without any name still runs through the whitelist heuristics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameIdentity {
    pub name: String,
    pub localized_name: Option<String>,
    pub original_name: Option<String>,
    pub chinese_name: Option<String>,
    pub developer: Option<String>,
    pub categories: Vec<String>,
    pub install_dir: Option<String>,
}

impl GameIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_developer(mut self, developer: impl Into<String>) -> Self {
        self.developer = Some(developer.into());
        self
    }

    pub fn with_install_dir(mut self, install_dir: impl Into<String>) -> Self {
        self.install_dir = Some(install_dir.into());
        self
    }

    /// Display, localized, original and Chinese names in that order, blanks skipped.
    pub fn name_fields(&self) -> Vec<&str> {
        [
            Some(self.name.as_str()),
            self.localized_name.as_deref(),
            self.original_name.as_deref(),
            self.chinese_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|value| !value.trim().is_empty())
        .collect()
    }

    pub fn developer_name(&self) -> Option<&str> {
        self.developer
            .as_deref()
            .filter(|value| !value.trim().is_empty())
    }

    pub fn install_root(&self) -> Option<&str> {
        self.install_dir
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Cache key for derived variant sets. Compared by value, so callers may
    /// rebuild the identity on every call.
    pub fn composite_key(&self) -> String {
        let mut key = String::new();
        for value in [
            Some(self.name.as_str()),
            self.localized_name.as_deref(),
            self.original_name.as_deref(),
            self.chinese_name.as_deref(),
            self.developer.as_deref(),
            self.install_dir.as_deref(),
        ] {
            key.push_str(value.unwrap_or_default());
            key.push('\u{1f}');
        }
        key.push_str(self.categories.join("\u{1e}").as_str());
        key
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    KernelTrace,
    DirectoryWatch,
}

impl CandidateSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KernelTrace => "kernel_trace",
            Self::DirectoryWatch => "directory_watch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOperation {
    Create,
    Write,
    Rename,
    Unknown,
}

impl FileOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Write => "write",
            Self::Rename => "rename",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_write_or_rename(self) -> bool {
        matches!(self, Self::Write | Self::Rename)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCandidate {
    pub path: String,
    pub source: CandidateSource,
    pub detected_at: SystemTime,
    pub operation: FileOperation,
}

impl PathCandidate {
    pub fn new(path: impl Into<String>, source: CandidateSource, operation: FileOperation) -> Self {
        Self {
            path: path.into(),
            source,
            detected_at: SystemTime::now(),
            operation,
        }
    }

    pub fn at(mut self, detected_at: SystemTime) -> Self {
        self.detected_at = detected_at;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectionOptions {
    pub queue_capacity: usize,
    pub analysis_interval_ms: u64,
    pub min_vote_count: usize,
    pub confidence_threshold: f64,
    pub etw_bonus: f64,
    pub max_detection_secs: u64,
    pub provider_retry_count: u32,
    pub provider_retry_interval_ms: u64,
    pub allow_etw: bool,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            analysis_interval_ms: DEFAULT_ANALYSIS_INTERVAL_MS,
            min_vote_count: DEFAULT_MIN_VOTE_COUNT,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            etw_bonus: DEFAULT_ETW_BONUS,
            max_detection_secs: DEFAULT_MAX_DETECTION_SECS,
            provider_retry_count: DEFAULT_PROVIDER_RETRY_COUNT,
            provider_retry_interval_ms: DEFAULT_PROVIDER_RETRY_INTERVAL_MS,
            allow_etw: DEFAULT_ALLOW_ETW,
        }
    }
}

impl DetectionOptions {
    pub fn normalized(mut self) -> Self {
        self.queue_capacity = self.queue_capacity.clamp(64, 65_536);
        self.analysis_interval_ms = self.analysis_interval_ms.clamp(100, 60_000);
        self.min_vote_count = self.min_vote_count.clamp(1, 1_000);
        if !self.confidence_threshold.is_finite() {
            self.confidence_threshold = DEFAULT_CONFIDENCE_THRESHOLD;
        }
        self.confidence_threshold = self.confidence_threshold.max(0.0);
        if !self.etw_bonus.is_finite() {
            self.etw_bonus = DEFAULT_ETW_BONUS;
        }
        self.etw_bonus = self.etw_bonus.clamp(0.0, 500.0);
        self.max_detection_secs = self.max_detection_secs.clamp(1, 24 * 60 * 60);
        self.provider_retry_count = self.provider_retry_count.min(1_000);
        self.provider_retry_interval_ms = self.provider_retry_interval_ms.clamp(100, 600_000);
        self
    }

    pub fn analysis_interval(&self) -> Duration {
        Duration::from_millis(self.analysis_interval_ms)
    }

    pub fn max_detection_time(&self) -> Duration {
        Duration::from_secs(self.max_detection_secs)
    }

    pub fn provider_retry_interval(&self) -> Duration {
        Duration::from_millis(self.provider_retry_interval_ms)
    }
}

/// Per-signal breakdown of a directory score, kept for debug logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSignals {
    pub recency: f64,
    pub behavior: f64,
    pub file_quality: f64,
    pub path_structure: f64,
    pub variant_match: f64,
    pub etw: f64,
    pub similarity: f64,
}

impl ScoreSignals {
    pub fn total(&self) -> f64 {
        self.recency
            + self.behavior
            + self.file_quality
            + self.path_structure
            + self.variant_match
            + self.etw
            + self.similarity
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredDirectory {
    pub path: String,
    pub score: f64,
    pub vote_count: usize,
    #[serde(skip)]
    pub latest_at: Option<SystemTime>,
    pub signals: ScoreSignals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "path")]
pub enum DetectionOutcome {
    Resolved(String),
    Exhausted,
    Cancelled,
}

impl DetectionOutcome {
    pub fn into_path(self) -> Option<String> {
        match self {
            Self::Resolved(path) => Some(path),
            Self::Exhausted | Self::Cancelled => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resolved(_) => "resolved",
            Self::Exhausted => "exhausted",
            Self::Cancelled => "cancelled",
        }
    }
}

#[cfg(test)]
#[path = "../tests/models_tests.inc"]
mod models_tests;
