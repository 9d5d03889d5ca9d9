pub mod analyzer;
pub mod classifier;
pub mod path_text;
pub mod pipeline;
pub mod providers;
pub mod similarity;
pub mod tables;
pub mod variants;

pub use analyzer::VotingAnalyzer;
pub use classifier::{PathClassifier, Verdict, is_candidate_path};
pub use pipeline::{DetectionPipeline, detect};
pub use providers::{
    CandidateProvider, CandidateSink, DirectoryWatchProvider, KernelTraceProvider, PathFilter,
    ProviderContext, candidate_queue, select_provider,
};
pub use similarity::jaro_winkler;
pub use variants::{VariantCache, core_variants, generate_variants};

pub use protocol::models;
pub use protocol::{AppError, AppResult};
