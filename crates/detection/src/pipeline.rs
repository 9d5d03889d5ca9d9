//! Detection session orchestration: picks a provider, drains the candidate
//! queue on a fixed interval, runs the voting analyzer off the async threads
//! and stops as soon as a directory wins, the game exits, the time budget
//! runs out or the caller cancels.

use crate::analyzer::VotingAnalyzer;
use crate::classifier::PathClassifier;
use crate::providers::{CandidateProvider, ProviderContext, candidate_queue, select_provider};
use kernel::runtime::{run_blocking, sleep_or_cancel};
use protocol::models::{DetectionOptions, DetectionOutcome, GameIdentity, PathCandidate};
use savescout_system::{KnownDirs, TargetProcess, is_process_elevated};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Discovering,
    Analyzing,
    Resolved,
    Exhausted,
    Cancelled,
}

impl SessionState {
    fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Discovering => "discovering",
            Self::Analyzing => "analyzing",
            Self::Resolved => "resolved",
            Self::Exhausted => "exhausted",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Stops the provider on every exit path, including unwinding.
struct ProviderGuard(Box<dyn CandidateProvider>);

impl Drop for ProviderGuard {
    fn drop(&mut self) {
        self.0.stop();
    }
}

pub struct DetectionPipeline {
    options: DetectionOptions,
    known_dirs: KnownDirs,
    provider: Option<Box<dyn CandidateProvider>>,
}

impl DetectionPipeline {
    pub fn new(options: DetectionOptions) -> Self {
        Self {
            options: options.normalized(),
            known_dirs: KnownDirs::from_env(),
            provider: None,
        }
    }

    /// Replaces provider selection with a fixed provider.
    pub fn with_provider(mut self, provider: Box<dyn CandidateProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_known_dirs(mut self, known_dirs: KnownDirs) -> Self {
        self.known_dirs = known_dirs;
        self
    }

    pub fn options(&self) -> &DetectionOptions {
        &self.options
    }

    pub async fn run(
        self,
        process: Arc<dyn TargetProcess>,
        cancel: CancellationToken,
        game: GameIdentity,
    ) -> DetectionOutcome {
        let session_id = Uuid::new_v4().to_string();
        let options = self.options;
        let pid = process.pid();
        let mut state = SessionState::Idle;
        tracing::info!(
            event = "save_detection_started",
            session_id = session_id.as_str(),
            pid,
            game = savescout_logging::sanitize_for_log(&game.name),
            state = state.as_str()
        );

        if cancel.is_cancelled() {
            transition(&session_id, &mut state, SessionState::Cancelled);
            return DetectionOutcome::Cancelled;
        }

        transition(&session_id, &mut state, SessionState::Discovering);
        let provider = self
            .provider
            .unwrap_or_else(|| select_provider(&options, is_process_elevated()));
        let mut provider = ProviderGuard(provider);
        let (sink, mut receiver) = candidate_queue(options.queue_capacity);
        let provider_cancel = cancel.child_token();
        let ctx = ProviderContext {
            session_id: session_id.clone(),
            pid,
            game: game.clone(),
            options,
            known_dirs: self.known_dirs.clone(),
            cancel: provider_cancel.clone(),
            sink,
            runtime: tokio::runtime::Handle::current(),
        };
        let filter = PathClassifier::for_game(&game).into_filter();
        let provider_kind = provider.0.kind();
        match provider.0.start(&ctx, filter) {
            Ok(()) => tracing::info!(
                event = "candidate_provider_started",
                session_id = session_id.as_str(),
                provider = provider_kind.as_str()
            ),
            Err(error) => tracing::warn!(
                event = "candidate_provider_start_failed",
                session_id = session_id.as_str(),
                provider = provider_kind.as_str(),
                error_code = error.code.as_str(),
                error_detail = error.detail()
            ),
        }
        drop(ctx);

        transition(&session_id, &mut state, SessionState::Analyzing);
        let analyzer = Arc::new(Mutex::new(VotingAnalyzer::with_known_dirs(
            self.known_dirs.clone(),
        )));
        let game = Arc::new(game);
        let deadline = Instant::now() + options.max_detection_time();
        // Shared with the analysis job; unique again once the job returns.
        let mut accumulated: Arc<Vec<PathCandidate>> = Arc::new(Vec::new());
        let mut passes = 0u64;

        let outcome = loop {
            if cancel.is_cancelled() {
                break DetectionOutcome::Cancelled;
            }
            if process.has_exited() {
                tracing::info!(event = "target_process_exited", session_id = session_id.as_str(), pid);
                break DetectionOutcome::Exhausted;
            }
            let now = Instant::now();
            if now >= deadline {
                tracing::info!(
                    event = "save_detection_timed_out",
                    session_id = session_id.as_str(),
                    budget_secs = options.max_detection_secs
                );
                break DetectionOutcome::Exhausted;
            }

            let drained = drain_queue(&mut receiver, Arc::make_mut(&mut accumulated));
            if accumulated.len() >= options.min_vote_count {
                passes += 1;
                let winner = analyze(
                    &session_id,
                    Arc::clone(&analyzer),
                    Arc::clone(&accumulated),
                    options,
                    Arc::clone(&game),
                )
                .await;
                tracing::debug!(
                    event = "analysis_pass_finished",
                    session_id = session_id.as_str(),
                    pass = passes,
                    drained,
                    accumulated = accumulated.len()
                );
                if let Some(path) = winner {
                    break DetectionOutcome::Resolved(path);
                }
            }

            let wait = options.analysis_interval().min(deadline.saturating_duration_since(now));
            if !sleep_or_cancel(&cancel, wait.max(Duration::from_millis(1))).await {
                break DetectionOutcome::Cancelled;
            }
        };

        provider_cancel.cancel();
        drop(provider);

        let final_state = match &outcome {
            DetectionOutcome::Resolved(_) => SessionState::Resolved,
            DetectionOutcome::Exhausted => SessionState::Exhausted,
            DetectionOutcome::Cancelled => SessionState::Cancelled,
        };
        transition(&session_id, &mut state, final_state);
        tracing::info!(
            event = "save_detection_finished",
            session_id = session_id.as_str(),
            outcome = outcome.as_str(),
            candidates = accumulated.len(),
            passes,
            path = match &outcome {
                DetectionOutcome::Resolved(path) => savescout_logging::sanitize_for_log(path),
                _ => String::new(),
            }
        );
        outcome
    }
}

/// Runs a detection session with the default provider selection and returns
/// the winning directory, if any.
pub async fn detect(
    process: Arc<dyn TargetProcess>,
    cancel: CancellationToken,
    game: GameIdentity,
    options: DetectionOptions,
) -> Option<String> {
    DetectionPipeline::new(options)
        .run(process, cancel, game)
        .await
        .into_path()
}

fn transition(session_id: &str, state: &mut SessionState, next: SessionState) {
    tracing::debug!(
        event = "save_detection_state",
        session_id,
        from = state.as_str(),
        to = next.as_str()
    );
    *state = next;
}

fn drain_queue(
    receiver: &mut mpsc::Receiver<PathCandidate>,
    accumulated: &mut Vec<PathCandidate>,
) -> usize {
    let mut drained = 0usize;
    while let Ok(candidate) = receiver.try_recv() {
        accumulated.push(candidate);
        drained += 1;
    }
    drained
}

async fn analyze(
    session_id: &str,
    analyzer: Arc<Mutex<VotingAnalyzer>>,
    batch: Arc<Vec<PathCandidate>>,
    options: DetectionOptions,
    game: Arc<GameIdentity>,
) -> Option<String> {
    let result = run_blocking("save_directory_analysis", move || {
        let mut analyzer = analyzer.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(analyzer.find_best_save_directory(&batch, &options, &game))
    })
    .await;
    match result {
        Ok(winner) => winner,
        Err(error) => {
            tracing::warn!(
                event = "analysis_pass_failed",
                session_id,
                error_code = error.code.as_str(),
                error_detail = error.detail()
            );
            None
        }
    }
}

#[cfg(test)]
#[path = "../tests/pipeline_tests.inc"]
mod pipeline_tests;
