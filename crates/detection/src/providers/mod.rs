//! Candidate sources feeding the shared queue.
//!
//! Providers run their own callbacks (watcher threads, the ETW processing
//! thread) and only ever touch the queue through [`CandidateSink`], which
//! never blocks: when the queue is full the candidate is dropped and counted.

mod kernel_trace;
mod watch;

pub use kernel_trace::KernelTraceProvider;
pub use watch::{DirectoryWatchProvider, watch_roots};

use protocol::AppResult;
use protocol::models::{CandidateSource, DetectionOptions, FileOperation, GameIdentity, PathCandidate};
use savescout_system::KnownDirs;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const DROP_LOG_EVERY: u64 = 1_000;

/// Decides on the producer thread whether a raw event becomes a candidate.
pub type PathFilter = Arc<dyn Fn(&str, FileOperation) -> bool + Send + Sync>;

pub trait CandidateProvider: Send {
    fn kind(&self) -> CandidateSource;

    /// Begins producing candidates into `ctx.sink`. Returns once the provider
    /// has been told to start; failures leave it unproductive.
    fn start(&mut self, ctx: &ProviderContext, filter: PathFilter) -> AppResult<()>;

    /// Idempotent. Releases OS resources; no candidates are offered afterwards.
    fn stop(&mut self);
}

/// Everything a provider needs from the session that started it.
#[derive(Clone)]
pub struct ProviderContext {
    pub session_id: String,
    pub pid: u32,
    pub game: GameIdentity,
    pub options: DetectionOptions,
    pub known_dirs: KnownDirs,
    pub cancel: CancellationToken,
    pub sink: CandidateSink,
    pub runtime: tokio::runtime::Handle,
}

/// Producer half of the bounded candidate queue.
#[derive(Debug, Clone)]
pub struct CandidateSink {
    sender: mpsc::Sender<PathCandidate>,
    dropped: Arc<AtomicU64>,
}

pub fn candidate_queue(capacity: usize) -> (CandidateSink, mpsc::Receiver<PathCandidate>) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (
        CandidateSink {
            sender,
            dropped: Arc::new(AtomicU64::new(0)),
        },
        receiver,
    )
}

impl CandidateSink {
    /// Non-blocking enqueue. Returns `false` when the candidate was dropped
    /// because the queue is full or the consumer is gone.
    pub fn offer(&self, candidate: PathCandidate) -> bool {
        match self.sender.try_send(candidate) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(candidate)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped == 1 || dropped % DROP_LOG_EVERY == 0 {
                    tracing::warn!(
                        event = "candidate_queue_full",
                        dropped,
                        source = candidate.source.as_str()
                    );
                }
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Runs one provider callback with panics contained, so a bad event never
/// unwinds into the watcher or ETW thread.
pub(crate) fn guard_callback(label: &'static str, callback: impl FnOnce()) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(callback)) {
        let detail = panic
            .downcast_ref::<&str>()
            .map(|value| value.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        tracing::error!(event = "provider_callback_panicked", callback = label, detail);
    }
}

/// Filters one raw event and offers it to the queue.
pub(crate) fn submit(
    sink: &CandidateSink,
    filter: &PathFilter,
    path: &str,
    source: CandidateSource,
    operation: FileOperation,
) -> bool {
    if path.is_empty() || !filter(path, operation) {
        return false;
    }
    sink.offer(PathCandidate::new(path, source, operation))
}

/// Kernel tracing when allowed and the process is elevated, directory
/// watching otherwise.
pub fn select_provider(options: &DetectionOptions, elevated: bool) -> Box<dyn CandidateProvider> {
    if options.allow_etw && elevated {
        Box::new(KernelTraceProvider::new())
    } else {
        Box::new(DirectoryWatchProvider::new())
    }
}

#[cfg(test)]
#[path = "../../tests/providers_tests.inc"]
mod providers_tests;
