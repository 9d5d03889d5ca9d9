use super::{CandidateProvider, CandidateSink, PathFilter, ProviderContext, guard_callback, submit};
use crate::path_text;
use crate::variants::file_system_safe;
use anyhow::Context;
use kernel::runtime::{run_blocking, sleep_or_cancel};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use protocol::models::{CandidateSource, FileOperation, GameIdentity};
use protocol::{AppResult, ResultExt};
use savescout_system::KnownDirs;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Recursive file-system watches over the usual save locations. Works
/// without elevation.
#[derive(Default)]
pub struct DirectoryWatchProvider {
    session: Option<WatchSession>,
}

struct WatchSession {
    session_id: String,
    stop: CancellationToken,
    watches: Arc<Mutex<Vec<ActiveWatch>>>,
    task: JoinHandle<()>,
}

struct ActiveWatch {
    key: String,
    _watcher: RecommendedWatcher,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttachOutcome {
    Attached,
    Covered,
    Missing,
    Failed,
}

impl DirectoryWatchProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_watch_count(&self) -> usize {
        self.session
            .as_ref()
            .and_then(|session| session.watches.lock().ok().map(|watches| watches.len()))
            .unwrap_or(0)
    }

    /// Detection session the running watches belong to.
    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.session_id.as_str())
    }
}

impl CandidateProvider for DirectoryWatchProvider {
    fn kind(&self) -> CandidateSource {
        CandidateSource::DirectoryWatch
    }

    fn start(&mut self, ctx: &ProviderContext, filter: PathFilter) -> AppResult<()> {
        self.stop();

        let roots = watch_roots(&ctx.game, &ctx.known_dirs);
        let stop = ctx.cancel.child_token();
        let attacher = Attacher {
            session_id: ctx.session_id.clone(),
            sink: ctx.sink.clone(),
            filter,
            watches: Arc::new(Mutex::new(Vec::new())),
            stop: stop.clone(),
        };
        let watches = Arc::clone(&attacher.watches);
        let retry_count = ctx.options.provider_retry_count;
        let retry_interval = ctx.options.provider_retry_interval();

        tracing::info!(
            event = "directory_watch_starting",
            session_id = ctx.session_id.as_str(),
            root_count = roots.len()
        );

        let task = ctx.runtime.spawn(async move {
            let initial = attacher.clone();
            let pending = run_blocking("directory_watch_attach", move || {
                Ok(initial.attach_all(roots))
            })
            .await;
            let mut pending = match pending {
                Ok(pending) => pending,
                Err(error) => {
                    tracing::warn!(
                        event = "directory_watch_attach_failed",
                        session_id = attacher.session_id.as_str(),
                        error_code = error.code.as_str(),
                        error_detail = error.detail()
                    );
                    return;
                }
            };

            for attempt in 1..=retry_count {
                if pending.is_empty() || !sleep_or_cancel(&attacher.stop, retry_interval).await {
                    break;
                }
                let retry = attacher.clone();
                let waiting = std::mem::take(&mut pending);
                pending = run_blocking("directory_watch_retry", move || Ok(retry.attach_all(waiting)))
                    .await
                    .unwrap_or_default();
                tracing::debug!(
                    event = "directory_watch_retry",
                    session_id = attacher.session_id.as_str(),
                    attempt,
                    pending = pending.len()
                );
            }
        });

        self.session = Some(WatchSession {
            session_id: ctx.session_id.clone(),
            stop,
            watches,
            task,
        });
        Ok(())
    }

    fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        session.stop.cancel();
        session.task.abort();
        let released = match session.watches.lock() {
            Ok(mut watches) => {
                let count = watches.len();
                watches.clear();
                count
            }
            Err(poisoned) => {
                let mut watches = poisoned.into_inner();
                let count = watches.len();
                watches.clear();
                count
            }
        };
        tracing::info!(
            event = "directory_watch_stopped",
            session_id = session.session_id.as_str(),
            released
        );
    }
}

impl Drop for DirectoryWatchProvider {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Clone)]
struct Attacher {
    session_id: String,
    sink: CandidateSink,
    filter: PathFilter,
    watches: Arc<Mutex<Vec<ActiveWatch>>>,
    stop: CancellationToken,
}

impl Attacher {
    /// Attaches every root it can and hands back the ones that do not exist
    /// yet.
    fn attach_all(&self, roots: Vec<PathBuf>) -> Vec<PathBuf> {
        let mut pending = Vec::new();
        for root in roots {
            if self.stop.is_cancelled() {
                break;
            }
            match self.attach(&root) {
                AttachOutcome::Missing => pending.push(root),
                AttachOutcome::Attached | AttachOutcome::Covered | AttachOutcome::Failed => {}
            }
        }
        pending
    }

    fn attach(&self, root: &Path) -> AttachOutcome {
        if !root.is_dir() {
            return AttachOutcome::Missing;
        }
        let key = path_text::normalize_key(&root.to_string_lossy());
        if self.is_covered(&key) {
            return AttachOutcome::Covered;
        }

        let watcher = match self.create_watcher(root) {
            Ok(watcher) => watcher,
            Err(error) => {
                tracing::warn!(
                    event = "directory_watch_attach_failed",
                    session_id = self.session_id.as_str(),
                    root = %root.display(),
                    error_code = error.code.as_str(),
                    error_detail = error.detail()
                );
                return AttachOutcome::Failed;
            }
        };

        let Ok(mut watches) = self.watches.lock() else {
            return AttachOutcome::Failed;
        };
        if self.stop.is_cancelled() {
            return AttachOutcome::Failed;
        }
        watches.push(ActiveWatch {
            key,
            _watcher: watcher,
        });
        tracing::debug!(
            event = "directory_watch_attached",
            session_id = self.session_id.as_str(),
            root = %root.display()
        );
        AttachOutcome::Attached
    }

    fn is_covered(&self, key: &str) -> bool {
        self.watches.lock().is_ok_and(|watches| {
            watches
                .iter()
                .any(|watch| path_text::is_key_under(key, &watch.key))
        })
    }

    fn create_watcher(&self, root: &Path) -> AppResult<RecommendedWatcher> {
        let sink = self.sink.clone();
        let filter = Arc::clone(&self.filter);
        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            guard_callback("directory_watch_event", || handle_event(&sink, &filter, result));
        })
        .context("创建目录监听器失败")
        .with_code("directory_watch_create_failed", "创建目录监听器失败")?;
        watcher
            .watch(root, RecursiveMode::Recursive)
            .with_context(|| format!("监听目录失败: {}", root.display()))
            .with_code("directory_watch_failed", "监听目录失败")
            .with_ctx("root", root.display().to_string())?;
        Ok(watcher)
    }
}

fn handle_event(sink: &CandidateSink, filter: &PathFilter, result: notify::Result<Event>) {
    let event = match result {
        Ok(event) => event,
        Err(error) => {
            tracing::debug!(event = "directory_watch_error", error = error.to_string());
            return;
        }
    };
    let Some(operation) = map_event_kind(&event.kind) else {
        return;
    };
    // Renames reporting both ends list the new name last.
    let paths: &[PathBuf] = match event.kind {
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            event.paths.last().map(std::slice::from_ref).unwrap_or_default()
        }
        _ => &event.paths,
    };
    for path in paths {
        submit(
            sink,
            filter,
            &path.to_string_lossy(),
            CandidateSource::DirectoryWatch,
            operation,
        );
    }
}

pub(crate) fn map_event_kind(kind: &EventKind) -> Option<FileOperation> {
    match kind {
        EventKind::Create(_) => Some(FileOperation::Create),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => None,
        EventKind::Modify(ModifyKind::Name(_)) => Some(FileOperation::Rename),
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any) => Some(FileOperation::Write),
        _ => None,
    }
}

/// Roots to watch recursively: the install directory, the generic per-user
/// locations, and each game keyword joined onto Roaming, Local and Documents.
/// Deduplicated and ordered shallowest first so that nested roots end up
/// covered by their ancestors.
pub fn watch_roots(game: &GameIdentity, known_dirs: &KnownDirs) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = game.install_root().map(PathBuf::from).into_iter().collect();
    roots.extend(known_dirs.generic_roots().into_iter().map(Path::to_path_buf));

    let keywords = game_keywords(game);
    for base in known_dirs.keyword_bases() {
        for keyword in &keywords {
            roots.push(base.join(keyword));
        }
    }

    let mut seen = HashSet::new();
    roots.retain(|root| seen.insert(path_text::normalize_key(&root.to_string_lossy())));
    roots.sort_by_key(|root| root.components().count());
    roots
}

fn game_keywords(game: &GameIdentity) -> Vec<String> {
    let mut keywords = Vec::new();
    let categories = game.categories.iter().map(String::as_str);
    for raw in game
        .name_fields()
        .into_iter()
        .chain(game.developer_name())
        .chain(categories)
    {
        let safe = file_system_safe(raw.trim());
        if safe.is_empty() {
            continue;
        }
        let spaced = safe.replace('_', " ");
        if !keywords.contains(&spaced) {
            keywords.push(spaced);
        }
        if !keywords.contains(&safe) {
            keywords.push(safe);
        }
    }
    keywords
}

#[cfg(test)]
#[path = "../../tests/watch_tests.inc"]
mod watch_tests;
