use crate::{AppError, ResultExt};
use anyhow::Context;
use std::fs::{self, DirEntry};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{Builder as RollingBuilder, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[path = "config.rs"]
mod config;
#[path = "sanitize.rs"]
mod sanitize;

pub use config::normalize_level;
pub use sanitize::{sanitize_for_log, truncate_text};

const DEFAULT_KEEP_DAYS: u64 = 7;
const LOG_FILE_PREFIX: &str = "savescout";
const LOG_FILE_SUFFIX: &str = "log";
const MAX_STRING_LEN: usize = 512;

/// What `init_logging` settled on. The file writer itself stays alive in a
/// process-wide slot.
#[derive(Debug, Clone)]
pub struct LoggingGuard {
    pub log_dir: PathBuf,
    pub level: String,
}

static FILE_WORKER: OnceLock<Mutex<Option<WorkerGuard>>> = OnceLock::new();

fn keep_file_worker(guard: WorkerGuard) {
    let slot = FILE_WORKER.get_or_init(|| Mutex::new(None));
    if let Ok(mut slot) = slot.lock() {
        *slot = Some(guard);
    }
}

pub fn resolve_log_level() -> String {
    config::resolve_log_level()
}

/// Installs the global subscriber for hosts that don't bring their own: a
/// daily-rolling JSON file under `<base_dir>/logs`, plus a compact console
/// layer in debug builds. Leaves an existing subscriber in place.
pub fn init_logging(base_dir: &Path) -> Result<LoggingGuard, AppError> {
    let log_dir = base_dir.join("logs");
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("创建日志目录失败: {}", log_dir.display()))
        .with_code("log_dir_create_failed", "创建日志目录失败")
        .with_ctx("logDir", log_dir.display().to_string())?;
    let removed = cleanup_expired_logs(&log_dir, DEFAULT_KEEP_DAYS)?;

    let level = resolve_log_level();
    if !tracing::dispatcher::has_been_set() {
        let writer = open_file_writer(&log_dir)?;
        install_subscriber(&level, writer)?;
    }
    tracing::info!(
        event = "logging_initialized",
        log_dir = %log_dir.display(),
        level = level.as_str(),
        removed_logs = removed
    );

    Ok(LoggingGuard { log_dir, level })
}

fn open_file_writer(log_dir: &Path) -> Result<NonBlocking, AppError> {
    let appender = RollingBuilder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .build(log_dir)
        .with_context(|| format!("创建日志写入器失败: {}", log_dir.display()))
        .with_code("log_appender_create_failed", "创建日志写入器失败")
        .with_ctx("logDir", log_dir.display().to_string())?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    keep_file_worker(guard);
    Ok(writer)
}

fn install_subscriber(level: &str, writer: NonBlocking) -> Result<(), AppError> {
    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(writer)
        .with_current_span(false)
        .with_span_list(false);
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::new(level))
        .with(file_layer);

    #[cfg(debug_assertions)]
    let registry = registry.with(tracing_subscriber::fmt::layer().compact().with_target(true));

    registry
        .try_init()
        .with_context(|| format!("初始化日志订阅器失败: level={level}"))
        .with_code("log_subscriber_init_failed", "初始化日志订阅器失败")
        .with_ctx("logLevel", level)
}

/// Removes `savescout*` files older than `keep_days`. Returns how many went.
pub fn cleanup_expired_logs(log_dir: &Path, keep_days: u64) -> Result<usize, AppError> {
    let keep = Duration::from_secs(keep_days.saturating_mul(24 * 60 * 60));
    cleanup_expired_logs_with_duration(log_dir, keep, SystemTime::now())
}

fn cleanup_expired_logs_with_duration(
    log_dir: &Path,
    keep: Duration,
    now: SystemTime,
) -> Result<usize, AppError> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let entries = fs::read_dir(log_dir)
        .with_context(|| format!("读取日志目录失败: {}", log_dir.display()))
        .with_code("log_cleanup_read_dir_failed", "读取日志目录失败")
        .with_ctx("logDir", log_dir.display().to_string())?;

    let expired: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| is_expired_own_log(entry, keep, now))
        .map(|entry| entry.path())
        .collect();
    for path in &expired {
        fs::remove_file(path)
            .with_context(|| format!("删除过期日志失败: {}", path.display()))
            .with_code("log_cleanup_remove_failed", "删除过期日志失败")
            .with_ctx("logPath", path.display().to_string())?;
    }
    Ok(expired.len())
}

fn is_expired_own_log(entry: &DirEntry, keep: Duration, now: SystemTime) -> bool {
    let own = entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX));
    if !own {
        return false;
    }
    let Ok(metadata) = entry.metadata() else {
        return false;
    };
    metadata.is_file()
        && metadata
            .modified()
            .is_ok_and(|modified| now.duration_since(modified).unwrap_or_default() > keep)
}

#[cfg(test)]
#[path = "../tests/logging_tests.inc"]
mod logging_tests;
