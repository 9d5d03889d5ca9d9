use super::{CandidateProvider, PathFilter, ProviderContext};
use protocol::AppResult;
use protocol::models::CandidateSource;
use std::collections::HashMap;

#[cfg_attr(not(windows), allow(dead_code))]
const MAX_TRACKED_FILE_OBJECTS: usize = 65_536;

/// Kernel file-I/O opcodes the provider reacts to.
#[cfg_attr(not(windows), allow(dead_code))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileIoEvent {
    Name,
    Create,
    Close,
    Write,
    Rename,
    Other,
}

#[cfg_attr(not(windows), allow(dead_code))]
impl FileIoEvent {
    pub(crate) fn from_opcode(opcode: u8) -> Self {
        match opcode {
            0 | 32 | 35 | 36 => Self::Name,
            64 => Self::Create,
            66 => Self::Close,
            68 => Self::Write,
            71 => Self::Rename,
            _ => Self::Other,
        }
    }
}

/// Kernel events name files by file object. Create events carry the path;
/// later writes and renames only carry the object, so the path is looked up
/// here.
#[cfg_attr(not(windows), allow(dead_code))]
#[derive(Debug, Default)]
pub(crate) struct FileObjectTable {
    names: HashMap<u64, String>,
    opened_by_target: HashMap<u64, String>,
}

#[cfg_attr(not(windows), allow(dead_code))]
impl FileObjectTable {
    pub(crate) fn record_name(&mut self, file_object: u64, path: String) {
        if self.names.len() >= MAX_TRACKED_FILE_OBJECTS {
            self.names.clear();
        }
        self.names.insert(file_object, path);
    }

    pub(crate) fn record_open(&mut self, file_object: u64, path: String) {
        if self.opened_by_target.len() >= MAX_TRACKED_FILE_OBJECTS {
            self.opened_by_target.clear();
        }
        self.opened_by_target.insert(file_object, path);
    }

    pub(crate) fn record_close(&mut self, file_object: u64) {
        self.opened_by_target.remove(&file_object);
    }

    /// Objects the target opened always resolve. Rundown names only count
    /// when the event itself is attributed to the target.
    pub(crate) fn resolve(&self, from_target: bool, keys: &[Option<u64>]) -> Option<&str> {
        for key in keys.iter().flatten() {
            if let Some(path) = self.opened_by_target.get(key) {
                return Some(path);
            }
        }
        if !from_target {
            return None;
        }
        keys.iter()
            .flatten()
            .find_map(|key| self.names.get(key))
            .map(String::as_str)
    }
}

/// NT device prefixes (`\Device\HarddiskVolume3`) and the drive letters they
/// are mounted as.
#[cfg_attr(not(windows), allow(dead_code))]
#[derive(Debug, Clone, Default)]
pub(crate) struct DeviceMap {
    entries: Vec<(String, String)>,
}

#[cfg_attr(not(windows), allow(dead_code))]
impl DeviceMap {
    pub(crate) fn new(entries: Vec<(String, String)>) -> Self {
        let mut entries: Vec<(String, String)> = entries
            .into_iter()
            .map(|(device, drive)| (device.trim_end_matches('\\').to_string(), drive))
            .filter(|(device, _)| !device.is_empty())
            .collect();
        entries.sort_by(|left, right| right.0.len().cmp(&left.0.len()));
        Self { entries }
    }

    #[cfg(windows)]
    pub(crate) fn from_system() -> Self {
        use windows_sys::Win32::Storage::FileSystem::QueryDosDeviceW;

        let mut entries = Vec::new();
        for letter in b'A'..=b'Z' {
            let drive = format!("{}:", char::from(letter));
            let wide: Vec<u16> = drive.encode_utf16().chain(std::iter::once(0)).collect();
            let mut buffer = vec![0u16; 1024];
            let capacity = u32::try_from(buffer.len()).unwrap_or(u32::MAX);
            let written = unsafe { QueryDosDeviceW(wide.as_ptr(), buffer.as_mut_ptr(), capacity) };
            if written == 0 {
                continue;
            }
            let end = buffer.iter().position(|unit| *unit == 0).unwrap_or(buffer.len());
            entries.push((String::from_utf16_lossy(&buffer[..end]), drive));
        }
        Self::new(entries)
    }

    /// Rewrites a kernel path to its drive-letter form; unknown devices pass
    /// through unchanged.
    pub(crate) fn translate(&self, kernel_path: &str) -> String {
        if let Some(rest) = kernel_path.strip_prefix("\\??\\") {
            return rest.to_string();
        }
        for (device, drive) in &self.entries {
            let Some(head) = kernel_path.get(..device.len()) else {
                continue;
            };
            if !head.eq_ignore_ascii_case(device) {
                continue;
            }
            let tail = &kernel_path[device.len()..];
            if tail.is_empty() || tail.starts_with('\\') {
                return format!("{drive}{tail}");
            }
        }
        kernel_path.to_string()
    }
}

/// Kernel file-I/O tracing filtered to the target process. Needs elevation
/// and only exists on Windows.
#[derive(Default)]
pub struct KernelTraceProvider {
    #[cfg(windows)]
    active: Option<ActiveTrace>,
}

#[cfg(windows)]
struct ActiveTrace {
    session_id: String,
    trace: ferrisetw::trace::KernelTrace,
}

impl KernelTraceProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CandidateProvider for KernelTraceProvider {
    fn kind(&self) -> CandidateSource {
        CandidateSource::KernelTrace
    }

    #[cfg(windows)]
    fn start(&mut self, ctx: &ProviderContext, filter: PathFilter) -> AppResult<()> {
        self.stop();
        let trace = session::start(ctx, filter)?;
        tracing::info!(
            event = "kernel_trace_started",
            session_id = ctx.session_id.as_str(),
            pid = ctx.pid
        );
        self.active = Some(ActiveTrace {
            session_id: ctx.session_id.clone(),
            trace,
        });
        Ok(())
    }

    #[cfg(not(windows))]
    fn start(&mut self, ctx: &ProviderContext, _filter: PathFilter) -> AppResult<()> {
        Err(
            protocol::AppError::new("kernel_trace_unsupported", "当前平台不支持内核文件跟踪")
                .with_context("platform", std::env::consts::OS)
                .with_session_id(ctx.session_id.as_str()),
        )
    }

    fn stop(&mut self) {
        #[cfg(windows)]
        {
            let Some(active) = self.active.take() else {
                return;
            };
            let session_id = active.session_id.as_str();
            match active.trace.stop() {
                Ok(()) => tracing::info!(event = "kernel_trace_stopped", session_id),
                Err(error) => tracing::warn!(
                    event = "kernel_trace_stop_failed",
                    session_id,
                    error = format!("{error:?}")
                ),
            }
        }
    }
}

impl Drop for KernelTraceProvider {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(windows)]
mod session {
    use super::{DeviceMap, FileIoEvent, FileObjectTable};
    use crate::providers::{CandidateSink, PathFilter, ProviderContext, guard_callback, submit};
    use ferrisetw::EventRecord;
    use ferrisetw::parser::{Parser, Pointer};
    use ferrisetw::provider::{Provider, kernel_providers};
    use ferrisetw::schema_locator::SchemaLocator;
    use ferrisetw::trace::KernelTrace;
    use protocol::models::{CandidateSource, FileOperation};
    use protocol::{AppError, AppResult};
    use std::sync::{Arc, Mutex};

    const TRACE_NAME_PREFIX: &str = "SaveScoutFileTrace";

    struct TraceState {
        target_pid: u32,
        devices: DeviceMap,
        table: Mutex<FileObjectTable>,
        sink: CandidateSink,
        filter: PathFilter,
    }

    pub(super) fn start(ctx: &ProviderContext, filter: PathFilter) -> AppResult<KernelTrace> {
        let state = Arc::new(TraceState {
            target_pid: ctx.pid,
            devices: DeviceMap::from_system(),
            table: Mutex::new(FileObjectTable::default()),
            sink: ctx.sink.clone(),
            filter,
        });

        let callback_state = Arc::clone(&state);
        let file_io = Provider::kernel(&kernel_providers::FILE_INIT_IO_PROVIDER)
            .add_callback(move |record: &EventRecord, locator: &SchemaLocator| {
                guard_callback("kernel_trace_event", || {
                    handle_record(&callback_state, record, locator)
                });
            })
            .build();
        // Name and rundown events share the provider GUID and reach the
        // callback above.
        let file_names = Provider::kernel(&kernel_providers::FILE_IO_PROVIDER).build();

        KernelTrace::new()
            .named(format!("{TRACE_NAME_PREFIX}-{}", ctx.session_id))
            .enable(file_io)
            .enable(file_names)
            .start_and_process()
            .map_err(|error| {
                AppError::new("kernel_trace_start_failed", "内核文件跟踪启动失败")
                    .with_context("traceError", format!("{error:?}"))
                    .with_session_id(ctx.session_id.as_str())
            })
    }

    fn handle_record(state: &TraceState, record: &EventRecord, locator: &SchemaLocator) {
        let kind = FileIoEvent::from_opcode(record.opcode());
        if kind == FileIoEvent::Other {
            return;
        }
        let Ok(schema) = locator.event_schema(record) else {
            return;
        };
        let parser = Parser::create(record, &schema);
        let from_target = record.process_id() == state.target_pid;
        let file_object = parse_pointer(&parser, "FileObject");

        match kind {
            FileIoEvent::Name => {
                let (Some(file_object), Ok(name)) =
                    (file_object, parser.try_parse::<String>("FileName"))
                else {
                    return;
                };
                let path = state.devices.translate(&name);
                if let Ok(mut table) = state.table.lock() {
                    table.record_name(file_object, path);
                }
            }
            FileIoEvent::Create => {
                if !from_target {
                    return;
                }
                let Ok(open_path) = parser.try_parse::<String>("OpenPath") else {
                    return;
                };
                let path = state.devices.translate(&open_path);
                if let (Some(file_object), Ok(mut table)) = (file_object, state.table.lock()) {
                    table.record_open(file_object, path.clone());
                }
                emit(state, &path, FileOperation::Create);
            }
            FileIoEvent::Close => {
                if let (Some(file_object), Ok(mut table)) = (file_object, state.table.lock()) {
                    table.record_close(file_object);
                }
            }
            FileIoEvent::Write | FileIoEvent::Rename => {
                let file_key = parse_pointer(&parser, "FileKey");
                let path = {
                    let Ok(table) = state.table.lock() else {
                        return;
                    };
                    table
                        .resolve(from_target, &[file_object, file_key])
                        .map(str::to_string)
                };
                let Some(path) = path else {
                    return;
                };
                let operation = if kind == FileIoEvent::Write {
                    FileOperation::Write
                } else {
                    FileOperation::Rename
                };
                emit(state, &path, operation);
            }
            FileIoEvent::Other => {}
        }
    }

    fn parse_pointer(parser: &Parser, field: &str) -> Option<u64> {
        parser
            .try_parse::<Pointer>(field)
            .ok()
            .map(|pointer| *pointer as u64)
    }

    fn emit(state: &TraceState, path: &str, operation: FileOperation) {
        submit(
            &state.sink,
            &state.filter,
            path,
            CandidateSource::KernelTrace,
            operation,
        );
    }
}

#[cfg(test)]
#[path = "../../tests/kernel_trace_tests.inc"]
mod kernel_trace_tests;
