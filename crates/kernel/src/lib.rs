pub mod runtime;

pub use protocol::models;
pub use protocol::{AppError, AppErrorPayload, AppResult, ErrorContextItem, ResultExt};
