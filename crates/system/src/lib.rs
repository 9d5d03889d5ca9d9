pub mod known_dirs;
pub mod privilege;
pub mod process;

pub use known_dirs::KnownDirs;
pub use privilege::is_process_elevated;
pub use process::{SystemProcess, TargetProcess};

pub use protocol::models;
