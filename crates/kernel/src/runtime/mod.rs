mod blocking;

pub use blocking::{run_blocking, sleep_or_cancel};
