const LOG_LEVEL_ENV: &str = "SAVESCOUT_LOG_LEVEL";

pub fn normalize_level(value: &str) -> Option<&'static str> {
    match value.trim().to_ascii_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

pub(super) fn resolve_log_level() -> String {
    let env_level = std::env::var(LOG_LEVEL_ENV).ok();
    resolve_log_level_from(env_level.as_deref())
}

pub(super) fn resolve_log_level_from(env_level: Option<&str>) -> String {
    if let Some(level) = env_level.and_then(normalize_level) {
        return level.to_string();
    }

    if cfg!(debug_assertions) {
        "debug".to_string()
    } else {
        "info".to_string()
    }
}
