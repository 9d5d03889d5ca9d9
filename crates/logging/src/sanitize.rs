use super::MAX_STRING_LEN;

pub fn truncate_text(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }

    let mut truncated = String::new();
    for ch in value.chars() {
        if truncated.len() + ch.len_utf8() > max_len {
            break;
        }
        truncated.push(ch);
    }

    format!("{truncated}...(truncated,len={})", value.len())
}

/// Single-line, length-capped form of a value for structured log fields.
pub fn sanitize_for_log(value: &str) -> String {
    let normalized = value.trim();
    if normalized.is_empty() {
        return String::new();
    }

    let single_line = normalized.replace(['\r', '\n'], " ");
    truncate_text(single_line.as_str(), MAX_STRING_LEN)
}
