use serde::de::DeserializeOwned;

use crate::agent::Failure;

/// Drop a surrounding Markdown code fence (```` ```json ... ``` ````), if any.
pub fn strip_code_fences(response: &str) -> String {
    let trimmed = response.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let lines: Vec<&str> = trimmed.lines().collect();
    let end = if lines.len() > 1 && lines[lines.len() - 1].trim_start().starts_with("```") {
        lines.len() - 1
    } else {
        lines.len()
    };
    lines[1..end].join("\n")
}

/// Deserialize the first JSON array found in a model response.
///
/// Leading or trailing chatter around the array is ignored; anything that
/// does not deserialize into `T` is a [`Failure::MalformedResponse`].
pub fn extract_json_array<T: DeserializeOwned>(response: &str) -> Result<Vec<T>, Failure> {
    let text = strip_code_fences(response);
    let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) else {
        return Err(Failure::malformed("no JSON array in response"));
    };
    if end < start {
        return Err(Failure::malformed("no JSON array in response"));
    }

    serde_json::from_str(&text[start..=end])
        .map_err(|e| Failure::malformed(format!("invalid JSON array: {e}")))
}

/// Parse a response that must be a single integer and nothing else.
///
/// Only surrounding whitespace is tolerated. Signs other than a leading
/// `-`, leading zeros, trailing punctuation and code fences are rejected.
pub fn parse_integer(response: &str) -> Result<i64, Failure> {
    let text = response.trim();
    let digits = text.strip_prefix('-').unwrap_or(text);
    let canonical = !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'));
    let malformed = || Failure::malformed(format!("expected a single integer, got {text:?}"));
    if !canonical {
        return Err(malformed());
    }
    text.parse::<i64>().map_err(|_| malformed())
}
