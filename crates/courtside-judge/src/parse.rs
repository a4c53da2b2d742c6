//! Recovery of a JSON object from raw model output.
//!
//! Models asked for JSON do not always answer with clean JSON: they wrap it
//! in markdown fences, add a sentence of preamble, or leave trailing commas.
//! [`extract_json`] tries progressively more forgiving strategies and only
//! ever returns a JSON *object*; what the object contains is validated
//! separately in [`crate::verdict`].

use serde_json::Value;

use crate::error::JudgeError;

/// Extract the first usable JSON object from a model response.
///
/// Strategies, in order:
/// 1. The whole response parses as an object
/// 2. The body of a fenced code block parses as an object
/// 3. The span from the first `{` to the last `}` parses as an object
/// 4. Any of the above after removing trailing commas
///
/// # Errors
///
/// Returns [`JudgeError::Parse`] when no strategy yields an object.
pub fn extract_json(raw: &str) -> Result<Value, JudgeError> {
    let trimmed = raw.trim();
    let candidates = [
        Some(trimmed),
        fenced_block(trimmed),
        brace_span(trimmed),
    ];

    for candidate in candidates.iter().flatten() {
        if let Some(obj) = parse_object(candidate) {
            return Ok(obj);
        }
    }
    for candidate in candidates.iter().flatten() {
        if let Some(obj) = parse_object(&strip_trailing_commas(candidate)) {
            return Ok(obj);
        }
    }

    Err(JudgeError::Parse(format!(
        "no JSON object found in response of {} bytes",
        trimmed.len()
    )))
}

fn parse_object(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(Value::is_object)
}

/// Body of the first ```` ``` ```` fenced block, skipping an optional
/// language tag on the opening line.
fn fenced_block(text: &str) -> Option<&str> {
    let mut parts = text.splitn(3, "```");
    parts.next()?;
    let inner = parts.next()?;
    // Without a closing fence this is not a block.
    parts.next()?;

    let body = match inner.split_once('\n') {
        Some((tag, rest)) if !tag.trim_start().starts_with('{') => rest,
        _ => inner,
    };
    Some(body.trim())
}

/// Text from the first `{` through the last `}`.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    text.get(start..=end)
}

/// Remove commas that directly precede `}` or `]`, ignoring string contents.
fn strip_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let rest: String = chars.clone().collect();
                let next = rest.trim_start().chars().next();
                if !matches!(next, Some('}' | ']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    out
}
