//! JSON extraction from provider responses
//!
//! Providers wrap JSON in markdown fences, prepend prose, or get cut off
//! before the closing fence. [`extract_json_object`] finds the first balanced
//! object regardless, and is the only place converters pull JSON from.

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("response contains no JSON object")]
    NoJsonObject,

    #[error("JSON object is not terminated (response truncated?)")]
    Unterminated,

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("response is missing required field '{0}'")]
    MissingField(String),
}

/// Returns the first balanced `{...}` object in `content`.
///
/// A leading markdown fence (with or without a language tag) is skipped and a
/// missing closing fence is tolerated. Braces inside string literals,
/// including escaped quotes, do not count towards nesting.
pub fn extract_json_object(content: &str) -> Result<&str, ParseError> {
    let body = strip_fence(content);
    let start = body.find('{').ok_or(ParseError::NoJsonObject)?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in body[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&body[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    Err(ParseError::Unterminated)
}

/// Text after the opening fence. The closing fence is left in place: the
/// brace scan ends at the object's matching `}`, and fences inside string
/// values must not cut the body short.
fn strip_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };
    // Only treat it as a fence if no JSON starts before it
    if trimmed[..open].contains('{') {
        return trimmed;
    }

    let after = &trimmed[open + 3..];
    // Skip the language tag line
    match after.find('\n') {
        Some(nl) if !after[..nl].contains('{') => &after[nl + 1..],
        _ => after,
    }
}

pub fn parse_json_response<T: DeserializeOwned>(content: &str) -> Result<T, ParseError> {
    let json = extract_json_object(content)?;
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use yare::parameterized;

    const CLEAN: &str = r#"{"name": "User", "code": "type User struct { ID int64 }", "notes": ["a \"quoted\" } brace"], "requires_review": false, "review_reason": ""}"#;

    const WITH_INNER_FENCE: &str = r#"{"name": "Doc", "code": "// Example:\n// ```go\n// x := 1\n// ```\npackage doc", "notes": ["see ``` above"], "requires_review": false, "review_reason": ""}"#;

    #[parameterized(
        raw = { CLEAN.to_string(), CLEAN },
        fenced_with_tag = { format!("```json\n{}\n```", CLEAN), CLEAN },
        fenced_without_tag = { format!("```\n{}\n```", CLEAN), CLEAN },
        missing_closing_fence = { format!("```json\n{}\n", CLEAN), CLEAN },
        prose_around = { format!("Here is the result:\n\n{}\n\nLet me know!", CLEAN), CLEAN },
        fence_after_prose = { format!("Sure.\n```json\n{}\n```\ntrailing", CLEAN), CLEAN },
        inner_fence_raw = { WITH_INNER_FENCE.to_string(), WITH_INNER_FENCE },
        inner_fence_fenced = { format!("```json\n{}\n```", WITH_INNER_FENCE), WITH_INNER_FENCE },
        inner_fence_unclosed = { format!("```json\n{}\n", WITH_INNER_FENCE), WITH_INNER_FENCE },
    )]
    fn test_extraction_matches_clean(input: String, clean: &str) {
        let parsed: Value = parse_json_response(&input).unwrap();
        let expected: Value = serde_json::from_str(clean).unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_braces_inside_strings() {
        let input = r#"{"code": "func f() { if x { return \"}\" } }", "n": 1} tail }"#;
        let json = extract_json_object(input).unwrap();
        assert!(json.ends_with("\"n\": 1}"));
        let parsed: Value = serde_json::from_str(json).unwrap();
        assert_eq!(parsed["n"], 1);
    }

    #[test]
    fn test_truncated_object() {
        let input = "```json\n{\"name\": \"User\", \"code\": \"type User struct {";
        assert!(matches!(
            extract_json_object(input),
            Err(ParseError::Unterminated)
        ));
    }

    #[test]
    fn test_no_object() {
        assert!(matches!(
            extract_json_object("I cannot convert this file."),
            Err(ParseError::NoJsonObject)
        ));
    }

    #[test]
    fn test_invalid_json() {
        let result: Result<Value, _> = parse_json_response("{name: unquoted}");
        assert!(matches!(result, Err(ParseError::InvalidJson(_))));
    }

    #[test]
    fn test_inline_fence_without_newline() {
        let parsed: Value = parse_json_response("```{\"a\": 1}```").unwrap();
        assert_eq!(parsed["a"], 1);
    }
}
