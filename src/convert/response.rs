//! Shared converter response schema

use super::json::{parse_json_response, ParseError};
use serde::Deserialize;
use serde_json::{Map, Value};

/// A code field a converter asks the provider for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeField {
    /// JSON key in the response
    pub key: &'static str,
    /// Appended to the snake_case unit name to form the file stem
    pub suffix: &'static str,
    pub required: bool,
}

impl CodeField {
    pub const fn required(key: &'static str, suffix: &'static str) -> Self {
        Self {
            key,
            suffix,
            required: true,
        }
    }

    pub const fn optional(key: &'static str, suffix: &'static str) -> Self {
        Self {
            key,
            suffix,
            required: false,
        }
    }
}

/// One output file, without directory or extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub stem: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedUnit {
    pub name: String,
    pub files: Vec<GeneratedFile>,
    pub notes: Vec<String>,
    pub requires_review: bool,
    pub review_reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    Converted(ConvertedUnit),
    /// The provider reports the unit does not belong to this category
    Dropped { reason: String },
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    name: Option<String>,
    #[serde(default)]
    notes: Vec<String>,
    #[serde(default)]
    requires_review: bool,
    #[serde(default)]
    review_reason: String,
    #[serde(default)]
    skip: bool,
    #[serde(default)]
    skip_reason: String,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

/// Parses the common response shape: `name`, the converter's code fields,
/// `notes`, `requires_review`, `review_reason` and, when `allow_skip`, the
/// `skip`/`skip_reason` pair.
pub fn parse_response(
    content: &str,
    fields: &[CodeField],
    allow_skip: bool,
) -> Result<Conversion, ParseError> {
    let raw: RawResponse = parse_json_response(content)?;

    if allow_skip && raw.skip {
        let reason = if raw.skip_reason.trim().is_empty() {
            "provider marked the unit as not applicable".to_string()
        } else {
            raw.skip_reason
        };
        return Ok(Conversion::Dropped { reason });
    }

    let name = raw
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ParseError::MissingField("name".to_string()))?;

    let stem = snake_case(&name);
    if stem.is_empty() {
        return Err(ParseError::MissingField("name".to_string()));
    }
    let mut files = Vec::new();
    for field in fields {
        let code = raw
            .rest
            .get(field.key)
            .and_then(Value::as_str)
            .filter(|c| !c.trim().is_empty());
        match code {
            Some(code) => files.push(GeneratedFile {
                stem: format!("{}{}", stem, field.suffix),
                content: ensure_trailing_newline(code),
            }),
            None if field.required => return Err(ParseError::MissingField(field.key.to_string())),
            None => {}
        }
    }

    Ok(Conversion::Converted(ConvertedUnit {
        name,
        files,
        notes: raw.notes,
        requires_review: raw.requires_review,
        review_reason: raw.review_reason,
    }))
}

fn ensure_trailing_newline(code: &str) -> String {
    let mut out = code.to_string();
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// `OrderLineItem` -> `order_line_item`, `HTTPClient` -> `http_client`
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1);
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else if c.is_alphanumeric() {
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_end_matches('_').to_string()
}
