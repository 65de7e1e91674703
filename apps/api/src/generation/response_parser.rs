//! Response Parser — decodes the completion text into `GeneratedContent` and
//! normalizes list sections into bullet markup.

use handlebars::html_escape;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::profile::CandidateProfile;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),
}

/// One section of model output, as the model shaped it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SectionValue {
    Text(String),
    Items(Vec<String>),
}

impl SectionValue {
    fn from_json(value: Value) -> Self {
        match value {
            Value::Array(items) => SectionValue::Items(items.into_iter().map(item_text).collect()),
            other => SectionValue::Text(item_text(other)),
        }
    }

    /// Document-ready markup: lists become a bullet fragment, text is escaped as-is.
    pub fn to_markup(&self) -> String {
        match self {
            SectionValue::Text(text) => html_escape(text),
            SectionValue::Items(items) => to_bullets(items),
        }
    }
}

/// Model output for one generation request. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedContent {
    pub summary: SectionValue,
    pub skills: SectionValue,
    pub education: SectionValue,
    pub experience: SectionValue,
    pub projects: SectionValue,
    pub languages: SectionValue,
}

impl GeneratedContent {
    /// `(section key, markup)` pairs in schema order.
    pub fn markup_sections(&self) -> [(&'static str, String); 6] {
        [
            ("summary", self.summary.to_markup()),
            ("skills", self.skills.to_markup()),
            ("education", self.education.to_markup()),
            ("experience", self.experience.to_markup()),
            ("projects", self.projects.to_markup()),
            ("languages", self.languages.to_markup()),
        ]
    }
}

/// Parses raw completion text. `profile` supplies the language fallback.
pub fn parse_completion(
    raw: &str,
    profile: &CandidateProfile,
) -> Result<GeneratedContent, ParseError> {
    let text = strip_json_fences(raw);

    let value: Value = serde_json::from_str(text)
        .map_err(|e| ParseError::MalformedResponse(format!("not valid JSON ({e})")))?;

    let Value::Object(mut fields) = value else {
        return Err(ParseError::MalformedResponse(
            "expected a JSON object at the top level".to_string(),
        ));
    };

    let languages = match fields.remove("languages") {
        Some(value) => SectionValue::from_json(value),
        None => SectionValue::Items(profile.language_lines()),
    };

    Ok(GeneratedContent {
        summary: take_text(&mut fields, "summary"),
        skills: take_list(&mut fields, "skills"),
        education: take_text(&mut fields, "education"),
        experience: take_list(&mut fields, "experience"),
        projects: take_list(&mut fields, "projects"),
        languages,
    })
}

/// Wraps each item in `<li>` inside a single `<ul>`, preserving order.
pub fn to_bullets(items: &[String]) -> String {
    let mut out = String::from("<ul>");
    for item in items {
        out.push_str("<li>");
        out.push_str(&html_escape(item));
        out.push_str("</li>");
    }
    out.push_str("</ul>");
    out
}

fn take_text(fields: &mut Map<String, Value>, key: &str) -> SectionValue {
    fields
        .remove(key)
        .map(SectionValue::from_json)
        .unwrap_or_else(|| SectionValue::Text(String::new()))
}

fn take_list(fields: &mut Map<String, Value>, key: &str) -> SectionValue {
    fields
        .remove(key)
        .map(SectionValue::from_json)
        .unwrap_or_else(|| SectionValue::Items(Vec::new()))
}

fn item_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Strips a single ```json ... ``` or ``` ... ``` fence that wraps the whole text.
/// Prose outside the fence, or an unclosed fence, is left in place and fails JSON decoding.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(stripped) = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
    else {
        return text;
    };
    stripped
        .trim_start()
        .strip_suffix("```")
        .map(|s| s.trim())
        .unwrap_or(text)
}
