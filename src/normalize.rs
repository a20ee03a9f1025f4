//! Offer normalization
//!
//! Turns one raw offer (any JSON value) into the flat row stored in the
//! offers table. Extraction is field by field and never fails:
//! - missing or `null` fields become `None`
//! - text fields are trimmed; numbers and booleans are written as text;
//!   nested values are written as JSON text
//! - list/object columns always hold JSON text, `"null"` included; keys keep
//!   their received order, separators are `", "`/`": "` and non-ASCII is
//!   written as `\uXXXX` escapes
//! - coordinates are kept as text exactly as the number was written
//! - flags stay tri-state: `None` is not `Some(false)`

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::Value;
use std::io;

/// An offer flattened to the stored column set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedOffer {
    pub slug: Option<String>,
    pub title: Option<String>,
    /// JSON text
    pub required_skills: String,
    /// JSON text
    pub nice_to_have_skills: String,
    pub workplace_type: Option<String>,
    pub working_time: Option<String>,
    pub experience_level: Option<String>,
    /// JSON text
    pub employment_types: String,
    pub category_id: Option<i64>,
    /// JSON text
    pub multilocation: String,
    pub city: Option<String>,
    pub street: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub remote_interview: Option<bool>,
    pub company_name: Option<String>,
    pub company_logo_thumb_url: Option<String>,
    pub published_at: Option<String>,
    pub open_to_hire_ukrainians: Option<bool>,
    /// JSON text
    pub languages: String,
}

/// Normalizes a single raw offer
///
/// # Example
///
/// ```
/// use offer_harvest::normalize;
/// use serde_json::json;
///
/// let offer = normalize(&json!({"slug": " dev-1 ", "requiredSkills": ["rust"]}));
/// assert_eq!(offer.slug.as_deref(), Some("dev-1"));
/// assert_eq!(offer.required_skills, r#"["rust"]"#);
/// assert_eq!(offer.remote_interview, None);
/// ```
pub fn normalize(raw: &Value) -> NormalizedOffer {
    let field = |name: &str| raw.get(name);

    NormalizedOffer {
        slug: text(field("slug")),
        title: text(field("title")),
        required_skills: json_text(field("requiredSkills")),
        nice_to_have_skills: json_text(field("niceToHaveSkills")),
        workplace_type: text(field("workplaceType")),
        working_time: text(field("workingTime")),
        experience_level: text(field("experienceLevel")),
        employment_types: json_text(field("employmentTypes")),
        category_id: integer(field("categoryId")),
        multilocation: json_text(field("multilocation")),
        city: text(field("city")),
        street: text(field("street")),
        latitude: coordinate(field("latitude")),
        longitude: coordinate(field("longitude")),
        remote_interview: flag(field("remoteInterview")),
        company_name: text(field("companyName")),
        company_logo_thumb_url: text(field("companyLogoThumbUrl")),
        published_at: text(field("publishedAt")),
        open_to_hire_ukrainians: flag(field("openToHireUkrainians")),
        languages: json_text(field("languages")),
    }
}

/// Normalizes every offer of a batch, keeping order
pub fn normalize_all(raw: &[Value]) -> Vec<NormalizedOffer> {
    raw.iter().map(normalize).collect()
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        nested => Some(json_text(Some(nested))),
    }
}

fn json_text(value: Option<&Value>) -> String {
    let value = value.unwrap_or(&Value::Null);
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, SpacedAsciiFormatter);

    match value.serialize(&mut serializer) {
        Ok(()) => String::from_utf8(out).unwrap_or_else(|_| value.to_string()),
        Err(_) => value.to_string(),
    }
}

/// Spaced separators and ASCII-only output, the layout already stored in
/// existing offers tables
struct SpacedAsciiFormatter;

impl Formatter for SpacedAsciiFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (index, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(fragment[start..index].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = index + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

fn coordinate(value: Option<&Value>) -> Option<String> {
    text(value)
}

fn integer(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn flag(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Null => None,
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64().map_or(false, |f| f != 0.0)),
        Value::String(s) => Some(!s.is_empty()),
        Value::Array(items) => Some(!items.is_empty()),
        Value::Object(fields) => Some(!fields.is_empty()),
    }
}
