use crate::inbox::Classified;
use crate::inbox::origin::{ContactTarget, Origin};
use crate::inbox::payload::{DecodedPayload, FieldValue};
use crate::labels::{Translate, field_label};
use serde::Serialize;

pub const MISSING: &str = "N/A";
pub const FALLBACK_SUMMARY: &str = "New activity";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Formatted,
    Raw,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Formatted => ViewMode::Raw,
            ViewMode::Raw => ViewMode::Formatted,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "formatted" => Some(ViewMode::Formatted),
            "raw" => Some(ViewMode::Raw),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Formatted => "formatted",
            ViewMode::Raw => "raw",
        }
    }
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

pub fn format_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Null => MISSING.to_string(),
        FieldValue::Bool(b) => b.to_string(),
        FieldValue::Number(n) => n.to_string(),
        FieldValue::Text(s) => s.clone(),
        FieldValue::List(items) => plural(items.len(), "item"),
        FieldValue::Map(map) => plural(map.len(), "field"),
    }
}

fn first_text<'a>(payload: &'a DecodedPayload, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| payload.text(k))
}

pub fn summarize(origin: Origin, payload: &DecodedPayload) -> String {
    let person = first_text(payload, &["customerName", "name"]);
    let summary = match origin {
        Origin::Career => person.map(|name| format!("{name} applied for a career position")),
        Origin::Architect => {
            let project = payload.text("projectType");
            (person.is_some() || project.is_some()).then(|| {
                format!(
                    "{} submitted an architect {} request",
                    person.unwrap_or("Someone"),
                    project.unwrap_or("project")
                )
            })
        }
        Origin::Worker => {
            let name = payload.text("name");
            let skill = first_text(payload, &["skill", "category"]);
            (name.is_some() || skill.is_some()).then(|| {
                format!(
                    "{} registered as {}",
                    name.unwrap_or("A worker"),
                    skill.unwrap_or("service")
                )
            })
        }
        Origin::Material => payload
            .text("name")
            .map(|name| format!("New material listed: {name}")),
        Origin::Contact(target) => Some(format!(
            "{} requested contact for a {}",
            person.unwrap_or("Someone"),
            target.as_str()
        )),
        Origin::Unknown => None,
    };
    summary.unwrap_or_else(|| FALLBACK_SUMMARY.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldLine {
    pub key: String,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuredView {
    pub origin: Origin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_target: Option<ContactTarget>,
    pub origin_label: String,
    pub summary: String,
    pub recognized_fields: Vec<FieldLine>,
    pub other_fields: Vec<FieldLine>,
    pub raw_pretty: String,
}

impl StructuredView {
    pub fn build(classified: &Classified, t: &dyn Translate) -> Self {
        let origin = classified.origin.origin;
        let recognized_fields = classified
            .fields
            .recognized
            .iter()
            .map(|(key, value)| FieldLine {
                key: key.clone(),
                label: field_label(key, t),
                value: format_value(value),
            })
            .collect();
        let other_fields = classified
            .fields
            .other
            .iter()
            .map(|(key, value)| FieldLine {
                key: key.clone(),
                label: key.clone(),
                value: format_value(value),
            })
            .collect();
        Self {
            origin,
            contact_target: origin.contact_target(),
            origin_label: classified.origin.label(t),
            summary: summarize(origin, &classified.payload),
            recognized_fields,
            other_fields,
            raw_pretty: classified.payload.pretty(),
        }
    }

    pub fn lines(&self, mode: ViewMode, t: &dyn Translate) -> Vec<String> {
        let mut out = vec![format!("[{}] {}", self.origin_label, self.summary)];
        match mode {
            ViewMode::Raw => out.extend(self.raw_pretty.lines().map(ToString::to_string)),
            ViewMode::Formatted => {
                for line in &self.recognized_fields {
                    out.push(format!("  {}: {}", line.label, line.value));
                }
                if !self.other_fields.is_empty() {
                    out.push(format!("  -- {} --", t.translate("admin.additionalFields")));
                    for line in &self.other_fields {
                        out.push(format!("  {}: {}", line.key, line.value));
                    }
                }
            }
        }
        out
    }
}
