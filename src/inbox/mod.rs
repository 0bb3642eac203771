pub mod fields;
pub mod origin;
pub mod payload;
pub mod render;

use crate::inbox::fields::{FieldPartition, partition_fields};
use crate::inbox::origin::{Origin, ResolvedOrigin, resolve_origin};
use crate::inbox::payload::{DecodedPayload, Payload, parse_payload};
use crate::inbox::render::{StructuredView, ViewMode};
use crate::labels::Translate;
use crate::records::EventRecord;
use chrono::DateTime;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub payload: DecodedPayload,
    pub origin: ResolvedOrigin,
    pub fields: FieldPartition,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Plain(String),
    Structured(Classified),
}

impl Classification {
    pub fn is_structured(&self) -> bool {
        matches!(self, Classification::Structured(_))
    }

    pub fn origin(&self) -> Origin {
        match self {
            Classification::Plain(_) => Origin::Unknown,
            Classification::Structured(c) => c.origin.origin,
        }
    }

    pub fn present(&self, t: &dyn Translate) -> RecordBody {
        match self {
            Classification::Plain(text) => RecordBody::Plain { text: text.clone() },
            Classification::Structured(c) => RecordBody::Structured(StructuredView::build(c, t)),
        }
    }
}

pub fn classify(raw_text: &str) -> Classification {
    match parse_payload(raw_text) {
        Payload::Plain => Classification::Plain(raw_text.to_string()),
        Payload::Structured(payload) => {
            let origin = resolve_origin(&payload);
            let fields = partition_fields(&payload.fields);
            Classification::Structured(Classified {
                payload,
                origin,
                fields,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordBody {
    Plain { text: String },
    Structured(StructuredView),
}

impl RecordBody {
    pub fn origin(&self) -> Origin {
        match self {
            RecordBody::Plain { .. } => Origin::Unknown,
            RecordBody::Structured(view) => view.origin,
        }
    }

    pub fn lines(&self, mode: ViewMode, t: &dyn Translate) -> Vec<String> {
        match self {
            RecordBody::Plain { text } => text.lines().map(ToString::to_string).collect(),
            RecordBody::Structured(view) => view.lines(mode, t),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordView {
    pub id: i64,
    pub timestamp: String,
    pub display_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub body: RecordBody,
}

impl RecordView {
    pub fn render(&self, mode: ViewMode, t: &dyn Translate) -> String {
        let mut out = format!("#{} {}", self.id, self.display_time);
        if let Some(author) = self.author.as_deref() {
            out.push_str(&format!(" ({author})"));
        }
        for line in self.body.lines(mode, t) {
            out.push('\n');
            out.push_str(&line);
        }
        out
    }
}

pub fn display_time(ts: &str) -> String {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.format("%b %-d, %Y, %I:%M:%S %p").to_string())
        .unwrap_or_else(|_| ts.to_string())
}

pub fn view_record(record: &EventRecord, t: &dyn Translate) -> RecordView {
    RecordView {
        id: record.id,
        timestamp: record.timestamp.clone(),
        display_time: display_time(&record.timestamp),
        author: record.author.clone(),
        body: classify(&record.raw_text).present(t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelCatalog;

    #[test]
    fn plain_text_bypasses_classification() {
        let c = classify("not json at all");
        assert!(!c.is_structured());
        assert_eq!(c.origin(), Origin::Unknown);
        let body = c.present(&LabelCatalog::english());
        assert_eq!(
            body,
            RecordBody::Plain {
                text: "not json at all".to_string()
            }
        );
    }

    #[test]
    fn display_time_formats_rfc3339_and_passes_through_garbage() {
        assert_eq!(
            display_time("2026-02-20T15:04:05Z"),
            "Feb 20, 2026, 03:04:05 PM"
        );
        assert_eq!(display_time("yesterday"), "yesterday");
    }

    #[test]
    fn formatted_and_raw_lines_share_header() {
        let t = LabelCatalog::english();
        let body = classify(r#"{"origin":"material","name":"Red bricks","extra":[1,2]}"#).present(&t);
        let formatted = body.lines(ViewMode::Formatted, &t);
        let raw = body.lines(ViewMode::Raw, &t);
        assert_eq!(formatted[0], raw[0]);
        assert_eq!(formatted[0], "[Material Listing] New material listed: Red bricks");
        assert!(formatted.contains(&"  extra: 2 items".to_string()));
        assert!(raw.iter().any(|l| l.contains("\"extra\"")));
    }
}
