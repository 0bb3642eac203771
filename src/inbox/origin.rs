use crate::inbox::payload::DecodedPayload;
use crate::labels::Translate;
use serde::{Serialize, Serializer};
use std::fmt;

const EXPLICIT_TAGS: [&str; 3] = ["origin", "source", "type"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactTarget {
    Worker,
    Material,
}

impl ContactTarget {
    fn from_target_type(value: Option<&str>) -> Self {
        match value {
            Some(t) if t.eq_ignore_ascii_case("worker") => ContactTarget::Worker,
            _ => ContactTarget::Material,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContactTarget::Worker => "worker",
            ContactTarget::Material => "material",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Origin {
    Worker,
    Material,
    Career,
    Architect,
    Contact(ContactTarget),
    Unknown,
}

impl Origin {
    pub fn as_str(self) -> &'static str {
        match self {
            Origin::Worker => "worker",
            Origin::Material => "material",
            Origin::Career => "career",
            Origin::Architect => "architect",
            Origin::Contact(_) => "contact",
            Origin::Unknown => "unknown",
        }
    }

    /// Suffix under `adminSource.` used for label lookup.
    pub fn label_key(self) -> &'static str {
        match self {
            Origin::Contact(ContactTarget::Worker) => "worker-contact",
            Origin::Contact(ContactTarget::Material) => "material-contact",
            other => other.as_str(),
        }
    }

    pub fn contact_target(self) -> Option<ContactTarget> {
        match self {
            Origin::Contact(t) => Some(t),
            _ => None,
        }
    }

    fn from_tag(tag: &str, payload: &DecodedPayload) -> Self {
        let target = || ContactTarget::from_target_type(payload.text("targetType"));
        match tag.to_ascii_lowercase().as_str() {
            "worker" => Origin::Worker,
            "material" => Origin::Material,
            "career" => Origin::Career,
            "architect" => Origin::Architect,
            "contact" => Origin::Contact(target()),
            "worker-contact" => Origin::Contact(ContactTarget::Worker),
            "material-contact" => Origin::Contact(ContactTarget::Material),
            _ => Origin::Unknown,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Origin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Taken from an `origin`/`source`/`type` field, verbatim.
    Tagged(String),
    Inferred,
    Unmatched,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOrigin {
    pub origin: Origin,
    pub resolution: Resolution,
}

impl ResolvedOrigin {
    /// The literal shown when no translation exists. Tags naming a known
    /// origin are folded to its canonical key; unlisted tags stay verbatim.
    pub fn literal(&self) -> &str {
        match (&self.resolution, self.origin) {
            (Resolution::Tagged(tag), Origin::Unknown) => tag,
            _ => self.origin.label_key(),
        }
    }

    pub fn label(&self, t: &dyn Translate) -> String {
        origin_label(self.literal(), t)
    }
}

pub fn origin_label(literal: &str, t: &dyn Translate) -> String {
    let key = format!("adminSource.{literal}");
    let translated = t.translate(&key);
    if translated == key {
        literal.to_string()
    } else {
        translated
    }
}

fn explicit_tag(payload: &DecodedPayload) -> Option<&str> {
    EXPLICIT_TAGS.iter().find_map(|k| payload.text(k))
}

pub fn resolve_origin(payload: &DecodedPayload) -> ResolvedOrigin {
    if let Some(tag) = explicit_tag(payload) {
        return ResolvedOrigin {
            origin: Origin::from_tag(tag, payload),
            resolution: Resolution::Tagged(tag.to_string()),
        };
    }

    let inferred = if payload.has("projectType") {
        Some(Origin::Architect)
    } else if payload.has("skills") && payload.has("experience") {
        Some(Origin::Career)
    } else if payload.has("targetId") && payload.has("targetType") {
        Some(Origin::Contact(ContactTarget::from_target_type(
            payload.text("targetType"),
        )))
    } else if payload.has("category") {
        Some(Origin::Worker)
    } else if payload.has("description") {
        Some(Origin::Material)
    } else {
        None
    };

    match inferred {
        Some(origin) => ResolvedOrigin {
            origin,
            resolution: Resolution::Inferred,
        },
        None => ResolvedOrigin {
            origin: Origin::Unknown,
            resolution: Resolution::Unmatched,
        },
    }
}
