use std::collections::BTreeMap;

/// Label lookup. Returns `key` unchanged when there is no translation.
pub trait Translate {
    fn translate(&self, key: &str) -> String;
}

impl<F> Translate for F
where
    F: Fn(&str) -> String,
{
    fn translate(&self, key: &str) -> String {
        self(key)
    }
}

const ENGLISH: [(&str, &str); 30] = [
    ("adminSource.worker", "Worker Registration"),
    ("adminSource.material", "Material Listing"),
    ("adminSource.career", "Career Application"),
    ("adminSource.architect", "Architect Inquiry"),
    ("adminSource.worker-contact", "Worker Contact"),
    ("adminSource.material-contact", "Material Contact"),
    ("adminSource.unknown", "Unknown"),
    ("admin.field.origin", "Source"),
    ("admin.field.source", "Source"),
    ("admin.field.type", "Type"),
    ("admin.field.name", "Name"),
    ("admin.field.customerName", "Customer Name"),
    ("admin.field.workerName", "Worker"),
    ("admin.field.mobile", "Mobile"),
    ("admin.field.requirements", "Requirements"),
    ("admin.field.requirement", "Requirement"),
    ("admin.field.targetId", "Target ID"),
    ("admin.field.targetType", "Target Type"),
    ("admin.field.projectType", "Project Type"),
    ("admin.field.category", "Category"),
    ("admin.field.skill", "Skill"),
    ("admin.field.skills", "Skills"),
    ("admin.field.experience", "Experience"),
    ("admin.field.description", "Description"),
    ("admin.field.location", "Location"),
    ("admin.field.budget", "Budget"),
    ("admin.field.message", "Message"),
    ("admin.field.details", "Details"),
    ("admin.field.timestamp", "Submitted"),
    ("admin.additionalFields", "Additional fields"),
];

#[derive(Debug, Clone, Default)]
pub struct LabelCatalog {
    entries: BTreeMap<String, String>,
}

impl LabelCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn english() -> Self {
        Self {
            entries: ENGLISH
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn with_overrides<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in overrides {
            self.entries.insert(k.into(), v.into());
        }
        self
    }
}

impl Translate for LabelCatalog {
    fn translate(&self, key: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

/// `customerName` -> `Customer Name`.
pub fn humanize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (idx, ch) in key.chars().enumerate() {
        if idx == 0 {
            out.extend(ch.to_uppercase());
        } else if ch.is_uppercase() {
            out.push(' ');
            out.push(ch);
        } else {
            out.push(ch);
        }
    }
    out
}

pub fn field_label(key: &str, t: &dyn Translate) -> String {
    let label_key = format!("admin.field.{key}");
    let translated = t.translate(&label_key);
    if translated == label_key {
        humanize_key(key)
    } else {
        translated
    }
}
