use crate::inbox::payload::FieldValue;
use std::collections::BTreeMap;

/// Bumped whenever a submission flow adds a field to [`RECOGNIZED_FIELDS`].
pub const ALLOWLIST_VERSION: u32 = 4;

/// Fields with a presentation rule, in display order.
pub const RECOGNIZED_FIELDS: [&str; 22] = [
    "origin",
    "source",
    "type",
    "name",
    "customerName",
    "workerName",
    "mobile",
    "requirements",
    "requirement",
    "targetId",
    "targetType",
    "projectType",
    "category",
    "skill",
    "skills",
    "experience",
    "description",
    "location",
    "budget",
    "message",
    "details",
    "timestamp",
];

pub fn is_recognized(key: &str) -> bool {
    RECOGNIZED_FIELDS.contains(&key)
}

fn display_rank(key: &str) -> usize {
    RECOGNIZED_FIELDS
        .iter()
        .position(|k| *k == key)
        .unwrap_or(RECOGNIZED_FIELDS.len())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPartition {
    /// Ordered by [`RECOGNIZED_FIELDS`] position.
    pub recognized: Vec<(String, FieldValue)>,
    /// Ordered by key.
    pub other: Vec<(String, FieldValue)>,
}

impl FieldPartition {
    pub fn len(&self) -> usize {
        self.recognized.len() + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn partition_fields(fields: &BTreeMap<String, FieldValue>) -> FieldPartition {
    let mut out = FieldPartition::default();
    for (key, value) in fields {
        if is_recognized(key) {
            out.recognized.push((key.clone(), value.clone()));
        } else {
            out.other.push((key.clone(), value.clone()));
        }
    }
    out.recognized.sort_by_key(|(k, _)| display_rank(k));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn fields(pairs: &[(&str, FieldValue)]) -> BTreeMap<String, FieldValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn partition_is_total_and_disjoint() {
        let input = fields(&[
            ("customerName", FieldValue::Text("Raj".into())),
            ("foo", FieldValue::Text("bar".into())),
            ("mobile", FieldValue::Text("9876543210".into())),
            ("extra", FieldValue::Null),
        ]);
        let parts = partition_fields(&input);
        let recognized: BTreeSet<_> = parts.recognized.iter().map(|(k, _)| k.clone()).collect();
        let other: BTreeSet<_> = parts.other.iter().map(|(k, _)| k.clone()).collect();
        assert!(recognized.is_disjoint(&other));
        let union: BTreeSet<_> = recognized.union(&other).cloned().collect();
        assert_eq!(union, input.keys().cloned().collect::<BTreeSet<_>>());
        assert_eq!(parts.len(), input.len());
    }

    #[test]
    fn recognized_follow_display_order() {
        let input = fields(&[
            ("message", FieldValue::Text("hi".into())),
            ("name", FieldValue::Text("Asha".into())),
            ("origin", FieldValue::Text("career".into())),
        ]);
        let keys: Vec<_> = partition_fields(&input)
            .recognized
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["origin", "name", "message"]);
    }

    #[test]
    fn allow_list_is_case_sensitive() {
        assert!(is_recognized("customerName"));
        assert!(!is_recognized("customername"));
        assert!(!is_recognized("foo"));
    }
}
