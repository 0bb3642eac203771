use crate::inbox::classify;
use crate::records::EventRecord;
use crate::records::directory::ListingKind;
use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

fn append_line(path: &Path, line: &Value) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open ndjson log {}", path.display()))?;
    writeln!(f, "{}", line)?;
    Ok(())
}

pub fn mirror_added(path: &Path, rec: &EventRecord) -> Result<()> {
    append_line(
        path,
        &json!({
            "op": "add",
            "id": rec.id,
            "ts": rec.timestamp,
            "author": rec.author,
            "origin": classify(&rec.raw_text).origin().as_str(),
        }),
    )
}

pub fn mirror_deleted(path: &Path, id: i64) -> Result<()> {
    append_line(
        path,
        &json!({
            "op": "delete",
            "id": id,
            "ts": Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        }),
    )
}

pub fn mirror_cleared(path: &Path, removed: usize) -> Result<()> {
    append_line(
        path,
        &json!({
            "op": "clear",
            "removed": removed,
            "ts": Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        }),
    )
}

pub fn mirror_listing_added(path: &Path, kind: ListingKind, id: i64, name: &str) -> Result<()> {
    append_line(
        path,
        &json!({
            "op": "add_listing",
            "kind": kind.as_str(),
            "id": id,
            "name": name,
            "ts": Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        }),
    )
}

pub fn mirror_listing_deleted(path: &Path, kind: ListingKind, id: i64) -> Result<()> {
    append_line(
        path,
        &json!({
            "op": "delete_listing",
            "kind": kind.as_str(),
            "id": id,
            "ts": Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn appends_one_line_per_mutation() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("logs").join("inbox.ndjson");
        let rec = EventRecord {
            id: 7,
            timestamp: "2026-02-20T00:00:00.000000Z".to_string(),
            author: Some("Asha".to_string()),
            raw_text: r#"{"skills":"x","experience":"y"}"#.to_string(),
        };
        mirror_added(&path, &rec).unwrap();
        mirror_deleted(&path, 7).unwrap();
        mirror_listing_deleted(&path, ListingKind::Material, 2).unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<Value> = body
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["op"], "add");
        assert_eq!(lines[0]["origin"], "career");
        assert_eq!(lines[1]["op"], "delete");
        assert_eq!(lines[1]["id"], 7);
        assert_eq!(lines[2]["op"], "delete_listing");
        assert_eq!(lines[2]["kind"], "material");
    }
}
