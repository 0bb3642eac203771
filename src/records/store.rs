use crate::records::directory::{MaterialEntry, NewMaterial, NewWorker, WorkerEntry};
use crate::records::{EventRecord, NewRecord, schema};
use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::time::Duration;

const WORKER_COLUMNS: &str = "id, ts, name, skill, category, location, mobile";
const MATERIAL_COLUMNS: &str = "id, ts, name, category, description, location, mobile";

pub struct RecordStore {
    conn: Connection,
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<EventRecord> {
    Ok(EventRecord {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        author: row.get(2)?,
        raw_text: row.get(3)?,
    })
}

fn worker_from_row(row: &Row<'_>) -> rusqlite::Result<WorkerEntry> {
    Ok(WorkerEntry {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        name: row.get(2)?,
        skill: row.get(3)?,
        category: row.get(4)?,
        location: row.get(5)?,
        mobile: row.get(6)?,
    })
}

fn material_from_row(row: &Row<'_>) -> rusqlite::Result<MaterialEntry> {
    Ok(MaterialEntry {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        name: row.get(2)?,
        category: row.get(3)?,
        description: row.get(4)?,
        location: row.get(5)?,
        mobile: row.get(6)?,
    })
}

fn now_ts() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl RecordStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create db parent dir {}", parent.display()))?;
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        schema::migrate(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        schema::migrate(&conn)?;
        Ok(Self { conn })
    }

    /// How long a write waits on another connection's lock before failing busy.
    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
        self.conn
            .busy_timeout(timeout)
            .context("set sqlite busy timeout")
    }

    pub fn add_record(&self, record: &NewRecord) -> Result<EventRecord> {
        let ts = now_ts();
        self.conn.execute(
            "INSERT INTO records (ts, author, raw_text) VALUES (?1, ?2, ?3)",
            params![ts, record.author, record.raw_text],
        )?;
        Ok(EventRecord {
            id: self.conn.last_insert_rowid(),
            timestamp: ts,
            author: record.author.clone(),
            raw_text: record.raw_text.clone(),
        })
    }

    /// Newest first.
    pub fn list_records(&self) -> Result<Vec<EventRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, ts, author, raw_text FROM records ORDER BY ts DESC, id DESC",
        )?;
        let rows = stmt
            .query_map([], record_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_record(&self, id: i64) -> Result<Option<EventRecord>> {
        self.conn
            .query_row(
                "SELECT id, ts, author, raw_text FROM records WHERE id = ?1",
                params![id],
                record_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn delete_record(&self, id: i64) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM records WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    pub fn delete_all_records(&self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM records", [])?)
    }

    pub fn count_records(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?)
    }

    pub fn add_worker(&self, worker: &NewWorker) -> Result<WorkerEntry> {
        let ts = now_ts();
        self.conn.execute(
            "INSERT INTO workers (ts, name, skill, category, location, mobile)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                ts,
                worker.name,
                worker.skill,
                worker.category,
                worker.location,
                worker.mobile
            ],
        )?;
        Ok(WorkerEntry {
            id: self.conn.last_insert_rowid(),
            timestamp: ts,
            name: worker.name.clone(),
            skill: worker.skill.clone(),
            category: worker.category.clone(),
            location: worker.location.clone(),
            mobile: worker.mobile.clone(),
        })
    }

    /// Newest first.
    pub fn list_workers(&self) -> Result<Vec<WorkerEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WORKER_COLUMNS} FROM workers ORDER BY ts DESC, id DESC"
        ))?;
        let rows = stmt
            .query_map([], worker_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Category match ignores ASCII case.
    pub fn list_workers_by_category(&self, category: &str) -> Result<Vec<WorkerEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WORKER_COLUMNS} FROM workers WHERE category = ?1 COLLATE NOCASE
             ORDER BY ts DESC, id DESC"
        ))?;
        let rows = stmt
            .query_map(params![category.trim()], worker_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn delete_worker(&self, id: i64) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM workers WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    pub fn count_workers(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM workers", [], |row| row.get(0))?)
    }

    pub fn add_material(&self, material: &NewMaterial) -> Result<MaterialEntry> {
        let ts = now_ts();
        self.conn.execute(
            "INSERT INTO materials (ts, name, category, description, location, mobile)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                ts,
                material.name,
                material.category,
                material.description,
                material.location,
                material.mobile
            ],
        )?;
        Ok(MaterialEntry {
            id: self.conn.last_insert_rowid(),
            timestamp: ts,
            name: material.name.clone(),
            category: material.category.clone(),
            description: material.description.clone(),
            location: material.location.clone(),
            mobile: material.mobile.clone(),
        })
    }

    /// Newest first.
    pub fn list_materials(&self) -> Result<Vec<MaterialEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials ORDER BY ts DESC, id DESC"
        ))?;
        let rows = stmt
            .query_map([], material_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn list_materials_by_category(&self, category: &str) -> Result<Vec<MaterialEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials WHERE category = ?1 COLLATE NOCASE
             ORDER BY ts DESC, id DESC"
        ))?;
        let rows = stmt
            .query_map(params![category.trim()], material_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn delete_material(&self, id: i64) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM materials WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    pub fn count_materials(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM materials", [], |row| row.get(0))?)
    }

    pub fn get_pref(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn set_pref(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO preferences (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn clear_prefs(&self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM preferences", [])?)
    }
}
