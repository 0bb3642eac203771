use crate::config::{InboxConfig, load_config_or_default};
use crate::inbox::fields::ALLOWLIST_VERSION;
use crate::inbox::render::ViewMode;
use crate::inbox::{RecordView, classify};
use crate::labels::LabelCatalog;
use crate::records::directory::{ListingKind, MaterialEntry, NewListing, WorkerEntry};
use crate::records::store::RecordStore;
use crate::records::{EventRecord, NewRecord};
use crate::service::{Inbox, SqliteBackend};
use crate::submit::Submission;
use anyhow::{Result, bail};
use std::io::Read;
use std::path::{Path, PathBuf};

pub const VIEW_PREF: &str = "view";

pub fn default_state_db() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("work24").join("inbox.db");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("state")
            .join("work24")
            .join("inbox.db");
    }
    PathBuf::from(".work24/inbox.db")
}

pub struct Dashboard {
    pub inbox: Inbox<SqliteBackend>,
    pub labels: LabelCatalog,
}

impl Dashboard {
    pub fn open(root: &Path, state_db: Option<PathBuf>) -> Result<Self> {
        let cfg = load_config_or_default(root)?;
        Self::with_config(cfg, state_db)
    }

    pub fn with_config(cfg: InboxConfig, state_db: Option<PathBuf>) -> Result<Self> {
        let db = state_db
            .or(cfg.store_path)
            .unwrap_or_else(default_state_db);
        let store = RecordStore::open(&db)?;
        store.set_busy_timeout(cfg.busy_timeout)?;
        let inbox = Inbox::new(SqliteBackend::new(store))
            .with_retry(cfg.retry)
            .with_stale_after(cfg.stale_after)
            .with_audit_log(cfg.ndjson_log);
        Ok(Self {
            inbox,
            labels: LabelCatalog::english().with_overrides(cfg.labels),
        })
    }

    fn store(&self) -> &RecordStore {
        self.inbox.backend().store()
    }

    /// An explicit flag wins over the saved preference.
    pub fn view_mode(&self, raw: bool) -> Result<ViewMode> {
        if raw {
            return Ok(ViewMode::Raw);
        }
        Ok(self
            .store()
            .get_pref(VIEW_PREF)?
            .as_deref()
            .and_then(ViewMode::parse)
            .unwrap_or_default())
    }

    /// Worker and material submissions are also added to their directory.
    pub fn submit(&mut self, submission: Submission) -> Result<EventRecord> {
        let origin = submission.origin();
        let listing = submission.listing();
        let record = submission.into_record()?;
        let inserted = self.inbox.submit(record)?;
        println!("Recorded {origin} submission #{}", inserted.id);
        match listing {
            Some(NewListing::Worker(worker)) => {
                let entry = self.inbox.add_worker(&worker)?;
                println!("Listed worker #{}", entry.id);
            }
            Some(NewListing::Material(material)) => {
                let entry = self.inbox.add_material(&material)?;
                println!("Listed material #{}", entry.id);
            }
            None => {}
        }
        Ok(inserted)
    }

    pub fn post(&mut self, text: &str, name: Option<&str>) -> Result<EventRecord> {
        if text.trim().is_empty() {
            bail!("message text is empty");
        }
        let inserted = self.inbox.submit(NewRecord::plain(text, name))?;
        println!("Recorded message #{}", inserted.id);
        Ok(inserted)
    }

    pub fn list(&mut self, raw: bool, json: bool) -> Result<Vec<RecordView>> {
        let mode = self.view_mode(raw)?;
        let views = self.inbox.views(&self.labels)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&views)?);
        } else if views.is_empty() {
            println!("No messages");
        } else {
            for view in &views {
                println!("{}\n", view.render(mode, &self.labels));
            }
        }
        Ok(views)
    }

    pub fn show(&mut self, id: i64, raw: bool, json: bool) -> Result<RecordView> {
        let mode = self.view_mode(raw)?;
        let view = self.inbox.view(id, &self.labels)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&view)?);
        } else {
            println!("{}", view.render(mode, &self.labels));
        }
        Ok(view)
    }

    pub fn delete(&mut self, id: i64) -> Result<()> {
        self.inbox.delete(id)?;
        println!("Deleted message #{id}");
        Ok(())
    }

    pub fn clear(&mut self, confirmed: bool) -> Result<usize> {
        if !confirmed {
            bail!("refusing to delete every message without --yes");
        }
        let removed = self.inbox.clear()?;
        println!("Deleted {removed} message(s)");
        Ok(removed)
    }

    pub fn workers(
        &self,
        category: Option<&str>,
        public: bool,
        json: bool,
    ) -> Result<Vec<WorkerEntry>> {
        let workers = self.inbox.workers(category)?;
        if json {
            if public {
                let out: Vec<_> = workers.iter().map(WorkerEntry::public).collect();
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&workers)?);
            }
        } else if workers.is_empty() {
            println!("No workers");
        } else {
            for w in &workers {
                let mut line = format!(
                    "#{} {} - {} ({}, {})",
                    w.id, w.name, w.skill, w.category, w.location
                );
                if !public && let Some(mobile) = &w.mobile {
                    line.push_str(&format!(" tel {mobile}"));
                }
                println!("{line}");
            }
        }
        Ok(workers)
    }

    pub fn materials(
        &self,
        category: Option<&str>,
        public: bool,
        json: bool,
    ) -> Result<Vec<MaterialEntry>> {
        let materials = self.inbox.materials(category)?;
        if json {
            if public {
                let out: Vec<_> = materials.iter().map(MaterialEntry::public).collect();
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&materials)?);
            }
        } else if materials.is_empty() {
            println!("No materials");
        } else {
            for m in &materials {
                let mut line = format!(
                    "#{} {} - {} ({}, {})",
                    m.id, m.name, m.description, m.category, m.location
                );
                if !public && let Some(mobile) = &m.mobile {
                    line.push_str(&format!(" tel {mobile}"));
                }
                println!("{line}");
            }
        }
        Ok(materials)
    }

    pub fn delete_listing(&self, kind: ListingKind, id: i64) -> Result<()> {
        self.inbox.delete_listing(kind, id)?;
        println!("Deleted {} #{id}", kind.as_str());
        Ok(())
    }

    pub fn summary(&mut self) -> Result<()> {
        let summary = self.inbox.summary()?;
        println!("messages: {}", summary.total);
        println!("plain: {}", summary.plain);
        for (origin, count) in &summary.by_origin {
            let label = crate::inbox::origin::origin_label(origin, &self.labels);
            println!("{label}: {count}");
        }
        println!("workers: {}", summary.workers);
        println!("materials: {}", summary.materials);
        println!("activity: {}", summary.activity());
        Ok(())
    }

    pub fn get_pref(&self, key: &str) -> Result<Option<String>> {
        let value = self.store().get_pref(key)?;
        match value.as_deref() {
            Some(v) => println!("{key} = {v}"),
            None => println!("{key} is not set"),
        }
        Ok(value)
    }

    pub fn set_pref(&self, key: &str, value: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            bail!("preference key is empty");
        }
        let value = if key == VIEW_PREF {
            match ViewMode::parse(value) {
                Some(mode) => mode.as_str(),
                None => bail!("`{VIEW_PREF}` must be `formatted` or `raw`, got `{value}`"),
            }
        } else {
            value.trim()
        };
        self.store().set_pref(key, value)?;
        println!("{key} = {value}");
        Ok(())
    }

    pub fn clear_prefs(&self) -> Result<usize> {
        let removed = self.store().clear_prefs()?;
        println!("Cleared {removed} preference(s)");
        Ok(removed)
    }
}

/// Classify a payload without touching the store.
pub fn classify_text(root: &Path, text: Option<String>) -> Result<()> {
    let text = match text {
        Some(t) => t,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let labels = LabelCatalog::english().with_overrides(load_config_or_default(root)?.labels);
    let out = classification_json(&text, &labels);
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

pub fn classification_json(text: &str, labels: &LabelCatalog) -> serde_json::Value {
    let classification = classify(text);
    serde_json::json!({
        "allowlist_version": ALLOWLIST_VERSION,
        "is_structured": classification.is_structured(),
        "origin": classification.origin().as_str(),
        "view": classification.present(labels),
    })
}
