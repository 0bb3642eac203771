use std::fs;
use std::time::Duration;
use tempfile::tempdir;
use work24::config::{InboxConfig, load_config_or_default};
use work24::dashboard::Dashboard;
use work24::inbox::origin::Origin;
use work24::inbox::render::ViewMode;
use work24::records::NewRecord;
use work24::records::directory::ListingKind;
use work24::records::store::RecordStore;
use work24::service::{RetryPolicy, ServiceError};
use work24::submit::Submission;

fn test_config() -> InboxConfig {
    InboxConfig {
        retry: RetryPolicy {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        },
        stale_after: Duration::from_secs(60),
        ..InboxConfig::default()
    }
}

fn career(name: &str) -> Submission {
    Submission::Career {
        name: name.to_string(),
        mobile: "9876543210".to_string(),
        skills: "Plumbing".to_string(),
        experience: "5 years".to_string(),
        message: String::new(),
    }
}

#[test]
fn store_lists_newest_first_and_deletes_one() {
    let tmp = tempdir().unwrap();
    let store = RecordStore::open(&tmp.path().join("nested").join("inbox.db")).unwrap();
    let a = store.add_record(&NewRecord::plain("first", None)).unwrap();
    let b = store.add_record(&NewRecord::plain("second", None)).unwrap();
    let c = store.add_record(&NewRecord::plain("third", None)).unwrap();

    let ids: Vec<i64> = store.list_records().unwrap().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![c.id, b.id, a.id]);

    assert!(store.delete_record(b.id).unwrap());
    assert!(!store.delete_record(b.id).unwrap());
    let remaining = store.list_records().unwrap();
    assert_eq!(remaining.len(), 2);
    assert_eq!(store.get_record(a.id).unwrap().unwrap().raw_text, "first");
    assert!(store.get_record(b.id).unwrap().is_none());
}

#[test]
fn records_survive_reopen() {
    let tmp = tempdir().unwrap();
    let db = tmp.path().join("inbox.db");
    let id = {
        let store = RecordStore::open(&db).unwrap();
        store
            .add_record(&NewRecord::plain(r#"{"projectType":"villa"}"#, Some("Meera")))
            .unwrap()
            .id
    };
    let store = RecordStore::open(&db).unwrap();
    let rec = store.get_record(id).unwrap().unwrap();
    assert_eq!(rec.author.as_deref(), Some("Meera"));
    assert!(rec.timestamp.ends_with('Z'));
}

#[test]
fn submissions_flow_through_to_classified_views() {
    let tmp = tempdir().unwrap();
    let mut dash = Dashboard::with_config(test_config(), Some(tmp.path().join("inbox.db"))).unwrap();

    dash.submit(career("Asha")).unwrap();
    dash.submit(Submission::Contact {
        customer_name: "Raj".to_string(),
        mobile: "7012345678".to_string(),
        requirements: "need a plumber".to_string(),
        target_id: 42,
        target_type: "worker".to_string(),
    })
    .unwrap();
    dash.post("Is the site down?", Some("Visitor")).unwrap();

    let views = dash.list(false, false).unwrap();
    assert_eq!(views.len(), 3);
    let origins: Vec<Origin> = views.iter().map(|v| v.body.origin()).collect();
    assert!(origins.contains(&Origin::Career));
    assert!(origins.iter().any(|o| o.contact_target().is_some()));
    assert!(origins.contains(&Origin::Unknown));

    let career_view = views
        .iter()
        .find(|v| v.body.origin() == Origin::Career)
        .unwrap();
    assert_eq!(career_view.author.as_deref(), Some("Asha"));
    let text = career_view.render(ViewMode::Formatted, &dash.labels);
    assert!(text.contains("Asha applied for a career position"));
}

#[test]
fn invalid_submission_is_not_stored() {
    let tmp = tempdir().unwrap();
    let db = tmp.path().join("inbox.db");
    let mut dash = Dashboard::with_config(test_config(), Some(db.clone())).unwrap();
    let mut bad = career("Asha");
    if let Submission::Career { mobile, .. } = &mut bad {
        *mobile = "12345".to_string();
    }
    assert!(dash.submit(bad).is_err());
    assert_eq!(RecordStore::open(&db).unwrap().count_records().unwrap(), 0);
}

#[test]
fn deletion_is_visible_on_next_read() {
    let tmp = tempdir().unwrap();
    let mut dash = Dashboard::with_config(test_config(), Some(tmp.path().join("inbox.db"))).unwrap();
    let keep = dash.submit(career("Asha")).unwrap();
    let gone = dash.submit(career("Ravi")).unwrap();
    assert_eq!(dash.list(false, true).unwrap().len(), 2);

    dash.delete(gone.id).unwrap();
    let views = dash.list(false, true).unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].id, keep.id);

    let err = dash.delete(gone.id).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ServiceError>(),
        Some(&ServiceError::NotFound {
            kind: "record",
            id: gone.id
        })
    );
}

#[test]
fn clear_requires_confirmation() {
    let tmp = tempdir().unwrap();
    let mut dash = Dashboard::with_config(test_config(), Some(tmp.path().join("inbox.db"))).unwrap();
    dash.post("one", None).unwrap();
    dash.post("two", None).unwrap();
    assert!(dash.clear(false).is_err());
    assert_eq!(dash.clear(true).unwrap(), 2);
    assert!(dash.list(false, true).unwrap().is_empty());
}

#[test]
fn view_preference_is_used_unless_raw_flag_given() {
    let tmp = tempdir().unwrap();
    let dash = Dashboard::with_config(test_config(), Some(tmp.path().join("inbox.db"))).unwrap();
    assert_eq!(dash.view_mode(false).unwrap(), ViewMode::Formatted);
    dash.set_pref("view", " RAW ").unwrap();
    assert_eq!(dash.get_pref("view").unwrap().as_deref(), Some("raw"));
    assert_eq!(dash.view_mode(false).unwrap(), ViewMode::Raw);
    assert!(dash.set_pref("view", "table").is_err());
    dash.clear_prefs().unwrap();
    assert_eq!(dash.view_mode(false).unwrap(), ViewMode::Formatted);
    assert_eq!(dash.view_mode(true).unwrap(), ViewMode::Raw);
}

#[test]
fn config_labels_and_audit_log_apply() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join(".work24")).unwrap();
    fs::write(
        root.join(".work24").join("config.toml"),
        r#"
version = 1
[store]
path = "state/inbox.db"
[retry]
max_attempts = 1
base_delay_ms = 0
max_delay_ms = 0
[labels]
"adminSource.career" = "Job Application"
[log]
ndjson = "logs/inbox.ndjson"
"#,
    )
    .unwrap();

    let cfg = load_config_or_default(root).unwrap();
    assert_eq!(cfg.store_path, Some(root.join("state/inbox.db")));

    let mut dash = Dashboard::open(root, None).unwrap();
    let rec = dash.submit(career("Asha")).unwrap();
    dash.delete(rec.id).unwrap();
    let rec = dash.submit(career("Ravi")).unwrap();
    let view = dash.show(rec.id, false, false).unwrap();
    let rendered = view.render(ViewMode::Formatted, &dash.labels);
    assert!(rendered.contains("[Job Application]"));

    assert!(root.join("state").join("inbox.db").exists());
    let log = fs::read_to_string(root.join("logs").join("inbox.ndjson")).unwrap();
    let ops: Vec<String> = log
        .lines()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["op"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ops, vec!["add", "delete", "add"]);
}

#[test]
fn directory_submissions_are_listed_without_contact_details_in_public() {
    let tmp = tempdir().unwrap();
    let mut dash = Dashboard::with_config(test_config(), Some(tmp.path().join("inbox.db"))).unwrap();
    dash.submit(Submission::Worker {
        name: "Vijay".to_string(),
        skill: "Wiring".to_string(),
        category: "Electrical".to_string(),
        location: "Pune".to_string(),
        mobile: Some("9876543210".to_string()),
    })
    .unwrap();
    dash.submit(Submission::Worker {
        name: "Anil".to_string(),
        skill: "Pipes".to_string(),
        category: "plumbing".to_string(),
        location: "Kochi".to_string(),
        mobile: None,
    })
    .unwrap();
    dash.submit(Submission::Material {
        name: "Red bricks".to_string(),
        category: "masonry".to_string(),
        description: "kiln fired".to_string(),
        location: "Kochi".to_string(),
        mobile: Some("7012345678".to_string()),
    })
    .unwrap();

    assert_eq!(dash.workers(None, false, false).unwrap().len(), 2);
    let electrical = dash.workers(Some("electrical"), true, true).unwrap();
    assert_eq!(electrical.len(), 1);
    assert_eq!(electrical[0].mobile.as_deref(), Some("9876543210"));
    let public = serde_json::to_value(electrical[0].public()).unwrap();
    assert!(public.get("mobile").is_none());
    assert_eq!(public["name"], "Vijay");

    let summary = dash.inbox.summary().unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.workers, 2);
    assert_eq!(summary.materials, 1);

    let brick = dash.materials(Some("masonry"), false, false).unwrap()[0].id;
    dash.delete_listing(ListingKind::Material, brick).unwrap();
    assert!(dash.materials(None, false, false).unwrap().is_empty());
    let err = dash.delete_listing(ListingKind::Material, brick).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ServiceError>(),
        Some(&ServiceError::NotFound {
            kind: "material",
            id: brick
        })
    );
    assert_eq!(dash.list(false, true).unwrap().len(), 3);
}
