pub mod directory;
pub mod schema;
pub mod store;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: i64,
    pub timestamp: String,
    pub author: Option<String>,
    pub raw_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub author: Option<String>,
    pub raw_text: String,
}

impl NewRecord {
    pub fn plain(raw_text: &str, author: Option<&str>) -> Self {
        Self {
            author: author
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(ToString::to_string),
            raw_text: raw_text.to_string(),
        }
    }
}
