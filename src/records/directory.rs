use serde::{Deserialize, Serialize};

/// Registered worker as the operator sees it, contact details included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerEntry {
    pub id: i64,
    pub timestamp: String,
    pub name: String,
    pub skill: String,
    pub category: String,
    pub location: String,
    pub mobile: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorker {
    pub name: String,
    pub skill: String,
    pub category: String,
    pub location: String,
    pub mobile: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialEntry {
    pub id: i64,
    pub timestamp: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub location: String,
    pub mobile: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMaterial {
    pub name: String,
    pub category: String,
    pub description: String,
    pub location: String,
    pub mobile: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Worker,
    Material,
}

impl ListingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ListingKind::Worker => "worker",
            ListingKind::Material => "material",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewListing {
    Worker(NewWorker),
    Material(NewMaterial),
}

/// Public projection of a worker. Contact details are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicWorker {
    pub id: i64,
    pub name: String,
    pub skill: String,
    pub category: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicMaterial {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub description: String,
    pub location: String,
}

impl WorkerEntry {
    pub fn public(&self) -> PublicWorker {
        PublicWorker {
            id: self.id,
            name: self.name.clone(),
            skill: self.skill.clone(),
            category: self.category.clone(),
            location: self.location.clone(),
        }
    }
}

impl MaterialEntry {
    pub fn public(&self) -> PublicMaterial {
        PublicMaterial {
            id: self.id,
            name: self.name.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
        }
    }
}
