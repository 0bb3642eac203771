use crate::records::NewRecord;
use crate::records::directory::{NewListing, NewMaterial, NewWorker};
use anyhow::{Result, bail};
use chrono::{SecondsFormat, Utc};
use clap::Subcommand;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static MOBILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[6-9]\d{9}$").expect("mobile pattern compiles"));

#[derive(Subcommand, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "lowercase")]
pub enum Submission {
    #[command(about = "Worker registration")]
    #[serde(rename_all = "camelCase")]
    Worker {
        #[arg(long)]
        name: String,
        #[arg(long)]
        skill: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        location: String,
        #[arg(long, help = "Kept private; omitted from public listings")]
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mobile: Option<String>,
    },
    #[command(about = "Material listing")]
    #[serde(rename_all = "camelCase")]
    Material {
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        location: String,
        #[arg(long, help = "Kept private; omitted from public listings")]
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mobile: Option<String>,
    },
    #[command(about = "Career application")]
    #[serde(rename_all = "camelCase")]
    Career {
        #[arg(long)]
        name: String,
        #[arg(long)]
        mobile: String,
        #[arg(long)]
        skills: String,
        #[arg(long)]
        experience: String,
        #[arg(long, default_value = "")]
        message: String,
    },
    #[command(about = "Architect project inquiry")]
    #[serde(rename_all = "camelCase")]
    Architect {
        #[arg(long)]
        name: String,
        #[arg(long)]
        project_type: String,
        #[arg(long)]
        location: String,
        #[arg(long, default_value = "")]
        budget: String,
        #[arg(long, default_value = "")]
        message: String,
    },
    #[command(about = "Contact request for a worker or material")]
    #[serde(rename_all = "camelCase")]
    Contact {
        #[arg(long)]
        customer_name: String,
        #[arg(long)]
        mobile: String,
        #[arg(long)]
        requirements: String,
        #[arg(long)]
        target_id: i64,
        #[arg(long, value_parser = ["worker", "material"])]
        target_type: String,
    },
}

#[derive(Serialize)]
struct Envelope<'a> {
    #[serde(flatten)]
    submission: &'a Submission,
    timestamp: String,
}

fn required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("`{field}` is required");
    }
    Ok(())
}

pub fn validate_mobile(value: &str) -> Result<()> {
    required("mobile", value)?;
    if !MOBILE.is_match(value.trim()) {
        bail!("`mobile` must be a 10-digit number starting with 6-9");
    }
    Ok(())
}

impl Submission {
    pub fn origin(&self) -> &'static str {
        match self {
            Submission::Worker { .. } => "worker",
            Submission::Material { .. } => "material",
            Submission::Career { .. } => "career",
            Submission::Architect { .. } => "architect",
            Submission::Contact { .. } => "contact",
        }
    }

    pub fn author(&self) -> &str {
        match self {
            Submission::Worker { name, .. }
            | Submission::Material { name, .. }
            | Submission::Career { name, .. }
            | Submission::Architect { name, .. } => name,
            Submission::Contact { customer_name, .. } => customer_name,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Submission::Worker {
                name,
                skill,
                category,
                location,
                mobile,
            } => {
                required("name", name)?;
                required("skill", skill)?;
                required("category", category)?;
                required("location", location)?;
                if let Some(mobile) = mobile {
                    validate_mobile(mobile)?;
                }
            }
            Submission::Material {
                name,
                category,
                description,
                location,
                mobile,
            } => {
                required("name", name)?;
                required("category", category)?;
                required("description", description)?;
                required("location", location)?;
                if let Some(mobile) = mobile {
                    validate_mobile(mobile)?;
                }
            }
            Submission::Career {
                name,
                mobile,
                skills,
                experience,
                ..
            } => {
                required("name", name)?;
                validate_mobile(mobile)?;
                required("skills", skills)?;
                required("experience", experience)?;
            }
            Submission::Architect {
                name,
                project_type,
                location,
                ..
            } => {
                required("name", name)?;
                required("projectType", project_type)?;
                required("location", location)?;
            }
            Submission::Contact {
                customer_name,
                mobile,
                requirements,
                target_type,
                ..
            } => {
                required("customerName", customer_name)?;
                validate_mobile(mobile)?;
                required("requirements", requirements)?;
                if target_type != "worker" && target_type != "material" {
                    bail!("`targetType` must be `worker` or `material`, got `{target_type}`");
                }
            }
        }
        Ok(())
    }

    /// Serialized payload carrying an explicit `origin` tag.
    pub fn encode(&self) -> Result<String> {
        self.validate()?;
        let envelope = Envelope {
            submission: self,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        Ok(serde_json::to_string(&envelope)?)
    }

    pub fn into_record(self) -> Result<NewRecord> {
        let raw_text = self.encode()?;
        Ok(NewRecord::plain(&raw_text, Some(self.author())))
    }

    /// Directory entry for worker registrations and material listings.
    pub fn listing(&self) -> Option<NewListing> {
        let trimmed = |v: &str| v.trim().to_string();
        let mobile = |v: &Option<String>| v.as_deref().map(str::trim).map(ToString::to_string);
        match self {
            Submission::Worker {
                name,
                skill,
                category,
                location,
                mobile: m,
            } => Some(NewListing::Worker(NewWorker {
                name: trimmed(name),
                skill: trimmed(skill),
                category: trimmed(category),
                location: trimmed(location),
                mobile: mobile(m),
            })),
            Submission::Material {
                name,
                category,
                description,
                location,
                mobile: m,
            } => Some(NewListing::Material(NewMaterial {
                name: trimmed(name),
                category: trimmed(category),
                description: trimmed(description),
                location: trimmed(location),
                mobile: mobile(m),
            })),
            _ => None,
        }
    }
}
