use crate::core::Translatable;
use crate::reconcile::OrderedRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Socials {
    #[serde(default)]
    pub github: String,
    #[serde(default)]
    pub linkedin: String,
    #[serde(default)]
    pub website: String,
}

/// The profile singleton (`cv-data/personalInfo`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalInfo {
    #[serde(default)]
    pub name: Translatable,
    #[serde(default)]
    pub title: Translatable,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub summary: Translatable,
    #[serde(default)]
    pub contact: ContactDetails,
    #[serde(default)]
    pub socials: Socials,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    #[serde(default)]
    pub position: Translatable,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub description: Translatable,
    #[serde(default)]
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    #[serde(default)]
    pub degree: Translatable,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub description: Translatable,
}

pub const DEFAULT_TECHNOLOGY_LEVEL: u32 = 50;

fn default_level() -> u32 {
    DEFAULT_TECHNOLOGY_LEVEL
}

/// A named skill with a proficiency level between 0 and 100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technology {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_level")]
    pub level: u32,
}

impl Technology {
    pub fn new(name: impl Into<String>, level: u32) -> Self {
        Self {
            name: name.into(),
            level,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCategory {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub technologies: Vec<Technology>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub title: Translatable,
    #[serde(default)]
    pub description: Translatable,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub demo_link: String,
    #[serde(default)]
    pub github_link: String,
}

/// A message left through the public contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/contact`. `lang` only selects the language of error messages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewContactMessage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub lang: Option<String>,
}

/// Counters kept under `stats/cv`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CvStats {
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub downloads: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub views: u64,
    pub downloads: u64,
    pub contacts: usize,
}

/// Everything the public site renders, in both languages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvData {
    pub personal_info: Option<PersonalInfo>,
    pub experiences: Vec<OrderedRecord<Experience>>,
    pub education: Vec<OrderedRecord<Education>>,
    pub skills: Vec<OrderedRecord<SkillCategory>>,
    pub projects: Vec<OrderedRecord<Project>>,
}
