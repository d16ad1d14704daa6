//! Language-flattened view of the CV, shared by every renderer.

use super::models::{CvData, Socials};
use crate::core::{Language, Translatable};
use serde::Serialize;

/// Replaces typographic characters with plain ASCII equivalents.
pub fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2026}' => out.push_str("..."),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{00A0}' => out.push(' '),
            other => out.push(other),
        }
    }
    out
}

fn pick(text: &Translatable, lang: Language) -> String {
    clean_text(text.get(lang))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    pub name: String,
    pub title: String,
    pub summary: String,
    pub avatar: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub socials: Socials,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExperienceSnapshot {
    pub position: String,
    pub company: String,
    pub duration: String,
    pub description: String,
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EducationSnapshot {
    pub degree: String,
    pub institution: String,
    pub duration: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillSnapshot {
    pub name: String,
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillCategorySnapshot {
    pub category: String,
    pub technologies: Vec<SkillSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    pub title: String,
    pub description: String,
    pub image: String,
    pub technologies: Vec<String>,
    pub demo_link: String,
    pub github_link: String,
}

/// The CV in one language, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CvSnapshot {
    pub lang: Language,
    pub personal_info: ProfileSnapshot,
    pub experiences: Vec<ExperienceSnapshot>,
    pub education: Vec<EducationSnapshot>,
    pub skills: Vec<SkillCategorySnapshot>,
    pub projects: Vec<ProjectSnapshot>,
}

impl CvSnapshot {
    /// `None` until a profile has been saved.
    pub fn flatten(data: &CvData, lang: Language) -> Option<Self> {
        let info = data.personal_info.as_ref()?;

        let personal_info = ProfileSnapshot {
            name: pick(&info.name, lang),
            title: pick(&info.title, lang),
            summary: pick(&info.summary, lang),
            avatar: info.avatar.clone(),
            email: clean_text(&info.contact.email),
            phone: clean_text(&info.contact.phone),
            location: clean_text(&info.contact.location),
            socials: info.socials.clone(),
        };

        let experiences = data
            .experiences
            .iter()
            .map(|r| &r.payload)
            .map(|e| ExperienceSnapshot {
                position: pick(&e.position, lang),
                company: clean_text(&e.company),
                duration: clean_text(&e.duration),
                description: pick(&e.description, lang),
                technologies: e.technologies.iter().map(|t| clean_text(t)).collect(),
            })
            .collect();

        let education = data
            .education
            .iter()
            .map(|r| &r.payload)
            .map(|e| EducationSnapshot {
                degree: pick(&e.degree, lang),
                institution: clean_text(&e.institution),
                duration: clean_text(&e.duration),
                description: pick(&e.description, lang),
            })
            .collect();

        let skills = data
            .skills
            .iter()
            .map(|r| &r.payload)
            .map(|s| SkillCategorySnapshot {
                category: clean_text(&s.category),
                technologies: s
                    .technologies
                    .iter()
                    .map(|t| SkillSnapshot {
                        name: clean_text(&t.name),
                        level: t.level.min(100),
                    })
                    .collect(),
            })
            .collect();

        let projects = data
            .projects
            .iter()
            .map(|r| &r.payload)
            .map(|p| ProjectSnapshot {
                title: pick(&p.title, lang),
                description: pick(&p.description, lang),
                image: p.image.clone(),
                technologies: p.technologies.iter().map(|t| clean_text(t)).collect(),
                demo_link: p.demo_link.clone(),
                github_link: p.github_link.clone(),
            })
            .collect();

        Some(Self {
            lang,
            personal_info,
            experiences,
            education,
            skills,
            projects,
        })
    }
}
