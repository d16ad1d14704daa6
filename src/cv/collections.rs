use super::models::{Education, Experience, Project, SkillCategory};
use super::validation::{FieldValidator, normalize_tags};
use crate::core::Result;
use crate::reconcile::OrderedRecord;
use crate::storage::{Document, StoreResult, to_document};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub const EXPERIENCES: &str = "experiences";
pub const EDUCATION: &str = "education";
pub const SKILLS: &str = "skills";
pub const PROJECTS: &str = "projects";

/// Route segment under each collection, so never usable as a record id.
pub const DRAFT_SEGMENT: &str = "draft";

/// A payload stored in one of the ordered collections.
pub trait CollectionPayload:
    Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
    /// Store collection and URL segment.
    const COLLECTION: &'static str;
    /// Human label used in log lines.
    const LABEL: &'static str;

    fn validate(&self, v: &mut FieldValidator);

    /// Cleans user input before validation.
    fn normalize(&mut self) {}

    fn to_document(&self) -> StoreResult<Document> {
        to_document(self)
    }
}

/// Normalizes then validates every record, reporting paths like `projects[1].title.fr`.
pub fn prepare_records<T: CollectionPayload>(records: &mut [OrderedRecord<T>]) -> Result<()> {
    let mut all = FieldValidator::new();
    for (index, record) in records.iter_mut().enumerate() {
        record.payload.normalize();
        let mut v = FieldValidator::with_prefix(format!("{}[{index}]", T::COLLECTION));
        if record.id.as_deref() == Some(DRAFT_SEGMENT) {
            v.error("id", "This identifier is reserved.");
        }
        record.payload.validate(&mut v);
        all.absorb(v);
    }
    all.finish()
}

/// Normalizes then validates one payload, with paths relative to it.
pub fn prepare_payload<T: CollectionPayload>(payload: &mut T) -> Result<()> {
    payload.normalize();
    let mut v = FieldValidator::new();
    payload.validate(&mut v);
    v.finish()
}

impl CollectionPayload for Experience {
    const COLLECTION: &'static str = EXPERIENCES;
    const LABEL: &'static str = "experience";

    fn normalize(&mut self) {
        self.technologies = normalize_tags(std::mem::take(&mut self.technologies));
    }

    fn validate(&self, v: &mut FieldValidator) {
        v.required("position.fr", &self.position.fr, "Le poste (FR) est requis.")
            .required("position.en", &self.position.en, "Le poste (EN) est requis.")
            .required("company", &self.company, "L'entreprise est requise.")
            .required("duration", &self.duration, "La durée est requise.")
            .required("description.fr", &self.description.fr, "La description (FR) est requise.")
            .required("description.en", &self.description.en, "La description (EN) est requise.")
            .non_empty("technologies", &self.technologies, "Ajoutez au moins une technologie.");
    }
}

impl CollectionPayload for Education {
    const COLLECTION: &'static str = EDUCATION;
    const LABEL: &'static str = "education";

    fn validate(&self, v: &mut FieldValidator) {
        v.required("degree.fr", &self.degree.fr, "Le diplôme (FR) est requis.")
            .required("degree.en", &self.degree.en, "Le diplôme (EN) est requis.")
            .required("institution", &self.institution, "L'établissement est requis.")
            .required("duration", &self.duration, "La durée est requise.")
            .required("description.fr", &self.description.fr, "La description (FR) est requise.")
            .required("description.en", &self.description.en, "La description (EN) est requise.");
    }
}

impl CollectionPayload for SkillCategory {
    const COLLECTION: &'static str = SKILLS;
    const LABEL: &'static str = "skill category";

    fn normalize(&mut self) {
        self.category = self.category.trim().to_string();
        for tech in &mut self.technologies {
            tech.name = tech.name.trim().to_string();
        }
    }

    fn validate(&self, v: &mut FieldValidator) {
        v.required("category", &self.category, "La catégorie est requise.")
            .non_empty("technologies", &self.technologies, "Ajoutez au moins une compétence.");
        for (i, tech) in self.technologies.iter().enumerate() {
            v.required(&format!("technologies[{i}].name"), &tech.name, "Le nom est requis.");
            if tech.level > 100 {
                v.error(
                    &format!("technologies[{i}].level"),
                    "Le niveau doit être compris entre 0 et 100.",
                );
            }
        }
    }
}

impl CollectionPayload for Project {
    const COLLECTION: &'static str = PROJECTS;
    const LABEL: &'static str = "project";

    fn normalize(&mut self) {
        self.technologies = normalize_tags(std::mem::take(&mut self.technologies));
        self.demo_link = self.demo_link.trim().to_string();
        self.github_link = self.github_link.trim().to_string();
        self.image = self.image.trim().to_string();
    }

    fn validate(&self, v: &mut FieldValidator) {
        v.required("title.fr", &self.title.fr, "Le titre (FR) est requis.")
            .required("title.en", &self.title.en, "Le titre (EN) est requis.")
            .required("description.fr", &self.description.fr, "La description (FR) est requise.")
            .required("description.en", &self.description.en, "La description (EN) est requise.")
            .non_empty("technologies", &self.technologies, "Ajoutez au moins une technologie.")
            .optional_url("demoLink", &self.demo_link, "URL invalide")
            .optional_url("githubLink", &self.github_link, "URL invalide");
    }
}
