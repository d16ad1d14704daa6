//! Field checks shared by the admin forms and the public contact form.

use super::models::{NewContactMessage, PersonalInfo};
use crate::core::{Language, Result, ValidationErrors};
use regex::Regex;

lazy_static::lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[A-Za-z0-9._%+\-']+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
            .expect("email pattern is valid");
    static ref URL_RE: Regex =
        Regex::new(r"^https?://[A-Za-z0-9\-._~%]+(:[0-9]{1,5})?(/[^\s]*)?$")
            .expect("url pattern is valid");
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

/// Absolute http(s) URL with a host.
pub fn is_valid_url(value: &str) -> bool {
    URL_RE.is_match(value.trim())
}

/// Trims tags, drops blanks and keeps the first occurrence of each.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

/// Collects field errors under a common path prefix (`experiences[2]`).
#[derive(Debug, Default)]
pub struct FieldValidator {
    prefix: String,
    errors: ValidationErrors,
}

impl FieldValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            errors: ValidationErrors::new(),
        }
    }

    fn path(&self, field: &str) -> String {
        if self.prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", self.prefix, field)
        }
    }

    pub fn error(&mut self, field: &str, message: &str) -> &mut Self {
        let path = self.path(field);
        self.errors.push(path, message);
        self
    }

    pub fn required(&mut self, field: &str, value: &str, message: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.error(field, message);
        }
        self
    }

    pub fn min_chars(&mut self, field: &str, value: &str, min: usize, message: &str) -> &mut Self {
        if value.trim().chars().count() < min {
            self.error(field, message);
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str, message: &str) -> &mut Self {
        if !is_valid_email(value) {
            self.error(field, message);
        }
        self
    }

    /// Empty is accepted, anything else must be a URL.
    pub fn optional_url(&mut self, field: &str, value: &str, message: &str) -> &mut Self {
        if !value.trim().is_empty() && !is_valid_url(value) {
            self.error(field, message);
        }
        self
    }

    pub fn non_empty<T>(&mut self, field: &str, items: &[T], message: &str) -> &mut Self {
        if items.is_empty() {
            self.error(field, message);
        }
        self
    }

    /// Folds another validator's errors into this one.
    pub fn absorb(&mut self, other: FieldValidator) -> &mut Self {
        for field in other.errors.fields() {
            self.errors.push(field.field.clone(), field.message.clone());
        }
        self
    }

    pub fn into_errors(self) -> ValidationErrors {
        self.errors
    }

    pub fn finish(self) -> Result<()> {
        self.errors.into_result()
    }
}

pub fn validate_personal_info(info: &PersonalInfo) -> Result<()> {
    let mut v = FieldValidator::new();
    v.min_chars("name.fr", &info.name.fr, 2, "Le nom (FR) est requis.")
        .min_chars("name.en", &info.name.en, 2, "Le nom (EN) est requis.")
        .min_chars("title.fr", &info.title.fr, 5, "Le titre (FR) est requis.")
        .min_chars("title.en", &info.title.en, 5, "Le titre (EN) est requis.")
        .min_chars(
            "summary.fr",
            &info.summary.fr,
            20,
            "Le résumé (FR) doit faire au moins 20 caractères.",
        )
        .min_chars(
            "summary.en",
            &info.summary.en,
            20,
            "Le résumé (EN) doit faire au moins 20 caractères.",
        )
        .optional_url("avatar", &info.avatar, "L'URL de l'avatar est invalide.")
        .email("contact.email", &info.contact.email, "L'e-mail est invalide.")
        .min_chars("contact.phone", &info.contact.phone, 10, "Le téléphone est invalide.")
        .min_chars("contact.location", &info.contact.location, 3, "La localisation est requise.")
        .optional_url("socials.github", &info.socials.github, "L'URL GitHub est invalide.")
        .optional_url("socials.linkedin", &info.socials.linkedin, "L'URL LinkedIn est invalide.")
        .optional_url("socials.website", &info.socials.website, "L'URL du site web est invalide.");
    v.finish()
}

/// Contact form errors are reported in the visitor's language.
pub fn validate_contact(message: &NewContactMessage, lang: Language) -> Result<()> {
    let (name, email, body) = match lang {
        Language::Fr => (
            "Le nom doit contenir au moins 2 caractères.",
            "Veuillez saisir une adresse e-mail valide.",
            "Le message doit contenir au moins 10 caractères.",
        ),
        Language::En => (
            "Name must be at least 2 characters long.",
            "Please enter a valid email address.",
            "Message must be at least 10 characters long.",
        ),
    };
    let mut v = FieldValidator::new();
    v.min_chars("name", &message.name, 2, name)
        .email("email", &message.email, email)
        .min_chars("message", &message.message, 10, body);
    v.finish()
}
