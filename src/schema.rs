//! Validation rules for phrase create and update payloads.
//!
//! Validation runs synchronously against in-progress form values. Every
//! failing field gets a human-readable message keyed by its path
//! (`phrase`, `translations.0.language`, ...); any failure blocks submission.

use crate::models::{Phrase, PhrasePayload, PhraseStatus, TranslationInput};
use thiserror::Error;

/// In-progress form values, as typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormValues {
    pub id: Option<String>,
    pub phrase: String,
    pub status: String,
    pub translations: Vec<TranslationInput>,
}

impl Default for FormValues {
    fn default() -> Self {
        Self {
            id: None,
            phrase: String::new(),
            status: PhraseStatus::Active.as_str().to_string(),
            translations: vec![TranslationInput::default()],
        }
    }
}

impl From<&Phrase> for FormValues {
    fn from(phrase: &Phrase) -> Self {
        Self {
            id: Some(phrase.id.clone()),
            phrase: phrase.phrase.clone(),
            status: phrase.status.as_str().to_string(),
            translations: phrase.translations.iter().map(TranslationInput::from).collect(),
        }
    }
}

/// A single field-scoped validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Validation report listing every failing field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Error)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_errors()
    }

    /// First message reported for `field`, for inline display
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }

    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhraseSchema {
    Create,
    /// Create rules plus a required `id`
    Update,
}

impl PhraseSchema {
    pub fn validate(&self, values: &FormValues) -> Result<PhrasePayload, ValidationReport> {
        let mut report = ValidationReport::new();

        if *self == Self::Update && values.id.as_deref().map_or(true, str::is_empty) {
            report.push("id", "Id is required");
        }

        if values.phrase.is_empty() {
            report.push("phrase", "Phrase is required");
        }

        let status = values.status.parse::<PhraseStatus>();
        if status.is_err() {
            report.push(
                "status",
                format!(
                    "Invalid status '{}'. Expected one of: active, pending, spam",
                    values.status
                ),
            );
        }

        if values.translations.is_empty() {
            report.push("translations", "At least one translation is required");
        }

        for (index, translation) in values.translations.iter().enumerate() {
            if translation.language.is_empty() {
                report.push(format!("translations.{}.language", index), "Language is required");
            }
            if translation.text.is_empty() {
                report.push(format!("translations.{}.text", index), "Translation text is required");
            }
        }

        match status {
            Ok(status) if report.is_clean() => Ok(PhrasePayload {
                id: match self {
                    Self::Create => None,
                    Self::Update => values.id.clone(),
                },
                phrase: values.phrase.clone(),
                status,
                translations: values.translations.clone(),
            }),
            _ => Err(report),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_values() -> FormValues {
        FormValues {
            id: None,
            phrase: "Hello".to_string(),
            status: "pending".to_string(),
            translations: vec![TranslationInput {
                id: None,
                language: "es".to_string(),
                text: "Hola".to_string(),
            }],
        }
    }

    #[test]
    fn test_default_values() {
        let values = FormValues::default();
        assert_eq!(values.phrase, "");
        assert_eq!(values.status, "active");
        assert_eq!(values.translations, vec![TranslationInput::default()]);
        assert!(values.id.is_none());
    }

    #[test]
    fn test_create_accepts_valid_values() {
        let payload = PhraseSchema::Create.validate(&valid_values()).expect("Should validate");
        assert_eq!(payload.phrase, "Hello");
        assert_eq!(payload.status, PhraseStatus::Pending);
        assert!(payload.id.is_none());
    }

    #[test]
    fn test_create_drops_stray_id() {
        let mut values = valid_values();
        values.id = Some("p1".to_string());

        let payload = PhraseSchema::Create.validate(&values).expect("Should validate");
        assert!(payload.id.is_none());
    }

    #[test]
    fn test_defaults_fail_create() {
        let report = PhraseSchema::Create
            .validate(&FormValues::default())
            .unwrap_err();

        assert_eq!(report.message_for("phrase"), Some("Phrase is required"));
        assert_eq!(
            report.message_for("translations.0.language"),
            Some("Language is required")
        );
        assert_eq!(
            report.message_for("translations.0.text"),
            Some("Translation text is required")
        );
        assert!(report.message_for("status").is_none());
        assert!(report.message_for("id").is_none());
    }

    #[test]
    fn test_empty_translations_rejected() {
        let mut values = valid_values();
        values.translations.clear();

        let report = PhraseSchema::Create.validate(&values).unwrap_err();
        assert_eq!(
            report.message_for("translations"),
            Some("At least one translation is required")
        );
    }

    #[test]
    fn test_invalid_status_rejected() {
        let mut values = valid_values();
        values.status = "archived".to_string();

        let report = PhraseSchema::Create.validate(&values).unwrap_err();
        assert!(report.message_for("status").unwrap().contains("archived"));
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_update_requires_id() {
        let report = PhraseSchema::Update.validate(&valid_values()).unwrap_err();
        assert_eq!(report.message_for("id"), Some("Id is required"));

        let mut values = valid_values();
        values.id = Some(String::new());
        let report = PhraseSchema::Update.validate(&values).unwrap_err();
        assert_eq!(report.message_for("id"), Some("Id is required"));
    }

    #[test]
    fn test_update_keeps_id_and_translation_ids() {
        let mut values = valid_values();
        values.id = Some("p1".to_string());
        values.translations[0].id = Some("t1".to_string());

        let payload = PhraseSchema::Update.validate(&values).expect("Should validate");
        assert_eq!(payload.id.as_deref(), Some("p1"));
        assert_eq!(payload.translations[0].id.as_deref(), Some("t1"));
    }

    #[test]
    fn test_errors_reported_per_row() {
        let mut values = valid_values();
        values.translations.push(TranslationInput {
            id: None,
            language: "fr".to_string(),
            text: String::new(),
        });

        let report = PhraseSchema::Create.validate(&values).unwrap_err();
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].field, "translations.1.text");
        assert_eq!(report.to_string(), "1 field(s) failed validation");
    }
}
