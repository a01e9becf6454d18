//! Create/edit form controller.
//!
//! The form opens in an explicit [`FormMode`]. In edit mode the target phrase
//! is loaded through the by-id query and copied into the fields. Translation
//! rows removed while editing are only remembered; their ids are deleted on
//! submit, strictly before the phrase update is sent.

use crate::api::{ApiClient, ApiError};
use crate::cache::QueryCache;
use crate::format::{language_label, language_name};
use crate::models::{Language, Phrase, PhrasePayload, TranslationInput};
use crate::notify::Notifier;
use crate::queries::{self, phrase_key, Query};
use crate::schema::{FormValues, PhraseSchema, ValidationReport};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Create,
    Edit(String),
}

impl FormMode {
    pub fn edit_id(&self) -> Option<&str> {
        match self {
            Self::Create => None,
            Self::Edit(id) => Some(id),
        }
    }

    pub fn is_edit(&self) -> bool {
        matches!(self, Self::Edit(_))
    }

    pub fn schema(&self) -> PhraseSchema {
        match self {
            Self::Create => PhraseSchema::Create,
            Self::Edit(_) => PhraseSchema::Update,
        }
    }
}

/// Row edits the form refuses
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("No translation row at position {0}")]
    RowOutOfRange(usize),

    #[error("The language of saved translation {0} cannot be changed")]
    LanguageLocked(usize),

    #[error("At least one translation row must remain")]
    LastRow,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Blocked by validation; nothing was sent
    Invalid(ValidationReport),
    Created(Option<Phrase>),
    Updated(Option<Phrase>),
    /// A request failed; the form stays open with its input intact
    Failed(ApiError),
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Created(_) | Self::Updated(_))
    }
}

pub struct FormController {
    client: ApiClient,
    notifier: Arc<dyn Notifier>,
    phrase: Query<Phrase>,
    languages: Query<Vec<Language>>,
    mode: FormMode,
    open: bool,
    values: FormValues,
    removed_translation_ids: Vec<String>,
    errors: ValidationReport,
    submitting: bool,
}

impl FormController {
    pub fn new(client: &ApiClient, cache: &Arc<QueryCache>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client: client.clone(),
            notifier,
            phrase: queries::phrase(client, cache, None),
            languages: queries::languages(client, cache),
            mode: FormMode::Create,
            open: false,
            values: FormValues::default(),
            removed_translation_ids: Vec::new(),
            errors: ValidationReport::new(),
            submitting: false,
        }
    }

    /// Open the form. In edit mode the phrase is loaded and copied into the
    /// fields; a load failure is notified and returned, leaving the defaults.
    pub async fn open(&mut self, mode: FormMode) -> Result<(), ApiError> {
        self.reset();
        self.phrase.set_key(phrase_key(mode.edit_id()));
        self.mode = mode;
        self.open = true;

        if let Err(e) = self.languages.load().await {
            warn!("Failed to load language catalog: {}", e);
        }

        match self.phrase.load().await {
            Ok(Some(phrase)) => {
                debug!("Editing phrase {}", phrase.id);
                self.values = FormValues::from(phrase.as_ref());
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                self.notifier.error("Failed to load phrase");
                Err(e)
            }
        }
    }

    /// Close and restore defaults (cancel, or after a successful submit)
    pub fn close(&mut self) {
        self.reset();
        self.mode = FormMode::Create;
        self.open = false;
        self.phrase.set_key(None);
    }

    fn reset(&mut self) {
        self.values = FormValues::default();
        self.removed_translation_ids.clear();
        self.errors = ValidationReport::new();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn errors(&self) -> &ValidationReport {
        &self.errors
    }

    /// Translation ids waiting to be deleted on submit
    pub fn removed_translation_ids(&self) -> &[String] {
        &self.removed_translation_ids
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn is_loading(&self) -> bool {
        self.phrase.is_loading()
    }

    pub fn set_phrase(&mut self, phrase: &str) {
        self.values.phrase = phrase.to_string();
    }

    pub fn set_status(&mut self, status: &str) {
        self.values.status = status.to_string();
    }

    /// Saved translations keep their language; only new rows may pick one
    pub fn is_language_locked(&self, index: usize) -> bool {
        self.mode.is_edit()
            && self
                .values
                .translations
                .get(index)
                .and_then(|t| t.id.as_deref())
                .map_or(false, |id| !id.is_empty())
    }

    pub fn set_translation_language(&mut self, index: usize, code: &str) -> Result<(), FormError> {
        if self.is_language_locked(index) {
            return Err(FormError::LanguageLocked(index));
        }
        let row = self
            .values
            .translations
            .get_mut(index)
            .ok_or(FormError::RowOutOfRange(index))?;
        row.language = code.to_string();
        Ok(())
    }

    pub fn set_translation_text(&mut self, index: usize, text: &str) -> Result<(), FormError> {
        let row = self
            .values
            .translations
            .get_mut(index)
            .ok_or(FormError::RowOutOfRange(index))?;
        row.text = text.to_string();
        Ok(())
    }

    pub fn add_translation(&mut self) {
        self.values.translations.push(TranslationInput::default());
    }

    /// Drop row `index`. A saved row's id is queued for deletion on submit.
    pub fn remove_translation(&mut self, index: usize) -> Result<(), FormError> {
        if index >= self.values.translations.len() {
            return Err(FormError::RowOutOfRange(index));
        }
        if self.values.translations.len() <= 1 {
            return Err(FormError::LastRow);
        }

        let removed = self.values.translations.remove(index);
        if self.mode.is_edit() {
            if let Some(id) = removed.id.filter(|id| !id.is_empty()) {
                self.removed_translation_ids.push(id);
            }
        }
        Ok(())
    }

    pub fn languages(&self) -> Option<Arc<Vec<Language>>> {
        self.languages.data()
    }

    /// Picker labels, e.g. `"Spanish (es)"`
    pub fn language_options(&self) -> Vec<String> {
        self.languages()
            .map(|languages| languages.iter().map(language_label).collect())
            .unwrap_or_default()
    }

    /// Display name for a row's language code
    pub fn language_display(&self, code: &str) -> String {
        match self.languages() {
            Some(languages) => language_name(&languages, code).to_string(),
            None => code.to_string(),
        }
    }

    /// Validate and send the form.
    ///
    /// `on_success` runs after a successful create or update (the list
    /// refresh), before the form closes.
    pub async fn submit<F, Fut>(&mut self, on_success: F) -> SubmitOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        let payload = match self.mode.schema().validate(&self.values) {
            Ok(payload) => payload,
            Err(report) => {
                debug!("Form blocked by validation: {}", report);
                self.errors = report.clone();
                return SubmitOutcome::Invalid(report);
            }
        };
        self.errors = ValidationReport::new();
        self.submitting = true;

        let outcome = match self.mode.clone() {
            FormMode::Create => self.create(&payload).await,
            FormMode::Edit(id) => self.update(&id, &payload).await,
        };
        self.submitting = false;

        if outcome.is_success() {
            on_success().await;
            if matches!(outcome, SubmitOutcome::Updated(_)) {
                if let Err(e) = self.phrase.refetch().await {
                    warn!("Failed to refresh edited phrase: {}", e);
                }
            }
            self.close();
        }

        outcome
    }

    async fn create(&mut self, payload: &PhrasePayload) -> SubmitOutcome {
        match self.client.create(payload).await {
            Ok(response) => {
                info!("Created phrase '{}'", payload.phrase);
                self.notifier.success("Phrase created successfully");
                SubmitOutcome::Created(response.data)
            }
            Err(e) => {
                self.notifier.error("Failed to create phrase");
                SubmitOutcome::Failed(e)
            }
        }
    }

    async fn update(&mut self, id: &str, payload: &PhrasePayload) -> SubmitOutcome {
        if !self.removed_translation_ids.is_empty() {
            match self.client.delete_translations(&self.removed_translation_ids).await {
                Ok(_) => {
                    info!(
                        "Deleted {} translations of phrase {}",
                        self.removed_translation_ids.len(),
                        id
                    );
                    self.notifier.success("Translations deleted successfully");
                    self.removed_translation_ids.clear();
                }
                Err(e) => {
                    self.notifier.error("Failed to delete translations");
                    return SubmitOutcome::Failed(e);
                }
            }
        }

        match self.client.update(id, payload).await {
            Ok(response) => {
                info!("Updated phrase {}", id);
                self.notifier.success("Phrase updated successfully");
                SubmitOutcome::Updated(response.data)
            }
            Err(e) => {
                self.notifier.error("Failed to update phrase");
                SubmitOutcome::Failed(e)
            }
        }
    }
}
