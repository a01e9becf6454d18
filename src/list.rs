//! List/search view controller.
//!
//! Holds the search term and sort selection, turns them into
//! [`SearchParams`], and re-fetches once the user has been idle for the
//! debounce period. Only the most recently issued search may update the
//! rows; anything it supersedes, or that lands after `unmount`, is dropped.
//!
//! Row actions: edit (opens the form), delete (behind a confirmation), and a
//! translations panel with language names resolved from the catalog.

use crate::api::{ApiClient, ApiError};
use crate::cache::{FetchMode, QueryCache, QueryKey};
use crate::config::Config;
use crate::debounce::Debouncer;
use crate::form::{FormController, FormMode, SubmitOutcome};
use crate::format::language_name;
use crate::models::{Language, Phrase, SearchField, SearchParams, SortField, SortOrder};
use crate::notify::Notifier;
use crate::queries::{self, Query};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Fields searched while the user types
pub const LIVE_SEARCH_FIELDS: [SearchField; 2] = [SearchField::Phrase, SearchField::Status];

/// Fields searched by the first fetch after mounting.
///
/// Translation text is only searched here, matching the existing API
/// clients; see DESIGN.md.
pub const INITIAL_SEARCH_FIELDS: [SearchField; 3] = [
    SearchField::Phrase,
    SearchField::Status,
    SearchField::TranslationText,
];

/// One line of the translations panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationLine {
    /// Language display name, or the raw code when the catalog lacks it
    pub language: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    /// No delete was awaiting confirmation
    NothingPending,
    Deleted(String),
    /// The dialog stays open so the delete can be retried
    Failed(ApiError),
}

struct ListState {
    search_term: String,
    sort_fields: Vec<SortField>,
    sort_order: SortOrder,
    rows: Option<Arc<Vec<Phrase>>>,
    loading: bool,
    generation: u64,
    mounted: bool,
    delete_target: Option<String>,
    translations_panel: Option<Vec<TranslationLine>>,
}

impl Default for ListState {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            sort_fields: vec![SortField::Phrase],
            sort_order: SortOrder::Asc,
            rows: None,
            loading: false,
            generation: 0,
            mounted: false,
            delete_target: None,
            translations_panel: None,
        }
    }
}

impl ListState {
    fn params(&self, search_fields: &[SearchField]) -> SearchParams {
        SearchParams::build(
            &self.search_term,
            &self.sort_fields,
            self.sort_order,
            search_fields,
        )
    }
}

struct Inner {
    client: ApiClient,
    notifier: Arc<dyn Notifier>,
    phrases: Query<Vec<Phrase>>,
    languages: Query<Vec<Language>>,
    state: Mutex<ListState>,
    debouncer: Debouncer,
    form: tokio::sync::Mutex<FormController>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, ListState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Issue a search; returns whether its result was applied to the view
    async fn run_search(&self, params: SearchParams, mode: FetchMode) -> Result<bool, ApiError> {
        let generation = {
            let mut state = self.lock();
            if !state.mounted {
                debug!("List not mounted, skipping search");
                return Ok(false);
            }
            state.generation += 1;
            state.loading = true;
            state.generation
        };

        debug!("Searching phrases with {:?}", params);
        let result = self
            .phrases
            .switch(Some(QueryKey::Phrases(params)), mode)
            .await;

        {
            let mut state = self.lock();
            if !state.mounted || state.generation != generation {
                debug!("Discarding superseded search results (generation {})", generation);
                return Ok(false);
            }
            state.loading = false;
            if let Ok(rows) = &result {
                state.rows = rows.clone();
            }
        }

        match result {
            Ok(rows) => {
                debug!("Loaded {} phrases", rows.map_or(0, |r| r.len()));
                Ok(true)
            }
            Err(e) => {
                self.notifier.error("Failed to load phrases");
                Err(e)
            }
        }
    }
}

/// Cheaply cloneable handle; clones share one view
#[derive(Clone)]
pub struct ListController {
    inner: Arc<Inner>,
}

impl ListController {
    pub fn new(
        config: &Config,
        client: &ApiClient,
        cache: &Arc<QueryCache>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let state = ListState::default();
        let initial = state.params(&INITIAL_SEARCH_FIELDS);

        Self {
            inner: Arc::new(Inner {
                client: client.clone(),
                notifier: notifier.clone(),
                phrases: queries::phrases(client, cache, initial),
                languages: queries::languages(client, cache),
                state: Mutex::new(state),
                debouncer: Debouncer::new(config.search_debounce),
                form: tokio::sync::Mutex::new(FormController::new(client, cache, notifier)),
            }),
        }
    }

    /// Show the view: load the first page of results and the language catalog
    pub async fn mount(&self) -> Result<(), ApiError> {
        let initial = {
            let mut state = self.inner.lock();
            state.mounted = true;
            state.params(&INITIAL_SEARCH_FIELDS)
        };
        info!("Mounting phrase list");

        if let Err(e) = self.inner.languages.load().await {
            warn!("Failed to load language catalog: {}", e);
        }

        self.inner
            .run_search(initial, FetchMode::CacheFirst)
            .await
            .map(|_| ())
    }

    /// Tear the view down: pending searches are cancelled and results still
    /// in flight are dropped when they arrive
    pub fn unmount(&self) {
        {
            let mut state = self.inner.lock();
            state.mounted = false;
            state.loading = false;
        }
        if self.inner.debouncer.cancel() {
            debug!("Cancelled pending search on unmount");
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.lock().mounted
    }

    // ==================== Search & sort ====================

    pub fn search_term(&self) -> String {
        self.inner.lock().search_term.clone()
    }

    pub fn sort_fields(&self) -> Vec<SortField> {
        self.inner.lock().sort_fields.clone()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.inner.lock().sort_order
    }

    /// Parameters the next debounced search will send
    pub fn search_params(&self) -> SearchParams {
        self.inner.lock().params(&LIVE_SEARCH_FIELDS)
    }

    /// Parameters of the search currently shown (or loading)
    pub fn active_params(&self) -> Option<SearchParams> {
        match self.inner.phrases.key() {
            Some(QueryKey::Phrases(params)) => Some(params),
            _ => None,
        }
    }

    pub fn set_search_term(&self, term: &str) {
        self.inner.lock().search_term = term.to_string();
        self.schedule_search();
    }

    /// Turn one sort field on or off; the first-enabled field sorts first
    pub fn set_sort_field(&self, field: SortField, enabled: bool) {
        {
            let mut state = self.inner.lock();
            let present = state.sort_fields.contains(&field);
            if enabled && !present {
                state.sort_fields.push(field);
            } else if !enabled && present {
                state.sort_fields.retain(|f| *f != field);
            }
        }
        self.schedule_search();
    }

    pub fn toggle_sort_field(&self, field: SortField) {
        let enabled = !self.inner.lock().sort_fields.contains(&field);
        self.set_sort_field(field, enabled);
    }

    pub fn set_sort_order(&self, order: SortOrder) {
        self.inner.lock().sort_order = order;
        self.schedule_search();
    }

    /// Restart the quiet period with a snapshot of the current selections
    fn schedule_search(&self) {
        let params = self.search_params();
        let inner = Arc::downgrade(&self.inner);

        self.inner.debouncer.schedule(async move {
            let Some(inner) = inner.upgrade() else {
                return;
            };
            // The request runs detached so a later keystroke cancels only the
            // timer, never a search already on the wire.
            tokio::spawn(async move {
                if let Err(e) = inner.run_search(params, FetchMode::Refetch).await {
                    debug!("Debounced search failed: {}", e);
                }
            });
        });
    }

    pub fn is_search_pending(&self) -> bool {
        self.inner.debouncer.is_pending()
    }

    /// Re-run the search currently shown
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let params = self
            .active_params()
            .unwrap_or_else(|| self.inner.lock().params(&INITIAL_SEARCH_FIELDS));
        self.inner
            .run_search(params, FetchMode::Refetch)
            .await
            .map(|_| ())
    }

    pub fn phrases(&self) -> Option<Arc<Vec<Phrase>>> {
        self.inner.lock().rows.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().loading
    }

    pub fn languages(&self) -> Option<Arc<Vec<Language>>> {
        self.inner.languages.data()
    }

    // ==================== Create/edit form ====================

    pub async fn open_create_form(&self) -> Result<(), ApiError> {
        self.inner.form.lock().await.open(FormMode::Create).await
    }

    pub async fn open_edit_form(&self, id: &str) -> Result<(), ApiError> {
        self.inner
            .form
            .lock()
            .await
            .open(FormMode::Edit(id.to_string()))
            .await
    }

    /// Exclusive access to the form for field edits
    pub async fn form(&self) -> tokio::sync::MutexGuard<'_, FormController> {
        self.inner.form.lock().await
    }

    /// Submit the form; a successful create/update refreshes the list
    pub async fn submit_form(&self) -> SubmitOutcome {
        let list = self;
        let mut form = self.inner.form.lock().await;
        let outcome = form
            .submit(move || async move {
                if let Err(e) = list.refresh().await {
                    warn!("Failed to refresh phrases after save: {}", e);
                }
            })
            .await;
        drop(form);

        if outcome.is_success() {
            self.reset_dialogs();
        }
        outcome
    }

    pub async fn close_form(&self) {
        self.inner.form.lock().await.close();
        self.reset_dialogs();
    }

    // ==================== Delete ====================

    /// Ask for confirmation before deleting `id`
    pub fn request_delete(&self, id: &str) {
        self.inner.lock().delete_target = Some(id.to_string());
    }

    pub fn pending_delete(&self) -> Option<String> {
        self.inner.lock().delete_target.clone()
    }

    pub fn is_delete_dialog_open(&self) -> bool {
        self.inner.lock().delete_target.is_some()
    }

    /// Dismiss the dialog without touching the server
    pub fn cancel_delete(&self) {
        self.reset_dialogs();
    }

    pub async fn confirm_delete(&self) -> DeleteOutcome {
        let Some(id) = self.pending_delete() else {
            return DeleteOutcome::NothingPending;
        };

        match self.inner.client.remove(&id).await {
            Ok(_) => {
                info!("Deleted phrase {}", id);
                self.reset_dialogs();
                {
                    let mut form = self.inner.form.lock().await;
                    if form.mode().edit_id() == Some(id.as_str()) {
                        form.close();
                    }
                }
                self.inner.notifier.success("Phrase deleted successfully");
                if let Err(e) = self.refresh().await {
                    warn!("Failed to refresh phrases after delete: {}", e);
                }
                DeleteOutcome::Deleted(id)
            }
            Err(e) => {
                self.inner.notifier.error("Failed to delete phrase");
                DeleteOutcome::Failed(e)
            }
        }
    }

    /// Clear the delete dialog and the translations panel
    fn reset_dialogs(&self) {
        let mut state = self.inner.lock();
        state.delete_target = None;
        state.translations_panel = None;
    }

    // ==================== Translations panel ====================

    /// Open the translations panel for a listed phrase
    pub fn show_translations(&self, phrase_id: &str) -> Option<Vec<TranslationLine>> {
        let rows = self.phrases()?;
        let phrase = rows.iter().find(|p| p.id == phrase_id)?;
        let languages = self.languages();
        let catalog: &[Language] = languages.as_deref().map(Vec::as_slice).unwrap_or_default();

        let lines: Vec<TranslationLine> = phrase
            .translations
            .iter()
            .map(|t| TranslationLine {
                language: language_name(catalog, &t.language).to_string(),
                text: t.text.clone(),
            })
            .collect();

        self.inner.lock().translations_panel = Some(lines.clone());
        Some(lines)
    }

    pub fn translations_panel(&self) -> Option<Vec<TranslationLine>> {
        self.inner.lock().translations_panel.clone()
    }

    pub fn close_translations(&self) {
        self.inner.lock().translations_panel = None;
    }
}
