//! Domain types shared by the API client, the query layer and the controllers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Workflow status of a phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhraseStatus {
    #[default]
    Active,
    Pending,
    Spam,
}

impl PhraseStatus {
    pub const ALL: [PhraseStatus; 3] = [Self::Active, Self::Pending, Self::Spam];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Spam => "spam",
        }
    }
}

impl fmt::Display for PhraseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhraseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown phrase status: '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub id: String,
    pub phrase_id: String,
    pub language: String,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phrase {
    pub id: String,
    pub phrase: String,
    pub status: PhraseStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub translations: Vec<Translation>,
}

/// Entry of the language catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Language {
    /// Display name (e.g. "Spanish")
    pub language: String,
    /// Code stored on `Translation::language` (e.g. "es")
    pub code: String,
}

/// Translation row as sent to the API; `id` is absent until persisted
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TranslationInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub language: String,
    pub text: String,
}

impl From<&Translation> for TranslationInput {
    fn from(translation: &Translation) -> Self {
        Self {
            id: Some(translation.id.clone()),
            language: translation.language.clone(),
            text: translation.text.clone(),
        }
    }
}

/// Validated body for create and update calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhrasePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub phrase: String,
    pub status: PhraseStatus,
    pub translations: Vec<TranslationInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Phrase,
    Status,
    TranslationLanguage,
}

impl SortField {
    pub const ALL: [SortField; 3] = [Self::Phrase, Self::Status, Self::TranslationLanguage];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phrase => "phrase",
            Self::Status => "status",
            Self::TranslationLanguage => "translations.language",
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "phrase" => Ok(Self::Phrase),
            "status" => Ok(Self::Status),
            "translations.language" | "language" | "translations" => {
                Ok(Self::TranslationLanguage)
            }
            other => Err(format!("Unknown sort field: '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("Unknown sort order: '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    Phrase,
    Status,
    TranslationText,
}

impl SearchField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phrase => "phrase",
            Self::Status => "status",
            Self::TranslationText => "translations.text",
        }
    }
}

/// Query string sent to `GET /phrase/search`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_fields: Option<String>,
}

impl SearchParams {
    /// Build parameters from the list view's selections.
    ///
    /// Every active sort field is paired with the shared direction, e.g.
    /// `[Phrase, Status]` + `Desc` gives `"phrase:desc,status:desc"`.
    /// No active fields means no `sort` parameter at all.
    pub fn build(
        query: &str,
        sort_fields: &[SortField],
        order: SortOrder,
        search_fields: &[SearchField],
    ) -> Self {
        let sort = sort_fields
            .iter()
            .map(|field| format!("{}:{}", field.as_str(), order.as_str()))
            .collect::<Vec<_>>()
            .join(",");

        let search_fields = search_fields
            .iter()
            .map(|field| field.as_str())
            .collect::<Vec<_>>()
            .join(",");

        Self {
            query: Some(query.to_string()),
            sort: (!sort.is_empty()).then_some(sort),
            search_fields: (!search_fields.is_empty()).then_some(search_fields),
        }
    }
}
