use crate::models::{Language, Translation};
use std::collections::BTreeMap;

/// Project translations into a language-code -> text map.
///
/// A later translation for the same code overwrites an earlier one.
pub fn format_phrase_output(translations: &[Translation]) -> BTreeMap<String, String> {
    translations
        .iter()
        .map(|t| (t.language.clone(), t.text.clone()))
        .collect()
}

/// Display name for a language code, falling back to the code itself
pub fn language_name<'a>(languages: &'a [Language], code: &'a str) -> &'a str {
    languages
        .iter()
        .find(|lang| lang.code == code)
        .map(|lang| lang.language.as_str())
        .unwrap_or(code)
}

/// Option label used by the language picker: `"Spanish (es)"`
pub fn language_label(language: &Language) -> String {
    format!("{} ({})", language.language, language.code)
}
