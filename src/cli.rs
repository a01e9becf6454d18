//! Line commands understood by the `phrase-admin` console.

use crate::models::{SortField, SortOrder};
use std::str::FromStr;
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  list                      Show the current page of phrases
  search [term]             Search phrases (empty term clears the search)
  sort <field> [on|off]     Toggle a sort field: phrase, status, language
  order <asc|desc>          Sort direction
  refresh                   Re-run the current search
  translations <id>         Show the translations of a listed phrase
  languages                 Show the language catalog
  new                       Open the create form
  edit <id>                 Open the edit form for a phrase
  phrase <text>             Set the phrase text
  status <status>           Set the status: active, pending, spam
  add                       Add a translation row
  remove <row>              Remove a translation row
  lang <row> <code>         Set a row's language
  text <row> <text>         Set a row's translation text
  show                      Show the form
  submit                    Save the form
  cancel                    Close the form or dismiss a pending delete
  delete <id>               Ask to delete a phrase
  confirm                   Confirm the pending delete
  help                      Show this help
  quit                      Exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Search(String),
    Sort {
        field: SortField,
        /// `None` toggles
        enabled: Option<bool>,
    },
    Order(SortOrder),
    Refresh,
    Translations(String),
    Languages,
    New,
    Edit(String),
    Phrase(String),
    Status(String),
    AddRow,
    /// Row indexes are zero-based; the console shows them one-based
    RemoveRow(usize),
    Language { row: usize, code: String },
    Text { row: usize, text: String },
    Show,
    Submit,
    Cancel,
    Delete(String),
    Confirm,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid row '{0}': rows are numbered from 1")]
    InvalidRow(String),

    #[error("{0}")]
    InvalidValue(String),
}

fn row(arg: &str) -> Result<usize, ParseError> {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(ParseError::InvalidRow(arg.to_string())),
    }
}

fn required<'a>(arg: Option<&'a str>, usage: &'static str) -> Result<&'a str, ParseError> {
    arg.filter(|a| !a.is_empty()).ok_or(ParseError::Usage(usage))
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let arg = if rest.is_empty() { None } else { Some(rest) };

        match name.to_lowercase().as_str() {
            "" => Err(ParseError::Empty),
            "list" | "ls" => Ok(Self::List),
            "search" | "find" => Ok(Self::Search(rest.to_string())),
            "sort" => {
                let mut parts = rest.split_whitespace();
                let field = required(parts.next(), "sort <field> [on|off]")?
                    .parse::<SortField>()
                    .map_err(ParseError::InvalidValue)?;
                let enabled = match parts.next() {
                    None => None,
                    Some("on") => Some(true),
                    Some("off") => Some(false),
                    Some(_) => return Err(ParseError::Usage("sort <field> [on|off]")),
                };
                Ok(Self::Sort { field, enabled })
            }
            "order" => required(arg, "order <asc|desc>")?
                .parse::<SortOrder>()
                .map(Self::Order)
                .map_err(ParseError::InvalidValue),
            "refresh" => Ok(Self::Refresh),
            "translations" | "tr" => {
                Ok(Self::Translations(required(arg, "translations <id>")?.to_string()))
            }
            "languages" | "langs" => Ok(Self::Languages),
            "new" | "create" => Ok(Self::New),
            "edit" => Ok(Self::Edit(required(arg, "edit <id>")?.to_string())),
            "phrase" => Ok(Self::Phrase(rest.to_string())),
            "status" => Ok(Self::Status(required(arg, "status <status>")?.to_string())),
            "add" => Ok(Self::AddRow),
            "remove" | "rm" => Ok(Self::RemoveRow(row(required(arg, "remove <row>")?)?)),
            "lang" => {
                let (index, code) = rest
                    .split_once(char::is_whitespace)
                    .ok_or(ParseError::Usage("lang <row> <code>"))?;
                Ok(Self::Language {
                    row: row(index)?,
                    code: code.trim().to_string(),
                })
            }
            "text" => {
                let usage = "text <row> <text>";
                let (index, text) = match rest.split_once(char::is_whitespace) {
                    Some((index, text)) => (index, text.trim()),
                    None => (required(arg, usage)?, ""),
                };
                Ok(Self::Text {
                    row: row(index)?,
                    text: text.to_string(),
                })
            }
            "show" => Ok(Self::Show),
            "submit" | "save" => Ok(Self::Submit),
            "cancel" | "close" => Ok(Self::Cancel),
            "delete" | "del" => Ok(Self::Delete(required(arg, "delete <id>")?.to_string())),
            "confirm" | "yes" => Ok(Self::Confirm),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}
