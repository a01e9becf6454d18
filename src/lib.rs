//! Administrative client for a phrase/translation catalog.
//!
//! [`api::ApiClient`] talks to the REST service, [`queries`] wraps its read
//! operations in cached query hooks, and the [`form`] and [`list`]
//! controllers hold the state of the create/edit form and the searchable
//! list. The `phrase-admin` binary drives them from a terminal.

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod debounce;
pub mod form;
pub mod format;
pub mod list;
pub mod models;
pub mod notify;
pub mod queries;
pub mod schema;
