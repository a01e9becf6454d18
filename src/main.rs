use anyhow::Result;
use phrase_admin::api::ApiClient;
use phrase_admin::cache::QueryCache;
use phrase_admin::cli::{Command, HELP};
use phrase_admin::config::Config;
use phrase_admin::form::{FormController, SubmitOutcome};
use phrase_admin::format::{format_phrase_output, language_label};
use phrase_admin::list::{DeleteOutcome, ListController};
use phrase_admin::models::Phrase;
use phrase_admin::notify::LogNotifier;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("phrase_admin=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    info!("Connecting to phrase API at {}", config.api_url);

    let client = ApiClient::new(&config)?;
    let cache = Arc::new(QueryCache::new());
    let list = ListController::new(&config, &client, &cache, Arc::new(LogNotifier));

    if let Err(e) = list.mount().await {
        warn!("Initial load failed: {}", e);
    } else {
        print_phrases(&list);
    }
    println!("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(&list).await;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(phrase_admin::cli::ParseError::Empty) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        if !run(&list, command).await {
            break;
        }
    }

    list.unmount();
    cache.clear();
    info!("Bye");
    Ok(())
}

async fn prompt(list: &ListController) {
    let form = list.form().await;
    let label = if !form.is_open() {
        "phrases".to_string()
    } else if let Some(id) = form.mode().edit_id() {
        format!("edit {}", id)
    } else {
        "new".to_string()
    };
    drop(form);

    print!("{}> ", label);
    let _ = std::io::stdout().flush();
}

/// Execute one command; returns false when the session should end
async fn run(list: &ListController, command: Command) -> bool {
    match command {
        Command::Quit => return false,
        Command::Help => println!("{}", HELP),

        // List & search
        Command::List => print_phrases(list),
        Command::Search(term) => list.set_search_term(&term),
        Command::Sort { field, enabled } => match enabled {
            Some(enabled) => list.set_sort_field(field, enabled),
            None => list.toggle_sort_field(field),
        },
        Command::Order(order) => list.set_sort_order(order),
        Command::Refresh => {
            if list.refresh().await.is_ok() {
                print_phrases(list);
            }
        }
        Command::Translations(id) => match list.show_translations(&id) {
            Some(lines) if lines.is_empty() => println!("No translations"),
            Some(lines) => {
                for line in lines {
                    println!("  {:<20} {}", line.language, line.text);
                }
                list.close_translations();
            }
            None => println!("Phrase {} is not in the current list", id),
        },
        Command::Languages => match list.languages() {
            Some(languages) => {
                for language in languages.iter() {
                    println!("  {}", language_label(language));
                }
            }
            None => println!("Language catalog not loaded"),
        },

        // Delete
        Command::Delete(id) => {
            list.request_delete(&id);
            println!("Delete phrase {}? Type 'confirm' or 'cancel'.", id);
        }
        Command::Confirm => match list.confirm_delete().await {
            DeleteOutcome::NothingPending => println!("Nothing to confirm"),
            DeleteOutcome::Deleted(_) => print_phrases(list),
            DeleteOutcome::Failed(e) => println!("{} (type 'confirm' to retry)", e),
        },

        // Form
        Command::New => {
            if list.open_create_form().await.is_ok() {
                print_form(&*list.form().await);
            }
        }
        Command::Edit(id) => {
            if list.open_edit_form(&id).await.is_ok() {
                print_form(&*list.form().await);
            }
        }
        Command::Cancel => {
            if list.is_delete_dialog_open() {
                list.cancel_delete();
            } else {
                list.close_form().await;
            }
        }
        Command::Submit => {
            if !list.form().await.is_open() {
                println!("No form is open");
                return true;
            }
            match list.submit_form().await {
                SubmitOutcome::Invalid(report) => {
                    for error in report.errors {
                        println!("  {}: {}", error.field, error.message);
                    }
                }
                SubmitOutcome::Failed(e) => println!("{}", e),
                SubmitOutcome::Created(_) | SubmitOutcome::Updated(_) => print_phrases(list),
            }
        }
        other => edit_form(list, other).await,
    }
    true
}

async fn edit_form(list: &ListController, command: Command) {
    let mut form = list.form().await;
    if !form.is_open() {
        println!("Open a form first with 'new' or 'edit <id>'");
        return;
    }

    let result = match command {
        Command::Phrase(text) => {
            form.set_phrase(&text);
            Ok(())
        }
        Command::Status(status) => {
            form.set_status(&status);
            Ok(())
        }
        Command::AddRow => {
            form.add_translation();
            Ok(())
        }
        Command::RemoveRow(row) => form.remove_translation(row),
        Command::Language { row, code } => form.set_translation_language(row, &code),
        Command::Text { row, text } => form.set_translation_text(row, &text),
        Command::Show => Ok(()),
        _ => return,
    };

    match result {
        Ok(()) => print_form(&form),
        Err(e) => println!("{}", e),
    }
}

fn print_phrases(list: &ListController) {
    let Some(rows) = list.phrases() else {
        println!("No results loaded");
        return;
    };
    if rows.is_empty() {
        println!("No phrases found");
        return;
    }

    for phrase in rows.iter() {
        print_phrase_row(phrase);
    }
    println!("{} phrase(s)", rows.len());
}

fn print_phrase_row(phrase: &Phrase) {
    let languages: Vec<String> = format_phrase_output(&phrase.translations)
        .into_keys()
        .collect();
    println!(
        "  {:<26} {:<8} {:<32} [{}]",
        phrase.id,
        phrase.status.as_str(),
        phrase.phrase,
        languages.join(", ")
    );
}

fn print_form(form: &FormController) {
    let values = form.values();
    if let Some(id) = &values.id {
        println!("  id:     {}", id);
    }
    println!("  phrase: {}", values.phrase);
    println!("  status: {}", values.status);
    for (index, row) in values.translations.iter().enumerate() {
        let language = if row.language.is_empty() {
            "<language>".to_string()
        } else {
            form.language_display(&row.language)
        };
        let lock = if form.is_language_locked(index) { " (locked)" } else { "" };
        println!("  {}. {}{}: {}", index + 1, language, lock, row.text);
    }
    if !form.removed_translation_ids().is_empty() {
        println!(
            "  {} translation(s) will be deleted on submit",
            form.removed_translation_ids().len()
        );
    }
}
