//! The `celwrite drafts` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use celwrite_core::draft::DraftStore;
use celwrite_core::model::word_count;

use super::Context;

pub enum Action {
    List,
    Show(String),
    Clear(String),
}

pub async fn execute(action: Action, data_dir: Option<PathBuf>, config: Option<PathBuf>) -> Result<()> {
    let ctx = Context::load(config.as_deref(), &[])?;
    let store = ctx.sqlite_drafts(data_dir.as_deref())?;

    match action {
        Action::List => {
            let entries = store.list().await;
            if entries.is_empty() {
                println!("No saved drafts.");
                return Ok(());
            }
            let mut table = Table::new();
            table.set_header(vec!["Question", "Title", "Words", "Saved"]);
            for entry in &entries {
                let title = ctx
                    .catalog
                    .get(&entry.question_id)
                    .map(|q| q.title.as_str())
                    .unwrap_or("-");
                table.add_row(vec![
                    Cell::new(&entry.question_id),
                    Cell::new(title),
                    Cell::new(word_count(&entry.text)),
                    Cell::new(&entry.updated_at),
                ]);
            }
            println!("{table}");
        }
        Action::Show(id) => match store.load(&id).await {
            Some(text) => println!("{text}"),
            None => anyhow::bail!("no draft saved for '{id}'"),
        },
        Action::Clear(id) => {
            if store.remove(&id).await {
                println!("Removed draft for '{id}'.");
            } else {
                println!("No draft saved for '{id}'.");
            }
        }
    }

    Ok(())
}
