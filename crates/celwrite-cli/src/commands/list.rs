//! The `celwrite list` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use celwrite_core::model::TaskKind;

use super::Context;

pub fn execute(kind: Option<String>, banks: Vec<PathBuf>, config: Option<PathBuf>) -> Result<()> {
    let ctx = Context::load(config.as_deref(), &banks)?;
    let kinds = match kind {
        Some(k) => vec![k.parse::<TaskKind>()?],
        None => TaskKind::ALL.to_vec(),
    };

    let mut table = Table::new();
    table.set_header(vec!["ID", "Task", "Title", "Time", "Words"]);
    for kind in kinds {
        for q in ctx.catalog.list_by_kind(kind) {
            table.add_row(vec![
                Cell::new(&q.id),
                Cell::new(q.kind.label()),
                Cell::new(&q.title),
                Cell::new(format!("{} min", q.time_limit_minutes)),
                Cell::new(q.word_count),
            ]);
        }
    }
    println!("{table}");
    println!("\nStart one with: celwrite practice --question <ID>");

    Ok(())
}
