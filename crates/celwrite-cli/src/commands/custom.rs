//! The `celwrite custom` command.

use anyhow::Result;

use celwrite_core::catalog::create_custom;
use celwrite_core::model::TaskKind;

use super::{practice, Context, SessionOptions};

pub async fn execute(
    kind: String,
    title: String,
    prompt: String,
    options: SessionOptions,
) -> Result<()> {
    let kind: TaskKind = kind.parse()?;
    // Rejected here, before any session or provider is set up.
    let question = create_custom(kind, &title, &prompt)?;
    let ctx = Context::load(options.config.as_deref(), &options.bank)?;
    practice::run(&ctx, question, &options).await
}
