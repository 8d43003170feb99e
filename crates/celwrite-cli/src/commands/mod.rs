//! Subcommands and the setup they share.

pub mod custom;
pub mod drafts;
pub mod evaluate;
pub mod init;
pub mod list;
pub mod list_models;
pub mod practice;
pub mod render;
pub mod validate;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::{info, warn};

use celwrite_core::bank::{load_bank_directory, parse_bank};
use celwrite_core::catalog::Catalog;
use celwrite_core::draft::{DraftStore, MemoryDraftStore};
use celwrite_core::evaluation::EvaluationClient;
use celwrite_core::report::SessionReport;
use celwrite_providers::{load_config_from, provider_by_name, CelwriteConfig};
use celwrite_report::{write_reports, ReportFormat};
use celwrite_store::SqliteDraftStore;

/// Flags shared by every command that scores a response.
#[derive(Args, Debug, Clone)]
pub struct SessionOptions {
    /// Output directory for feedback reports
    #[arg(long, default_value = "./celwrite-results")]
    pub output: PathBuf,

    /// Report formats: json, html, md, all (comma-separated)
    #[arg(long, default_value = "json")]
    pub format: String,

    /// Scoring provider name (default from config)
    #[arg(long)]
    pub provider: Option<String>,

    /// Scoring model (default from config)
    #[arg(long)]
    pub model: Option<String>,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Extra question bank file or directory (repeatable)
    #[arg(long)]
    pub bank: Vec<PathBuf>,

    /// Directory holding the draft database
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

/// Loaded configuration plus the question catalog it describes.
pub struct Context {
    pub config: CelwriteConfig,
    pub catalog: Catalog,
}

impl Context {
    /// Load config, then build the catalog from the built-in questions, the
    /// banks named in config and the extra `banks`.
    pub fn load(config_path: Option<&Path>, banks: &[PathBuf]) -> Result<Self> {
        let config = load_config_from(config_path)?;
        let mut catalog = Catalog::builtin();
        for path in config.question_banks.iter().chain(banks) {
            add_banks(&mut catalog, path)?;
        }
        Ok(Self { config, catalog })
    }

    /// Build the scoring client. Fails before any session starts when the
    /// provider is unknown or has no credential.
    pub fn client(&self, provider: Option<&str>, model: Option<&str>) -> Result<Arc<EvaluationClient>> {
        let name = provider.unwrap_or(&self.config.default_provider);
        let provider = provider_by_name(&self.config, name)?;
        let settings = self.config.scoring_settings(model);
        info!(provider = name, model = %settings.model, "scoring client ready");
        Ok(Arc::new(EvaluationClient::new(provider, settings)))
    }

    fn data_dir<'a>(&'a self, data_dir: Option<&'a Path>) -> Option<&'a Path> {
        data_dir.or(self.config.data_dir.as_deref())
    }

    /// Open the SQLite draft store.
    pub fn sqlite_drafts(&self, data_dir: Option<&Path>) -> Result<SqliteDraftStore> {
        let path = celwrite_store::db_path(self.data_dir(data_dir))
            .context("cannot determine a data directory; pass --data-dir")?;
        Ok(SqliteDraftStore::open(&path)?)
    }

    /// The SQLite draft store, or an in-memory one if it cannot be opened.
    pub fn drafts(&self, data_dir: Option<&Path>) -> Arc<dyn DraftStore> {
        match self.sqlite_drafts(data_dir) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                warn!("drafts will not outlive this session: {e:#}");
                Arc::new(MemoryDraftStore::new())
            }
        }
    }
}

fn add_banks(catalog: &mut Catalog, path: &Path) -> Result<()> {
    let banks = if path.is_dir() {
        load_bank_directory(path)?
    } else {
        vec![parse_bank(path)?]
    };
    for bank in banks {
        let count = bank.questions.len();
        catalog
            .extend(bank.questions)
            .with_context(|| format!("cannot add question bank '{}'", bank.id))?;
        info!(bank = %bank.id, questions = count, "question bank loaded");
    }
    Ok(())
}

/// Print a scored report and write it in every requested format.
pub fn finish(report: &SessionReport, options: &SessionOptions, formats: &[ReportFormat]) -> Result<()> {
    render::print_report(report);
    for path in write_reports(report, &options.output, formats)? {
        eprintln!("Report saved to: {}", path.display());
    }
    Ok(())
}
