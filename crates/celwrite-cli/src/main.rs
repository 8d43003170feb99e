//! celwrite CLI: timed writing practice with AI feedback.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

use commands::SessionOptions;

#[derive(Parser)]
#[command(
    name = "celwrite",
    version,
    about = "Timed writing practice with AI band-score feedback"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List practice questions
    List {
        /// Only show one task kind (email or survey)
        #[arg(long)]
        kind: Option<String>,

        /// Extra question bank file or directory (repeatable)
        #[arg(long)]
        bank: Vec<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Answer a catalog question under the countdown
    Practice {
        /// Question id (see `celwrite list`)
        #[arg(long)]
        question: String,

        #[command(flatten)]
        options: SessionOptions,
    },

    /// Answer a question you write yourself
    Custom {
        /// Task kind: email or survey
        #[arg(long)]
        kind: String,

        /// Question title
        #[arg(long)]
        title: String,

        /// Task description
        #[arg(long)]
        prompt: String,

        #[command(flatten)]
        options: SessionOptions,
    },

    /// Score a finished response from a file, without the countdown
    Evaluate {
        /// Question id (see `celwrite list`)
        #[arg(long)]
        question: String,

        /// File containing the response text
        #[arg(long)]
        response: PathBuf,

        #[command(flatten)]
        options: SessionOptions,
    },

    /// Inspect or discard saved drafts
    Drafts {
        #[command(subcommand)]
        action: DraftAction,

        /// Directory holding the draft database
        #[arg(long, global = true)]
        data_dir: Option<PathBuf>,

        /// Config file path
        #[arg(long, global = true)]
        config: Option<PathBuf>,
    },

    /// Validate question bank TOML files
    Validate {
        /// Path to a bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// List available scoring models
    ListModels {
        /// Filter to specific provider
        #[arg(long)]
        provider: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example question bank
    Init,
}

#[derive(Subcommand)]
enum DraftAction {
    /// List saved drafts
    List,
    /// Print one draft
    Show {
        /// Question id
        id: String,
    },
    /// Delete one draft
    Clear {
        /// Question id
        id: String,
    },
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "celwrite=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List { kind, bank, config } => commands::list::execute(kind, bank, config),
        Commands::Practice { question, options } => {
            commands::practice::execute(question, options).await
        }
        Commands::Custom {
            kind,
            title,
            prompt,
            options,
        } => commands::custom::execute(kind, title, prompt, options).await,
        Commands::Evaluate {
            question,
            response,
            options,
        } => commands::evaluate::execute(question, response, options).await,
        Commands::Drafts {
            action,
            data_dir,
            config,
        } => {
            let action = match action {
                DraftAction::List => commands::drafts::Action::List,
                DraftAction::Show { id } => commands::drafts::Action::Show(id),
                DraftAction::Clear { id } => commands::drafts::Action::Clear(id),
            };
            commands::drafts::execute(action, data_dir, config).await
        }
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::ListModels { provider, config } => {
            commands::list_models::execute(provider, config)
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
