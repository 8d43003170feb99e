//! The `celwrite init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("celwrite.toml").exists() {
        println!("celwrite.toml already exists, skipping.");
    } else {
        std::fs::write("celwrite.toml", SAMPLE_CONFIG)?;
        println!("Created celwrite.toml");
    }

    std::fs::create_dir_all("banks")?;
    let example_path = std::path::Path::new("banks/example.toml");
    if example_path.exists() {
        println!("banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Set GEMINI_API_KEY (or edit celwrite.toml)");
    println!("  2. Run: celwrite validate --bank banks/example.toml");
    println!("  3. Run: celwrite practice --question t1-1");

    Ok(())
}

pub(crate) const SAMPLE_CONFIG: &str = r#"# celwrite configuration

default_provider = "gemini"
default_model = "gemini-3-flash-preview"
temperature = 0.7
max_tokens = 4096
# Seconds before a scoring call is abandoned; 0 waits forever.
request_timeout_secs = 120
question_banks = ["banks"]

[providers.gemini]
type = "gemini"
api_key = "${GEMINI_API_KEY}"

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"

[providers.anthropic]
type = "anthropic"
api_key = "${ANTHROPIC_API_KEY}"

[providers.offline]
type = "mock"
"#;

pub(crate) const EXAMPLE_BANK: &str = r#"[bank]
id = "example"
name = "Example Questions"
description = "A starter bank; copy it to add your own tasks"

[[questions]]
id = "ex-email-1"
kind = "email"
title = "Gym Membership Cancellation"
prompt = """
You recently moved and can no longer use your gym. Write an email to the \
membership office. Explain your situation, ask to cancel your contract \
without the early-termination fee, and request confirmation in writing.
"""

[[questions]]
id = "ex-survey-1"
kind = "survey"
title = "Neighbourhood Budget"
prompt = """
Your city has money for one neighbourhood project. Choose the option you \
prefer and explain your choice.
"""
options = [
    "Option A: A new public library branch",
    "Option B: Protected bike lanes on main streets",
]
"#;
