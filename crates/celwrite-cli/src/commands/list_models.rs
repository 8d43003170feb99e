//! The `celwrite list-models` command.

use std::path::PathBuf;

use anyhow::Result;

use celwrite_providers::{load_config_from, provider_by_name};

pub fn execute(provider_filter: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let mut names: Vec<String> = config.providers.keys().cloned().collect();
    for builtin in ["gemini", "mock"] {
        if !names.iter().any(|n| n == builtin) {
            names.push(builtin.to_string());
        }
    }
    names.sort();

    let mut found_any = false;

    for name in &names {
        if let Some(filter) = &provider_filter {
            if name != filter {
                continue;
            }
        }

        let provider = match provider_by_name(&config, name) {
            Ok(p) => p,
            Err(e) => {
                println!("Provider: {name} (unavailable: {e:#})\n");
                continue;
            }
        };
        let models = provider.available_models();

        if !models.is_empty() {
            found_any = true;
            println!("Provider: {name}");
            for model in &models {
                let marker = if model.id == config.default_model {
                    " (default)"
                } else {
                    ""
                };
                let schema = if model.native_schema {
                    "structured output"
                } else {
                    "schema in prompt"
                };
                println!(
                    "  {}: {} ({}K context, {schema}){marker}",
                    model.id,
                    model.name,
                    model.max_context / 1000,
                );
            }
            println!();
        }
    }

    if !found_any {
        println!("No usable providers. Run `celwrite init` and add an API key.");
    }

    Ok(())
}
