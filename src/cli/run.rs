use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use serde_json::Value;

use crate::core::config::{DEFAULT_MAX_LENGTH, WeftConfig};
use crate::core::generation::{Generation, RouterGeneration};
use crate::core::options::GenerationOptions;

pub async fn run(
    model: Option<String>,
    max_length: Option<u64>,
    option_args: Vec<String>,
    prompts: Vec<String>,
) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config = load_config(&cwd)?;

    let model = model
        .or_else(|| config.as_ref().map(|c| c.model.default.clone()))
        .context("No model specified. Pass --model or set [model] default in weft.toml.")?;

    let max_length = max_length
        .or_else(|| config.as_ref().map(|c| c.model.max_length))
        .unwrap_or(DEFAULT_MAX_LENGTH);

    let defaults = config.map(|c| c.options).unwrap_or_default();
    let overrides = parse_options(&option_args)?;

    let prompts = if prompts.is_empty() {
        vec![read_stdin_prompt()?]
    } else {
        prompts
    };

    let generation = RouterGeneration::new(&model, None, defaults)?;

    eprintln!(
        "  {} {} {}",
        "Generating".cyan(),
        format!("{} completion(s)", prompts.len()).bold(),
        format!("({})", model).dimmed()
    );

    let results = generation.execute(&prompts, max_length, &overrides).await?;

    for (prompt, completion) in prompts.iter().zip(&results) {
        eprintln!("  {} {}", "▸".green().bold(), prompt.dimmed());
        println!("{}", completion);
    }

    Ok(())
}

/// Load the nearest weft.toml, if any.
///
/// A missing config is fine (flags can carry everything), but a config
/// that exists and fails to parse or validate is an error, not an absence.
fn load_config(start_dir: &Path) -> Result<Option<WeftConfig>> {
    match WeftConfig::discover(start_dir) {
        Some(path) => Ok(Some(WeftConfig::from_file(&path)?)),
        None => Ok(None),
    }
}

fn read_stdin_prompt() -> Result<String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read prompt from stdin")?;

    let prompt = input.trim().to_string();
    if prompt.is_empty() {
        bail!("No prompts given and stdin was empty");
    }
    Ok(prompt)
}

/// Parse `key=value` pairs into request options.
///
/// Values are parsed as JSON when possible (`0.7`, `true`, `["\n"]`),
/// otherwise taken as plain strings.
fn parse_options(args: &[String]) -> Result<GenerationOptions> {
    let mut options = GenerationOptions::new();
    for arg in args {
        let Some((key, raw)) = arg.split_once('=') else {
            bail!("Invalid option '{}'. Expected key=value.", arg);
        };
        if key.is_empty() {
            bail!("Invalid option '{}'. Expected key=value.", arg);
        }

        let value = serde_json::from_str::<Value>(raw)
            .unwrap_or_else(|_| Value::String(raw.to_string()));
        options.insert(key, value);
    }
    Ok(options)
}
