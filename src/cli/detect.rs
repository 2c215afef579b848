use anyhow::{Result, bail};
use colored::Colorize;

use crate::providers;

pub async fn run(model: String) -> Result<()> {
    let Some(client) = providers::default_client() else {
        bail!(
            "Completion backend is not available. \
             Rebuild with the \"router\" feature enabled."
        );
    };

    match client.detect_provider(&model) {
        Ok(provider) => {
            eprintln!(
                "  {} {} {}",
                "✓".green().bold(),
                model.bold(),
                format!("→ {}", provider).dimmed()
            );
        }
        Err(_) => {
            eprintln!(
                "  {} {} {}",
                "✗".red().bold(),
                model.bold(),
                "is not served by any known provider".dimmed()
            );
        }
    }

    Ok(())
}
