pub mod detect;
pub mod run;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "weft")]
#[command(about = "Uniform text generation over multi-provider LLM completion APIs")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate completions for one or more prompts
    Run {
        /// Model identifier (overrides weft.toml)
        #[arg(short, long)]
        model: Option<String>,

        /// Maximum completion length in tokens
        #[arg(short = 'n', long)]
        max_length: Option<u64>,

        /// Extra request option as key=value (value parsed as JSON, else string)
        #[arg(short, long = "option", value_name = "KEY=VALUE")]
        options: Vec<String>,

        /// Prompts to complete (reads stdin when omitted)
        prompts: Vec<String>,
    },

    /// Check whether a model identifier is servable, and by which provider
    Detect {
        /// Model identifier to probe
        model: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Run {
                model,
                max_length,
                options,
                prompts,
            } => run::run(model, max_length, options, prompts).await,
            Commands::Detect { model } => detect::run(model).await,
        }
    }
}
