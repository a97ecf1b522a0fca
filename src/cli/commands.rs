use clap::{Parser, Subcommand};

use crate::config::PolicyKind;

#[derive(Parser)]
#[command(name = "newsrelay")]
#[command(about = "Watch RSS/Atom feeds, translate and summarize new articles, and post them to Slack")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch feeds continuously, checking on every interval until interrupted
    Run {
        /// Item selection policy (defaults to novelty)
        #[arg(long, value_enum)]
        policy: Option<PolicyKind>,
    },

    /// Check feeds once, notify, and exit
    Once {
        /// Item selection policy (defaults to recency)
        #[arg(long, value_enum)]
        policy: Option<PolicyKind>,

        /// Dry run - print translated results instead of posting to Slack
        #[arg(long)]
        dry_run: bool,
    },

    /// Test connectivity to DeepL, OpenAI and Slack, then exit
    Check,
}

impl Commands {
    /// Policy for this command: flag, then configuration, then the command default
    pub fn policy(&self, configured: Option<PolicyKind>) -> PolicyKind {
        match self {
            Commands::Run { policy } => policy.or(configured).unwrap_or(PolicyKind::Novelty),
            Commands::Once { policy, .. } => policy.or(configured).unwrap_or(PolicyKind::Recency),
            Commands::Check => configured.unwrap_or(PolicyKind::Novelty),
        }
    }
}
