use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "parley")]
#[command(version, about = "Parley - conversational chat in the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (defaults to ~/.parley/parley.db)
    #[arg(long, global = true, env = "PARLEY_DB_PATH")]
    pub db_path: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat
    Chat(ChatArgs),

    /// Review past conversations
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Continue an existing conversation (full id or prefix)
    #[arg(long, short)]
    pub conversation: Option<String>,

    /// Reply with a local echo instead of calling the generation service
    #[arg(long)]
    pub offline: bool,
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommands {
    /// List conversations, newest first
    List {
        /// Number of recent messages to scan
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show one conversation as a transcript
    Show {
        /// Conversation id or unique prefix
        id: String,
    },
}
