use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `kbchat` - knowledge-base chat assistant with an admin surface.
#[derive(Parser, Debug)]
#[command(name = "kbchat")]
#[command(version)]
#[command(about = "Chat with an LLM grounded in a folder of documents.", long_about = None)]
pub struct Cli {
    /// Config file (TOML). Falls back to KBCHAT_CONFIG, then built-in defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at DEBUG instead of INFO
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Host to bind to (overrides config and environment)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config and environment)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the knowledge context the next chat turn would send
    Context,

    /// List session transcripts, newest first
    Sessions,
}

impl Default for Commands {
    fn default() -> Self {
        Self::Serve {
            host: None,
            port: None,
        }
    }
}
