use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Terminal client for a document question-answering backend.
#[derive(Debug, Parser)]
#[command(name = "docqa", version, about)]
pub struct Args {
    /// Configuration file (RON). Defaults to ./docqa.ron when present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for chat history and the log file.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Backend base URL; wins over the config file and DOCQA_API_URL.
    #[arg(long)]
    pub api_url: Option<String>,

    /// Where log records go.
    #[arg(long, value_enum, default_value_t = LogTarget::File)]
    pub log: LogTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    File,
    Terminal,
    Both,
}
