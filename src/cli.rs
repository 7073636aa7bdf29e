use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "chunktrace",
    about = "Content-addressed line chunking and diff reconstruction",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Hash digest width in hex characters (8-40)
    #[arg(long, global = true, env = "HASH_LENGTH")]
    pub hash_length: Option<usize>,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Color output mode
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Output chunk/reconstruct listings as JSON instead of diff-lines
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Chunk a file at its current content and print one U line per chunk
    Chunk {
        /// File to chunk
        path: PathBuf,

        /// Character budget used to split oversized chunks
        #[arg(long)]
        budget: Option<usize>,
    },

    /// Extract matched/unmatched chunks against an accumulated diff file
    Diff {
        /// File to diff against its recorded history
        path: PathBuf,

        /// Diff file to read and update (created if absent)
        diff_file: PathBuf,

        /// Character budget used to split unmatched chunks
        #[arg(long)]
        budget: Option<usize>,

        /// Unix timestamp to stamp new chunks with (defaults to now)
        #[arg(long)]
        timestamp: Option<u64>,
    },

    /// Reconstruct the chain recorded in a diff file against a file's current content
    Reconstruct {
        /// File to reconstruct chunks against
        path: PathBuf,

        /// Diff file holding the accumulated chunk references
        diff_file: PathBuf,
    },

    /// Replay a file's git history through the ingestion pipeline
    Simulate {
        /// Path to the git repository
        repo: PathBuf,

        /// File path within the repository, relative to its root
        path: PathBuf,

        /// Character budget used to split unmatched chunks at each revision
        #[arg(long)]
        budget: Option<usize>,

        /// Write the final accumulated diff to this file
        #[arg(long)]
        diff_file: Option<PathBuf>,
    },
}
