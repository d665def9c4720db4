//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "notedex",
    version,
    about = "Retrieval engine for study-material assistants",
    long_about = "Notedex indexes the extracted text of uploaded study documents: it splits text \
                  into overlapping chunks, embeds chunks and queries into vector space, and serves \
                  document-scoped top-k similarity retrieval for downstream question answering."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/notedex/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a pre-extracted text document into the index
    Ingest {
        /// UTF-8 text file holding the document's extracted text
        file: PathBuf,

        /// Display name (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,

        /// File with one externally produced image description per line
        #[arg(long, value_name = "FILE")]
        images_file: Option<PathBuf>,

        /// Chunking strategy override for this document
        #[arg(long, value_parser = ["fixed_window", "paragraph"])]
        strategy: Option<String>,
    },

    /// Query indexed documents with semantic search
    Query {
        /// Query text
        query: String,

        /// Document ids the search is allowed to touch
        #[arg(short, long, value_delimiter = ',', required = true)]
        documents: Vec<String>,

        /// Maximum number of results (defaults to the configured k)
        #[arg(short = 'k', long)]
        k: Option<usize>,

        /// Similarity floor; results scoring at or below are dropped
        #[arg(long)]
        min_score: Option<f32>,

        /// Search the image-description collection instead of text chunks
        #[arg(long)]
        images: bool,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List ingested documents
    List,

    /// Delete documents and all their indexed content
    Delete {
        /// Document ids to remove
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Show index statistics
    Stats,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the active configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Check the configuration file for errors
    Validate,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
