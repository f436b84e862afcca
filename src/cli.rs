use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "localflix")]
#[command(author, version, about = "Personal media library server")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,

    /// Manage categories
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },

    /// Manage folders
    Folder {
        #[command(subcommand)]
        action: FolderAction,
    },
}

#[derive(Subcommand)]
pub enum CategoryAction {
    /// List categories
    List,

    /// Create a category
    Add {
        /// Category name
        name: String,
    },

    /// Rename a category
    Rename {
        /// Category id
        id: i64,

        /// New name
        name: String,
    },

    /// Delete a category without folders
    Remove {
        /// Category id
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum FolderAction {
    /// List folders
    List {
        /// Only folders of this category
        #[arg(long)]
        category: Option<i64>,
    },

    /// Register a directory under a category
    Add {
        /// Category id
        category_id: i64,

        /// Directory to register (defaults to the current directory)
        path: Option<PathBuf>,
    },

    /// Delete a folder and its generated assets
    Remove {
        /// Folder id
        id: i64,
    },
}
