use crate::commands::list::ListFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "paperid")]
#[command(about = "Stable sequential ids for scanned pages, regrouped into documents by id expressions")]
#[command(version)]
pub struct Cli {
    /// Archive directory
    #[arg(short, long, global = true, default_value = ".")]
    pub dir: PathBuf,

    /// Path to config TOML. If omitted, uses <dir>/paperid.toml if present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Include category subdirectories when listing scans
    #[arg(short, long, global = true)]
    pub recursive: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server
    Mcp,

    /// Print the next unused id
    NextId {
        /// Allocate for a front/back pair (the id is always odd)
        #[arg(short, long)]
        pair: bool,

        /// Use this id instead of computing one
        #[arg(long)]
        force: Option<u32>,

        /// Print the filename for the next scan with this extension
        #[arg(long)]
        ext: Option<String>,
    },

    /// Expand an id expression into its id sequence
    Ids {
        /// Id expression (e.g., "453+,88+", "869++", "100#", "3-9")
        #[arg(long = "id", alias = "ids", allow_hyphen_values = true)]
        id: String,
    },

    /// Map each id of an expression to its file
    Resolve {
        /// Id expression
        #[arg(long = "id", alias = "ids", allow_hyphen_values = true)]
        id: String,
    },

    /// List all scans
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ListFormat::IdDateTitle)]
        format: ListFormat,
    },

    /// List the scans touching an id expression
    ById {
        /// Id expression
        #[arg(long = "id", alias = "ids", allow_hyphen_values = true)]
        id: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ListFormat::IdDateTitle)]
        format: ListFormat,
    },

    /// Show files sharing an id (exit status 1 if any)
    CheckDuplicates {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ListFormat::IdDateTitle)]
        format: ListFormat,
    },

    /// Show sheets with no scan, as "N+"
    MissingIds,

    /// List category directories
    ListCategories,

    /// Merge the scans of an id expression into one dated, titled PDF
    Merge {
        /// Id expression; page order follows it
        #[arg(long = "id", alias = "ids", allow_hyphen_values = true)]
        id: String,

        /// Document date (YYYY-MM-DD or "today")
        #[arg(long)]
        date: Option<String>,

        /// Document title
        #[arg(long)]
        title: Option<String>,

        /// Category directory (e.g., "bills/power")
        #[arg(short, long)]
        category: Option<String>,

        /// Only show what would be merged
        #[arg(short = 's', long, alias = "simulate")]
        dry_run: bool,

        /// Keep the source scans
        #[arg(short, long)]
        keep: bool,
    },

    /// OCR image scans into PDFs
    Convert {
        /// Limit to an id expression
        #[arg(long = "id", alias = "ids", allow_hyphen_values = true)]
        id: Option<String>,

        /// Run the commands instead of printing them
        #[arg(long)]
        execute: bool,
    },

    /// Recreate the symlinked index directory
    RebuildIndex,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_merge() {
        let cli = Cli::try_parse_from([
            "paperid", "--dir", "/archive", "merge", "--id", "453+,88+", "-c", "bills", "-s",
        ])
        .unwrap();
        assert_eq!(cli.dir, PathBuf::from("/archive"));
        match cli.command {
            Commands::Merge {
                id,
                category,
                dry_run,
                keep,
                ..
            } => {
                assert_eq!(id, "453+,88+");
                assert_eq!(category.as_deref(), Some("bills"));
                assert!(dry_run);
                assert!(!keep);
            }
            _ => panic!("expected merge"),
        }
    }
}
