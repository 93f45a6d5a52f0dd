//! CLI commands and argument parsing

use crate::types::Verbosity;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Keyset pagination over JSON document files
#[derive(Parser, Debug)]
#[command(name = "keyset-pager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pagination configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Extra collection for $lookup and populate (name=path.json)
    #[arg(long = "collection", global = true, value_name = "NAME=PATH")]
    pub collections: Vec<String>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every paged command
#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    /// Document file (JSON array or one document per line)
    #[arg(short, long)]
    pub data: PathBuf,

    /// Sort specification, e.g. "-createdAt,name"
    #[arg(short, long)]
    pub sort: Option<String>,

    /// Page size (0 = everything, unless forbidden by config)
    #[arg(short, long, allow_hyphen_values = true)]
    pub limit: Option<i64>,

    /// Return the page after this cursor
    #[arg(long, conflicts_with = "before")]
    pub after: Option<String>,

    /// Return the page before this cursor
    #[arg(long)]
    pub before: Option<String>,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Return one page of a filtered find
    Find {
        #[command(flatten)]
        page: PageArgs,

        /// Filter document (JSON)
        #[arg(long)]
        filter: Option<String>,

        /// Projection document (JSON)
        #[arg(long)]
        projection: Option<String>,

        /// Resolve a reference field (path=collection)
        #[arg(long)]
        populate: Vec<String>,
    },

    /// Return one page of an aggregation pipeline
    Aggregate {
        #[command(flatten)]
        page: PageArgs,

        /// Stages run before pagination (JSON array)
        #[arg(long)]
        pipeline: Option<String>,

        /// Stages run on the page window (JSON array)
        #[arg(long)]
        post: Option<String>,
    },

    /// Explain the find a page would run
    Explain {
        #[command(flatten)]
        page: PageArgs,

        /// Filter document (JSON)
        #[arg(long)]
        filter: Option<String>,

        /// Explain verbosity
        #[arg(long, default_value = "query-planner")]
        verbosity: VerbosityArg,
    },

    /// Decode a cursor token against a sort specification
    DecodeCursor {
        /// Sort specification the token was issued under
        #[arg(short, long)]
        sort: Option<String>,

        /// Cursor token
        token: String,
    },
}

/// Explain verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum VerbosityArg {
    /// Winning plan only
    QueryPlanner,
    /// Plan plus execution statistics
    ExecutionStats,
    /// Statistics for every candidate plan
    AllPlansExecution,
}

impl From<VerbosityArg> for Verbosity {
    fn from(arg: VerbosityArg) -> Self {
        match arg {
            VerbosityArg::QueryPlanner => Self::QueryPlanner,
            VerbosityArg::ExecutionStats => Self::ExecutionStats,
            VerbosityArg::AllPlansExecution => Self::AllPlansExecution,
        }
    }
}
