//! CLI module
//!
//! Command-line interface for paging through JSON document files.
//!
//! # Commands
//!
//! - `find` - One page of a filtered find
//! - `aggregate` - One page of an aggregation pipeline
//! - `explain` - Query plan for the find a page would run
//! - `decode-cursor` - Show the values a cursor token anchors on

mod commands;
mod runner;

pub use commands::{Cli, Commands, PageArgs, VerbosityArg};
pub use runner::Runner;
