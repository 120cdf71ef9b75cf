use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tasklist_core::domain::{StatusFilter, TodoId};

#[derive(Parser, Debug, PartialEq)]
#[command(name = "tasklist")]
#[command(about = "Terminal client for a personal task list")]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Server base url (overrides config)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum CliCommand {
    /// Show one page of todos
    List {
        #[arg(long, default_value = "")]
        search: String,

        #[arg(long, default_value = "all")]
        status: StatusFilter,

        #[arg(long)]
        page: Option<u32>,
    },

    /// Create a todo
    Add {
        #[arg(long)]
        title: String,

        #[arg(long)]
        description: Option<String>,

        /// Image file to attach
        #[arg(long)]
        cover: Option<PathBuf>,
    },

    /// Edit a todo; omitted fields keep their value
    Edit {
        id: TodoId,

        #[arg(long)]
        title: Option<String>,

        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,

        #[arg(long)]
        clear_description: bool,

        #[arg(long, action = ArgAction::Set)]
        finished: Option<bool>,

        /// Replacement image file
        #[arg(long)]
        cover: Option<PathBuf>,
    },

    /// Flip the finished flag of a todo
    Toggle { id: TodoId },

    /// Delete a todo
    Delete { id: TodoId },

    /// Show counters, the monthly trend and this month's calendar
    Stats,

    /// Interactive session
    Shell,
}
