use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tabfeed")]
#[command(about = "Incremental feed reader with per-article summaries")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List articles, paging forward until the requested number of pages
    List {
        /// Number of pages to load
        #[arg(short, long, default_value_t = 1)]
        pages: u32,

        /// Articles per page (defaults to TABFEED_PAGE_SIZE)
        #[arg(long)]
        per_page: Option<usize>,

        /// Ordering strategy (defaults to TABFEED_STRATEGY)
        #[arg(short, long)]
        strategy: Option<String>,

        /// Summarize every listed article
        #[arg(long)]
        summarize: bool,
    },

    /// Show one article with its body
    Show {
        /// "username/slug" or the article URL
        target: String,

        /// Summarize the article
        #[arg(long)]
        summarize: bool,
    },

    /// Show the effective configuration and summarizer availability
    Status,
}
