use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tabfeed::cli::{Cli, Commands};
use tabfeed::config::Config;
use tabfeed::domain::{EnrichmentState, Record};
use tabfeed::engine::{HttpSummaryEngine, SummaryEngine, UnavailableEngine};
use tabfeed::errors::TabfeedResult;
use tabfeed::services::{EnrichmentCache, FeedPager};
use tabfeed::sources::{parse_target, ContentSource, TabNewsSource};

type SharedEngine = Arc<dyn SummaryEngine>;

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> TabfeedResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    match cli.command {
        Commands::List {
            pages,
            per_page,
            strategy,
            summarize,
        } => cmd_list(&config, pages, per_page, strategy, summarize).await,
        Commands::Show { target, summarize } => cmd_show(&config, &target, summarize).await,
        Commands::Status => cmd_status(&config),
    }
}

fn build_engine(config: &Config) -> TabfeedResult<SharedEngine> {
    match &config.summarizer {
        Some(summarizer) => Ok(Arc::new(HttpSummaryEngine::new(summarizer, config.timeout)?)),
        None => Ok(Arc::new(UnavailableEngine::new("SUMMARIZER_URL is not set"))),
    }
}

async fn cmd_list(
    config: &Config,
    pages: u32,
    per_page: Option<usize>,
    strategy: Option<String>,
    summarize: bool,
) -> TabfeedResult<()> {
    let source = TabNewsSource::new(&config.api_url, config.timeout)?;
    let pager = FeedPager::new(
        source,
        per_page.unwrap_or(config.page_size),
        strategy.unwrap_or_else(|| config.strategy.clone()),
    );

    pager.load_next_page(true).await?;

    // Behave like a reader scrolled to the bottom of the list
    let mut loaded = 1;
    while loaded < pages && pager.has_more() {
        let Some(last_id) = pager.items().last().map(|r| r.id.clone()) else {
            break;
        };
        pager.load_more_if_needed(&last_id).await?;
        loaded += 1;
    }

    let items = pager.items();
    if items.is_empty() {
        println!("No articles found.");
        return Ok(());
    }

    let cache = if summarize {
        let cache = EnrichmentCache::new(build_engine(config)?);
        match cache.availability().reason() {
            Some(reason) => {
                println!("Summaries unavailable: {}\n", reason);
                None
            }
            None => {
                for record in &items {
                    cache.start(record);
                }
                wait_until_settled(&cache, &items).await;
                Some(cache)
            }
        }
    } else {
        None
    };

    for (i, record) in items.iter().enumerate() {
        println!("{:>3}. {}", i + 1, record.title);
        println!("     {}", record.subtitle());
        if let Some(cache) = &cache {
            if let Some(line) = describe(&cache.query(&record.id)) {
                println!("     {}", line);
            }
        }
    }

    let snapshot = pager.snapshot();
    println!(
        "\n{} articles ({} per page, {}), next page {}{}",
        snapshot.items.len(),
        pager.page_size(),
        pager.strategy(),
        snapshot.cursor,
        if snapshot.has_more { "" } else { " (end of feed)" }
    );

    Ok(())
}

async fn cmd_show(config: &Config, target: &str, summarize: bool) -> TabfeedResult<()> {
    let (username, slug) = parse_target(target)?;

    let source = TabNewsSource::new(&config.api_url, config.timeout)?;
    let record = source.fetch_content(&username, &slug).await?;

    println!("{}", record.title);
    println!("{}", record.subtitle());
    if let Some(link) = record.source_link() {
        println!("Source: {}", link);
    }

    if summarize {
        let cache = EnrichmentCache::new(build_engine(config)?);
        cache.enrich(&record).await;
        if let Some(line) = describe(&cache.query(&record.id)) {
            println!("\n{}", line);
        }
    }

    if let Some(body) = record.body_text() {
        println!("\n{}", body);
    }

    Ok(())
}

fn cmd_status(config: &Config) -> TabfeedResult<()> {
    println!("API: {}", config.api_url);
    println!("Page size: {}", config.page_size);
    println!("Strategy: {}", config.strategy);
    println!("Timeout: {}s", config.timeout.as_secs());

    let engine = build_engine(config)?;
    match engine.availability().reason() {
        None => {
            let summarizer = config.summarizer.as_ref();
            println!(
                "Summarizer: available ({}, model {})",
                summarizer.map(|s| s.url.as_str()).unwrap_or_default(),
                summarizer
                    .and_then(|s| s.model.as_deref())
                    .unwrap_or(tabfeed::engine::http::DEFAULT_MODEL)
            );
        }
        Some(reason) => println!("Summarizer: unavailable ({})", reason),
    }

    Ok(())
}

async fn wait_until_settled(cache: &EnrichmentCache<SharedEngine>, items: &[Record]) {
    let mut updates = cache.subscribe();
    while items.iter().any(|r| cache.query(&r.id).is_in_flight()) {
        if updates.changed().await.is_err() {
            break;
        }
    }
}

fn describe(state: &EnrichmentState) -> Option<String> {
    match state {
        EnrichmentState::Absent => None,
        EnrichmentState::InFlight => Some("Summarizing...".to_string()),
        EnrichmentState::Ready(text) => Some(format!("Summary: {}", text)),
        EnrichmentState::Failed(reason) => Some(format!("Summary failed: {}", reason)),
    }
}
