use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tapecrawl_core::config::CrawlConfig;
use tapecrawl_core::crawl::{
    pending_categories, CrawlOrchestrator, CrawlProgressCallback, LinkPhaseOptions,
    ProductPhaseOptions,
};
use tapecrawl_core::report::{ReportFormat, StatusReport};
use tapecrawl_core::store::ProgressStore;
use tapecrawl_scanner::{ChromeRenderer, LinkHarvester, ProductExtractor};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber. `RUST_LOG` wins unless `quiet` is set.
pub fn init_logging(quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Expands a leading `~` in a user-supplied path.
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Builds the crawl settings from the global flags.
pub fn build_config(matches: &ArgMatches) -> Result<CrawlConfig> {
    let mut config = CrawlConfig::default();

    if let Some(base_url) = matches.get_one::<String>("base-url") {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            bail!("--base-url must not be empty");
        }
        config.base_url = base_url.to_string();
    }
    if let Some(path) = matches.get_one::<String>("links-file") {
        config.links_file = expand_path(path);
    }
    if let Some(path) = matches.get_one::<String>("products-file") {
        config.products_file = expand_path(path);
    }
    if let Some(millis) = matches.get_one::<u64>("delay-ms") {
        config.delay = Duration::from_millis(*millis);
    }
    if let Some(seconds) = matches.get_one::<u64>("timeout") {
        config.timeout = Duration::from_secs(*seconds);
    }

    Ok(config)
}

fn open_store(config: &CrawlConfig) -> ProgressStore {
    ProgressStore::new(config.links_file.clone(), config.products_file.clone())
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn progress_printer(quiet: bool) -> Option<CrawlProgressCallback> {
    if quiet {
        return None;
    }
    Some(Arc::new(|msg: String| {
        println!("{} {}", "→".blue(), msg);
    }))
}

pub async fn handle_links(config: &CrawlConfig, sub_matches: &ArgMatches, quiet: bool) -> Result<()> {
    let refresh: Vec<String> = sub_matches
        .get_many::<String>("refresh")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    for name in &refresh {
        if config.category(name).is_none() {
            warn!("--refresh {}: not a configured category", name);
        }
    }

    let store = open_store(config);
    let links = store
        .load_links()
        .with_context(|| format!("Failed to load {}", store.links_path().display()))?;

    let needs_work = !pending_categories(&config.categories, &links).is_empty()
        || config.categories.iter().any(|c| refresh.contains(&c.name));

    if !needs_work {
        println!(
            "{} All {} categories already harvested ({} product links)",
            "✓".green().bold(),
            config.categories.len(),
            links.total_urls()
        );
        return Ok(());
    }

    if !quiet {
        print_divider();
        println!("{}", "  PHASE 1: LINK DISCOVERY".bright_white().bold());
        print_divider();
    }

    // One browser session serves every category and is dropped when the phase ends.
    let renderer = tokio::task::spawn_blocking(ChromeRenderer::launch)
        .await?
        .context("Failed to launch headless browser")?;

    let harvester = LinkHarvester::new(&config.base_url, Arc::new(renderer))?
        .with_timeout(config.timeout)?
        .with_marker(&config.marker)
        .with_category_path(&config.category_path)
        .with_settle_delay(config.settle_delay);

    let mut orchestrator = CrawlOrchestrator::new(store);
    if let Some(callback) = progress_printer(quiet) {
        orchestrator = orchestrator.with_progress_callback(callback);
    }

    let options = LinkPhaseOptions {
        categories: config.categories.clone(),
        refresh,
        delay: config.delay,
    };
    let (links, summary) = orchestrator.discover_links(links, &harvester, &options).await?;

    println!();
    println!(
        "{} Link discovery complete: {} categories recorded, {} product links",
        "✓".green().bold(),
        links.len(),
        links.total_urls()
    );
    println!(
        "  harvested: {}  empty: {}  skipped: {}",
        summary.harvested.len(),
        summary.empty.len(),
        summary.skipped.len()
    );
    if !summary.failed.is_empty() {
        println!(
            "  {} {} (will be retried on the next run)",
            "failed:".red().bold(),
            summary.failed.join(", ")
        );
    }
    println!("  Saved to {}", orchestrator.store().links_path().display());

    Ok(())
}

pub async fn handle_products(
    config: &CrawlConfig,
    sub_matches: &ArgMatches,
    quiet: bool,
) -> Result<()> {
    let category = sub_matches.get_one::<String>("category").cloned();
    let show_progress_bars = !quiet && !sub_matches.get_flag("no-progress");

    let store = open_store(config);
    let state = store.load().context("Failed to load crawl state")?;

    if state.links.is_empty() {
        println!(
            "{} No product links recorded in {}. Run `tapecrawl links` first.",
            "⚠".yellow().bold(),
            store.links_path().display()
        );
        return Ok(());
    }

    if let Some(ref name) = category
        && !state.links.contains(name)
    {
        bail!("Category '{}' has no recorded links in {}", name, store.links_path().display());
    }

    if !quiet {
        print_divider();
        println!("{}", "  PHASE 2: PRODUCT EXTRACTION".bright_white().bold());
        print_divider();
    }

    let extractor = ProductExtractor::with_timeout(&config.base_url, config.timeout)?;

    let mut orchestrator = CrawlOrchestrator::new(store);
    // The progress bar already reports per-URL progress.
    if !show_progress_bars && let Some(callback) = progress_printer(quiet) {
        orchestrator = orchestrator.with_progress_callback(callback);
    }

    let options = ProductPhaseOptions {
        category,
        delay: config.delay,
        show_progress_bars,
    };
    let (_, summary) = orchestrator.extract_products(state, &extractor, &options).await?;

    println!();
    println!(
        "{} Product extraction complete: {} records in {}",
        "✓".green().bold(),
        summary.total_records,
        orchestrator.store().products_path().display()
    );
    println!(
        "  extracted: {}  skipped: {}",
        summary.extracted, summary.skipped
    );
    if !summary.failed.is_empty() {
        println!(
            "  {} {} URLs (will be retried on the next run)",
            "failed:".red().bold(),
            summary.failed.len()
        );
        for url in &summary.failed {
            println!("    {} {}", "✗".red(), url);
        }
    }

    Ok(())
}

pub fn handle_status(config: &CrawlConfig, sub_matches: &ArgMatches) -> Result<()> {
    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);

    let state = open_store(config)
        .load()
        .context("Failed to load crawl state")?;
    let report = StatusReport::build(&config.categories, &state);

    print!("{}", report.render(format)?);
    if format == ReportFormat::Json {
        println!();
    }
    Ok(())
}
