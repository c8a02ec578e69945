//! Main entry point for the ttgrab CLI

use clap::Parser;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ttgrab::batch::{parse_input, BatchPlan, BatchScheduler};
use ttgrab::cli::args::Args;
use ttgrab::cli::output;
use ttgrab::core::queue::{ItemStatus, QueueStore};
use ttgrab::core::session::Session;
use ttgrab::download::downloader::StreamingDownloader;
use ttgrab::enrich::Enricher;
use ttgrab::error::GrabError;
use ttgrab::fallback::FallbackController;
use ttgrab::resolve::resolver::ProviderResolver;
use ttgrab::utils::url::{extract_handle, extract_links};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    info!("Starting ttgrab with args: {:?}", args);

    let resolver = Arc::new(ProviderResolver::new().with_timeout(args.timeout));
    let session = Arc::new(Session::with_parts(
        resolver.clone(),
        StreamingDownloader::new(),
        Enricher::from_env(),
        args.session_config(),
    ));

    if args.clear_history {
        session.clear_history()?;
        println!("History cleared.");
        return Ok(());
    }
    if args.show_history {
        output::print_history(&session.history());
        return Ok(());
    }

    let input = args
        .input
        .clone()
        .ok_or_else(|| GrabError::NoLinksFound)?;

    if args.channel {
        return handle_channel(session, resolver, &args, &input).await;
    }
    if args.bulk {
        return handle_bulk(session, &args, &input).await;
    }
    handle_single(session, &args, &input).await
}

/// Handle a single pasted link
async fn handle_single(
    session: Arc<Session>,
    args: &Args,
    input: &str,
) -> anyhow::Result<()> {
    let links = extract_links(input);
    if links.len() > 1 {
        return Err(GrabError::MultipleLinks.into());
    }
    let url = links.first().map(String::as_str).unwrap_or(input);

    let start_time = Instant::now();
    let mut descriptor = session.resolve_single(url).await?;
    // The resolved card is shown before enrichment is even attempted; the
    // annotation is extra color, never a gate on core data.
    output::print_descriptor(&descriptor);
    session.enrich(&mut descriptor).await;
    if let Some(annotation) = &descriptor.annotation {
        output::print_annotation(annotation);
    }

    let bar = output::download_bar(!args.no_progress && !args.quiet);
    let bar_progress = bar.clone();
    let result = session
        .download_single(
            &descriptor,
            Arc::new(move |percent| bar_progress.set_position(percent as u64)),
        )
        .await;
    bar.finish_and_clear();

    match result {
        Ok(saved) => {
            println!(
                "Saved {} in {}s",
                saved.path.display(),
                start_time.elapsed().as_secs()
            );
            Ok(())
        }
        Err(e) if e.needs_bypass() => {
            let mut fallback = FallbackController::new();
            let prompt = fallback.exhaust(&descriptor, args.media_kind());
            output::print_manual_prompt(prompt);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Handle a pasted link collection
async fn handle_bulk(
    session: Arc<Session>,
    args: &Args,
    input: &str,
) -> anyhow::Result<()> {
    let parsed = parse_input(input);
    output::print_duplicates_notice(parsed.duplicates_removed);

    match BatchPlan::from_parsed(&parsed) {
        BatchPlan::Empty => Err(GrabError::NoLinksFound.into()),
        BatchPlan::Single(url) => handle_single(session, args, &url).await,
        BatchPlan::Batch(items) => {
            let store = Arc::new(QueueStore::new());
            let scheduler = BatchScheduler::new(session.resolver(), store.clone());

            println!("Resolving {} link(s)...", items.len());
            scheduler.enqueue(items).await;
            output::print_queue(&store.snapshot());

            download_queue(session, args, store).await
        }
    }
}

/// Download every resolved queue item in order
async fn download_queue(
    session: Arc<Session>,
    args: &Args,
    store: Arc<QueueStore>,
) -> anyhow::Result<()> {
    let bar = output::download_bar(!args.no_progress && !args.quiet);
    let bar_observer = bar.clone();
    store.observe(Arc::new(move |items| {
        if let Some(active) = items.iter().find(|it| it.status == ItemStatus::Downloading) {
            bar_observer.set_position(active.progress as u64);
        }
    }));

    session.download_ready(store.clone()).await;
    bar.finish_and_clear();

    let items = store.snapshot();
    output::print_queue(&items);

    // Exhausted items keep a direct link the user can open manually.
    for item in items.iter().filter(|it| it.show_bypass) {
        if let Some(descriptor) = item.descriptor() {
            let prompt =
                ttgrab::fallback::ManualPrompt::for_media(&descriptor, args.media_kind());
            output::print_manual_prompt(&prompt);
        }
    }

    let completed = items
        .iter()
        .filter(|it| it.status == ItemStatus::Completed)
        .count();
    println!("Downloaded {}/{} item(s)", completed, items.len());
    Ok(())
}

/// Handle a creator handle: list recent posts and run them as a queue
async fn handle_channel(
    session: Arc<Session>,
    resolver: Arc<ProviderResolver>,
    args: &Args,
    input: &str,
) -> anyhow::Result<()> {
    let handle = extract_handle(input)
        .ok_or_else(|| GrabError::InvalidUrl(input.to_string()))?;

    println!("Listing recent posts for @{}...", handle);
    let urls = resolver.list_channel(&handle, 10).await?;
    if urls.is_empty() {
        return Err(GrabError::NoLinksFound.into());
    }

    handle_bulk(session, args, &urls.join("\n")).await
}

/// Initialize logging system
fn init_logging(args: &Args) -> anyhow::Result<()> {
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();

    Ok(())
}
