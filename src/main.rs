use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use newsrelay::app::{build_policy, App};
use newsrelay::cli::{Cli, Commands};
use newsrelay::config::{self, Config, PolicyKind};
use newsrelay::domain::MessageBuilder;
use newsrelay::logging;
use newsrelay::providers::{DeepLTranslator, OpenAiSummarizer, SlackChannel};
use newsrelay::services::notifier::single_ladder;
use newsrelay::services::{FeedPoller, Notifier, Pipeline};
use newsrelay::sources::RssAtomSource;

type RelayApp = App<DeepLTranslator, OpenAiSummarizer, SlackChannel>;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    config::load_env_files();
    logging::init_tracing();

    let config = Config::from_env().context("failed to load configuration")?;
    let app = build_app(&config)?;

    let policy = cli.command.policy(config.policy);

    match cli.command {
        Commands::Check => cmd_check(&app).await,
        Commands::Once { dry_run: true, .. } => cmd_dry_run(&app, &config, policy).await,
        Commands::Once { .. } => cmd_once(&app, &config, policy).await,
        Commands::Run { .. } => cmd_run(&app, &config, policy).await,
    }
}

fn build_app(config: &Config) -> anyhow::Result<RelayApp> {
    let poller = FeedPoller::new(
        Box::new(RssAtomSource::new()),
        config.feed_urls.clone(),
        config.max_items_per_feed,
    );

    let translator = DeepLTranslator::new(
        &config.deepl_api_url,
        &config.deepl_api_key,
        &config.source_lang,
        &config.target_lang,
    );
    let summarizer = OpenAiSummarizer::new(
        &config.openai_api_url,
        &config.openai_api_key,
        &config.openai_model,
        &config.target_lang,
    );

    let channel = SlackChannel::new(config).context("failed to create Slack client")?;
    let ladder = single_ladder(config.slack_use_threads, channel.supports_threads());
    let builder = MessageBuilder::new(
        &config.slack_channel,
        &config.slack_username,
        config.display_offset,
    );
    let notifier = Notifier::new(channel, builder, ladder);

    Ok(App::new(poller, Pipeline::new(translator, summarizer), notifier)
        .with_timing(config.check_interval, config.item_delay))
}

async fn cmd_check(app: &RelayApp) -> anyhow::Result<()> {
    app.test_connections(true)
        .await
        .context("connection test failed")?;
    println!("All connections OK.");
    Ok(())
}

async fn cmd_once(
    app: &RelayApp,
    config: &Config,
    policy: PolicyKind,
) -> anyhow::Result<()> {
    let mut policy = build_policy(policy, config).context("failed to open state store")?;
    let summary = app.run_once(&mut policy).await?;

    println!(
        "Checked {} feed(s): {} new article(s), {} notified, {} failed, {} feed error(s).",
        config.feed_urls.len(),
        summary.items_found,
        summary.delivered,
        summary.delivery_failed,
        summary.feeds_failed
    );
    Ok(())
}

async fn cmd_dry_run(
    app: &RelayApp,
    config: &Config,
    policy: PolicyKind,
) -> anyhow::Result<()> {
    let mut policy = build_policy(policy, config).context("failed to open state store")?;
    app.test_connections(false)
        .await
        .context("connection test failed")?;

    let (outcome, results) = app.collect(&mut policy).await;

    for (url, reason) in &outcome.failed_feeds {
        println!("[FEED ERROR] {}: {}", url, reason);
    }

    if results.is_empty() {
        println!("No new articles.");
        return Ok(());
    }

    for result in &results {
        println!("[DRY RUN] {}\n", result.format());
    }
    println!("Dry run complete. Would notify {} article(s).", results.len());
    Ok(())
}

async fn cmd_run(
    app: &RelayApp,
    config: &Config,
    policy: PolicyKind,
) -> anyhow::Result<()> {
    let mut policy = build_policy(policy, config).context("failed to open state store")?;

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_on_signal(cancel.clone()));

    app.run_continuous(&mut policy, cancel).await?;
    tracing::info!("Stopped");
    Ok(())
}

async fn shutdown_on_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => tracing::info!(signal = "SIGINT", "Received signal"),
                    _ = term.recv() => tracing::info!(signal = "SIGTERM", "Received signal"),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cannot listen for SIGTERM, handling Ctrl-C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!(signal = "Ctrl-C", "Received signal");
    }

    cancel.cancel();
}
