use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use taxonomy_mapper::{
    cli::Cli,
    clients::{ChatCompletionClient, CompletionOptions},
    config::Config,
    observability,
    pipeline::{BatchRunner, MappingMetrics, TaxonomyMapper},
    report::ExecutionReport,
    store::{load_cases, save_results},
    taxonomy::{KeywordSignals, Taxonomy},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    std::panic::set_hook(Box::new(|panic_info| {
        let thread = std::thread::current();
        let thread_name = thread.name().unwrap_or("unnamed");
        let message = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| {
                panic_info
                    .payload()
                    .downcast_ref::<String>()
                    .map(|s| s.as_str())
            })
            .unwrap_or("unknown panic payload");

        if let Some(location) = panic_info.location() {
            error!(
                thread = thread_name,
                file = location.file(),
                line = location.line(),
                column = location.column(),
                message,
                "panic occurred"
            );
        } else {
            error!(
                thread = thread_name,
                message, "panic occurred without location information"
            );
        }
    }));

    // .env は任意
    dotenv::dotenv().ok();
    observability::tracing::init().context("failed to initialize tracing")?;

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    let taxonomy = Arc::new(
        Taxonomy::from_path(&cli.taxonomy)
            .with_context(|| format!("failed to load taxonomy from {}", cli.taxonomy.display()))?,
    );
    let client = ChatCompletionClient::new(
        config.llm_base_url(),
        config.api_key(),
        CompletionOptions::from_config(&config),
    )
    .context("failed to build completion client")?;
    let mapper = TaxonomyMapper::new(
        taxonomy,
        &KeywordSignals::default_signals(),
        Arc::new(client),
    )
    .context("failed to build keyword matcher")?;

    let cases = load_cases(&cli.cases)
        .await
        .context("failed to load test cases")?;
    info!(cases = cases.len(), model = %config.llm_model(), "starting batch");

    let mut metrics = MappingMetrics::new();
    let records = BatchRunner::new(&mapper, config.call_delay())
        .run(&cases, &mut metrics)
        .await;

    save_results(&cli.output, &records)
        .await
        .context("failed to write reasoning log")?;

    let log_path = cli.output.display().to_string();
    print!(
        "{}",
        ExecutionReport::new(
            &records,
            &metrics,
            config.cost_per_million_tokens(),
            &log_path
        )
    );

    Ok(())
}
