use std::sync::Arc;

use analysis_core::{Horizon, TradeSignal};
use analysis_orchestrator::{AnalysisOrchestrator, BatchAnalyzer, BatchResult, JsonFileProvider, OrchestratorConfig};
use anyhow::{Context, Result};
use estimate_aggregator::SimulatedEstimateProvider;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "batch_analysis=info,analysis_orchestrator=info,estimate_aggregator=warn,technical_analysis=warn".into()
        })
    };
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter()).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter()).init();
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage:");
        eprintln!("  batch-analysis                  Analyze the WATCHLIST symbols");
        eprintln!("  batch-analysis AAPL 2330.TW ... Analyze specific symbols");
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --json    Print the full result as JSON");
        return Ok(());
    }
    let as_json = args.iter().any(|a| a == "--json");

    let config = OrchestratorConfig::from_env().context("Failed to load configuration")?;

    let symbols: Vec<String> = {
        let requested: Vec<String> = args.into_iter().filter(|a| !a.starts_with("--")).collect();
        if requested.is_empty() {
            config.watchlist.clone()
        } else {
            requested
        }
    };

    tracing::info!(
        "batch-analysis: {} symbols, data_dir={}, lookback={}d, concurrency={}",
        symbols.len(),
        config.data_dir.display(),
        config.lookback_days,
        config.batch_concurrency
    );

    let files = Arc::new(JsonFileProvider::new(&config.data_dir));
    let mut orchestrator = AnalysisOrchestrator::from_config(files.clone(), &config).with_estimate_source(files.clone());
    if config.simulated_estimates {
        orchestrator = orchestrator.with_estimate_source(Arc::new(SimulatedEstimateProvider::new(files)));
    }

    let batch = BatchAnalyzer::new(Arc::new(orchestrator), config.batch_concurrency);
    let result = batch.run(&symbols).await;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&result).context("Failed to serialize result")?);
    } else {
        print_table(&result);
    }

    Ok(())
}

fn print_table(result: &BatchResult) {
    println!(
        "{:<10} {:<12} {:>10} {:>6} {:>8} {:>10} {:>8} {:>10}",
        "SYMBOL", "EXCHANGE", "PRICE", "SIGNAL", "SCORE", "1Y TARGET", "RETURN", "CONSENSUS"
    );
    for analysis in &result.ranked {
        let current = &analysis.signals.current;
        let one_year = analysis.estimates.horizon(Horizon::OneYear);
        println!(
            "{:<10} {:<12} {:>10.2} {:>6} {:>8.2} {:>10} {:>8} {:>10}",
            analysis.symbol.symbol,
            analysis.symbol.exchange,
            analysis.current_price,
            current.signal.to_label(),
            current.raw_score,
            one_year.map_or("-".to_string(), |e| format!("{:.2}", e.mean)),
            one_year.map_or("-".to_string(), |e| format!("{:+.1}%", e.expected_return_pct)),
            one_year.map_or("-", |e| e.consensus_level.to_label()),
        );
    }

    println!();
    println!(
        "{} analyzed: {} BUY, {} HOLD, {} SELL",
        result.ranked.len(),
        result.count(TradeSignal::Buy),
        result.count(TradeSignal::Hold),
        result.count(TradeSignal::Sell)
    );
    for failure in &result.failures {
        println!("  {} failed: {}", failure.symbol, failure.error);
    }
}
