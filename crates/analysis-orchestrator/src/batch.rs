use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use analysis_core::{AnalysisError, TradeSignal};
use rayon::prelude::*;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::{AnalysisOrchestrator, InstrumentAnalysis, InstrumentInput};

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub symbol: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    /// Strongest current signal first
    pub ranked: Vec<InstrumentAnalysis>,
    pub failures: Vec<BatchFailure>,
    pub total: usize,
}

impl BatchResult {
    pub fn count(&self, signal: TradeSignal) -> usize {
        self.ranked
            .iter()
            .filter(|a| a.signals.current.signal == signal)
            .count()
    }
}

/// Sort by current raw score, descending; ties broken by symbol.
pub fn rank(analyses: &mut [InstrumentAnalysis]) {
    analyses.sort_by(|a, b| {
        b.signals
            .current
            .raw_score
            .partial_cmp(&a.signals.current.raw_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.symbol.symbol.cmp(&b.symbol.symbol))
    });
}

/// Analyzes many symbols: bounded concurrent fetches, then a parallel compute pass.
pub struct BatchAnalyzer {
    orchestrator: Arc<AnalysisOrchestrator>,
    concurrency: usize,
}

impl BatchAnalyzer {
    pub fn new(orchestrator: Arc<AnalysisOrchestrator>, concurrency: usize) -> Self {
        Self {
            orchestrator,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn run(&self, symbols: &[String]) -> BatchResult {
        let total = symbols.len();
        tracing::info!("Starting batch analysis of {} symbols (concurrency {})", total, self.concurrency);

        let (inputs, mut failures) = self.fetch_all(symbols).await;
        let pending: Vec<String> = inputs.iter().map(|input| input.symbol.clone()).collect();

        let orchestrator = Arc::clone(&self.orchestrator);
        let computed = tokio::task::spawn_blocking(move || {
            inputs
                .par_iter()
                .map(|input| (input.symbol.clone(), orchestrator.analyze_input(input)))
                .collect::<Vec<(String, Result<InstrumentAnalysis, AnalysisError>)>>()
        })
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Compute pass failed: {}", e);
            pending
                .into_iter()
                .map(|symbol| (symbol, Err(AnalysisError::Provider(format!("compute task failed: {}", e)))))
                .collect()
        });

        let mut ranked = Vec::with_capacity(computed.len());
        for (symbol, result) in computed {
            match result {
                Ok(analysis) => ranked.push(analysis),
                Err(e) => {
                    tracing::warn!("Failed to analyze {}: {}", symbol, e);
                    failures.push(BatchFailure {
                        symbol,
                        error: e.to_string(),
                    });
                }
            }
        }

        rank(&mut ranked);
        failures.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        tracing::info!("Batch done: {} analyzed, {} failed", ranked.len(), failures.len());
        BatchResult {
            ranked,
            failures,
            total,
        }
    }

    async fn fetch_all(&self, symbols: &[String]) -> (Vec<InstrumentInput>, Vec<BatchFailure>) {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        let mut spawned = HashMap::new();

        for symbol in symbols {
            let orchestrator = Arc::clone(&self.orchestrator);
            let semaphore = Arc::clone(&semaphore);
            let task_symbol = symbol.clone();
            let handle = tasks.spawn(async move {
                match semaphore.acquire().await {
                    Ok(_permit) => orchestrator.fetch(&task_symbol).await,
                    Err(e) => Err(AnalysisError::Provider(format!("fetch slot unavailable: {}", e))),
                }
            });
            spawned.insert(handle.id(), symbol.clone());
        }

        let mut inputs = Vec::new();
        let mut failures = Vec::new();
        let mut done = 0;

        while let Some(joined) = tasks.join_next_with_id().await {
            done += 1;
            match joined {
                Ok((_, Ok(input))) => {
                    tracing::debug!("[{}/{}] fetched {} ({} bars)", done, symbols.len(), input.symbol, input.bars.len());
                    inputs.push(input);
                }
                Ok((id, Err(e))) => {
                    let symbol = spawned.remove(&id).unwrap_or_default();
                    tracing::warn!("[{}/{}] {} fetch failed: {}", done, symbols.len(), symbol, e);
                    failures.push(BatchFailure {
                        symbol,
                        error: e.to_string(),
                    });
                }
                Err(e) => {
                    let symbol = spawned.remove(&e.id()).unwrap_or_default();
                    tracing::error!("[{}/{}] {} fetch task error: {}", done, symbols.len(), symbol, e);
                    failures.push(BatchFailure {
                        symbol,
                        error: format!("fetch task failed: {}", e),
                    });
                }
            }
        }

        (inputs, failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use analysis_core::{PriceBar, PriceProvider};
    use async_trait::async_trait;

    fn analyzer(prices: MockPrices, concurrency: usize) -> BatchAnalyzer {
        let orchestrator = AnalysisOrchestrator::new(Arc::new(prices)).with_estimate_source(Arc::new(MockEstimates {
            name: "street".to_string(),
            estimates: vec![estimate("a", 105.0)],
            fail: false,
        }));
        BatchAnalyzer::new(Arc::new(orchestrator), concurrency)
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_batch_ranks_by_strength() {
        let prices = MockPrices {
            bars: [
                ("AAA".to_string(), wave_bars(220, 0.0)),
                ("BBB".to_string(), wave_bars(220, 2.0)),
                ("CCC".to_string(), wave_bars(220, 4.0)),
                ("DDD".to_string(), wave_bars(220, 7.0)),
                ("SHORT".to_string(), wave_bars(20, 0.0)),
            ]
            .into_iter()
            .collect(),
            delay: None,
        };

        let result = analyzer(prices, 2)
            .run(&symbols(&["DDD", "SHORT", "AAA", "MISSING", "CCC", "BBB"]))
            .await;

        assert_eq!(result.total, 6);
        assert_eq!(result.ranked.len(), 4);
        for pair in result.ranked.windows(2) {
            assert!(pair[0].signals.current.raw_score >= pair[1].signals.current.raw_score);
        }

        let failed: Vec<&str> = result.failures.iter().map(|f| f.symbol.as_str()).collect();
        assert_eq!(failed, vec!["MISSING", "SHORT"]);

        let counted = result.count(TradeSignal::Buy) + result.count(TradeSignal::Sell) + result.count(TradeSignal::Hold);
        assert_eq!(counted, 4);
    }

    #[tokio::test]
    async fn test_equal_scores_fall_back_to_symbol_order() {
        let prices = MockPrices {
            bars: ["ZED", "ALPHA", "MID"]
                .iter()
                .map(|s| (s.to_string(), wave_bars(150, 1.0)))
                .collect(),
            delay: None,
        };

        let result = analyzer(prices, 8).run(&symbols(&["ZED", "ALPHA", "MID"])).await;
        let order: Vec<&str> = result.ranked.iter().map(|a| a.symbol.symbol.as_str()).collect();
        assert_eq!(order, vec!["ALPHA", "MID", "ZED"]);
    }

    #[tokio::test]
    async fn test_batch_is_deterministic() {
        let prices = || MockPrices {
            bars: [("AAA".to_string(), wave_bars(120, 0.0)), ("BBB".to_string(), wave_bars(120, 3.0))]
                .into_iter()
                .collect(),
            delay: None,
        };
        let list = symbols(&["BBB", "AAA"]);

        let first = serde_json::to_string(&analyzer(prices(), 1).run(&list).await).unwrap();
        let second = serde_json::to_string(&analyzer(prices(), 4).run(&list).await).unwrap();
        assert_eq!(first, second);
    }

    /// Delegates to the inner mock but panics for one symbol
    struct PanickingPrices {
        inner: MockPrices,
        panic_on: &'static str,
    }

    #[async_trait]
    impl PriceProvider for PanickingPrices {
        async fn fetch_bars(&self, symbol: &str, lookback_days: u32) -> Result<Vec<PriceBar>, AnalysisError> {
            if symbol == self.panic_on {
                panic!("price feed crashed for {}", symbol);
            }
            self.inner.fetch_bars(symbol, lookback_days).await
        }
    }

    #[tokio::test]
    async fn test_panicking_fetch_is_reported_as_failure() {
        let prices = PanickingPrices {
            inner: MockPrices {
                bars: [("AAA".to_string(), wave_bars(150, 0.0))].into_iter().collect(),
                delay: None,
            },
            panic_on: "BOOM",
        };
        let orchestrator = AnalysisOrchestrator::new(Arc::new(prices));
        let result = BatchAnalyzer::new(Arc::new(orchestrator), 2)
            .run(&symbols(&["AAA", "BOOM"]))
            .await;

        assert_eq!(result.total, 2);
        assert_eq!(result.ranked.len(), 1);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].symbol, "BOOM");
        assert!(result.failures[0].error.contains("fetch task failed"));
        assert_eq!(result.ranked.len() + result.failures.len(), result.total);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_compute_pass_runs_on_multi_thread_runtime() {
        let prices = MockPrices {
            bars: ["AAA", "BBB", "CCC"]
                .iter()
                .map(|s| (s.to_string(), wave_bars(180, 1.5)))
                .collect(),
            delay: None,
        };
        let result = analyzer(prices, 3).run(&symbols(&["AAA", "BBB", "CCC"])).await;
        assert_eq!(result.ranked.len(), 3);
        assert!(result.failures.is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let result = analyzer(MockPrices::default(), 4).run(&[]).await;
        assert_eq!(result.total, 0);
        assert!(result.ranked.is_empty());
        assert!(result.failures.is_empty());
    }
}
