//! Polling loop: fetch → render → publish → persist
//!
//! Each symbol is either waiting for its interval to elapse or ready to be
//! posted. A successful post puts it back to waiting; a failed one leaves it
//! ready so the next tick retries it (there is no backoff).

use crate::{
    config::{Config, SymbolConfig},
    error::ConfigError,
    metrics::{RunStats, StatsSnapshot},
    provider::PriceProvider,
    providers::{BinanceTickerProvider, CoinGeckoProvider, FailoverProvider},
    publisher::{DryRunPublisher, Publisher, TelegramPublisher},
    render::Renderer,
    store::{PostState, PriceStore},
    types::PriceQuote,
};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::time::sleep;

/// Whether a symbol's interval has elapsed since its last post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Ready,
    Waiting { remaining: Duration },
}

impl Eligibility {
    /// Evaluates eligibility at `now`. A symbol that never posted is ready.
    pub fn at(last_post: Option<DateTime<Utc>>, interval: Duration, now: DateTime<Utc>) -> Self {
        let Some(last_post) = last_post else {
            return Eligibility::Ready;
        };
        // a clock that went backwards counts as no time elapsed
        let elapsed = now
            .signed_duration_since(last_post)
            .to_std()
            .unwrap_or(Duration::ZERO);

        if elapsed >= interval {
            Eligibility::Ready
        } else {
            Eligibility::Waiting {
                remaining: interval - elapsed,
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Eligibility::Ready)
    }
}

/// What happened to each symbol during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// The fetch failed and nothing was attempted
    pub fetch_failed: bool,
    pub posted: Vec<String>,
    pub publish_failed: Vec<String>,
    pub render_failed: Vec<String>,
    /// Ready, but no provider returned a quote
    pub missing_quote: Vec<String>,
    pub waiting: Vec<String>,
}

enum PostOutcome {
    Posted,
    RenderFailed,
    PublishFailed,
}

/// Drives the fetch/render/publish cycle for all configured symbols
pub struct Scheduler {
    symbols: Arc<Vec<SymbolConfig>>,
    provider: Arc<dyn PriceProvider>,
    renderer: Renderer,
    publisher: Arc<dyn Publisher>,
    store: PriceStore,
    state: PostState,
    stats: RunStats,
    tick_interval: Duration,
    footer: Option<String>,
}

impl Scheduler {
    /// Builds the production scheduler: CoinGecko with Binance fallback,
    /// posting to Telegram (or only logging when `dry_run`).
    pub fn from_config(config: &Config, dry_run: bool) -> Result<Self, ConfigError> {
        let timeout = config.request_timeout();

        let mut providers: Vec<Arc<dyn PriceProvider>> = vec![Arc::new(
            CoinGeckoProvider::new(&config.providers.coingecko_url, timeout)
                .map_err(|e| ConfigError::invalid("providers.coingecko_url", e.to_string()))?,
        )];
        if config.providers.fallback_enabled {
            providers.push(Arc::new(
                BinanceTickerProvider::new(&config.providers.binance_url, timeout)
                    .map_err(|e| ConfigError::invalid("providers.binance_url", e.to_string()))?,
            ));
        }

        let publisher: Arc<dyn Publisher> = if dry_run {
            Arc::new(DryRunPublisher)
        } else {
            Arc::new(TelegramPublisher::new(&config.telegram, timeout)?)
        };

        Ok(Self::with_parts(
            config,
            Arc::new(FailoverProvider::new(providers)),
            Renderer::new(&config.image),
            publisher,
            PriceStore::new(&config.state_file),
        ))
    }

    /// Creates a scheduler from explicit components and loads the post state
    pub fn with_parts(
        config: &Config,
        provider: Arc<dyn PriceProvider>,
        renderer: Renderer,
        publisher: Arc<dyn Publisher>,
        store: PriceStore,
    ) -> Self {
        let state = store.load();
        Self {
            symbols: Arc::new(config.symbols.clone()),
            provider,
            renderer,
            publisher,
            store,
            state,
            stats: RunStats::new(),
            tick_interval: config.tick(),
            footer: config.footer.clone(),
        }
    }

    pub fn state(&self) -> &PostState {
        &self.state
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn eligibility(&self, symbol: &SymbolConfig, now: DateTime<Utc>) -> Eligibility {
        Eligibility::at(
            self.state.last_post_time(&symbol.symbol),
            symbol.interval(),
            now,
        )
    }

    /// Runs one iteration: a single fetch, then every ready symbol in order
    pub async fn tick(&mut self, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport::default();
        let symbols = Arc::clone(&self.symbols);

        let start = Instant::now();
        let quotes = match self.provider.fetch_quotes(&symbols).await {
            Ok(quotes) => {
                self.stats.record_fetch(start.elapsed(), true);
                tracing::debug!(
                    count = quotes.len(),
                    provider = self.provider.provider_name(),
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Fetched prices"
                );
                quotes
            }
            Err(e) => {
                self.stats.record_fetch(start.elapsed(), false);
                tracing::warn!(error = %e, "Failed to fetch prices, skipping tick");
                report.fetch_failed = true;
                return report;
            }
        };

        for symbol in symbols.iter() {
            if !self.eligibility(symbol, now).is_ready() {
                report.waiting.push(symbol.symbol.clone());
                continue;
            }

            let Some(quote) = quotes.get(&symbol.symbol) else {
                tracing::warn!(symbol = %symbol.symbol, "No quote this tick, skipping");
                report.missing_quote.push(symbol.symbol.clone());
                continue;
            };

            match self.post(symbol, quote, now).await {
                PostOutcome::Posted => report.posted.push(symbol.symbol.clone()),
                PostOutcome::RenderFailed => report.render_failed.push(symbol.symbol.clone()),
                PostOutcome::PublishFailed => report.publish_failed.push(symbol.symbol.clone()),
            }
        }

        report
    }

    /// Render, publish and, only on success, persist one symbol
    async fn post(&mut self, symbol: &SymbolConfig, quote: &PriceQuote, now: DateTime<Utc>) -> PostOutcome {
        tracing::info!(
            symbol = %symbol.symbol,
            price = %quote.price,
            change_24h = ?quote.change_24h,
            source = %quote.source,
            "Processing symbol"
        );

        let previous = self.state.last_price(&symbol.symbol);
        let artifact = match self.renderer.render(symbol, quote, previous) {
            Ok(artifact) => artifact,
            Err(e) => {
                self.stats.record_render_failure();
                tracing::error!(symbol = %symbol.symbol, error = %e, "Render failed, skipping symbol this tick");
                return PostOutcome::RenderFailed;
            }
        };

        let caption = match &self.footer {
            Some(footer) => format!("{}\n\n{}", artifact.caption(), footer),
            None => artifact.caption().to_string(),
        };

        if !self.publisher.publish(&artifact, &caption).await {
            self.stats.record_post(false);
            tracing::warn!(symbol = %symbol.symbol, "Publish failed, will retry next tick");
            return PostOutcome::PublishFailed;
        }
        self.stats.record_post(true);

        self.state.record_post(&symbol.symbol, quote.price, now);
        if let Err(e) = self.store.save(&self.state) {
            tracing::error!(
                path = %self.store.path().display(),
                error = %e,
                "Failed to persist post state, keeping it in memory"
            );
        }

        tracing::info!(
            symbol = %symbol.symbol,
            next_post_secs = symbol.interval_seconds,
            "Posted"
        );
        PostOutcome::Posted
    }

    /// Logs when each symbol is next due
    pub fn log_status(&self, now: DateTime<Utc>) {
        for symbol in self.symbols.iter() {
            let (remaining, state) = match self.eligibility(symbol, now) {
                Eligibility::Ready => (Duration::ZERO, "READY"),
                Eligibility::Waiting { remaining } => (remaining, "WAITING"),
            };
            tracing::info!(
                symbol = %symbol.symbol,
                next_in = %format_countdown(remaining),
                state,
                "Next post"
            );
        }

        let stats = self.stats.snapshot();
        tracing::info!(
            posts = stats.posts,
            failed_posts = stats.failed_posts,
            render_failures = stats.render_failures,
            fetch_success_rate = stats.fetch_success_rate,
            fetch_p50_ms = stats.fetch_p50_ms,
            fetch_p99_ms = stats.fetch_p99_ms,
            next_update_secs = self.tick_interval.as_secs(),
            "Monitoring"
        );
    }

    /// Loops until `shutdown` resolves. Shutdown is only observed between
    /// ticks, so an in-flight tick always completes.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        tracing::info!(
            symbols = self.symbols.len(),
            tick_secs = self.tick_interval.as_secs(),
            provider = self.provider.provider_name(),
            publisher = self.publisher.publisher_name(),
            "Starting price poster"
        );

        loop {
            self.tick(Utc::now()).await;
            self.log_status(Utc::now());

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, stopping");
                    break;
                }
                _ = sleep(self.tick_interval) => {}
            }
        }
    }
}

/// Installs the Ctrl-C handler right away and returns a future that resolves
/// once it fires, for use as the shutdown signal of [`Scheduler::run`].
///
/// `tokio::signal::ctrl_c` only registers on first poll; until then SIGINT
/// still kills the process. The listener task is polled here, before the
/// first tick starts.
pub async fn ctrl_c_shutdown() -> impl Future<Output = ()> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = tx.send(());
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        }
    });
    tokio::task::yield_now().await;

    async move {
        let _ = rx.await;
    }
}

/// `mm:ss`, minutes uncapped
fn format_countdown(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
