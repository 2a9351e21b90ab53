//! Session control loop: entry scan, exit monitoring and forced square-off.

use std::collections::{BTreeMap, HashSet};

use chrono::{NaiveDateTime, NaiveTime};
use futures::future::join_all;
use rust_decimal::Decimal;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use intraday_core::config::SessionConfig;
use intraday_core::events::Signal;
use intraday_core::position::Position;
use intraday_core::traits::{Broker, Notifier};
use intraday_strategy::CrossoverDetector;

use crate::clock::Clock;
use crate::exits;
use crate::ledger::PositionLedger;
use crate::square_off::SquareOff;
use crate::types::{Phase, SessionSummary};

/// Drives one trading session from entry time to square-off.
///
/// Transitions fire once the exchange-local clock has reached the configured
/// time, so a stalled tick delays a transition instead of skipping it.
pub struct SessionScheduler<B, N, C> {
    config: SessionConfig,
    broker: B,
    notifier: N,
    clock: C,
    detector: CrossoverDetector,
    ledger: PositionLedger,
    square_off: SquareOff,
    phase: Phase,
    entry_scans: u32,
    /// Signals whose entry order failed; retried while the entry window is open.
    pending_entries: BTreeMap<String, Signal>,
}

impl<B, N, C> SessionScheduler<B, N, C>
where
    B: Broker,
    N: Notifier,
    C: Clock,
{
    #[must_use]
    pub fn new(config: SessionConfig, broker: B, notifier: N, clock: C) -> Self {
        Self {
            detector: CrossoverDetector::from_config(&config),
            ledger: PositionLedger::new(&config),
            square_off: SquareOff::new(config.product),
            config,
            broker,
            notifier,
            clock,
            phase: Phase::PreEntry,
            entry_scans: 0,
            pending_entries: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub const fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    /// Number of entry scans performed; never exceeds one.
    #[must_use]
    pub const fn entry_scans(&self) -> u32 {
        self.entry_scans
    }

    /// Runs ticks at the configured interval until the session ends or
    /// `shutdown` flips to `true`.
    ///
    /// On shutdown, open positions are still squared off before returning.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> SessionSummary {
        info!(
            symbols = ?self.config.symbols,
            entry = %self.config.entry_time.format("%H:%M"),
            cutoff = %self.config.cutoff_time.format("%H:%M"),
            tick_secs = self.config.tick_interval_secs,
            stop_loss = %self.config.stop_loss_pct,
            target = %self.config.target_pct,
            "Session started"
        );
        self.notify("Intraday crossover session started").await;

        let mut interval = tokio::time::interval(self.config.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown_open = true;

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed(), if shutdown_open => {
                    if changed.is_err() {
                        // Sender dropped: nobody can request a stop any more.
                        shutdown_open = false;
                    } else if *shutdown.borrow_and_update() {
                        let now = self.clock.now();
                        self.abort(now).await;
                        break;
                    }
                }

                _ = interval.tick() => {
                    let now = self.clock.now();
                    if self.tick(now).await == Phase::SessionEnded {
                        break;
                    }
                }
            }
        }

        let summary = self.ledger.summary();
        info!(
            opened = summary.opened,
            still_open = summary.still_open,
            realized_pnl = %summary.realized_pnl,
            "Session ended"
        );
        self.notify(&summary.to_string()).await;
        summary
    }

    /// Advances the state machine for wall time `now`.
    pub async fn tick(&mut self, now: NaiveDateTime) -> Phase {
        let time = now.time();
        debug!(phase = %self.phase, time = %time.format("%H:%M:%S"), "Tick");

        if self.phase == Phase::PreEntry && time >= self.config.entry_time {
            if self.within_entry_window(time) {
                self.run_entry_scan(now).await;
            } else {
                warn!(
                    time = %time.format("%H:%M"),
                    entry = %self.config.entry_time.format("%H:%M"),
                    "Entry window missed, skipping entry scan"
                );
                self.notify(&format!(
                    "Entry window missed (first tick at {}), no entries today",
                    time.format("%H:%M")
                ))
                .await;
            }
            self.phase = Phase::EntryDone;
        } else if self.phase == Phase::EntryDone && !self.pending_entries.is_empty() {
            self.retry_pending_entries(now).await;
        }

        if self.phase == Phase::EntryDone {
            self.monitor_exits().await;

            if time >= self.config.cutoff_time {
                self.run_square_off(time).await;
            }
        }

        self.phase
    }

    fn within_entry_window(&self, time: NaiveTime) -> bool {
        time < self.config.cutoff_time
            && time.signed_duration_since(self.config.entry_time) < self.config.entry_window()
    }

    async fn run_entry_scan(&mut self, now: NaiveDateTime) {
        self.entry_scans += 1;
        info!(symbols = self.config.symbols.len(), "Running strategy for entry");

        let symbols = self.config.symbols.clone();
        let detector = &self.detector;
        let broker = &self.broker;
        let detections = join_all(
            symbols
                .iter()
                .map(|symbol| detector.detect(broker, symbol, now)),
        )
        .await;

        for (symbol, detection) in symbols.iter().zip(detections) {
            let detection = match detection {
                Ok(d) => d,
                Err(e) => {
                    warn!(symbol, error = %e, "Crossover check failed, treating as no signal");
                    self.notify(&format!("Error in crossover for {symbol}: {e}"))
                        .await;
                    continue;
                }
            };

            match (detection.signal, detection.price) {
                (Signal::None, _) | (_, None) => info!(symbol, "No signal"),
                (signal, Some(price)) => self.enter(symbol, signal, price, now).await,
            }
        }
    }

    async fn enter(&mut self, symbol: &str, signal: Signal, price: Decimal, now: NaiveDateTime) {
        match self
            .ledger
            .open_if_eligible(&self.broker, symbol, signal, price, now)
            .await
        {
            Ok(Some(pos)) => {
                self.pending_entries.remove(symbol);
                self.notify(&entry_message(&pos)).await;
            }
            Ok(None) => {
                self.pending_entries.remove(symbol);
            }
            Err(e) => {
                error!(symbol, error = %e, retryable = e.is_retryable(), "Entry order failed");
                self.notify(&format!("Order failed for {symbol}: {e}")).await;
                if e.is_retryable() {
                    self.pending_entries.insert(symbol.to_string(), signal);
                } else {
                    self.pending_entries.remove(symbol);
                }
            }
        }
    }

    async fn retry_pending_entries(&mut self, now: NaiveDateTime) {
        if !self.within_entry_window(now.time()) {
            let dropped: Vec<String> = std::mem::take(&mut self.pending_entries)
                .into_keys()
                .collect();
            warn!(symbols = ?dropped, "Entry window closed, dropping failed entries");
            return;
        }

        let pending: Vec<(String, Signal)> = self
            .pending_entries
            .iter()
            .map(|(s, sig)| (s.clone(), *sig))
            .collect();
        for (symbol, signal) in pending {
            match self.broker.quote(&symbol).await {
                Ok(quote) => {
                    info!(symbol, price = %quote.last_price, "Retrying entry");
                    self.enter(&symbol, signal, quote.last_price, now).await;
                }
                Err(e) => warn!(symbol, error = %e, "Quote failed, entry retry deferred"),
            }
        }
    }

    async fn monitor_exits(&mut self) {
        for symbol in self.ledger.open_symbols() {
            let quote = match self.broker.quote(&symbol).await {
                Ok(q) => q,
                Err(e) => {
                    warn!(symbol, error = %e, "Error checking exit, will retry next tick");
                    continue;
                }
            };

            let Some(reason) = self
                .ledger
                .get(&symbol)
                .and_then(|pos| exits::evaluate(pos, quote.last_price))
            else {
                continue;
            };

            match self
                .ledger
                .close(&self.broker, &symbol, quote.last_price, reason)
                .await
            {
                Ok(Some(pos)) => {
                    self.notify(&format!(
                        "Exited {} at {} ({})",
                        pos.symbol, quote.last_price, reason
                    ))
                    .await;
                }
                Ok(None) => {}
                Err(e) => {
                    error!(symbol, error = %e, "Exit order failed, will retry next tick");
                    self.notify(&format!("Error exiting {symbol}: {e}")).await;
                }
            }
        }
    }

    async fn run_square_off(&mut self, time: NaiveTime) {
        let still_held = match self.square_off.flatten_all(&self.broker).await {
            Ok(report) => {
                for (pos, _) in &report.flattened {
                    self.notify(&format!(
                        "Auto square-off {} ({}) at {}",
                        pos.symbol,
                        pos.quantity,
                        time.format("%H:%M")
                    ))
                    .await;
                }
                for (pos, e) in &report.failed {
                    self.notify(&format!("Square-off failed for {}: {e}", pos.symbol))
                        .await;
                }
                if report.is_complete() {
                    Some(HashSet::new())
                } else {
                    Some(report.still_held())
                }
            }
            Err(e) => {
                error!(error = %e, attempt = self.square_off.attempts(), "Square-off error");
                self.notify(&format!("Square-off error: {e}")).await;
                None
            }
        };

        let complete = still_held.as_ref().is_some_and(HashSet::is_empty);
        if complete || self.square_off.exhausted() {
            // Without a listing nothing is known to be flat.
            let held = still_held
                .unwrap_or_else(|| self.ledger.open_symbols().into_iter().collect());
            if !complete {
                error!(
                    attempts = self.square_off.attempts(),
                    "Square-off incomplete after final attempt"
                );
                self.notify("Square-off incomplete, manual intervention required")
                    .await;
            }
            self.ledger.mark_flattened(&held);
            self.pending_entries.clear();
            self.phase = Phase::SessionEnded;
            info!("Exiting after square-off");
        }
    }

    async fn abort(&mut self, now: NaiveDateTime) {
        warn!(phase = %self.phase, "Shutdown requested");
        if self.phase != Phase::SessionEnded && self.ledger.has_open() {
            info!("Open positions present, squaring off before shutdown");
            self.run_square_off(now.time()).await;
            while self.phase != Phase::SessionEnded {
                tokio::time::sleep(self.config.tick_interval()).await;
                self.run_square_off(self.clock.now().time()).await;
            }
        }
        self.phase = Phase::SessionEnded;
    }

    async fn notify(&self, text: &str) {
        if let Err(e) = self.notifier.send(text).await {
            warn!(error = %e, "Notification failed");
        }
    }
}

fn entry_message(pos: &Position) -> String {
    format!(
        "{} {} at {} | target {} stop {} | order {}",
        pos.direction.entry_side(),
        pos.symbol,
        pos.entry_price,
        pos.target_price,
        pos.stop_price,
        pos.entry_order_id
    )
}
