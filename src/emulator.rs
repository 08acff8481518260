//! The iteration driver: sample → fetch → emit, once or in a loop.

use crate::sampler::Sampler;
use anyhow::Context;
use std::future::Future;
use std::io;
use emulator_types::SampleKey;
use posting_emulator_mysql_source::{FetchError, RowFetcher};
use posting_emulator_sink::{EmitReport, Emitter};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Default number of back-to-back fetch failures tolerated in continuous mode.
pub const DEFAULT_MAX_CONSECUTIVE_FETCH_FAILURES: u32 = 10;

/// How many iterations to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// One full iteration, then stop regardless of sink outcomes.
    Once,
    /// Iterate until interrupted, or until `max_iterations` fetches were attempted.
    Continuous { max_iterations: Option<u64> },
}

/// Running totals across iterations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmulationStats {
    /// Iterations whose fetch succeeded and whose records were emitted.
    pub iterations: u64,
    pub fetch_failures: u64,
    pub delivered: u64,
    pub failed: u64,
    pub archived: u64,
    pub archive_failures: u64,
    /// Source records that came back empty (offset past the end of the table).
    pub empty_records: u64,
}

impl EmulationStats {
    fn record(&mut self, report: &EmitReport, empty_records: usize) {
        self.iterations += 1;
        self.delivered += report.delivered() as u64;
        self.failed += report.failed() as u64;
        self.archived += (report.archived.len() - report.archive_failures()) as u64;
        self.archive_failures += report.archive_failures() as u64;
        self.empty_records += empty_records as u64;
    }
}

/// Runs the fixed pipeline. Iterations never overlap: each one finishes
/// every sink call before the next offset is sampled.
pub struct Emulator<F> {
    sampler: Sampler,
    fetcher: F,
    emitter: Emitter,
    max_consecutive_fetch_failures: u32,
    stats: EmulationStats,
}

impl<F: RowFetcher> Emulator<F> {
    pub fn new(sampler: Sampler, fetcher: F, emitter: Emitter) -> Self {
        Self {
            sampler,
            fetcher,
            emitter,
            max_consecutive_fetch_failures: DEFAULT_MAX_CONSECUTIVE_FETCH_FAILURES,
            stats: EmulationStats::default(),
        }
    }

    /// Abort continuous mode after this many fetch failures in a row (0 = never).
    pub fn with_max_consecutive_fetch_failures(mut self, limit: u32) -> Self {
        self.max_consecutive_fetch_failures = limit;
        self
    }

    pub fn stats(&self) -> EmulationStats {
        self.stats
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch the rows at `key` and emit them to every sink.
    ///
    /// Only a fetch failure is returned as an error; sink failures are in the
    /// report.
    pub async fn emit_key(&mut self, key: SampleKey) -> Result<EmitReport, FetchError> {
        let records = match self.fetcher.fetch(key).await {
            Ok(records) => records,
            Err(e) => {
                self.stats.fetch_failures += 1;
                return Err(e);
            }
        };

        let empty = records.empty_sources();
        if !empty.is_empty() {
            warn!("Offset {} is past the end of {:?}; emitting empty records", key, empty);
        }

        let report = self.emitter.emit(key, &records).await;
        self.stats.record(&report, empty.len());
        info!(
            "Offset {}: {} delivered, {} failed, {} archive failures",
            key,
            report.delivered(),
            report.failed(),
            report.archive_failures()
        );
        Ok(report)
    }

    /// Sample, wait out the think time, fetch and emit.
    pub async fn run_iteration(&mut self) -> Result<EmitReport, FetchError> {
        let sample = self.sampler.sample();
        self.sampler.pace(sample.delay).await;
        self.emit_key(sample.key).await
    }

    /// Run in the given mode until done or until `shutdown` fires.
    ///
    /// `shutdown` is only watched in continuous mode, and only between
    /// iterations: an iteration that has started always completes.
    pub async fn run(
        &mut self,
        mode: LoopMode,
        shutdown: broadcast::Receiver<()>,
    ) -> anyhow::Result<EmulationStats> {
        match mode {
            LoopMode::Once => self.run_once().await,
            LoopMode::Continuous { max_iterations } => {
                self.run_continuous(max_iterations, shutdown).await
            }
        }
    }

    /// One full iteration. A fetch failure is returned as the error.
    pub async fn run_once(&mut self) -> anyhow::Result<EmulationStats> {
        self.run_iteration().await.context("Iteration failed")?;
        Ok(self.finish())
    }

    async fn run_continuous(
        &mut self,
        max_iterations: Option<u64>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> anyhow::Result<EmulationStats> {
        let mut attempts = 0u64;
        let mut consecutive_failures = 0u32;
        loop {
            if max_iterations.is_some_and(|max| attempts >= max) {
                info!("Reached {} iterations", attempts);
                break;
            }

            let sample = self.sampler.sample();
            tokio::select! {
                biased;
                Ok(()) = shutdown.recv() => {
                    info!("Received shutdown signal");
                    break;
                }
                _ = self.sampler.pace(sample.delay) => {}
            }

            attempts += 1;
            match self.emit_key(sample.key).await {
                Ok(_) => consecutive_failures = 0,
                Err(e) => {
                    consecutive_failures += 1;
                    error!(
                        "Fetch at offset {} failed ({} in a row): {}",
                        sample.key, consecutive_failures, e
                    );
                    if self.max_consecutive_fetch_failures > 0
                        && consecutive_failures >= self.max_consecutive_fetch_failures
                    {
                        return Err(anyhow::Error::new(e).context(format!(
                            "Giving up after {consecutive_failures} consecutive fetch failures"
                        )));
                    }
                }
            }
        }
        Ok(self.finish())
    }

    fn finish(&self) -> EmulationStats {
        let stats = self.stats;
        info!(
            "Emulation finished: {} iterations, {} delivered, {} failed, {} archived, \
             {} fetch failures",
            stats.iterations, stats.delivered, stats.failed, stats.archived, stats.fetch_failures
        );
        stats
    }
}

/// Sets up a shutdown signal handler
///
/// The first Ctrl+C asks the run loop to stop after the current iteration.
/// A second one exits the process immediately with status 130.
pub fn setup_shutdown_handler() -> broadcast::Receiver<()> {
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    tokio::spawn(async move {
        if forward_interrupts(tokio::signal::ctrl_c, shutdown_tx).await {
            warn!("Received second interrupt signal, exiting immediately");
            std::process::exit(130);
        }
    });

    shutdown_rx
}

/// Turn the first interrupt into a shutdown request, then wait for another.
///
/// Returns `true` once a second interrupt arrives, `false` if listening for
/// interrupts fails.
pub async fn forward_interrupts<F, Fut>(
    mut next_interrupt: F,
    shutdown_tx: broadcast::Sender<()>,
) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if let Err(e) = next_interrupt().await {
        error!("Failed to install CTRL+C signal handler: {}", e);
        return false;
    }

    info!("Received interrupt signal (Ctrl+C), stopping after the current iteration");
    let _ = shutdown_tx.send(());

    match next_interrupt().await {
        Ok(()) => true,
        Err(e) => {
            error!("Failed to listen for a second CTRL+C: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emulator_types::{Record, Source};
    use posting_emulator_mysql_source::MemoryRowFetcher;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;

    fn fetcher(rows: i64) -> MemoryRowFetcher {
        let table = |column: &str| {
            (0..rows)
                .map(|i| Record::empty().with_field("index", i).with_field(column, i * 10))
                .collect::<Vec<_>>()
        };
        MemoryRowFetcher::new()
            .with_rows(Source::Pin, table("category"))
            .with_rows(Source::Geo, table("country"))
            .with_rows(Source::User, table("age"))
    }

    fn emulator(fetcher: MemoryRowFetcher, table_size: u64) -> Emulator<MemoryRowFetcher> {
        Emulator::new(
            Sampler::seeded(table_size, Duration::ZERO, 3),
            fetcher,
            Emitter::new(),
        )
    }

    #[tokio::test]
    async fn test_once_runs_a_single_iteration() {
        let (_tx, rx) = broadcast::channel(1);
        let mut emulator = emulator(fetcher(10), 10);
        let stats = emulator.run(LoopMode::Once, rx).await.unwrap();
        assert_eq!(stats.iterations, 1);
        assert_eq!(emulator.fetcher().fetches(), 1);
    }

    #[tokio::test]
    async fn test_once_surfaces_fetch_failure() {
        let (_tx, rx) = broadcast::channel(1);
        let mut emulator = emulator(MemoryRowFetcher::unavailable("access denied"), 10);
        let err = emulator.run(LoopMode::Once, rx).await.unwrap_err();
        assert!(format!("{err:#}").contains("access denied"));
    }

    #[tokio::test]
    async fn test_continuous_respects_max_iterations() {
        let (_tx, rx) = broadcast::channel(1);
        let mut emulator = emulator(fetcher(10), 10);
        let stats = emulator
            .run(LoopMode::Continuous { max_iterations: Some(5) }, rx)
            .await
            .unwrap();
        assert_eq!(stats.iterations, 5);
        assert_eq!(stats.empty_records, 0);
    }

    #[tokio::test]
    async fn test_offsets_past_the_end_are_not_errors() {
        let (_tx, rx) = broadcast::channel(1);
        // Tables hold 2 rows but offsets go up to 50.
        let mut emulator = emulator(fetcher(2), 50);
        let stats = emulator
            .run(LoopMode::Continuous { max_iterations: Some(20) }, rx)
            .await
            .unwrap();
        assert_eq!(stats.iterations, 20);
        assert_eq!(stats.fetch_failures, 0);
        assert!(stats.empty_records > 0);
    }

    #[tokio::test]
    async fn test_continuous_gives_up_after_consecutive_failures() {
        let (_tx, rx) = broadcast::channel(1);
        let mut emulator = emulator(MemoryRowFetcher::unavailable("unreachable"), 10)
            .with_max_consecutive_fetch_failures(3);
        let err = emulator
            .run(LoopMode::Continuous { max_iterations: None }, rx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("3 consecutive fetch failures"));
        assert_eq!(emulator.fetcher().fetches(), 3);
        assert_eq!(emulator.stats().fetch_failures, 3);
    }

    #[tokio::test]
    async fn test_continuous_keeps_going_past_failures_when_unlimited() {
        let (_tx, rx) = broadcast::channel(1);
        let mut emulator = emulator(MemoryRowFetcher::unavailable("unreachable"), 10)
            .with_max_consecutive_fetch_failures(0);
        let stats = emulator
            .run(LoopMode::Continuous { max_iterations: Some(4) }, rx)
            .await
            .unwrap();
        assert_eq!(stats.fetch_failures, 4);
        assert_eq!(stats.iterations, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_between_iterations() {
        let (tx, rx) = broadcast::channel(1);
        let mut emulator = Emulator::new(
            Sampler::seeded(10, Duration::from_secs(60), 3),
            fetcher(10),
            Emitter::new(),
        );
        tx.send(()).unwrap();
        let stats = emulator
            .run(LoopMode::Continuous { max_iterations: None }, rx)
            .await
            .unwrap();
        assert_eq!(stats.iterations, 0);
        assert_eq!(emulator.fetcher().fetches(), 0);
    }

    #[tokio::test]
    async fn test_pending_shutdown_wins_over_zero_delay() {
        for seed in 0..20 {
            let (tx, rx) = broadcast::channel(1);
            let mut emulator = Emulator::new(
                Sampler::seeded(10, Duration::ZERO, seed),
                fetcher(10),
                Emitter::new(),
            );
            tx.send(()).unwrap();
            let stats = emulator
                .run(LoopMode::Continuous { max_iterations: None }, rx)
                .await
                .unwrap();
            assert_eq!(stats.iterations, 0, "seed {seed}");
        }
    }

    #[tokio::test]
    async fn test_run_once_does_not_watch_shutdown() {
        let (tx, rx) = broadcast::channel(1);
        tx.send(()).unwrap();
        let mut emulator = emulator(fetcher(10), 10);
        let stats = emulator.run(LoopMode::Once, rx).await.unwrap();
        assert_eq!(stats.iterations, 1);
    }

    #[tokio::test]
    async fn test_first_interrupt_requests_shutdown_second_one_exits() {
        let interrupts = Arc::new(Notify::new());
        let (tx, mut rx) = broadcast::channel(1);
        let source = interrupts.clone();
        let forwarder = tokio::spawn(forward_interrupts(
            move || {
                let source = source.clone();
                async move {
                    source.notified().await;
                    Ok(())
                }
            },
            tx,
        ));

        interrupts.notify_one();
        rx.recv().await.unwrap();
        assert!(!forwarder.is_finished());

        interrupts.notify_one();
        assert!(forwarder.await.unwrap());
    }

    #[tokio::test]
    async fn test_broken_signal_source_requests_nothing() {
        let (tx, mut rx) = broadcast::channel(1);
        let exit = forward_interrupts(|| async { Err(io::Error::other("no signals")) }, tx).await;
        assert!(!exit);
        assert!(rx.try_recv().is_err());
    }
}
