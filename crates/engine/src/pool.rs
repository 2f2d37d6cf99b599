//! Bounded-concurrency execution of work units.
//!
//! Lifecycle: `open -> submit* -> drain`. Parallel pools run units on a
//! fixed rayon thread pool sized by the core policy; sequential pools run
//! them inline on the submitting thread. Every submitted unit reports
//! exactly one terminal event over an mpsc channel, and [`WorkerPool::drain`]
//! receives until every sender clone is gone, so no unit can be abandoned
//! or double-counted. Dropping an undrained pool performs the same blocking
//! drain.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, RwLock};

use rayon::ThreadPool;
use tracing::{debug, error, warn};

use optibench_core::{InstanceLoader, PoolConfig};

use crate::error::EngineError;
use crate::metrics::ExperimentMetrics;
use crate::sink::ResultSink;
use crate::unit::{UnitOutcome, WorkUnit};

/// Terminal event reported by every submitted unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitEvent {
    Completed,
    Failed,
    Skipped,
}

/// Totals observed by [`WorkerPool::drain`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub completed: usize,
    pub failed: usize,
    /// Queued units never started because cancellation was requested.
    pub skipped: usize,
    pub interrupted: bool,
}

/// Everything a worker needs to finish one unit: the loader, the shared
/// sink, and the metrics lock.
pub struct RunContext {
    loader: Arc<dyn InstanceLoader>,
    sink: Arc<ResultSink>,
    metrics: Arc<RwLock<ExperimentMetrics>>,
}

impl RunContext {
    pub fn new(
        loader: Arc<dyn InstanceLoader>,
        sink: Arc<ResultSink>,
        metrics: Arc<RwLock<ExperimentMetrics>>,
    ) -> Self {
        Self {
            loader,
            sink,
            metrics,
        }
    }

    /// Executes one unit and records its outcome. Faults stay inside: a
    /// failed unit becomes a warning plus a failure record, and a sink
    /// error becomes an error log plus a counter bump.
    fn process(&self, unit: &WorkUnit) -> UnitEvent {
        match unit.execute(self.loader.as_ref()) {
            UnitOutcome::Completed(row) => {
                if let Err(e) = self.sink.append(&row) {
                    error!(
                        "Failed to append row for {} on {}: {}",
                        row.algorithm_id, row.instance_name, e
                    );
                    if let Ok(mut m) = self.metrics.write() {
                        m.record_sink_error();
                    }
                }
                if let Ok(mut m) = self.metrics.write() {
                    m.record_success(&row.algorithm_id, row.objective_value, row.elapsed);
                }
                UnitEvent::Completed
            }
            UnitOutcome::Failed(failure) => {
                warn!(
                    "Unit {} on {} failed: {}",
                    failure.algorithm_id,
                    failure.path.display(),
                    failure.error
                );
                if let Ok(mut m) = self.metrics.write() {
                    m.record_failure(&failure.algorithm_id);
                }
                UnitEvent::Failed
            }
        }
    }
}

enum Executor {
    /// Sequential mode: units run synchronously inside `submit`.
    Caller,
    Pool(ThreadPool),
}

pub struct WorkerPool {
    executor: Executor,
    ctx: Arc<RunContext>,
    workers: usize,
    submitted: usize,
    cancelled: Arc<AtomicBool>,
    events_tx: Option<Sender<UnitEvent>>,
    events_rx: Option<Receiver<UnitEvent>>,
}

impl WorkerPool {
    /// Builds the execution context for one run. The worker count is fixed
    /// here and never exceeded afterwards.
    pub fn open(
        config: &PoolConfig,
        ctx: Arc<RunContext>,
        cancelled: Arc<AtomicBool>,
    ) -> Result<Self, EngineError> {
        let workers = config.effective_workers();
        let executor = if config.sequential {
            Executor::Caller
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| EngineError::Pool(e.to_string()))?;
            Executor::Pool(pool)
        };
        debug!(
            "Worker pool ready: {} workers (sequential: {})",
            workers, config.sequential
        );
        let (events_tx, events_rx) = mpsc::channel();
        Ok(Self {
            executor,
            ctx,
            workers,
            submitted: 0,
            cancelled,
            events_tx: Some(events_tx),
            events_rx: Some(events_rx),
        })
    }

    /// Accepts one unit. Sequential pools execute it before returning;
    /// parallel pools enqueue it and return immediately. Units submitted
    /// after a cancellation request are skipped, not run.
    pub fn submit(&mut self, unit: WorkUnit) {
        self.submitted += 1;
        let Some(tx) = self.events_tx.as_ref() else {
            return;
        };
        match &self.executor {
            Executor::Caller => {
                let event = if self.cancelled.load(Ordering::Relaxed) {
                    skip(&unit)
                } else {
                    self.ctx.process(&unit)
                };
                let _ = tx.send(event);
            }
            Executor::Pool(pool) => {
                let ctx = Arc::clone(&self.ctx);
                let cancelled = Arc::clone(&self.cancelled);
                let tx = tx.clone();
                pool.spawn(move || {
                    let event = if cancelled.load(Ordering::Relaxed) {
                        skip(&unit)
                    } else {
                        ctx.process(&unit)
                    };
                    let _ = tx.send(event);
                });
            }
        }
    }

    /// Handle for requesting cancellation from another thread. Queued units
    /// are skipped; in-flight units always run to completion.
    pub fn cancel_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Blocks until every submitted unit has reached a terminal state, then
    /// reports the totals. Consuming the pool makes later submissions a
    /// compile error.
    pub fn drain(mut self) -> DrainReport {
        self.drain_inner()
    }

    fn drain_inner(&mut self) -> DrainReport {
        let Some(rx) = self.events_rx.take() else {
            return DrainReport::default();
        };
        drop(self.events_tx.take());

        let mut report = DrainReport::default();
        while let Ok(event) = rx.recv() {
            match event {
                UnitEvent::Completed => report.completed += 1,
                UnitEvent::Failed => report.failed += 1,
                UnitEvent::Skipped => report.skipped += 1,
            }
        }
        report.interrupted = self.cancelled.load(Ordering::Relaxed);

        if report.skipped > 0 {
            warn!(
                "Drained after cancellation: {} queued units skipped",
                report.skipped
            );
        }
        debug!(
            "Pool drained: {} completed, {} failed, {} skipped",
            report.completed, report.failed, report.skipped
        );
        report
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if self.events_rx.is_some() {
            warn!(
                "Worker pool dropped without drain; waiting for {} submitted units",
                self.submitted
            );
            self.drain_inner();
        }
    }
}

fn skip(unit: &WorkUnit) -> UnitEvent {
    debug!(
        "Skipping queued unit {} on {} after cancellation",
        unit.algorithm_id(),
        unit.path().display()
    );
    UnitEvent::Skipped
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::atomic::AtomicUsize;
    use std::thread::ThreadId;

    use tempfile::TempDir;

    use optibench_core::{
        Algorithm, DecimalSeparator, LoadError, ProblemInstance, SolveError, Solution,
    };

    use super::*;

    struct TinyLoader;

    impl InstanceLoader for TinyLoader {
        fn load(&self, _path: &Path) -> Result<ProblemInstance, LoadError> {
            Ok(ProblemInstance::parse("tiny", "p 2 1\ne 1 2\n").unwrap())
        }
    }

    /// Records the thread each run executed on.
    struct ThreadProbe {
        seen: std::sync::Mutex<Vec<ThreadId>>,
    }

    impl ThreadProbe {
        fn new() -> Self {
            Self {
                seen: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    impl Algorithm for ThreadProbe {
        fn id(&self) -> &str {
            "thread-probe"
        }

        fn run(&self, instance: &ProblemInstance, _seed: u64) -> Result<Solution, SolveError> {
            self.seen.lock().unwrap().push(std::thread::current().id());
            Ok(Solution::new(instance, vec![true, false]))
        }
    }

    /// Sets the shared cancel flag while running, then returns normally.
    struct CancelOnRun {
        flag: Arc<AtomicBool>,
        runs: AtomicUsize,
    }

    impl Algorithm for CancelOnRun {
        fn id(&self) -> &str {
            "cancel-on-run"
        }

        fn run(&self, instance: &ProblemInstance, _seed: u64) -> Result<Solution, SolveError> {
            self.runs.fetch_add(1, Ordering::Relaxed);
            self.flag.store(true, Ordering::Relaxed);
            Ok(Solution::new(instance, vec![true, false]))
        }
    }

    fn test_ctx(dir: &TempDir) -> (Arc<RunContext>, Arc<RwLock<ExperimentMetrics>>) {
        let sink = Arc::new(
            ResultSink::create(dir.path().join("results.csv"), ',', DecimalSeparator::Point)
                .unwrap(),
        );
        let metrics = Arc::new(RwLock::new(ExperimentMetrics::new("test-run", "test")));
        let ctx = Arc::new(RunContext::new(
            Arc::new(TinyLoader),
            sink,
            Arc::clone(&metrics),
        ));
        (ctx, metrics)
    }

    fn sequential_config() -> PoolConfig {
        PoolConfig {
            sequential: true,
            cores: 1,
            core_percent: 100,
            time_budget_secs: None,
        }
    }

    fn parallel_config(cores: usize) -> PoolConfig {
        PoolConfig {
            sequential: false,
            cores,
            core_percent: 100,
            time_budget_secs: None,
        }
    }

    #[test]
    fn sequential_pool_runs_on_the_caller() {
        let dir = TempDir::new().unwrap();
        let (ctx, _metrics) = test_ctx(&dir);
        let probe = Arc::new(ThreadProbe::new());
        let mut pool = WorkerPool::open(
            &sequential_config(),
            ctx,
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap();

        pool.submit(WorkUnit::new("a.txt", Arc::clone(&probe) as Arc<dyn Algorithm>, 1));
        pool.submit(WorkUnit::new("b.txt", Arc::clone(&probe) as Arc<dyn Algorithm>, 1));
        let report = pool.drain();

        assert_eq!(report.completed, 2);
        let seen = probe.seen.lock().unwrap();
        assert!(seen.iter().all(|id| *id == std::thread::current().id()));
    }

    #[test]
    fn parallel_pool_runs_off_the_caller() {
        let dir = TempDir::new().unwrap();
        let (ctx, _metrics) = test_ctx(&dir);
        let probe = Arc::new(ThreadProbe::new());
        let mut pool =
            WorkerPool::open(&parallel_config(2), ctx, Arc::new(AtomicBool::new(false))).unwrap();

        pool.submit(WorkUnit::new("a.txt", Arc::clone(&probe) as Arc<dyn Algorithm>, 1));
        let report = pool.drain();

        assert_eq!(report.completed, 1);
        let seen = probe.seen.lock().unwrap();
        assert!(seen.iter().all(|id| *id != std::thread::current().id()));
    }

    #[test]
    fn drain_on_empty_pool_returns_immediately() {
        let dir = TempDir::new().unwrap();
        let (ctx, _metrics) = test_ctx(&dir);
        let pool =
            WorkerPool::open(&parallel_config(2), ctx, Arc::new(AtomicBool::new(false))).unwrap();
        assert_eq!(pool.drain(), DrainReport::default());
    }

    #[test]
    fn sequential_cancellation_skips_later_submissions() {
        let dir = TempDir::new().unwrap();
        let (ctx, _metrics) = test_ctx(&dir);
        let cancel = Arc::new(AtomicBool::new(false));
        let alg = Arc::new(CancelOnRun {
            flag: Arc::clone(&cancel),
            runs: AtomicUsize::new(0),
        });
        let mut pool = WorkerPool::open(&sequential_config(), ctx, cancel).unwrap();

        pool.submit(WorkUnit::new("a.txt", Arc::clone(&alg) as Arc<dyn Algorithm>, 1));
        pool.submit(WorkUnit::new("b.txt", Arc::clone(&alg) as Arc<dyn Algorithm>, 1));
        pool.submit(WorkUnit::new("c.txt", Arc::clone(&alg) as Arc<dyn Algorithm>, 1));
        let report = pool.drain();

        assert_eq!(alg.runs.load(Ordering::Relaxed), 1, "only the first unit runs");
        assert_eq!(report.completed, 1);
        assert_eq!(report.skipped, 2);
        assert!(report.interrupted);
    }

    #[test]
    fn drop_without_drain_still_finishes_units() {
        let dir = TempDir::new().unwrap();
        let (ctx, metrics) = test_ctx(&dir);
        let probe = Arc::new(ThreadProbe::new());
        {
            let mut pool =
                WorkerPool::open(&parallel_config(2), ctx, Arc::new(AtomicBool::new(false)))
                    .unwrap();
            for _ in 0..4 {
                pool.submit(WorkUnit::new(
                    "a.txt",
                    Arc::clone(&probe) as Arc<dyn Algorithm>,
                    1,
                ));
            }
        }
        let m = metrics.read().unwrap();
        assert_eq!(m.per_algorithm["thread-probe"].runs, 4);
    }

    #[test]
    fn submitted_counts_accepted_units() {
        let dir = TempDir::new().unwrap();
        let (ctx, _metrics) = test_ctx(&dir);
        let probe = Arc::new(ThreadProbe::new());
        let mut pool = WorkerPool::open(
            &sequential_config(),
            ctx,
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap();
        for _ in 0..3 {
            pool.submit(WorkUnit::new(
                "a.txt",
                Arc::clone(&probe) as Arc<dyn Algorithm>,
                1,
            ));
        }
        assert_eq!(pool.submitted(), 3);
        pool.drain();
    }
}
