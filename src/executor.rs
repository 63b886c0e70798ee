//! Single-flight background execution of rename batches.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crate::batch::{plan_batch, run_batch, BatchOutcome, RenamePlan};
use crate::error::RenameError;
use crate::expression::Expression;
use crate::fs::{FileSystem, LocalFileSystem};
use crate::value::Value;

const READY: u8 = 0;
const ONGOING: u8 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutorState {
    /// Edits and run requests are accepted.
    Ready,
    /// A batch is running; edits and run requests are rejected.
    Ongoing,
}

impl std::fmt::Display for ExecutorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutorState::Ready => write!(f, "READY"),
            ExecutorState::Ongoing => write!(f, "ONGOING"),
        }
    }
}

/// Owns the formula and the file set, and runs batches over them on a
/// background thread.
///
/// At most one batch runs at a time: [`run`](Self::run) returns `false`
/// instead of queueing while another one is in flight, and every edit is
/// refused until it completes. Completion is signalled through a flag the
/// caller polls with [`take_result_ready_flag`](Self::take_result_ready_flag).
pub struct BatchExecutor<F: FileSystem + 'static = LocalFileSystem> {
    shared: Arc<Shared<F>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

struct Shared<F> {
    fs: F,
    state: AtomicU8,
    expression: Mutex<Expression>,
    paths: Mutex<Vec<String>>,
    outcome: Mutex<Option<BatchOutcome>>,
    result_ready: AtomicBool,
}

impl<F: FileSystem + 'static> BatchExecutor<F> {
    pub fn new(fs: F) -> Self {
        Self {
            shared: Arc::new(Shared {
                fs,
                state: AtomicU8::new(READY),
                expression: Mutex::new(Expression::new()),
                paths: Mutex::new(Vec::new()),
                outcome: Mutex::new(None),
                result_ready: AtomicBool::new(false),
            }),
            worker: Mutex::new(None),
        }
    }

    pub fn file_system(&self) -> &F {
        &self.shared.fs
    }

    pub fn current_state(&self) -> ExecutorState {
        match self.shared.state.load(Ordering::Acquire) {
            ONGOING => ExecutorState::Ongoing,
            _ => ExecutorState::Ready,
        }
    }

    pub fn append_value(&self, value: impl Into<Value>) -> bool {
        let value = value.into();
        self.shared.edit_expression(|expression| {
            expression.push(value);
            true
        })
    }

    /// Removes the last value. `false` when busy or already empty.
    pub fn pop_last_value(&self) -> bool {
        self.shared
            .edit_expression(|expression| expression.pop().is_some())
    }

    pub fn clear_values(&self) -> bool {
        self.shared.edit_expression(|expression| {
            expression.clear();
            true
        })
    }

    /// The formula as text, or `None` while a batch is running.
    pub fn render_expression(&self) -> Option<String> {
        let expression = lock(&self.shared.expression);
        if self.shared.is_ongoing() {
            return None;
        }
        Some(expression.to_string())
    }

    pub fn append_path(&self, path: impl Into<String>) -> bool {
        let path = path.into();
        self.shared.edit_paths(|paths| paths.push(path))
    }

    pub fn clear_paths(&self) -> bool {
        self.shared.edit_paths(Vec::clear)
    }

    /// Copy of the current formula, whatever the state.
    pub fn expression_snapshot(&self) -> Expression {
        lock(&self.shared.expression).clone()
    }

    /// Copy of the current file set, whatever the state.
    pub fn paths_snapshot(&self) -> Vec<String> {
        lock(&self.shared.paths).clone()
    }

    /// Computes the new names without renaming anything. `None` while a
    /// batch is running.
    pub fn preview(&self) -> Option<Result<Vec<RenamePlan>, RenameError>> {
        if self.shared.is_ongoing() {
            return None;
        }
        let (expression, paths) = self.shared.snapshot();
        Some(plan_batch(expression.values(), &paths))
    }

    /// Starts a batch on a background thread. Returns whether one was
    /// actually started.
    pub fn run(&self) -> bool {
        if self
            .shared
            .state
            .compare_exchange(READY, ONGOING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("run requested while a batch is in progress");
            return false;
        }
        // An unconsumed flag belongs to the previous batch.
        self.shared.result_ready.store(false, Ordering::Release);

        let mut worker = lock(&self.worker);
        if let Some(previous) = worker.take() {
            // Already past its last state change, so this does not wait long.
            join_worker(previous);
        }

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("rename-batch".to_string())
            .spawn(move || shared.execute());
        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                true
            }
            Err(err) => {
                tracing::error!(%err, "failed to start batch worker");
                self.shared.state.store(READY, Ordering::Release);
                false
            }
        }
    }

    /// Status line of the last finished batch, empty before the first one.
    pub fn poll_result(&self) -> String {
        lock(&self.shared.outcome)
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    pub fn poll_outcome(&self) -> Option<BatchOutcome> {
        lock(&self.shared.outcome).clone()
    }

    /// Returns `true` once per finished batch. Starting a new batch clears a
    /// flag nobody took.
    pub fn take_result_ready_flag(&self) -> bool {
        self.shared.result_ready.swap(false, Ordering::AcqRel)
    }

    /// Blocks until the running batch, if any, has finished.
    pub fn join(&self) {
        if let Some(handle) = lock(&self.worker).take() {
            join_worker(handle);
        }
    }
}

impl Default for BatchExecutor<LocalFileSystem> {
    fn default() -> Self {
        Self::new(LocalFileSystem::new())
    }
}

impl<F: FileSystem + 'static> Drop for BatchExecutor<F> {
    fn drop(&mut self) {
        self.join();
    }
}

impl<F: FileSystem> Shared<F> {
    fn is_ongoing(&self) -> bool {
        self.state.load(Ordering::Acquire) == ONGOING
    }

    // The state is checked with the lock held: a batch that starts afterwards
    // snapshots after this edit, never in the middle of it.
    fn edit_expression(&self, edit: impl FnOnce(&mut Expression) -> bool) -> bool {
        let mut expression = lock(&self.expression);
        if self.is_ongoing() {
            tracing::debug!("expression edit rejected, batch in progress");
            return false;
        }
        edit(&mut expression)
    }

    fn edit_paths(&self, edit: impl FnOnce(&mut Vec<String>)) -> bool {
        let mut paths = lock(&self.paths);
        if self.is_ongoing() {
            tracing::debug!("file set edit rejected, batch in progress");
            return false;
        }
        edit(&mut paths);
        true
    }

    fn snapshot(&self) -> (Expression, Vec<String>) {
        let paths = lock(&self.paths).clone();
        let expression = lock(&self.expression).clone();
        (expression, paths)
    }

    fn execute(&self) {
        let _reset = ResetOnPanic(&self.state);
        let (expression, paths) = self.snapshot();
        tracing::info!(files = paths.len(), formula = %expression, "batch started");

        let outcome = run_batch(&self.fs, expression.values(), &paths);
        tracing::info!(
            renamed = outcome.renamed_count(),
            total = outcome.total(),
            success = outcome.is_success(),
            "batch finished"
        );

        // The flag goes up before the state drops back, so a caller that
        // sees `Ready` never misses this batch's result.
        *lock(&self.outcome) = Some(outcome);
        self.result_ready.store(true, Ordering::Release);
        self.state.store(READY, Ordering::Release);
    }
}

/// Puts the executor back to `Ready` if the worker unwinds.
struct ResetOnPanic<'a>(&'a AtomicU8);

impl Drop for ResetOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            tracing::error!("batch worker panicked, executor back to ready");
            self.0.store(READY, Ordering::Release);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn join_worker(handle: JoinHandle<()>) {
    if handle.join().is_err() {
        tracing::error!("batch worker panicked");
    }
}
