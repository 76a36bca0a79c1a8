//! Execution of side-effect batches off the caller's thread.
//!
//! Every `fire` that lands on a transition with side effects hands one
//! [`Job`] to the machine's [`Dispatcher`]. The job runs the side-effect
//! callback once per side effect, in order, then the completion callback.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::sync::{Arc, Mutex};
use std::thread;
use thiserror::Error;
use uuid::Uuid;

/// One side-effect batch, ready to run.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Identifier of a dispatched side-effect batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DispatchId(Uuid);

impl DispatchId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying v4 uuid.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for DispatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Strategy for running side-effect batches.
///
/// Implementations must run each job exactly once and must not reorder the
/// work inside a job. No ordering between jobs is implied.
pub trait Dispatcher: Send + Sync {
    /// Run `job` now or later, on any thread.
    fn dispatch(&self, id: DispatchId, job: Job);
}

/// Errors in a [`DispatchConfig`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Thread name {0:?} contains a NUL byte")]
    InvalidThreadName(String),
}

fn check_thread_name(name: &str) -> Result<(), ConfigError> {
    if name.contains('\0') {
        return Err(ConfigError::InvalidThreadName(name.to_string()));
    }
    Ok(())
}

fn deserialize_thread_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    check_thread_name(&name).map_err(de::Error::custom)?;
    Ok(name)
}

/// Settings for [`ThreadDispatcher`].
///
/// Missing fields fall back to their defaults, so `{}` is a valid config.
/// Thread names containing NUL bytes are rejected when deserializing.
///
/// # Example
///
/// ```rust
/// use switchyard::effects::DispatchConfig;
///
/// let config = DispatchConfig {
///     thread_name: "orders-fx".to_string(),
///     stack_size: Some(256 * 1024),
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Name given to every spawned side-effect thread
    #[serde(deserialize_with = "deserialize_thread_name")]
    pub thread_name: String,
    /// Stack size for spawned threads; platform default when unset
    pub stack_size: Option<usize>,
}

impl DispatchConfig {
    /// Check that the config can be used to spawn threads.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_thread_name(&self.thread_name)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            thread_name: "switchyard-dispatch".to_string(),
            stack_size: None,
        }
    }
}

/// Spawns a fresh OS thread per job.
///
/// This is the default dispatcher. `fire` returns as soon as the thread is
/// spawned; the thread is detached and runs the batch to completion. If the
/// OS refuses the thread, the batch runs on the calling thread instead.
#[derive(Clone, Debug, Default)]
pub struct ThreadDispatcher {
    config: DispatchConfig,
}

impl ThreadDispatcher {
    /// Dispatcher with the default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher with `config`. NUL bytes in the thread name are stripped.
    pub fn from_config(mut config: DispatchConfig) -> Self {
        if config.validate().is_err() {
            tracing::warn!(
                thread_name = ?config.thread_name,
                "stripping NUL bytes from dispatch thread name"
            );
            config.thread_name.retain(|c| c != '\0');
        }
        Self { config }
    }

    /// Dispatcher with `config`, rejecting an invalid one.
    pub fn try_from_config(config: DispatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The config threads are spawned with.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }
}

impl Dispatcher for ThreadDispatcher {
    fn dispatch(&self, id: DispatchId, job: Job) {
        let mut builder = thread::Builder::new().name(self.config.thread_name.clone());
        if let Some(size) = self.config.stack_size {
            builder = builder.stack_size(size);
        }

        // The handle is dropped: the thread is detached.
        spawn_or_run_inline(id, job, move |job| builder.spawn(job).map(|_handle| ()));
    }
}

fn take_job(slot: &Mutex<Option<Job>>) -> Option<Job> {
    match slot.lock() {
        Ok(mut guard) => guard.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    }
}

/// Hand `job` to `spawn`, running it on the current thread if spawning fails.
///
/// `spawn` consumes its argument even on failure, so the job is parked in a
/// shared slot and whichever side takes it first runs it.
pub(crate) fn spawn_or_run_inline<F>(id: DispatchId, job: Job, spawn: F)
where
    F: FnOnce(Job) -> io::Result<()>,
{
    let slot = Arc::new(Mutex::new(Some(job)));
    let parked = Arc::clone(&slot);
    let runner: Job = Box::new(move || {
        if let Some(job) = take_job(&parked) {
            job();
        }
    });

    if let Err(err) = spawn(runner) {
        tracing::warn!(
            dispatch = %id,
            error = %err,
            "failed to spawn side-effect thread, running batch inline"
        );
        if let Some(job) = take_job(&slot) {
            job();
        }
    }
}

/// Runs each job on the thread that called `fire`, before `fire` returns.
///
/// Useful in tests that need deterministic completion. Ordering inside a
/// batch is unchanged; only the executing thread differs from
/// [`ThreadDispatcher`].
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineDispatcher;

impl Dispatcher for InlineDispatcher {
    fn dispatch(&self, _id: DispatchId, job: Job) {
        job();
    }
}
